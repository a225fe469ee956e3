use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use validator::Validate;

/// Reserved intent id meaning "no approved intent applies".
pub const NO_MATCH: &str = "__NO_MATCH__";

fn default_category() -> String {
    "Other".to_string()
}

/// One approved question/answer pair from the response bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Intent {
    /// Unique key of the intent.
    #[validate(length(min = 1))]
    pub intent_id: String,
    /// Grouping label. Catalog order of first appearance defines display order.
    #[serde(default = "default_category")]
    pub category: String,
    /// Canonical phrasing shown to users.
    #[serde(default)]
    pub user_question: Option<String>,
    /// Short label, used when no `user_question` is present.
    #[serde(default)]
    pub display_name: Option<String>,
    /// The only text ever shown as an answer for this intent.
    #[validate(length(min = 1))]
    pub response: String,
    /// Example utterances used to prompt the classifier. Never shown to users.
    #[serde(default)]
    pub sample_user_phrases: Vec<String>,
    /// Related intents offered as follow-up suggestions.
    #[serde(default)]
    pub next_best_intent_ids: Vec<String>,
}

impl Intent {
    /// Canonical question for this intent, falling back to the display name.
    pub fn question(&self) -> &str {
        self.user_question
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or("Question")
    }
}

/// A deep link into one of the site pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page: String,
    pub label: String,
}

/// On-disk shape of `response_bank.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub intents: Vec<Intent>,
}

/// On-disk shape of `intent_to_page_map.json`.
pub type PageMap = HashMap<String, Vec<PageLink>>;

/// Decision produced for a single utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ClassificationResult {
    /// A catalog intent id or [`NO_MATCH`].
    pub intent_id: String,
    /// Confidence score (0.0 - 1.0).
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    /// Free-form slot values extracted by the model.
    #[serde(default)]
    pub slots: BTreeMap<String, String>,
    /// Why this id and confidence were chosen.
    pub rationale: String,
}

impl ClassificationResult {
    /// A zero-confidence no-match decision with no slots.
    pub fn no_match(rationale: impl Into<String>) -> Self {
        Self {
            intent_id: NO_MATCH.to_string(),
            confidence: 0.0,
            slots: BTreeMap::new(),
            rationale: rationale.into(),
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.intent_id == NO_MATCH
    }
}
