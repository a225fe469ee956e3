//! Safety override rules.
//!
//! Deterministic phrase matching that runs before any model call. A hit always
//! wins, with confidence 1.0.

use crate::models::{ClassificationResult, NO_MATCH};
use crate::response_bank::ResponseBank;
use std::collections::BTreeMap;

/// Intent that receives every emergency utterance when the catalog defines it.
pub const URGENT_SUPPORT_INTENT: &str = "urgent_support";

/// Phrases that route a message to urgent support. Checked in order; first hit wins.
pub const EMERGENCY_PHRASES: &[&str] = &[
    "emergency",
    "can't breathe",
    "cannot breathe",
    "blue lips",
    "call 911",
    "911",
    "go to er",
    "hospital now",
    "chest pain",
    "severe trouble breathing",
];

/// Phrase-based override layer.
#[derive(Debug, Clone)]
pub struct SafetyRules {
    phrases: Vec<String>,
    urgent_intent_id: String,
}

impl Default for SafetyRules {
    fn default() -> Self {
        Self::new(EMERGENCY_PHRASES.iter().copied(), URGENT_SUPPORT_INTENT)
    }
}

impl SafetyRules {
    /// Phrases are stored lower-cased; matching is case-insensitive.
    pub fn new<'a>(phrases: impl IntoIterator<Item = &'a str>, urgent_intent_id: &str) -> Self {
        Self {
            phrases: phrases.into_iter().map(str::to_lowercase).collect(),
            urgent_intent_id: urgent_intent_id.to_string(),
        }
    }

    /// The first configured phrase contained in `message`, if any.
    pub fn matched_phrase(&self, message: &str) -> Option<&str> {
        let lowered = message.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// Returns the override decision for `message`, or `None` when no phrase matches.
    pub fn check(&self, message: &str, bank: &ResponseBank) -> Option<ClassificationResult> {
        let phrase = self.matched_phrase(message)?;
        let intent_id = if bank.is_allowed(&self.urgent_intent_id) {
            self.urgent_intent_id.clone()
        } else {
            NO_MATCH.to_string()
        };
        Some(ClassificationResult {
            intent_id,
            confidence: 1.0,
            slots: BTreeMap::new(),
            rationale: format!("Safety override matched phrase '{}'", phrase),
        })
    }
}
