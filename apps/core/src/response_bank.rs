//! Response Bank
//!
//! Read-only, indexed access to the approved intent catalog and the
//! intent-to-page link map. Built once at startup and shared behind an `Arc`.

use crate::error::AppError;
use crate::models::{CatalogDocument, Intent, PageLink, PageMap, NO_MATCH};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

/// File name of the intent catalog inside the data directory.
pub const BANK_FILENAME: &str = "response_bank.json";

/// File name of the intent-to-page map inside the data directory.
pub const PAGE_MAP_FILENAME: &str = "intent_to_page_map.json";

/// Immutable catalog of intents plus the page-link map.
#[derive(Debug, Clone)]
pub struct ResponseBank {
    intents: Vec<Intent>,
    lookup: HashMap<String, usize>,
    page_map: PageMap,
}

impl ResponseBank {
    /// Builds a bank from already decoded documents.
    ///
    /// Fails on empty ids or answers, a missing question, duplicate ids, or an
    /// intent claiming the reserved [`NO_MATCH`] id.
    pub fn from_documents(catalog: CatalogDocument, page_map: PageMap) -> Result<Self, AppError> {
        let mut lookup = HashMap::with_capacity(catalog.intents.len());

        for (index, intent) in catalog.intents.iter().enumerate() {
            intent.validate().map_err(|e| {
                AppError::Catalog(format!("intent #{} is invalid: {}", index, e))
            })?;
            if intent.intent_id == NO_MATCH {
                return Err(AppError::Catalog(format!(
                    "intent #{} uses the reserved id {}",
                    index, NO_MATCH
                )));
            }
            if intent.user_question.is_none() && intent.display_name.is_none() {
                return Err(AppError::Catalog(format!(
                    "intent '{}' has neither user_question nor display_name",
                    intent.intent_id
                )));
            }
            if lookup.insert(intent.intent_id.clone(), index).is_some() {
                return Err(AppError::Catalog(format!(
                    "duplicate intent id '{}'",
                    intent.intent_id
                )));
            }
        }

        for intent in &catalog.intents {
            for target in &intent.next_best_intent_ids {
                if !lookup.contains_key(target) {
                    warn!(
                        "Intent '{}' suggests unknown intent '{}'; the link will be skipped",
                        intent.intent_id, target
                    );
                }
            }
        }

        Ok(Self {
            intents: catalog.intents,
            lookup,
            page_map,
        })
    }

    /// Parses both documents from JSON text.
    pub fn from_json(bank_json: &str, page_map_json: &str) -> Result<Self, AppError> {
        let catalog: CatalogDocument = serde_json::from_str(bank_json)?;
        let page_map: PageMap = serde_json::from_str(page_map_json)?;
        Self::from_documents(catalog, page_map)
    }

    /// Loads the catalog and page map from two JSON files.
    pub fn load(bank_path: &Path, page_map_path: &Path) -> Result<Self, AppError> {
        let bank_json = fs::read_to_string(bank_path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read {:?}: {}", bank_path, e),
            ))
        })?;
        let page_map_json = fs::read_to_string(page_map_path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot read {:?}: {}", page_map_path, e),
            ))
        })?;
        let bank = Self::from_json(&bank_json, &page_map_json)?;
        info!(
            "Response bank loaded: {} intents across {} categories",
            bank.len(),
            bank.categories().len()
        );
        Ok(bank)
    }

    /// Loads `response_bank.json` and `intent_to_page_map.json` from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self, AppError> {
        Self::load(&dir.join(BANK_FILENAME), &dir.join(PAGE_MAP_FILENAME))
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// All intents in catalog order.
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for intent in &self.intents {
            if !seen.contains(&intent.category.as_str()) {
                seen.push(&intent.category);
            }
        }
        seen
    }

    pub fn intents_by_category(&self, category: &str) -> Vec<&Intent> {
        self.intents
            .iter()
            .filter(|intent| intent.category == category)
            .collect()
    }

    pub fn intent_by_id(&self, intent_id: &str) -> Option<&Intent> {
        self.lookup.get(intent_id).map(|&index| &self.intents[index])
    }

    /// Every valid intent id. Never contains [`NO_MATCH`].
    pub fn allowed_intent_ids(&self) -> HashSet<&str> {
        self.intents.iter().map(|i| i.intent_id.as_str()).collect()
    }

    pub fn is_allowed(&self, intent_id: &str) -> bool {
        self.lookup.contains_key(intent_id)
    }

    /// Follow-up suggestions for `intent_id`; dangling links are dropped.
    pub fn next_best(&self, intent_id: &str) -> Vec<&Intent> {
        match self.intent_by_id(intent_id) {
            Some(intent) => intent
                .next_best_intent_ids
                .iter()
                .filter_map(|id| self.intent_by_id(id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn page_links_for_intent(&self, intent_id: &str) -> &[PageLink] {
        self.page_map
            .get(intent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first intent, in catalog order, that deep-links to `page`.
    pub fn primary_intent_for_page(&self, page: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| {
            self.page_links_for_intent(&intent.intent_id)
                .iter()
                .any(|link| link.page == page)
        })
    }

    /// Every sample phrase across the catalog, in catalog order.
    pub fn training_phrases(&self) -> Vec<&str> {
        self.intents
            .iter()
            .flat_map(|intent| intent.sample_user_phrases.iter().map(String::as_str))
            .collect()
    }
}
