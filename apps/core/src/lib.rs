//! RSV Assistant core
//!
//! A response bank of pre-authored answers, a rule-plus-LLM intent classifier
//! that routes free-text questions into that bank, a backend status check, and
//! the guided/free-text conversation orchestrator built on top of them.

pub mod assistant;
pub mod backend;
pub mod brain;
pub mod config;
pub mod error;
pub mod models;
pub mod navigation;
pub mod preflight;
pub mod response_bank;

pub use assistant::{Assistant, ChatMode, Conversation, Reply};
pub use brain::IntentClassifier;
pub use config::{AppConfig, ClassifierConfig};
pub use error::AppError;
pub use models::{ClassificationResult, Intent, PageLink, NO_MATCH};
pub use preflight::{StatusReport, StatusState};
pub use response_bank::ResponseBank;

#[cfg(test)]
mod tests;
