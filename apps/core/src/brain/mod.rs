//! # Brain Module
//!
//! Maps a free-text utterance to one approved intent of the response bank.
//!
//! ## Components
//! - `safety`: deterministic emergency-phrase override (always runs first)
//! - `prompt`: system instruction enumerating the closed intent set
//! - `classifier`: backend call, reply parsing and confidence gating

pub mod classifier;
pub mod prompt;
pub mod safety;

pub use classifier::IntentClassifier;
pub use safety::{SafetyRules, EMERGENCY_PHRASES, URGENT_SUPPORT_INTENT};
