//! Intent classification against the closed set of approved intents.
//!
//! Per call: safety override, then the no-credential fallback, then one
//! constrained backend call (with a single plain-text retry when structured
//! replies are rejected), then parsing and confidence gating. Every path ends in
//! a well-formed [`ClassificationResult`]; nothing is raised to the caller.

use crate::backend::{BackendError, BackendRequest, ModelBackend, OpenAiBackend};
use crate::brain::prompt::build_system_prompt;
use crate::brain::safety::SafetyRules;
use crate::config::ClassifierConfig;
use crate::models::{ClassificationResult, NO_MATCH};
use crate::preflight::{self, StatusReport};
use crate::response_bank::ResponseBank;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, instrument, warn};
use validator::Validate;

pub const NO_CREDENTIAL_RATIONALE: &str =
    "Add an OPENAI_API_KEY to a local .env file or environment variable, then restart the app.";
pub const PARSE_FAILURE_RATIONALE: &str = "Could not parse model output";
pub const GATE_RATIONALE: &str = "Below confidence threshold or invalid intent";

// Outermost JSON object in a free-text reply (prose or a fenced block around it).
// NOTE: expect() is acceptable here: constant pattern.
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex: JSON object pattern"));

/// Routes free text to one approved intent or to [`NO_MATCH`].
pub struct IntentClassifier {
    bank: Arc<ResponseBank>,
    /// Copy of the backend's model id, for spans and status display.
    model: String,
    confidence_threshold: f64,
    backend: Option<Arc<dyn ModelBackend>>,
    rules: SafetyRules,
}

impl IntentClassifier {
    /// Creates a classifier backed by the OpenAI adapter when a credential is configured.
    ///
    /// Construction never fails: without a credential the classifier still serves the
    /// safety override and reports `has_credential() == false`.
    pub fn new(bank: Arc<ResponseBank>, config: ClassifierConfig) -> Self {
        let backend = OpenAiBackend::from_config(&config)
            .map(|backend| Arc::new(backend) as Arc<dyn ModelBackend>);
        Self::with_backend(bank, config, backend)
    }

    /// Creates a classifier over an explicit backend. `None` means "no credential".
    pub fn with_backend(
        bank: Arc<ResponseBank>,
        config: ClassifierConfig,
        backend: Option<Arc<dyn ModelBackend>>,
    ) -> Self {
        if backend.is_none() {
            warn!("No model credential configured; free-text classification is disabled");
        }
        Self {
            bank,
            model: config.model,
            confidence_threshold: config.confidence_threshold,
            backend,
            rules: SafetyRules::default(),
        }
    }

    pub fn with_safety_rules(mut self, rules: SafetyRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn response_bank(&self) -> &Arc<ResponseBank> {
        &self.bank
    }

    /// Classifies one utterance.
    #[instrument(skip(self, message), fields(model = %self.model, chars = message.chars().count()))]
    pub async fn classify(&self, message: &str) -> ClassificationResult {
        if let Some(result) = self.rules.check(message, &self.bank) {
            info!("Safety override routed message to '{}'", result.intent_id);
            return result;
        }

        let Some(backend) = &self.backend else {
            return ClassificationResult::no_match(NO_CREDENTIAL_RATIONALE);
        };

        let request = BackendRequest::structured(build_system_prompt(&self.bank), message.to_string());
        let reply = match backend.invoke(&request).await {
            Err(BackendError::UnsupportedResponseFormat(reason)) => {
                warn!("Structured reply rejected ({}); retrying with plain-text instruction", reason);
                backend.invoke(&request.as_plain_text()).await
            }
            other => other,
        };

        let text = match reply {
            Ok(text) => text,
            Err(err) => {
                warn!("Classification backend call failed: {}", err);
                return backend_failure(&err);
            }
        };

        let candidate = match parse_candidate(&text) {
            Some(candidate) => candidate,
            None => {
                warn!("Model output could not be parsed into a classification");
                return ClassificationResult::no_match(PARSE_FAILURE_RATIONALE);
            }
        };

        self.gate(candidate)
    }

    /// Accepts the candidate only for a known intent at or above the threshold.
    fn gate(&self, candidate: ClassificationResult) -> ClassificationResult {
        if self.bank.is_allowed(&candidate.intent_id)
            && candidate.confidence >= self.confidence_threshold
        {
            info!(
                "Classified as '{}' (confidence {:.2})",
                candidate.intent_id, candidate.confidence
            );
            return candidate;
        }

        info!(
            "Demoted '{}' (confidence {:.2}, threshold {:.2})",
            candidate.intent_id, candidate.confidence, self.confidence_threshold
        );
        ClassificationResult {
            intent_id: NO_MATCH.to_string(),
            confidence: candidate.confidence,
            slots: candidate.slots,
            rationale: GATE_RATIONALE.to_string(),
        }
    }

    /// Probes the backend independently of any classification request.
    pub async fn check_status(&self) -> StatusReport {
        preflight::check_backend(self.backend.as_deref()).await
    }
}

/// Decodes and validates a model reply, tolerating prose around the JSON object.
pub fn parse_candidate(text: &str) -> Option<ClassificationResult> {
    let decoded = serde_json::from_str::<ClassificationResult>(text.trim()).ok().or_else(|| {
        JSON_OBJECT
            .find(text)
            .and_then(|m| serde_json::from_str::<ClassificationResult>(m.as_str()).ok())
    })?;
    decoded.validate().ok()?;
    Some(decoded)
}

/// Maps a backend failure to a no-match decision with an actionable rationale.
fn backend_failure(err: &BackendError) -> ClassificationResult {
    let rationale = match err {
        BackendError::Authentication(_) => {
            "OpenAI rejected the API key. Double-check OPENAI_API_KEY in your environment or .env file."
                .to_string()
        }
        BackendError::Network(_) => {
            "Unable to reach OpenAI. Check your internet/VPN connection and try again.".to_string()
        }
        BackendError::Status { code, .. } => {
            format!("OpenAI request failed ({}). Please try again shortly.", code)
        }
        BackendError::MalformedReply(_) => PARSE_FAILURE_RATIONALE.to_string(),
        BackendError::UnsupportedResponseFormat(reason) => format!("OpenAI call failed: {}", reason),
        BackendError::Unexpected(reason) => format!("Unexpected OpenAI error: {}", reason),
    };
    ClassificationResult::no_match(rationale)
}
