//! Connectivity / Status Check
//!
//! Answers "can the model backend be reached and is the credential valid right
//! now", independently of any classification request. The report is a
//! point-in-time observation; callers decide when to re-probe.

use crate::backend::{BackendError, ModelBackend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Add OPENAI_API_KEY to a local .env file or export it before restarting the app.";
pub const REACHABLE_MESSAGE: &str = "API key loaded and reachable.";

/// Outcome of a status probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Ok,
    Missing,
    Error,
}

impl StatusState {
    /// Returns a human-readable badge label
    pub fn label(&self) -> &'static str {
        match self {
            StatusState::Ok => "API key loaded",
            StatusState::Missing => "Missing key",
            StatusState::Error => "Connection error",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of a single status check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: StatusState,
    pub message: String,
    /// When the probe finished. Display only.
    pub checked_at: DateTime<Utc>,
}

impl StatusReport {
    fn new(state: StatusState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            checked_at: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == StatusState::Ok
    }
}

/// Probes `backend`. `None` means no credential is configured and no call is made.
pub async fn check_backend(backend: Option<&dyn ModelBackend>) -> StatusReport {
    let Some(backend) = backend else {
        warn!("  ❌ backend_status: no credential configured");
        return StatusReport::new(StatusState::Missing, MISSING_CREDENTIAL_MESSAGE);
    };

    let report = match backend.probe().await {
        Ok(()) => StatusReport::new(StatusState::Ok, REACHABLE_MESSAGE),
        Err(err) => StatusReport::new(StatusState::Error, failure_message(&err)),
    };

    if report.is_ok() {
        info!("  ✅ backend_status: {}", report.message);
    } else {
        warn!("  ❌ backend_status: {}", report.message);
    }
    report
}

fn failure_message(err: &BackendError) -> String {
    match err {
        BackendError::Authentication(_) => {
            "OpenAI rejected the API key. Confirm the OPENAI_API_KEY value and organization access."
                .to_string()
        }
        BackendError::Network(_) => {
            "Unable to reach OpenAI. Check your network/VPN connection and retry.".to_string()
        }
        BackendError::Status { code, .. } => format!(
            "OpenAI validation failed ({}). Try again or reduce request volume.",
            code
        ),
        BackendError::UnsupportedResponseFormat(reason) | BackendError::MalformedReply(reason) => {
            format!("OpenAI validation failed: {}", reason)
        }
        BackendError::Unexpected(reason) => format!("Unexpected validation error: {}", reason),
    }
}
