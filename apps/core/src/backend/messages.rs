use serde::Serialize;

/// Instruction appended to the conversation when structured replies are not available.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with only the JSON object matching the schema.";

/// How the backend is asked to shape its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    /// Native structured output (JSON object mode).
    JsonObject,
    /// Free text, with [`JSON_ONLY_INSTRUCTION`] appended.
    PlainText,
}

/// A single classification request.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub format: ReplyFormat,
}

impl BackendRequest {
    pub fn structured(system_prompt: String, user_message: String) -> Self {
        Self {
            system_prompt,
            user_message,
            format: ReplyFormat::JsonObject,
        }
    }

    /// The same request, downgraded to a plain-text reply.
    pub fn as_plain_text(&self) -> Self {
        Self {
            format: ReplyFormat::PlainText,
            ..self.clone()
        }
    }
}

/// Defines the failures a model backend can report.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq)]
pub enum BackendError {
    /// The backend rejected the credential (HTTP 401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),
    /// The backend could not be reached, or did not answer in time.
    #[error("Network failure: {0}")]
    Network(String),
    /// The backend answered with a non-success status, including rate limiting (429).
    #[error("Request failed with status {code}: {message}")]
    Status { code: u16, message: String },
    /// The backend does not accept the structured reply format.
    #[error("Structured replies not supported: {0}")]
    UnsupportedResponseFormat(String),
    /// The backend answered, but the envelope could not be decoded.
    #[error("Malformed reply: {0}")]
    MalformedReply(String),
    /// Anything else.
    #[error("Unexpected backend error: {0}")]
    Unexpected(String),
}

impl From<tokio::time::error::Elapsed> for BackendError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        BackendError::Network(format!("request timed out: {}", err))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            BackendError::Network(err.to_string())
        } else if err.is_decode() {
            BackendError::MalformedReply(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status {
                code: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            BackendError::Unexpected(err.to_string())
        }
    }
}
