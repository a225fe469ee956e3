use std::io;
use thiserror::Error;

/// Application-wide error type for the startup path (catalog loading and configuration).
///
/// Classification never surfaces this type: backend failures are expressed with
/// [`crate::backend::BackendError`] and folded into a `__NO_MATCH__` decision.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents standard input/output errors, typically a missing catalog file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents a catalog document that could not be decoded.
    #[error("Catalog format error: {0}")]
    Format(#[from] serde_json::Error),

    /// Represents a decoded catalog that breaks an invariant (duplicate ids, reserved id, ...).
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Represents data validation errors (e.g., an out-of-range threshold).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}
