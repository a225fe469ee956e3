//! Runtime configuration read from the process environment and a local `.env` file.

use crate::error::AppError;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "RSV_CLASSIFIER_MODEL";
pub const THRESHOLD_VAR: &str = "RSV_CONFIDENCE_THRESHOLD";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const TIMEOUT_VAR: &str = "RSV_REQUEST_TIMEOUT_SECS";
pub const DATA_DIR_VAR: &str = "RSV_DATA_DIR";

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DATA_DIR: &str = "data";

/// Settings for the intent classifier and its model backend.
#[derive(Clone, Validate)]
pub struct ClassifierConfig {
    /// Model identifier sent to the backend.
    #[validate(length(min = 1))]
    pub model: String,
    /// Minimum confidence required to accept the backend's intent guess.
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_threshold: f64,
    /// Backend credential. `None` disables free-text classification.
    pub api_key: Option<String>,
    /// Root of the OpenAI-compatible API, always with a trailing slash.
    pub base_url: Url,
    /// Upper bound for a single backend round-trip.
    pub request_timeout: Duration,
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("model", &self.model)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            api_key: None,
            // NOTE: expect() is acceptable here: constant input.
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Invalid default base URL"),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClassifierConfig {
    /// Reads the classifier settings from the environment.
    ///
    /// A missing or empty credential is not an error. Malformed numeric values,
    /// an out-of-range threshold, or an unparsable base URL are.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let api_key = env::var(API_KEY_VAR)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let model = env::var(MODEL_VAR)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);

        let confidence_threshold = match env::var(THRESHOLD_VAR) {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|e| {
                AppError::Config(format!("{} must be a number: {}", THRESHOLD_VAR, e))
            })?,
            Err(_) => defaults.confidence_threshold,
        };
        if !confidence_threshold.is_finite() {
            return Err(AppError::Config(format!(
                "{} must be a finite number, got {}",
                THRESHOLD_VAR, confidence_threshold
            )));
        }

        let base_url = match env::var(BASE_URL_VAR) {
            Ok(raw) if !raw.trim().is_empty() => parse_base_url(raw.trim())?,
            _ => defaults.base_url,
        };

        let request_timeout = match env::var(TIMEOUT_VAR) {
            Ok(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("{} must be a whole number of seconds: {}", TIMEOUT_VAR, e))
            })?),
            Err(_) => defaults.request_timeout,
        };

        let config = Self {
            model,
            confidence_threshold,
            api_key,
            base_url,
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Parses an API root and guarantees a trailing slash so `Url::join` keeps the path.
pub fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Top-level settings for the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding `response_bank.json` and `intent_to_page_map.json`.
    pub data_dir: PathBuf,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    /// Reads all settings from the process environment. Load `.env` before calling.
    pub fn from_env() -> Result<Self, AppError> {
        let data_dir = env::var(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Ok(Self {
            data_dir,
            classifier: ClassifierConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 5] = [API_KEY_VAR, MODEL_VAR, THRESHOLD_VAR, BASE_URL_VAR, TIMEOUT_VAR];

    #[test]
    fn test_defaults_without_environment() {
        temp_env::with_vars_unset(ALL_VARS, || {
            let config = ClassifierConfig::from_env().expect("defaults are valid");
            assert_eq!(config.model, DEFAULT_MODEL);
            assert_eq!(config.confidence_threshold, 0.7);
            assert!(config.api_key.is_none());
            assert_eq!(config.base_url.as_str(), "https://api.openai.com/v1/");
            assert_eq!(config.request_timeout, Duration::from_secs(30));
        });
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        temp_env::with_vars(
            [(API_KEY_VAR, Some("   ")), (THRESHOLD_VAR, None), (BASE_URL_VAR, None)],
            || {
                let config = ClassifierConfig::from_env().unwrap();
                assert!(config.api_key.is_none());
            },
        );
    }

    #[test]
    fn test_reads_overrides() {
        temp_env::with_vars(
            [
                (API_KEY_VAR, Some("sk-test")),
                (MODEL_VAR, Some("gpt-4o-mini")),
                (THRESHOLD_VAR, Some("0.55")),
                (BASE_URL_VAR, Some("http://localhost:9000/v1")),
                (TIMEOUT_VAR, Some("5")),
            ],
            || {
                let config = ClassifierConfig::from_env().unwrap();
                assert_eq!(config.api_key.as_deref(), Some("sk-test"));
                assert_eq!(config.model, "gpt-4o-mini");
                assert_eq!(config.confidence_threshold, 0.55);
                assert_eq!(config.base_url.as_str(), "http://localhost:9000/v1/");
                assert_eq!(config.request_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_threshold_out_of_range_is_rejected() {
        temp_env::with_vars([(THRESHOLD_VAR, Some("1.5")), (BASE_URL_VAR, None)], || {
            let err = ClassifierConfig::from_env().unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        });
    }

    #[test]
    fn test_non_finite_threshold_is_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            temp_env::with_var(THRESHOLD_VAR, Some(raw), || {
                let err = ClassifierConfig::from_env().unwrap_err();
                assert!(matches!(err, AppError::Config(_)), "accepted {}", raw);
            });
        }
    }

    #[test]
    fn test_threshold_not_a_number_is_rejected() {
        temp_env::with_var(THRESHOLD_VAR, Some("high"), || {
            let err = ClassifierConfig::from_env().unwrap_err();
            assert!(matches!(err, AppError::Config(_)));
        });
    }

    #[test]
    fn test_app_config_reads_process_environment() {
        temp_env::with_vars(
            [(DATA_DIR_VAR, Some("/srv/rsv/data")), (API_KEY_VAR, Some("sk-env")), (BASE_URL_VAR, None)],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.data_dir, PathBuf::from("/srv/rsv/data"));
                assert_eq!(config.classifier.api_key.as_deref(), Some("sk-env"));
            },
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClassifierConfig::default().with_api_key("sk-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
