use crate::backend::messages::{BackendError, BackendRequest, ReplyFormat, JSON_ONLY_INSTRUCTION};
use crate::backend::traits::ModelBackend;
use crate::config::ClassifierConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

// --- Reply envelope ---
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter for OpenAI-compatible chat completion APIs.
///
/// The handle is cheap to clone and safe to share across tasks; the underlying
/// `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    request_timeout: Duration,
}

impl OpenAiBackend {
    pub fn new(base_url: Url, api_key: String, model: String, request_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
            request_timeout,
        }
    }

    /// Builds an adapter from the classifier settings, or `None` when no credential is configured.
    pub fn from_config(config: &ClassifierConfig) -> Option<Self> {
        config.api_key.as_ref().map(|key| {
            Self::new(
                config.base_url.clone(),
                key.clone(),
                config.model.clone(),
                config.request_timeout,
            )
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Unexpected(format!("invalid endpoint '{}': {}", path, e)))
    }

    fn build_payload(&self, request: &BackendRequest) -> serde_json::Value {
        let mut messages = vec![
            json!({"role": "system", "content": request.system_prompt}),
            json!({"role": "user", "content": request.user_message}),
        ];

        let mut payload = json!({ "model": self.model });
        match request.format {
            ReplyFormat::JsonObject => {
                payload["response_format"] = json!({"type": "json_object"});
            }
            ReplyFormat::PlainText => {
                messages.push(json!({"role": "system", "content": JSON_ONLY_INSTRUCTION}));
            }
        }
        payload["messages"] = serde_json::Value::Array(messages);
        payload
    }
}

/// Maps a non-success HTTP status and its body onto the backend error taxonomy.
fn status_error(status: StatusCode, body: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Authentication(body),
        StatusCode::BAD_REQUEST if body.contains("response_format") => {
            BackendError::UnsupportedResponseFormat(body)
        }
        _ => BackendError::Status {
            code: status.as_u16(),
            message: body,
        },
    }
}

impl OpenAiBackend {
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let url = self.endpoint("chat/completions")?;
        let payload = self.build_payload(request);
        debug!("Chat completion request ({:?}) to {}", request.format, url);

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!("Chat completion failed with status {}", status);
            return Err(status_error(status, body));
        }

        let body = res.bytes().await?;
        let completion: ChatCompletion = serde_json::from_slice(&body)
            .map_err(|e| BackendError::MalformedReply(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::MalformedReply("reply contained no choices".to_string()))
    }

    async fn list_models(&self) -> Result<(), BackendError> {
        let url = self.endpoint("models")?;
        let res = self.client.get(url).bearer_auth(&self.api_key).send().await?;
        let status = res.status();
        if status.is_success() {
            res.bytes().await?;
            Ok(())
        } else {
            let body = res.text().await.unwrap_or_default();
            Err(status_error(status, body))
        }
    }
}

// The timeout covers the whole exchange, body included.
#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError> {
        timeout(self.request_timeout, self.complete(request)).await?
    }

    async fn probe(&self) -> Result<(), BackendError> {
        timeout(self.request_timeout, self.list_models()).await?
    }
}
