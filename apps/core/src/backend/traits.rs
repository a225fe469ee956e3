use crate::backend::messages::{BackendError, BackendRequest};
use async_trait::async_trait;

/// Defines the public interface for a model backend.
///
/// This trait abstracts the concrete API, allowing the classifier to run against
/// a hosted model, a local server, or a scripted fake in tests.
#[async_trait]
pub trait ModelBackend: Send + Sync + 'static {
    /// Sends one classification request and returns the raw reply text.
    async fn invoke(&self, request: &BackendRequest) -> Result<String, BackendError>;

    /// Performs a lightweight call proving the backend is reachable and the credential accepted.
    async fn probe(&self) -> Result<(), BackendError>;
}
