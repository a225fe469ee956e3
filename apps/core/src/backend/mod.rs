//! # Model Backend
//!
//! Narrow capability interface over the external language model used by the
//! classifier, plus the OpenAI-compatible adapter.
//!
//! ## Components
//! - `traits`: the `ModelBackend` capability (`invoke`, `probe`)
//! - `messages`: request/reply shapes and the `BackendError` taxonomy
//! - `openai`: reqwest adapter for OpenAI-compatible chat completions

pub mod messages;
pub mod openai;
pub mod traits;

pub use messages::{BackendError, BackendRequest, ReplyFormat, JSON_ONLY_INSTRUCTION};
pub use openai::OpenAiBackend;
pub use traits::ModelBackend;
