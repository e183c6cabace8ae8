//! Language-understanding backend.
//!
//! The pipeline only needs "send a system + user instruction, get text
//! back", so the backend is a single-method trait. `OpenAiClient` speaks the
//! chat-completions wire format; tests substitute their own implementations.

pub mod client;
pub mod errors;
pub mod types;

pub use client::OpenAiClient;
pub use errors::LlmError;
pub use types::{ChatRequest, Message};

use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}
