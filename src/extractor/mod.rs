pub mod fields;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::llm::{ChatRequest, CompletionBackend, LlmError, Message};

/// Field value recorded when extraction fails.
pub const EXTRACTION_ERROR: &str = "Error";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Backend call parameters shared by every extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ExtractorSettings {
    pub fn new(model: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens,
            temperature,
        }
    }
}

/// Turns one instruction plus record text into one field value.
///
/// Calls share a semaphore so the number of backend requests in flight stays
/// bounded no matter how many records are being transformed.
#[derive(Clone)]
pub struct Extractor {
    backend: Arc<dyn CompletionBackend>,
    settings: ExtractorSettings,
    permits: Arc<Semaphore>,
}

impl Extractor {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        settings: ExtractorSettings,
        concurrency: usize,
    ) -> Self {
        Self {
            backend,
            settings,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    pub fn build_prompt(instruction: &str, record_text: &str) -> String {
        format!("{instruction}: {record_text}")
    }

    pub fn build_request(&self, instruction: &str, record_text: &str) -> ChatRequest {
        ChatRequest::new(self.settings.model.clone())
            .message(Message::system(self.settings.system_prompt.clone()))
            .message(Message::user(Self::build_prompt(instruction, record_text)))
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
    }

    /// One backend call, error surfaced to the caller.
    pub async fn try_extract(&self, instruction: &str, record_text: &str) -> Result<String, LlmError> {
        let _permit = self.permits.acquire().await.map_err(|_| LlmError::Closed)?;
        let request = self.build_request(instruction, record_text);
        self.backend
            .complete(request)
            .await
            .map(|content| content.trim().to_string())
    }

    /// One backend call; any failure becomes [`EXTRACTION_ERROR`].
    pub async fn extract(&self, instruction: &str, record_text: &str) -> String {
        match self.try_extract(instruction, record_text).await {
            Ok(value) => value,
            Err(error) => Self::fallback(instruction, &error),
        }
    }

    /// The value recorded once `error` is final for this field.
    pub fn fallback(instruction: &str, error: &LlmError) -> String {
        warn!(instruction, error = %error, "extraction failed");
        EXTRACTION_ERROR.to_string()
    }
}
