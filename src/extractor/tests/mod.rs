use mockall::predicate::function;
use reqwest::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::extractor::{EXTRACTION_ERROR, Extractor, ExtractorSettings};
use crate::llm::{ChatRequest, CompletionBackend, LlmError, MockCompletionBackend};

fn settings() -> ExtractorSettings {
    ExtractorSettings::new("gpt-4o", 4000, 1.0)
}

#[tokio::test]
async fn test_extract_returns_trimmed_backend_text() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .times(1)
        .returning(|_| Ok("  United Kingdom\n".to_string()));

    let extractor = Extractor::new(Arc::new(backend), settings(), 2);
    let value = extractor
        .extract("Extract only country name", "Data-d: london")
        .await;

    assert_eq!(value, "United Kingdom");
}

#[tokio::test]
async fn test_extract_sends_instruction_and_record_text() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .with(function(|req: &ChatRequest| {
            req.model == "gpt-4o"
                && req.max_tokens == Some(4000)
                && req.temperature == Some(1.0)
                && req.messages.len() == 2
                && req.messages[0].role == "system"
                && req.messages[0].content == "You are a helpful assistant."
                && req.user_content()
                    == Some("Extract only fee information: Title: Prize Body: Free entry")
        }))
        .times(1)
        .returning(|_| Ok("Free".to_string()));

    let extractor = Extractor::new(Arc::new(backend), settings(), 1);
    let value = extractor
        .extract(
            "Extract only fee information",
            "Title: Prize Body: Free entry",
        )
        .await;

    assert_eq!(value, "Free");
}

#[tokio::test]
async fn test_backend_failure_yields_sentinel() {
    let mut backend = MockCompletionBackend::new();
    backend.expect_complete().times(1).returning(|_| {
        Err(LlmError::Api {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "quota".to_string(),
        })
    });

    let extractor = Extractor::new(Arc::new(backend), settings(), 1);
    let value = extractor.extract("Extract only country name", "").await;

    assert_eq!(value, EXTRACTION_ERROR);
}

#[tokio::test]
async fn test_try_extract_surfaces_error() {
    let mut backend = MockCompletionBackend::new();
    backend
        .expect_complete()
        .returning(|_| Err(LlmError::EmptyResponse));

    let extractor = Extractor::new(Arc::new(backend), settings(), 1);
    let result = extractor.try_extract("Extract only country name", "x").await;

    assert!(matches!(result, Err(LlmError::EmptyResponse)));
}

#[test]
fn test_fallback_is_the_sentinel() {
    let value = Extractor::fallback("Extract only fee information", &LlmError::Timeout);
    assert_eq!(value, EXTRACTION_ERROR);
}

#[test]
fn test_prompt_format() {
    assert_eq!(
        Extractor::build_prompt("Extract only open call title", "Title: Open Prize"),
        "Extract only open call title: Title: Open Prize"
    );
    assert_eq!(
        Extractor::build_prompt("Extract only open call title", ""),
        "Extract only open call title: "
    );
}

/// Tracks how many calls are running at once.
struct SlowBackend {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl CompletionBackend for SlowBackend {
    async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("ok".to_string())
    }
}

#[tokio::test]
async fn test_concurrency_is_bounded_by_permits() {
    let backend = Arc::new(SlowBackend {
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let extractor = Extractor::new(backend.clone(), settings(), 2);

    let calls = (0..6).map(|_| extractor.extract("Extract only fee information", "x"));
    let values = futures::future::join_all(calls).await;

    assert!(values.iter().all(|v| v == "ok"));
    assert_eq!(backend.peak.load(Ordering::SeqCst), 2);
}
