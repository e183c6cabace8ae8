//! Raw row → canonical record.
//!
//! A row is flattened into one text blob, then every canonical field is
//! extracted from that same blob by its own backend call. The nine calls run
//! concurrently (bounded by the extractor's permits) and the record is built
//! only once all of them have resolved. A failing field carries the sentinel;
//! the record itself is never dropped.

pub mod backoff;

pub use backoff::calculate_backoff_delay;

use std::time::Duration;
use tracing::{debug, warn};

use crate::entities::{CanonicalField, CanonicalRecord, RawRecord};
use crate::extractor::Extractor;

/// One input row as ordered `(column, value)` cells. Empty values count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    cells: Vec<(String, String)>,
}

impl SourceRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    /// `"{column}: {value}"` for every non-empty cell, space-joined, in column order.
    pub fn to_prompt_text(&self) -> String {
        self.cells
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| format!("{column}: {value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&RawRecord> for SourceRow {
    fn from(record: &RawRecord) -> Self {
        Self::new(
            record
                .columns()
                .into_iter()
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect(),
        )
    }
}

/// Retries applied to retriable backend errors before settling on the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }
}

#[derive(Clone)]
pub struct RecordTransformer {
    extractor: Extractor,
    retry: RetryPolicy,
}

impl RecordTransformer {
    pub fn new(extractor: Extractor, retry: RetryPolicy) -> Self {
        Self { extractor, retry }
    }

    pub async fn transform(&self, row: &SourceRow) -> CanonicalRecord {
        let text = row.to_prompt_text();
        debug!(chars = text.len(), "transforming row");

        let values = futures::future::join_all(
            CanonicalField::ALL
                .iter()
                .map(|field| self.extract_field(*field, &text)),
        )
        .await;

        let mut values = values.into_iter();
        CanonicalRecord::from_values(std::array::from_fn(|_| values.next().unwrap_or_default()))
    }

    pub async fn transform_raw(&self, record: &RawRecord) -> CanonicalRecord {
        self.transform(&SourceRow::from(record)).await
    }

    async fn extract_field(&self, field: CanonicalField, text: &str) -> String {
        if self.retry.max_retries == 0 {
            return self.extractor.extract(field.instruction(), text).await;
        }

        let mut attempt = 0;
        loop {
            match self.extractor.try_extract(field.instruction(), text).await {
                Ok(value) => return value,
                Err(error) if error.is_retriable() && attempt < self.retry.max_retries => {
                    let delay = calculate_backoff_delay(attempt, self.retry.base_delay);
                    attempt += 1;
                    warn!(
                        field = field.column(),
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying extraction"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Extractor::fallback(field.instruction(), &error),
            }
        }
    }
}
