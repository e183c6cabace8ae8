//! Canonical table → remote open calls API, one POST per row.

pub mod errors;
pub mod payload;

pub use errors::UploadError;
pub use payload::OpenCallPayload;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode, header};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::entities::{CanonicalField, CanonicalRecord};
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub endpoint: String,
    pub token: String,
    pub concurrency: usize,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum RowOutcome {
    /// The API answered 200.
    Sent,
    /// The API answered with any other status.
    Rejected { status: StatusCode },
    /// The request never got an answer.
    Failed { error: String },
    /// The row could not be read as a canonical record.
    Invalid { error: String },
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RowOutcome::Sent)
    }
}

#[derive(Debug)]
pub struct RowReport {
    pub title: String,
    pub outcome: RowOutcome,
}

/// Per-row results, in table order.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub rows: Vec<RowReport>,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.succeeded()
    }
}

#[derive(Clone)]
pub struct Uploader {
    client: Client,
    settings: UploadSettings,
}

impl Uploader {
    pub fn new(settings: UploadSettings) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;
        Ok(Self { client, settings })
    }

    /// Load the table at `path`, drop repeated rows, and POST each remaining row.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn upload(&self, path: &Path) -> Result<UploadReport, UploadError> {
        let table = Table::read(path)?;

        let required = CanonicalField::ALL.map(CanonicalField::column);
        let missing = table.missing_columns(&required);
        if !missing.is_empty() {
            return Err(UploadError::MissingColumns(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        let before = table.len();
        let table = table.dedup();
        info!(rows = table.len(), duplicates = before - table.len(), "upload table loaded");

        let rows: Vec<Result<CanonicalRecord, String>> = table
            .deserialize::<CanonicalRecord>()
            .map(|row| row.map_err(|e| e.to_string()))
            .collect();

        let reports: Vec<RowReport> = stream::iter(rows)
            .map(|row| async move {
                match row {
                    Ok(record) => self.send(&record).await,
                    Err(error) => {
                        warn!(error = %error, "skipping unreadable row");
                        RowReport {
                            title: String::new(),
                            outcome: RowOutcome::Invalid { error },
                        }
                    }
                }
            })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let report = UploadReport { rows: reports };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "upload finished"
        );
        Ok(report)
    }

    /// Send one record. Never retried.
    pub async fn send(&self, record: &CanonicalRecord) -> RowReport {
        let payload = OpenCallPayload::from(record);
        let title = record.open_call_title.clone();

        let result = self
            .client
            .post(self.settings.endpoint.as_str())
            .bearer_auth(&self.settings.token)
            .header(header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await;

        let outcome = match result {
            Ok(response) if response.status() == StatusCode::OK => {
                info!(title = %title, "open call uploaded");
                RowOutcome::Sent
            }
            Ok(response) => {
                let status = response.status();
                warn!(title = %title, status = %status, "open call rejected");
                RowOutcome::Rejected { status }
            }
            Err(error) => {
                warn!(title = %title, error = %error, "open call upload failed");
                RowOutcome::Failed {
                    error: error.to_string(),
                }
            }
        };

        RowReport { title, outcome }
    }
}
