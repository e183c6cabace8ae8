//! Directory of input tables → canonical records.

use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::entities::CanonicalRecord;
use crate::table::{Table, TableError};
use crate::transform::RecordTransformer;

const INPUT_EXTENSION: &str = "csv";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("cannot list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file that could not be loaded, with the reason.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: TableError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub records: Vec<CanonicalRecord>,
    pub files_processed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Malformed rows left out of otherwise readable tables.
    pub skipped_rows: usize,
}

/// `.csv` files directly inside `dir`, sorted by file name.
pub fn discover_tables(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = fs::read_dir(dir).map_err(|source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == INPUT_EXTENSION))
        .collect();
    paths.sort();
    Ok(paths)
}

#[derive(Clone)]
pub struct BatchProcessor {
    transformer: RecordTransformer,
    record_concurrency: usize,
}

impl BatchProcessor {
    pub fn new(transformer: RecordTransformer, record_concurrency: usize) -> Self {
        Self {
            transformer,
            record_concurrency: record_concurrency.max(1),
        }
    }

    /// Transform every input table found in `dir`. A directory that cannot be
    /// listed yields an empty outcome.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub async fn process_dir(&self, dir: &Path) -> BatchOutcome {
        match discover_tables(dir) {
            Ok(paths) => self.process(&paths).await,
            Err(error) => {
                warn!(error = %error, "no input tables");
                BatchOutcome::default()
            }
        }
    }

    /// Transform every row of every table. A table that fails to load is
    /// skipped, and so is a malformed row; the rest are still processed.
    pub async fn process(&self, sources: &[PathBuf]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for path in sources {
            let table = match Table::read(path) {
                Ok(table) => table,
                Err(error) => {
                    warn!(file = %path.display(), error = %error, "skipping unreadable table");
                    outcome.skipped.push(SkippedFile {
                        path: path.clone(),
                        error,
                    });
                    continue;
                }
            };
            info!(
                file = %path.display(),
                rows = table.len(),
                skipped_rows = table.skipped_rows(),
                "table loaded"
            );
            outcome.skipped_rows += table.skipped_rows();

            let records: Vec<CanonicalRecord> = stream::iter(table.source_rows())
                .map(|row| async move { self.transformer.transform(&row).await })
                .buffered(self.record_concurrency)
                .collect()
                .await;

            outcome.records.extend(records);
            outcome.files_processed += 1;
        }

        info!(
            records = outcome.records.len(),
            files = outcome.files_processed,
            skipped = outcome.skipped.len(),
            skipped_rows = outcome.skipped_rows,
            "batch finished"
        );
        outcome
    }
}
