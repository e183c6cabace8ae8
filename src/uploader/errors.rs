use thiserror::Error;

use crate::table::TableError;

/// Failures that stop the whole upload phase. Per-row failures are reported
/// in [`super::UploadReport`] instead.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("cannot load upload table: {0}")]
    Table(#[from] TableError),

    #[error("upload table is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("client setup failed: {0}")]
    Client(String),
}
