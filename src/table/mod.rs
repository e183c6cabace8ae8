//! Tabular artifacts shared between phases.
//!
//! Tables are CSV files. Writes start with a UTF-8 byte-order mark so
//! spreadsheet tools pick the right encoding, and always replace whatever was
//! at the path. Reads tolerate (and drop) a leading BOM.

pub mod errors;

pub use errors::TableError;

use csv::{ReaderBuilder, StringRecord, Writer};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::transform::SourceRow;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An in-memory CSV table: header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    skipped_rows: usize,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let bytes = fs::read(path).map_err(|e| TableError::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Parse CSV bytes.
    ///
    /// Short rows are padded with empty cells. Rows wider than the header,
    /// or that cannot be decoded, are logged and left out; only an
    /// unreadable header fails the whole table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        let mut skipped_rows = 0;
        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            match record {
                Ok(record) if record.len() > width => {
                    warn!(row, cells = record.len(), columns = width, "skipping row wider than header");
                    skipped_rows += 1;
                }
                Ok(record) => {
                    let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
                    cells.resize(width, String::new());
                    rows.push(cells);
                }
                Err(error) => {
                    warn!(row, error = %error, "skipping unreadable row");
                    skipped_rows += 1;
                }
            }
        }

        Ok(Self {
            headers,
            rows,
            skipped_rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows dropped while parsing.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header names from `required` that this table lacks.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.headers.iter().any(|h| h == name))
            .collect()
    }

    /// Drop rows that repeat an earlier row exactly.
    pub fn dedup(self) -> Self {
        Self {
            rows: dedup(self.rows),
            ..self
        }
    }

    /// Rows as `(column, value)` cells for prompt serialization.
    pub fn source_rows(&self) -> impl Iterator<Item = SourceRow> + '_ {
        self.rows.iter().map(|row| {
            SourceRow::new(
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            )
        })
    }

    /// Deserialize each row by header name. Failures are reported per row.
    pub fn deserialize<T: DeserializeOwned>(
        &self,
    ) -> impl Iterator<Item = Result<T, TableError>> + '_ {
        let headers = StringRecord::from(self.headers.clone());
        self.rows.iter().enumerate().map(move |(index, row)| {
            StringRecord::from(row.clone())
                .deserialize(Some(&headers))
                .map_err(|source| TableError::Row {
                    row: index + 1,
                    source,
                })
        })
    }
}

/// Keep the first occurrence of every value, preserving order.
pub fn dedup<T: Eq + Hash + Clone>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Deduplicate and write `records` to `path`, replacing any previous content.
/// Returns the number of rows written.
pub fn persist<T>(records: Vec<T>, path: &Path) -> Result<usize, TableError>
where
    T: Serialize + Eq + Hash + Clone,
{
    let records = dedup(records);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
    }

    let mut file = fs::File::create(path).map_err(|e| TableError::io(path, e))?;
    file.write_all(UTF8_BOM).map_err(|e| TableError::io(path, e))?;

    let mut writer = Writer::from_writer(file);
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| TableError::io(path, e))?;

    Ok(records.len())
}
