//! Tabular input batches
//!
//! A batch is the unit of ingestion: one header row plus string cells, as
//! produced by the upstream flattening step. Layout detection needs only
//! column names and positional cell access, so cells stay untyped here;
//! parsing happens in the layout decoders.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::SchemaError;

/// One per-metric tabular batch with an unknown column layout.
#[derive(Debug, Clone)]
pub struct RawBatch {
    metric: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawBatch {
    pub fn new(metric: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            metric: metric.into(),
            columns,
            rows,
        }
    }

    /// Read a batch from a CSV file. The metric name is the lowercased file
    /// stem, matching how the upstream flattener names its exports.
    pub fn from_csv_path(path: &Path) -> Result<Self, SchemaError> {
        let metric = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let file = File::open(path).map_err(|e| SchemaError::Unreadable {
            metric: metric.clone(),
            source: csv::Error::from(e),
        })?;
        Self::from_csv_reader(metric, file)
    }

    /// Read a batch from any CSV source with a header row.
    pub fn from_csv_reader(metric: impl Into<String>, reader: impl Read) -> Result<Self, SchemaError> {
        let metric = metric.into();
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let unreadable = |metric: &str, e: csv::Error| SchemaError::Unreadable {
            metric: metric.to_string(),
            source: e,
        };

        let columns = rdr
            .headers()
            .map_err(|e| unreadable(&metric, e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| unreadable(&metric, e))?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        Ok(Self::new(metric, columns, rows))
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` under the named column; `None` when the column is
    /// absent or the row is short (flexible CSVs may be ragged).
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column_index(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }
}
