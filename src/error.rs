//! Error types for wearbase

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::ParticipantId;

/// Errors raised while normalizing a single input batch.
///
/// Schema failures are non-fatal to an ingestion run: the loader logs the
/// batch and continues with the rest.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{metric}: unknown columns {columns:?}")]
    UnknownColumns {
        metric: String,
        columns: Vec<String>,
    },

    #[error("{metric}: no value column (expected `steps` or `value`)")]
    MissingValueColumn { metric: String },

    #[error("{metric}: row {row}: unparseable instant {text:?}")]
    BadInstant {
        metric: String,
        row: usize,
        text: String,
    },

    #[error("{metric}: row {row}: unparseable or non-finite value {text:?}")]
    BadValue {
        metric: String,
        row: usize,
        text: String,
    },

    #[error("{metric}: malformed embedded payload: {source}")]
    BadPayload {
        metric: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{metric}: single-column batch has no rows")]
    EmptyPayload { metric: String },

    #[error("{metric}: unreadable batch: {source}")]
    Unreadable {
        metric: String,
        #[source]
        source: csv::Error,
    },
}

/// Errors from the sample store or watermark persistence.
///
/// Fatal for the batch being committed; the watermark never advances past
/// uncommitted data, so retrying the whole run is safe (the composite
/// primary key makes redelivery a no-op).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed checkpoint record: {0}")]
    Checkpoint(#[from] serde_json::Error),
}

/// Errors surfaced by the query interface.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The requested end date precedes the start date. A client error.
    #[error("end date {end} precedes start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// Zero stored samples for the participant/metric/range. Distinct from
    /// a fully-imputed response, which is a valid result once at least one
    /// sample exists.
    #[error("no data for participant {participant}, metric {metric:?}")]
    NoData {
        participant: ParticipantId,
        metric: String,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
