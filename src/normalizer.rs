//! Batch normalization
//!
//! Detects the column layout of an incoming batch against the closed set of
//! recognized layouts, in a fixed priority order, and converts it to the
//! canonical tidy sequence: UTC-naive instants, finite float values, sorted
//! ascending by timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::layouts;
use crate::types::TidyRecord;

/// Normalizer for converting raw batches to sorted tidy records.
pub struct Normalizer;

impl Normalizer {
    /// Detect the batch layout and produce the canonical sorted sequence.
    ///
    /// Fails with [`SchemaError::UnknownColumns`] when no layout claims the
    /// batch; the caller is expected to skip that batch and continue.
    pub fn normalize(batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
        for decoder in layouts::decoders() {
            if decoder.matches(batch) {
                tracing::debug!(metric = batch.metric(), layout = decoder.name(), "layout detected");
                let mut records = decoder.decode(batch)?;
                records.sort_by_key(|r| r.timestamp);
                return Ok(records);
            }
        }
        Err(SchemaError::UnknownColumns {
            metric: batch.metric().to_string(),
            columns: batch.columns().to_vec(),
        })
    }
}

/// Parse an instant to UTC-naive form.
///
/// Accepts RFC 3339 (the offset is honored, then stripped), `T`- or
/// space-separated date-times with optional fractional seconds, and bare
/// dates (taken as midnight).
pub(crate) fn parse_instant(metric: &str, row: usize, text: &str) -> Result<NaiveDateTime, SchemaError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }

    Err(SchemaError::BadInstant {
        metric: metric.to_string(),
        row,
        text: text.to_string(),
    })
}

/// Coerce a cell to a finite float.
pub(crate) fn parse_value(metric: &str, row: usize, text: &str) -> Result<f64, SchemaError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SchemaError::BadValue {
            metric: metric.to_string(),
            row,
            text: text.to_string(),
        }),
    }
}

/// Numeric view of an embedded JSON value, if it has one.
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
