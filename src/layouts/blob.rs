//! Single-column blob layout: one serialized nested payload
//!
//! Pre-flatten archives occasionally reach ingestion as a single column
//! whose cell holds a whole device export. The decoder recovers a reference
//! date from the payload, then walks it for the first dataset-like list and
//! emits one record per element.

use serde_json::Value;

use super::LayoutDecoder;
use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::normalizer::{json_number, parse_instant};
use crate::types::TidyRecord;

/// Recursion limit for the payload walk. Device exports nest a handful of
/// levels; anything deeper is malformed or adversarial.
const MAX_DEPTH: usize = 16;

/// Single-column batches holding a serialized nested structure.
pub struct BlobPayload;

impl LayoutDecoder for BlobPayload {
    fn name(&self) -> &'static str {
        "blob_payload"
    }

    fn matches(&self, batch: &RawBatch) -> bool {
        batch.columns().len() == 1
    }

    fn decode(&self, batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
        let metric = batch.metric();
        let cell = batch
            .rows()
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| SchemaError::EmptyPayload {
                metric: metric.to_string(),
            })?;

        let payload: Value = serde_json::from_str(cell).map_err(|e| SchemaError::BadPayload {
            metric: metric.to_string(),
            source: e,
        })?;

        let date = reference_date(&payload).unwrap_or_default();

        let mut records = Vec::new();
        if let Some(dataset) = first_dataset(&payload, MAX_DEPTH) {
            for (i, element) in dataset.iter().enumerate() {
                let Some(rec) = element.as_object() else {
                    continue;
                };

                let time = rec
                    .get("time")
                    .or_else(|| rec.get("minute"))
                    .and_then(Value::as_str)
                    .unwrap_or("00:00:00");

                // Compose date + time-of-day; a field that is already a
                // full instant stands on its own.
                let timestamp = parse_instant(metric, i, &format!("{date} {time}"))
                    .or_else(|_| parse_instant(metric, i, time))?;

                let value = ["value", "steps", "minutes"]
                    .iter()
                    .find_map(|key| rec.get(*key).and_then(json_number))
                    .unwrap_or(0.0);

                records.push(TidyRecord { timestamp, value });
            }
        }

        Ok(records)
    }
}

/// Reference date for composing element timestamps: top-level `dateTime`,
/// then `date`, then the heart activities summary's date.
fn reference_date(payload: &Value) -> Option<&str> {
    payload
        .get("dateTime")
        .and_then(Value::as_str)
        .or_else(|| payload.get("date").and_then(Value::as_str))
        .or_else(|| {
            payload
                .get("activities-heart")?
                .get(0)?
                .get("dateTime")
                .and_then(Value::as_str)
        })
}

/// Depth-first search for the first list-valued field whose key name ends
/// with `dataset`. Keys of the current object are inspected before its
/// values are descended into.
fn first_dataset(node: &Value, depth: usize) -> Option<&Vec<Value>> {
    if depth == 0 {
        return None;
    }
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                if key.ends_with("dataset") {
                    if let Value::Array(items) = value {
                        return Some(items);
                    }
                }
            }
            map.values().find_map(|v| first_dataset(v, depth - 1))
        }
        Value::Array(items) => items.iter().find_map(|v| first_dataset(v, depth - 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn single_column(metric: &str, payload: &str) -> RawBatch {
        RawBatch::new(
            metric,
            vec!["payload".into()],
            vec![vec![payload.to_string()]],
        )
    }

    #[test]
    fn test_decode_intraday_export() {
        let payload = r#"{
            "activities-heart": [{"dateTime": "2024-01-15"}],
            "activities-heart-intraday": {
                "dataset": [
                    {"time": "08:00:00", "value": 62},
                    {"time": "08:00:01", "value": 63}
                ]
            }
        }"#;
        let batch = single_column("hr", payload);

        assert!(BlobPayload.matches(&batch));
        let records = BlobPayload.decode(&batch).unwrap();
        assert_eq!(records.len(), 2);

        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        assert_eq!(records[0].timestamp, expected);
        assert_eq!(records[0].value, 62.0);
    }

    #[test]
    fn test_full_instant_minute_field() {
        let payload = r#"{
            "date": "2024-01-15",
            "hrv-dataset": [
                {"minute": "2024-01-15 02:00:00", "value": 48.5}
            ]
        }"#;
        let records = BlobPayload.decode(&single_column("hrv", payload)).unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(2, 0, 0))
            .unwrap();
        assert_eq!(records[0].timestamp, expected);
    }

    #[test]
    fn test_missing_fields_default() {
        // No time field -> midnight; no value-like field -> zero.
        let payload = r#"{"dateTime": "2024-01-15", "dataset": [{}]}"#;
        let records = BlobPayload.decode(&single_column("br", payload)).unwrap();

        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(records[0].timestamp, expected);
        assert_eq!(records[0].value, 0.0);
    }

    #[test]
    fn test_no_dataset_yields_empty() {
        let payload = r#"{"dateTime": "2024-01-15", "summary": {"total": 12}}"#;
        let records = BlobPayload.decode(&single_column("azm", payload)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_payload() {
        let batch = single_column("hr", "{'python': 'repr'}");
        assert!(matches!(
            BlobPayload.decode(&batch),
            Err(SchemaError::BadPayload { .. })
        ));
    }

    #[test]
    fn test_empty_batch() {
        let batch = RawBatch::new("hr", vec!["payload".into()], vec![]);
        assert!(matches!(
            BlobPayload.decode(&batch),
            Err(SchemaError::EmptyPayload { .. })
        ));
    }
}
