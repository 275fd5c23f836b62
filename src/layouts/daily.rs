//! Combined dateTime layout: per-night minute lists or daily totals

use serde::Deserialize;

use super::date_time::value_column;
use super::LayoutDecoder;
use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::normalizer::{json_number, parse_instant, parse_value};
use crate::types::TidyRecord;

/// Batches keyed by a single `dateTime` column.
///
/// Two sub-shapes share this layout. When a `minutes` column exists, each
/// cell holds a serialized list of `{minute, value}` records (a per-night
/// summary, e.g. SpO2) expanded to one output row per element. Otherwise
/// each row is a daily total with the value in `steps` or `value`.
pub struct CombinedDateTime;

impl LayoutDecoder for CombinedDateTime {
    fn name(&self) -> &'static str {
        "combined_date_time"
    }

    fn matches(&self, batch: &RawBatch) -> bool {
        batch.has_column("dateTime")
    }

    fn decode(&self, batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
        if batch.has_column("minutes") {
            decode_minute_lists(batch)
        } else {
            decode_daily_totals(batch)
        }
    }
}

/// One element of an embedded minute list. `minute` is a full instant.
#[derive(Deserialize)]
struct MinuteEntry {
    minute: String,
    value: serde_json::Value,
}

fn decode_minute_lists(batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
    let metric = batch.metric();
    let mut records = Vec::new();

    for (i, row) in batch.rows().iter().enumerate() {
        let cell = batch.cell(row, "minutes").unwrap_or("");
        let entries: Vec<MinuteEntry> =
            serde_json::from_str(cell).map_err(|e| SchemaError::BadPayload {
                metric: metric.to_string(),
                source: e,
            })?;

        for entry in entries {
            let timestamp = parse_instant(metric, i, &entry.minute)?;
            let value = json_number(&entry.value).ok_or_else(|| SchemaError::BadValue {
                metric: metric.to_string(),
                row: i,
                text: entry.value.to_string(),
            })?;
            records.push(TidyRecord { timestamp, value });
        }
    }

    Ok(records)
}

fn decode_daily_totals(batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
    let metric = batch.metric();
    let value_column = value_column(batch)?;
    let mut records = Vec::with_capacity(batch.rows().len());

    for (i, row) in batch.rows().iter().enumerate() {
        let timestamp = parse_instant(metric, i, batch.cell(row, "dateTime").unwrap_or(""))?;
        let value = parse_value(metric, i, batch.cell(row, value_column).unwrap_or(""))?;
        records.push(TidyRecord { timestamp, value });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_minute_list_expansion() {
        let minutes = r#"[
            {"minute": "2024-01-15 02:00:00", "value": 95.2},
            {"minute": "2024-01-15 02:01:00", "value": "95.8"}
        ]"#;
        let batch = RawBatch::new(
            "spo2",
            vec!["dateTime".into(), "minutes".into()],
            vec![vec!["2024-01-15".into(), minutes.into()]],
        );

        assert!(CombinedDateTime.matches(&batch));
        let records = CombinedDateTime.decode(&batch).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].value, 95.2);
        assert_eq!(records[1].value, 95.8);
    }

    #[test]
    fn test_decode_daily_total() {
        let batch = RawBatch::new(
            "activity",
            vec!["dateTime".into(), "steps".into()],
            vec![vec!["2024-01-15".into(), "8500".into()]],
        );

        let records = CombinedDateTime.decode(&batch).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(records[0].timestamp, expected);
        assert_eq!(records[0].value, 8500.0);
    }

    #[test]
    fn test_malformed_minutes_cell() {
        let batch = RawBatch::new(
            "spo2",
            vec!["dateTime".into(), "minutes".into()],
            vec![vec!["2024-01-15".into(), "not json".into()]],
        );

        assert!(matches!(
            CombinedDateTime.decode(&batch),
            Err(SchemaError::BadPayload { .. })
        ));
    }
}
