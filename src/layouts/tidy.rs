//! Already-tidy layout: `timestamp,value`

use super::LayoutDecoder;
use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::normalizer::{parse_instant, parse_value};
use crate::types::TidyRecord;

/// Batches that already carry canonical `timestamp,value` columns.
pub struct Tidy;

impl LayoutDecoder for Tidy {
    fn name(&self) -> &'static str {
        "tidy"
    }

    fn matches(&self, batch: &RawBatch) -> bool {
        batch.has_column("timestamp") && batch.has_column("value")
    }

    fn decode(&self, batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
        let metric = batch.metric();
        let mut records = Vec::with_capacity(batch.rows().len());

        for (i, row) in batch.rows().iter().enumerate() {
            let timestamp = parse_instant(metric, i, batch.cell(row, "timestamp").unwrap_or(""))?;
            let value = parse_value(metric, i, batch.cell(row, "value").unwrap_or(""))?;
            records.push(TidyRecord { timestamp, value });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_tidy() {
        let batch = RawBatch::new(
            "hr",
            vec!["timestamp".into(), "value".into()],
            vec![
                vec!["2024-01-15 08:00:00".into(), "62".into()],
                vec!["2024-01-15 08:00:01".into(), "63.5".into()],
            ],
        );

        assert!(Tidy.matches(&batch));
        let records = Tidy.decode(&batch).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, 63.5);
    }

    #[test]
    fn test_bad_row_fails_batch() {
        let batch = RawBatch::new(
            "hr",
            vec!["timestamp".into(), "value".into()],
            vec![vec!["not-a-time".into(), "62".into()]],
        );

        assert!(Tidy.decode(&batch).is_err());
    }
}
