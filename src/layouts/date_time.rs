//! Split date/time layout: `date,time[,steps|value]`

use super::LayoutDecoder;
use crate::batch::RawBatch;
use crate::error::SchemaError;
use crate::normalizer::{parse_instant, parse_value};
use crate::types::TidyRecord;

/// Batches with separate `date` and `time` columns. The value lives in a
/// `steps` column when present, otherwise in `value`.
pub struct DateTimeSplit;

impl LayoutDecoder for DateTimeSplit {
    fn name(&self) -> &'static str {
        "date_time_split"
    }

    fn matches(&self, batch: &RawBatch) -> bool {
        batch.has_column("date") && batch.has_column("time")
    }

    fn decode(&self, batch: &RawBatch) -> Result<Vec<TidyRecord>, SchemaError> {
        let metric = batch.metric();
        let value_column = value_column(batch)?;
        let mut records = Vec::with_capacity(batch.rows().len());

        for (i, row) in batch.rows().iter().enumerate() {
            let date = batch.cell(row, "date").unwrap_or("");
            let time = batch.cell(row, "time").unwrap_or("");
            let timestamp = parse_instant(metric, i, &format!("{date} {time}"))?;
            let value = parse_value(metric, i, batch.cell(row, value_column).unwrap_or(""))?;
            records.push(TidyRecord { timestamp, value });
        }

        Ok(records)
    }
}

/// `steps` takes precedence over `value` when both exist.
pub(super) fn value_column(batch: &RawBatch) -> Result<&'static str, SchemaError> {
    if batch.has_column("steps") {
        Ok("steps")
    } else if batch.has_column("value") {
        Ok("value")
    } else {
        Err(SchemaError::MissingValueColumn {
            metric: batch.metric().to_string(),
        })
    }
}
