//! Delta ingestion
//!
//! Pushes only unseen samples into the store and keeps the watermark
//! consistent with what has actually been committed. Failures are isolated
//! per batch: a batch that fails normalization or commit is logged and
//! skipped, and the run continues with the rest.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::RawBatch;
use crate::error::StorageError;
use crate::normalizer::Normalizer;
use crate::store::SampleStore;
use crate::types::{ParticipantId, SensorSample};
use crate::watermark::WatermarkStore;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    /// Run identifier carried in every log line of the run.
    pub run_id: Uuid,
    /// Batches offered to the run.
    pub batches: usize,
    /// Batches skipped on normalization failure.
    pub skipped: usize,
    /// Batches whose commit failed.
    pub failed: usize,
    /// Raw rows actually inserted (redelivered rows are ignored by the
    /// primary key and not counted).
    pub inserted: usize,
    /// Watermark persisted at the end of the run.
    pub watermark: NaiveDateTime,
}

/// Incremental loader: normalize, filter to strictly-newer-than-watermark,
/// tag, commit.
pub struct DeltaLoader<'a, W: WatermarkStore> {
    store: &'a mut SampleStore,
    watermark: &'a W,
    participant: ParticipantId,
}

impl<'a, W: WatermarkStore> DeltaLoader<'a, W> {
    pub fn new(store: &'a mut SampleStore, watermark: &'a W, participant: ParticipantId) -> Self {
        Self {
            store,
            watermark,
            participant,
        }
    }

    /// Run one ingestion pass over the given batches.
    ///
    /// The watermark is read once up front and written once at the end,
    /// advanced to the newest timestamp actually committed during the run.
    /// Failed batches do not advance it; their rows remain above the
    /// watermark and are picked up by a retry of the whole run, where the
    /// primary key makes any overlap a no-op.
    pub fn run(&mut self, batches: &[RawBatch]) -> Result<IngestSummary, StorageError> {
        let run_id = Uuid::new_v4();
        let since = self.watermark.read()?;
        self.store.ensure_schema()?;

        let mut skipped = 0;
        let mut failed = 0;
        let mut inserted = 0;
        let mut newest = since;

        for batch in batches {
            let records = match Normalizer::normalize(batch) {
                Ok(records) => records,
                Err(e) => {
                    warn!(run_id = %run_id, metric = batch.metric(), error = %e, "skipping batch");
                    skipped += 1;
                    continue;
                }
            };

            let fresh: Vec<SensorSample> = records
                .into_iter()
                .filter(|r| r.timestamp > since)
                .map(|r| SensorSample {
                    timestamp: r.timestamp,
                    participant: self.participant,
                    metric: batch.metric().to_string(),
                    value: r.value,
                })
                .collect();

            if fresh.is_empty() {
                continue;
            }

            match self.store.insert_samples(&fresh) {
                Ok(rows) => {
                    inserted += rows;
                    // Records are sorted, so the last one is the newest.
                    if let Some(sample) = fresh.last() {
                        newest = newest.max(sample.timestamp);
                    }
                    info!(run_id = %run_id, metric = batch.metric(), rows, "ingested batch");
                }
                Err(e) => {
                    warn!(run_id = %run_id, metric = batch.metric(), error = %e, "batch commit failed");
                    failed += 1;
                }
            }
        }

        self.watermark.write(newest)?;
        info!(run_id = %run_id, inserted, watermark = %newest, "ingestion complete");

        Ok(IngestSummary {
            run_id,
            batches: batches.len(),
            skipped,
            failed,
            inserted,
            watermark: newest,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::Tier;
    use crate::watermark::MemoryWatermark;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn ts(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn hr_batch() -> RawBatch {
        RawBatch::new(
            "hr",
            vec!["timestamp".into(), "value".into()],
            vec![
                vec!["2024-01-15 08:00:00".into(), "62".into()],
                vec!["2024-01-15 08:00:01".into(), "63".into()],
                vec!["2024-01-15 08:00:02".into(), "64".into()],
            ],
        )
    }

    fn garbage_batch() -> RawBatch {
        RawBatch::new(
            "mystery",
            vec!["foo".into(), "bar".into()],
            vec![vec!["1".into(), "2".into()]],
        )
    }

    fn stored_rows(store: &SampleStore, metric: &str) -> usize {
        store
            .count_samples(
                1,
                metric,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            )
            .unwrap() as usize
    }

    #[test]
    fn test_first_run_ingests_everything() {
        let mut store = SampleStore::open_in_memory().unwrap();
        let watermark = MemoryWatermark::new();

        let summary = DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[hr_batch()])
            .unwrap();

        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.watermark, ts("2024-01-15 08:00:02"));
        assert_eq!(watermark.read().unwrap(), ts("2024-01-15 08:00:02"));
        assert_eq!(stored_rows(&store, "hr"), 3);
    }

    #[test]
    fn test_rerun_with_unchanged_source_inserts_nothing() {
        let mut store = SampleStore::open_in_memory().unwrap();
        let watermark = MemoryWatermark::new();

        DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[hr_batch()])
            .unwrap();
        let second = DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[hr_batch()])
            .unwrap();

        assert_eq!(second.inserted, 0);
        assert_eq!(stored_rows(&store, "hr"), 3);
        // The watermark holds its position when nothing new arrives.
        assert_eq!(second.watermark, ts("2024-01-15 08:00:02"));
    }

    #[test]
    fn test_redelivery_behind_a_stale_watermark_is_safe() {
        // Same batch, but the watermark was never advanced: the filter
        // passes every row and the primary key absorbs the duplicates.
        let mut store = SampleStore::open_in_memory().unwrap();

        let first = MemoryWatermark::new();
        DeltaLoader::new(&mut store, &first, 1)
            .run(&[hr_batch()])
            .unwrap();

        let stale = MemoryWatermark::new();
        let summary = DeltaLoader::new(&mut store, &stale, 1)
            .run(&[hr_batch()])
            .unwrap();

        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(stored_rows(&store, "hr"), 3);
    }

    #[test]
    fn test_only_rows_past_the_watermark_load() {
        let mut store = SampleStore::open_in_memory().unwrap();
        let watermark = MemoryWatermark::at(ts("2024-01-15 08:00:00"));

        let summary = DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[hr_batch()])
            .unwrap();

        // The 08:00:00 row is at the watermark, not past it.
        assert_eq!(summary.inserted, 2);
        assert_eq!(stored_rows(&store, "hr"), 2);
    }

    #[test]
    fn test_unrecognized_batch_is_skipped_not_fatal() {
        let mut store = SampleStore::open_in_memory().unwrap();
        let watermark = MemoryWatermark::new();

        let summary = DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[garbage_batch(), hr_batch()])
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.inserted, 3);
        assert_eq!(stored_rows(&store, "hr"), 3);
    }

    #[test]
    fn test_rows_are_tagged_with_participant_and_metric() {
        let mut store = SampleStore::open_in_memory().unwrap();
        let watermark = MemoryWatermark::new();

        DeltaLoader::new(&mut store, &watermark, 1)
            .run(&[hr_batch()])
            .unwrap();

        let rows = store
            .fetch_range(
                Tier::Raw,
                1,
                "hr",
                ts("2024-01-15 00:00:00"),
                ts("2024-01-16 00:00:00"),
            )
            .unwrap();
        assert_eq!(rows.len(), 3);

        // A different participant sees nothing.
        let other = store
            .fetch_range(
                Tier::Raw,
                2,
                "hr",
                ts("2024-01-15 00:00:00"),
                ts("2024-01-16 00:00:00"),
            )
            .unwrap();
        assert!(other.is_empty());
    }
}
