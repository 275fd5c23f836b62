//! SQLite sample store
//!
//! One raw table at native cadence plus one table per rollup cadence, all
//! keyed by (time column, participant, metric). The composite primary key
//! is what makes redelivery idempotent: bulk inserts use `INSERT OR
//! IGNORE`, so re-committing an already-stored row is a no-op rather than
//! an error.
//!
//! Timestamps are stored as ISO-8601 text in UTC-naive form; with a single
//! consistent format, lexicographic order equals chronological order and
//! range scans work directly on the text column.

use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::resolution::Tier;
use crate::types::{ParticipantId, SensorSample};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS raw_data (
  ts          TEXT    NOT NULL,
  participant INTEGER NOT NULL,
  metric      TEXT    NOT NULL,
  value       REAL,
  PRIMARY KEY (ts, participant, metric)
);
CREATE TABLE IF NOT EXISTS data_1m (
  bucket      TEXT    NOT NULL,
  participant INTEGER NOT NULL,
  metric      TEXT    NOT NULL,
  value       REAL,
  PRIMARY KEY (bucket, participant, metric)
);
CREATE TABLE IF NOT EXISTS data_1h (
  bucket      TEXT    NOT NULL,
  participant INTEGER NOT NULL,
  metric      TEXT    NOT NULL,
  value       REAL,
  PRIMARY KEY (bucket, participant, metric)
);
CREATE TABLE IF NOT EXISTS data_1d (
  bucket      TEXT    NOT NULL,
  participant INTEGER NOT NULL,
  metric      TEXT    NOT NULL,
  value       REAL,
  PRIMARY KEY (bucket, participant, metric)
);
";

/// Store of raw and rolled-up sensor samples.
pub struct SampleStore {
    conn: Connection,
}

impl SampleStore {
    /// Open (creating if needed) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create the raw and rollup tables. Idempotent; runs on every
    /// ingestion invocation.
    pub fn ensure_schema(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Commit samples to the raw tier in a single transaction.
    ///
    /// Returns the number of rows actually inserted; rows already present
    /// under the primary key are ignored, so the count can be smaller than
    /// the input on redelivery.
    pub fn insert_samples(&mut self, samples: &[SensorSample]) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR IGNORE INTO raw_data (ts, participant, metric, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for sample in samples {
                inserted += stmt.execute(params![
                    sample.timestamp,
                    sample.participant,
                    sample.metric,
                    sample.value
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Known samples for one participant/metric in `[start, end)` at the
    /// given tier, ordered by time ascending.
    pub fn fetch_range(
        &self,
        tier: Tier,
        participant: ParticipantId,
        metric: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, f64)>, StorageError> {
        let sql = format!(
            "SELECT {col}, value FROM {table}
             WHERE participant = ?1 AND metric = ?2 AND {col} >= ?3 AND {col} < ?4
             ORDER BY {col}",
            col = tier.time_column(),
            table = tier.table(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![participant, metric, start, end], |row| {
                Ok((row.get::<_, NaiveDateTime>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Newest raw-tier timestamp across all metrics for the participant.
    pub fn last_upload(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<NaiveDateTime>, StorageError> {
        let newest = self
            .conn
            .query_row(
                "SELECT MAX(ts) FROM raw_data WHERE participant = ?1",
                params![participant],
                |row| row.get::<_, Option<NaiveDateTime>>(0),
            )
            .optional()?
            .flatten();
        Ok(newest)
    }

    /// Number of distinct calendar days in `[start, end]` (inclusive) with
    /// at least one raw sample of the metric.
    pub fn days_with_metric(
        &self,
        participant: ParticipantId,
        metric: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StorageError> {
        let (lo, hi) = day_bounds(start, end);
        let count = self.conn.query_row(
            "SELECT COUNT(DISTINCT date(ts)) FROM raw_data
             WHERE participant = ?1 AND metric = ?2 AND ts >= ?3 AND ts < ?4",
            params![participant, metric, lo, hi],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Raw sample count of the metric over `[start, end]` (inclusive days).
    pub fn count_samples(
        &self,
        participant: ParticipantId,
        metric: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StorageError> {
        let (lo, hi) = day_bounds(start, end);
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM raw_data
             WHERE participant = ?1 AND metric = ?2 AND ts >= ?3 AND ts < ?4",
            params![participant, metric, lo, hi],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Half-open datetime bounds covering the inclusive date range.
fn day_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        start.and_time(NaiveTime::MIN),
        (end + Duration::days(1)).and_time(NaiveTime::MIN),
    )
}
