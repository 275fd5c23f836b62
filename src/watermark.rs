//! Ingestion watermark persistence
//!
//! The watermark is process-wide state: a single instant meaning "no sample
//! at or before this time needs reprocessing." It is read once at the start
//! of an ingestion run and written once at the end. The store offers no
//! protection against concurrent writers; overlapping runs must be
//! serialized by the caller.

use std::cell::Cell;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Watermark value used before any run has persisted one.
pub fn epoch_start() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// Persisted watermark state with whole-record read/write semantics.
pub trait WatermarkStore {
    /// Last fully-ingested instant; epoch start when none persisted yet.
    fn read(&self) -> Result<NaiveDateTime, StorageError>;

    /// Replace the persisted record.
    fn write(&self, ts: NaiveDateTime) -> Result<(), StorageError>;
}

/// On-disk record shape. Kept as its own struct so the file format stays
/// stable independent of in-memory types.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    last_ts: NaiveDateTime,
}

/// File-backed watermark: one JSON record, read and written whole.
#[derive(Debug, Clone)]
pub struct FileWatermark {
    path: PathBuf,
}

impl FileWatermark {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WatermarkStore for FileWatermark {
    fn read(&self) -> Result<NaiveDateTime, StorageError> {
        if !self.path.exists() {
            return Ok(epoch_start());
        }
        let text = fs::read_to_string(&self.path)?;
        let record: CheckpointRecord = serde_json::from_str(&text)?;
        Ok(record.last_ts)
    }

    fn write(&self, ts: NaiveDateTime) -> Result<(), StorageError> {
        let record = CheckpointRecord { last_ts: ts };
        fs::write(&self.path, serde_json::to_string(&record)?)?;
        Ok(())
    }
}

/// In-memory watermark for tests and ephemeral runs.
#[derive(Debug)]
pub struct MemoryWatermark {
    last: Cell<NaiveDateTime>,
}

impl MemoryWatermark {
    pub fn new() -> Self {
        Self {
            last: Cell::new(epoch_start()),
        }
    }

    /// Start from a specific watermark instead of the epoch.
    pub fn at(ts: NaiveDateTime) -> Self {
        Self { last: Cell::new(ts) }
    }
}

impl Default for MemoryWatermark {
    fn default() -> Self {
        Self::new()
    }
}

impl WatermarkStore for MemoryWatermark {
    fn read(&self) -> Result<NaiveDateTime, StorageError> {
        Ok(self.last.get())
    }

    fn write(&self, ts: NaiveDateTime) -> Result<(), StorageError> {
        self.last.set(ts);
        Ok(())
    }
}
