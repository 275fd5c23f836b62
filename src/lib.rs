//! Wearbase - delta ingestion and tiered time-series queries for wearable
//! sensor exports
//!
//! Heterogeneous per-metric exports are normalized into one canonical
//! (timestamp, value) record, loaded incrementally behind a persisted
//! watermark, and served back as dense, gap-filled series at a cadence
//! chosen from the width of the requested range.
//!
//! Data flow: [`batch::RawBatch`] → [`normalizer::Normalizer`] →
//! [`loader::DeltaLoader`] → [`store::SampleStore`] (raw tier plus rollup
//! tiers kept by [`rollup::RollupMaterializer`]) → [`query::QueryEngine`].
//! [`adherence::AdherenceCalculator`] reads the store independently of the
//! series path.

pub mod adherence;
pub mod batch;
pub mod error;
pub mod gapfill;
pub mod layouts;
pub mod loader;
pub mod normalizer;
pub mod query;
pub mod resolution;
pub mod rollup;
pub mod store;
pub mod types;
pub mod watermark;

pub use batch::RawBatch;
pub use error::{QueryError, SchemaError, StorageError};
pub use loader::{DeltaLoader, IngestSummary};
pub use normalizer::Normalizer;
pub use query::QueryEngine;
pub use resolution::{select_tier, Tier};
pub use rollup::RollupMaterializer;
pub use store::SampleStore;
pub use types::{
    AdherenceReport, ParticipantId, SensorSample, SeriesResponse, TidyRecord, DEFAULT_PARTICIPANT,
};
pub use watermark::{FileWatermark, MemoryWatermark, WatermarkStore};

/// Crate version reported by the CLI.
pub const WEARBASE_VERSION: &str = env!("CARGO_PKG_VERSION");
