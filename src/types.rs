//! Core types for the wearbase ingestion and query paths
//!
//! This module defines the records that flow through the system: the
//! canonical normalizer output, the tagged raw-tier row, and the response
//! shapes of the two query operations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Participant identifier. Directory lookup is an external concern; this
/// crate only carries the id through storage and queries.
pub type ParticipantId = i64;

/// Participant used when the caller does not specify one.
pub const DEFAULT_PARTICIPANT: ParticipantId = 1;

/// Metric whose daily presence serves as the sync-activity proxy in
/// adherence day coverage.
pub const REFERENCE_METRIC: &str = "activity";

/// High-frequency metric assumed to tick at 1 Hz for wear-time coverage.
pub const WEAR_METRIC: &str = "hr";

/// Canonical normalizer output: one reading at one instant.
///
/// Timestamps are UTC-naive: inputs carrying an offset are converted to UTC
/// and stripped; offset-free inputs are taken as already UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidyRecord {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// A raw-tier row: a tidy record tagged with participant and metric.
///
/// Unique per (timestamp, participant, metric); the value is always finite
/// (enforced at normalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: NaiveDateTime,
    pub participant: ParticipantId,
    pub metric: String,
    pub value: f64,
}

/// Dense, gap-filled series over a query window.
///
/// The three vectors are parallel and equal in length; timestamps are
/// strictly increasing at the selected tier's cadence. `imputed[i]` is
/// false when `values[i]` came directly from storage and true when it was
/// synthesized by edge clamping or interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
    pub imputed: Vec<bool>,
}

/// Coverage statistics for a participant over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceReport {
    /// Newest stored timestamp across all metrics; `None` when the
    /// participant has no data at all.
    pub last_upload: Option<NaiveDateTime>,
    /// Percentage of calendar days in range with at least one sample of
    /// the reference metric.
    pub sleep_upload_pct: f64,
    /// Stored sample count of the wear metric against the theoretical 1 Hz
    /// maximum, as a percentage. Deliberately uncapped: values above 100
    /// mean the cadence assumption is wrong for the data, and that is
    /// reported rather than hidden.
    pub wear_time_pct: f64,
}
