//! Storage tier selection
//!
//! Wide date ranges trade cadence for bounded response size: a month of
//! 1 Hz heart rate is millions of points, but a month at daily resolution
//! is thirty-one.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A cadence-specific storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Native per-sample cadence, assumed 1 second.
    Raw,
    Minute,
    Hour,
    Day,
}

impl Tier {
    /// Spacing between consecutive samples in this tier.
    pub fn cadence(&self) -> Duration {
        match self {
            Tier::Raw => Duration::seconds(1),
            Tier::Minute => Duration::minutes(1),
            Tier::Hour => Duration::hours(1),
            Tier::Day => Duration::days(1),
        }
    }

    /// Backing table in the sample store.
    pub fn table(&self) -> &'static str {
        match self {
            Tier::Raw => "raw_data",
            Tier::Minute => "data_1m",
            Tier::Hour => "data_1h",
            Tier::Day => "data_1d",
        }
    }

    /// Time column of the backing table.
    pub fn time_column(&self) -> &'static str {
        match self {
            Tier::Raw => "ts",
            _ => "bucket",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Raw => "raw",
            Tier::Minute => "1m",
            Tier::Hour => "1h",
            Tier::Day => "1d",
        }
    }
}

/// Pick the storage tier for a requested date range.
///
/// The span is `end - start` in whole days; thresholds are inclusive on
/// the narrow side.
pub fn select_tier(start: NaiveDate, end: NaiveDate) -> Tier {
    let span_days = (end - start).num_days();
    if span_days <= 1 {
        Tier::Raw
    } else if span_days <= 7 {
        Tier::Minute
    } else if span_days <= 30 {
        Tier::Hour
    } else {
        Tier::Day
    }
}
