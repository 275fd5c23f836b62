//! Rollup materialization
//!
//! Stands in for the external aggregation process that keeps the rollup
//! tiers populated. Each bucket is the mean of the raw samples it covers,
//! with the bucket instant truncated to the cadence boundary. Invoked
//! explicitly (CLI `rollup`, or after an ingest when asked); the delta
//! loader never triggers it implicitly.

use crate::error::StorageError;
use crate::resolution::Tier;
use crate::store::SampleStore;

/// Rebuilds rollup tables from the raw tier.
pub struct RollupMaterializer<'a> {
    store: &'a SampleStore,
}

impl<'a> RollupMaterializer<'a> {
    pub fn new(store: &'a SampleStore) -> Self {
        Self { store }
    }

    /// Materialize every rollup tier.
    pub fn materialize_all(&self) -> Result<(), StorageError> {
        for tier in [Tier::Minute, Tier::Hour, Tier::Day] {
            self.materialize(tier)?;
        }
        Ok(())
    }

    /// Materialize one rollup tier. The raw tier is the source and is left
    /// untouched.
    pub fn materialize(&self, tier: Tier) -> Result<(), StorageError> {
        let truncate = match tier {
            Tier::Raw => return Ok(()),
            Tier::Minute => "%Y-%m-%dT%H:%M:00",
            Tier::Hour => "%Y-%m-%dT%H:00:00",
            Tier::Day => "%Y-%m-%dT00:00:00",
        };
        let sql = format!(
            "INSERT OR REPLACE INTO {table} (bucket, participant, metric, value)
             SELECT strftime('{truncate}', ts), participant, metric, AVG(value)
             FROM raw_data
             GROUP BY 1, 2, 3",
            table = tier.table(),
        );
        self.store.connection().execute(&sql, [])?;
        Ok(())
    }
}
