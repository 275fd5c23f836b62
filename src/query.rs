//! Query orchestration
//!
//! The read path: validate the range, pick the tier, read the known
//! samples, gap-fill to a dense series. Stateless; each call issues its
//! own short-lived store read, so arbitrarily many queries may run against
//! the store without coordination.

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::adherence::AdherenceCalculator;
use crate::error::QueryError;
use crate::gapfill::fill_series;
use crate::resolution::select_tier;
use crate::store::SampleStore;
use crate::types::{AdherenceReport, ParticipantId, SeriesResponse};

/// Read-side interface over the sample store.
pub struct QueryEngine<'a> {
    store: &'a SampleStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a SampleStore) -> Self {
        Self { store }
    }

    /// Gap-filled series for one metric over an inclusive date range.
    ///
    /// The storage tier (and with it the response cadence) follows from
    /// the range width. The store is read over `[start 00:00, end + 1 day
    /// 00:00)` so the final requested day is fully covered.
    pub fn series(
        &self,
        participant: ParticipantId,
        metric: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<SeriesResponse, QueryError> {
        if end < start {
            return Err(QueryError::InvalidRange { start, end });
        }

        let tier = select_tier(start, end);
        let lo = start.and_time(NaiveTime::MIN);
        let hi = (end + Duration::days(1)).and_time(NaiveTime::MIN);
        let known = self.store.fetch_range(tier, participant, metric, lo, hi)?;

        fill_series(&known, participant, metric, start, end, tier.cadence())
    }

    /// Coverage statistics for the participant over an inclusive range.
    pub fn adherence(
        &self,
        participant: ParticipantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AdherenceReport, QueryError> {
        AdherenceCalculator::new(self.store).report(participant, start, end)
    }
}
