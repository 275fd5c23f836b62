//! Adherence statistics
//!
//! Coverage metrics answering "is the participant still wearing and
//! syncing the device": newest upload instant, fraction of days with any
//! sync activity, and wear time against the expected sampling cadence.

use chrono::NaiveDate;

use crate::error::QueryError;
use crate::store::SampleStore;
use crate::types::{AdherenceReport, ParticipantId, REFERENCE_METRIC, WEAR_METRIC};

/// Seconds in a day; the theoretical sample maximum per day for a 1 Hz
/// metric.
const EXPECTED_DAILY_SAMPLES: f64 = 86_400.0;

/// Derives coverage metrics from stored raw samples.
pub struct AdherenceCalculator<'a> {
    store: &'a SampleStore,
    reference_metric: &'static str,
    wear_metric: &'static str,
}

impl<'a> AdherenceCalculator<'a> {
    pub fn new(store: &'a SampleStore) -> Self {
        Self {
            store,
            reference_metric: REFERENCE_METRIC,
            wear_metric: WEAR_METRIC,
        }
    }

    /// Coverage report over the inclusive date range.
    pub fn report(
        &self,
        participant: ParticipantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AdherenceReport, QueryError> {
        if end < start {
            return Err(QueryError::InvalidRange { start, end });
        }
        let days_in_range = (end - start).num_days() + 1;

        let last_upload = self.store.last_upload(participant)?;

        let covered_days =
            self.store
                .days_with_metric(participant, self.reference_metric, start, end)?;
        let sleep_upload_pct = covered_days as f64 / days_in_range as f64 * 100.0;

        let samples = self
            .store
            .count_samples(participant, self.wear_metric, start, end)?;
        // Uncapped on purpose: >100% reveals a wrong cadence assumption
        // rather than hiding it.
        let wear_time_pct =
            samples as f64 / (days_in_range as f64 * EXPECTED_DAILY_SAMPLES) * 100.0;

        Ok(AdherenceReport {
            last_upload,
            sleep_upload_pct,
            wear_time_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SensorSample;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn sample(ts: &str, metric: &str, value: f64) -> SensorSample {
        SensorSample {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            participant: 1,
            metric: metric.to_string(),
            value,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_single_day_scenario() {
        // Three heart-rate samples and one activity sample in one day.
        let mut store = SampleStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
            .insert_samples(&[
                sample("2024-01-15 08:00:00", "hr", 62.0),
                sample("2024-01-15 08:00:01", "hr", 63.0),
                sample("2024-01-15 08:00:02", "hr", 64.0),
                sample("2024-01-15 00:00:00", "activity", 8500.0),
            ])
            .unwrap();

        let report = AdherenceCalculator::new(&store)
            .report(1, date(15), date(15))
            .unwrap();

        assert_eq!(report.sleep_upload_pct, 100.0);
        assert_eq!(report.wear_time_pct, 3.0 / 86_400.0 * 100.0);
        assert_eq!(
            report.last_upload,
            Some(NaiveDateTime::parse_from_str("2024-01-15 08:00:02", "%Y-%m-%d %H:%M:%S").unwrap())
        );
    }

    #[test]
    fn test_partial_day_coverage() {
        let mut store = SampleStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
            .insert_samples(&[
                sample("2024-01-15 00:00:00", "activity", 8500.0),
                sample("2024-01-17 00:00:00", "activity", 9000.0),
            ])
            .unwrap();

        let report = AdherenceCalculator::new(&store)
            .report(1, date(15), date(18))
            .unwrap();

        // 2 of 4 days have activity data.
        assert_eq!(report.sleep_upload_pct, 50.0);
        assert_eq!(report.wear_time_pct, 0.0);
    }

    #[test]
    fn test_no_data_at_all() {
        let store = {
            let s = SampleStore::open_in_memory().unwrap();
            s.ensure_schema().unwrap();
            s
        };

        let report = AdherenceCalculator::new(&store)
            .report(7, date(15), date(15))
            .unwrap();

        assert_eq!(report.last_upload, None);
        assert_eq!(report.sleep_upload_pct, 0.0);
        assert_eq!(report.wear_time_pct, 0.0);
    }

    #[test]
    fn test_invalid_range() {
        let store = SampleStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();

        let err = AdherenceCalculator::new(&store)
            .report(1, date(16), date(15))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidRange { .. }));
    }
}
