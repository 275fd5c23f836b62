//! Gap filling
//!
//! Turns the sparse samples a store read returns into a dense, evenly
//! spaced series over the query window, tracking per-point provenance.
//! Grid instants with a stored sample pass through exactly; instants
//! outside the known span clamp to the nearest edge value; interior gaps
//! are linearly interpolated between the bracketing samples.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::QueryError;
use crate::types::{ParticipantId, SeriesResponse};

/// Fill `[start 00:00, (end + 1 day) 00:00)` at `cadence` from known
/// samples, which must be sorted ascending (store reads are).
///
/// An empty known set is a not-found condition: it means the store holds
/// nothing at all for this participant/metric/range, which is distinct
/// from a sparse range that fills entirely by imputation.
pub fn fill_series(
    known: &[(NaiveDateTime, f64)],
    participant: ParticipantId,
    metric: &str,
    start: NaiveDate,
    end: NaiveDate,
    cadence: Duration,
) -> Result<SeriesResponse, QueryError> {
    if known.is_empty() {
        return Err(QueryError::NoData {
            participant,
            metric: metric.to_string(),
        });
    }
    debug_assert!(known.windows(2).all(|w| w[0].0 <= w[1].0));

    let grid_start = start.and_time(NaiveTime::MIN);
    let grid_end = (end + Duration::days(1)).and_time(NaiveTime::MIN);

    let times: Vec<NaiveDateTime> = known.iter().map(|(t, _)| *t).collect();
    let first = known[0];
    let last = known[known.len() - 1];

    let points = ((grid_end - grid_start).num_seconds() / cadence.num_seconds()).max(0) as usize;
    let mut timestamps = Vec::with_capacity(points);
    let mut values = Vec::with_capacity(points);
    let mut imputed = Vec::with_capacity(points);

    let mut t = grid_start;
    while t < grid_end {
        let (value, synthesized) = match times.binary_search(&t) {
            Ok(i) => (known[i].1, false),
            Err(0) => (first.1, true),
            Err(i) if i == known.len() => (last.1, true),
            Err(i) => {
                let (t0, v0) = known[i - 1];
                let (t1, v1) = known[i];
                let elapsed = (t - t0).num_milliseconds() as f64;
                let span = (t1 - t0).num_milliseconds() as f64;
                (v0 + (v1 - v0) * elapsed / span, true)
            }
        };
        timestamps.push(t);
        values.push(value);
        imputed.push(synthesized);
        t = t + cadence;
    }

    Ok(SeriesResponse {
        timestamps,
        values,
        imputed,
    })
}
