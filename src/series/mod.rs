//! Per-second request counts built from parsed timestamps.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Request count for one distinct second that appears in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: NaiveDateTime,
    /// Seconds elapsed since the first point of the series.
    pub seconds: f64,
    pub requests: u64,
}

/// Sort and group timestamps into a per-second series.
///
/// Seconds with no events are absent rather than zero-filled, so the gap
/// between consecutive `seconds` values can exceed 1.
pub fn aggregate(timestamps: &[NaiveDateTime]) -> Vec<TimeSeriesPoint> {
    let mut counts: BTreeMap<NaiveDateTime, u64> = BTreeMap::new();
    for ts in timestamps {
        *counts.entry(*ts).or_default() += 1;
    }

    let Some(&start) = counts.keys().next() else {
        return Vec::new();
    };

    let series: Vec<TimeSeriesPoint> = counts
        .into_iter()
        .map(|(time, requests)| TimeSeriesPoint {
            time,
            seconds: (time - start).num_seconds() as f64,
            requests,
        })
        .collect();

    debug!(timestamps = timestamps.len(), points = series.len(), "aggregated per-second series");
    series
}

/// Total requests across a series.
pub fn total_requests(series: &[TimeSeriesPoint]) -> u64 {
    series.iter().map(|p| p.requests).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 22)
            .unwrap()
            .and_hms_opt(18, 0, s)
            .unwrap()
    }

    #[test]
    fn test_aggregate_groups_and_sorts() {
        let input = vec![at(5), at(1), at(5), at(3), at(5), at(1)];
        let series = aggregate(&input);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].time, at(1));
        assert_eq!(series[0].requests, 2);
        assert_eq!(series[0].seconds, 0.0);
        assert_eq!(series[1].time, at(3));
        assert_eq!(series[1].requests, 1);
        assert_eq!(series[1].seconds, 2.0);
        assert_eq!(series[2].requests, 3);
        assert_eq!(series[2].seconds, 4.0);
        assert_eq!(total_requests(&series), input.len() as u64);
    }

    #[test]
    fn test_aggregate_across_minute_boundary() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 22).unwrap().and_hms_opt(18, 0, 59).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 22).unwrap().and_hms_opt(18, 2, 0).unwrap();
        let series = aggregate(&[b, a]);
        assert_eq!(series[1].seconds, 61.0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_timestamps_collapse() {
        let series = aggregate(&[at(7), at(7)]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].requests, 2);
    }
}
