//! Analysis result and its human-readable rendering.

pub mod export;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analysis::{LinearModel, ResidualStats, RobustFit};
use crate::detect::{AnnotatedPoint, Detection, Severity, ZScoreDetector};
use crate::parse::ParseStats;

pub use export::write_series_csv;

/// Headline figures for a run that flagged at least one second.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    /// Robust baseline intercept, in requests per second.
    pub baseline_rps: f64,
    pub max_requests: u64,
    pub max_z_score: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub severity: Severity,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub parse: ParseStats,
    pub total_requests: u64,
    pub initial_model: LinearModel,
    pub baseline: LinearModel,
    pub filter_quantile: f64,
    pub filter_threshold: f64,
    pub normal_points: usize,
    pub clean: ResidualStats,
    pub z_threshold: f64,
    pub points: Vec<AnnotatedPoint>,
    pub anomalies: Vec<AnnotatedPoint>,
    pub summary: Option<AnomalySummary>,
}

impl Report {
    pub fn new(
        parse: ParseStats,
        filter_quantile: f64,
        fit: &RobustFit,
        detection: Detection,
        detector: &ZScoreDetector,
    ) -> Self {
        let summary = summarize(&detection.anomalies, &fit.robust, detector);
        let total_requests = detection.points.iter().map(|p| p.requests).sum();

        Self {
            parse,
            total_requests,
            initial_model: fit.initial,
            baseline: fit.robust,
            filter_quantile,
            filter_threshold: fit.filter_threshold,
            normal_points: fit.normal_count(),
            clean: detection.clean,
            z_threshold: detection.threshold,
            points: detection.points,
            anomalies: detection.anomalies,
            summary,
        }
    }

    /// `true` when no second crossed the threshold.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

fn summarize(
    anomalies: &[AnnotatedPoint],
    baseline: &LinearModel,
    detector: &ZScoreDetector,
) -> Option<AnomalySummary> {
    let first = anomalies.first()?;
    let (mut max_requests, mut max_z_score) = (first.requests, first.z_score);
    let (mut start, mut end) = (first.time, first.time);
    for p in &anomalies[1..] {
        max_requests = max_requests.max(p.requests);
        max_z_score = max_z_score.max(p.z_score);
        start = start.min(p.time);
        end = end.max(p.time);
    }

    Some(AnomalySummary {
        baseline_rps: baseline.intercept,
        max_requests,
        max_z_score,
        start,
        end,
        severity: detector.severity(max_z_score),
    })
}

/// Format a report as the plain-text summary printed by the CLI.
pub fn format_summary(report: &Report) -> String {
    let mut out = format!(
        "Parsed {} of {} lines into {} seconds ({} requests)\n",
        report.parse.matched,
        report.parse.lines,
        report.points.len(),
        report.total_requests,
    );
    out.push_str(&format!(
        "Robust baseline: {:.3} req/s, slope {:+.5} ({} of {} points kept)\n",
        report.baseline.intercept,
        report.baseline.slope,
        report.normal_points,
        report.points.len(),
    ));

    match &report.summary {
        Some(s) => {
            out.push_str(&format!(
                "\nNormal Baseline Traffic: ~{:.1} req/sec\n",
                s.baseline_rps
            ));
            out.push_str(&format!("Max Attack Traffic:      {} req/sec\n", s.max_requests));
            out.push_str(&format!(
                "Statistical Confidence:  {:.1} sigma ({})\n",
                s.max_z_score, s.severity
            ));
            out.push_str(&format!(
                "\n[DETECTED INTERVAL] {} anomalous second{}\n",
                report.anomalies.len(),
                if report.anomalies.len() == 1 { "" } else { "s" },
            ));
            out.push_str(&format!("Start: {}\n", s.start));
            out.push_str(&format!("End:   {}\n", s.end));
        }
        None => out.push_str("\nNo anomalies detected.\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 22).unwrap().and_hms_opt(18, 1, s).unwrap()
    }

    fn point(s: u32, requests: u64, z_score: f64) -> AnnotatedPoint {
        AnnotatedPoint {
            time: at(s),
            seconds: s as f64,
            requests,
            predicted: 1.0,
            residual: requests as f64 - 1.0,
            z_score,
            in_baseline: false,
        }
    }

    fn report_with(anomalies: Vec<AnnotatedPoint>) -> Report {
        let detector = ZScoreDetector::default();
        let baseline = LinearModel { slope: 0.0, intercept: 1.3 };
        Report {
            parse: ParseStats { lines: 12, matched: 10, skipped: 2 },
            total_requests: 10,
            initial_model: baseline,
            baseline,
            filter_quantile: 0.9,
            filter_threshold: 0.5,
            normal_points: 4,
            clean: ResidualStats { mean: 0.0, std_dev: 1.0, sample_count: 4 },
            z_threshold: 5.0,
            points: anomalies.clone(),
            summary: summarize(&anomalies, &baseline, &detector),
            anomalies,
        }
    }

    #[test]
    fn test_summary_spans_anomalous_interval() {
        let report = report_with(vec![point(40, 30, 6.0), point(10, 80, 12.5), point(20, 45, 9.0)]);
        let s = report.summary.as_ref().unwrap();
        assert_eq!(s.max_requests, 80);
        assert_eq!(s.max_z_score, 12.5);
        assert_eq!(s.start, at(10));
        assert_eq!(s.end, at(40));
        assert_eq!(s.severity, Severity::Critical);
        assert_eq!(s.baseline_rps, 1.3);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_format_summary_with_anomalies() {
        let report = report_with(vec![point(5, 50, 7.0)]);
        let text = format_summary(&report);
        assert!(text.contains("Normal Baseline Traffic: ~1.3 req/sec"));
        assert!(text.contains("Max Attack Traffic:      50 req/sec"));
        assert!(text.contains("7.0 sigma (warning)"));
        assert!(text.contains("1 anomalous second\n"));
        assert!(text.contains("Start: 2024-03-22 18:01:05"));
    }

    #[test]
    fn test_format_summary_clean() {
        let report = report_with(Vec::new());
        assert!(report.is_clean());
        assert!(report.summary.is_none());
        assert!(format_summary(&report).contains("No anomalies detected."));
    }
}
