//! logspike -- request-rate anomaly detection for web server logs.
//!
//! The pipeline parses bracketed timestamps out of a log, aggregates them
//! into per-second request counts, fits a two-pass robust linear baseline
//! and flags seconds whose residual z-score exceeds a threshold.

pub mod analysis;
pub mod config;
pub mod detect;
pub mod error;
pub mod parse;
pub mod report;
pub mod series;

use std::io::BufRead;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

pub use error::{AnalysisError, Result};
pub use report::Report;

/// Tunable detector parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    pub z_threshold: f64,
    pub filter_quantile: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            z_threshold: detect::DEFAULT_Z_THRESHOLD,
            filter_quantile: analysis::DEFAULT_FILTER_QUANTILE,
        }
    }
}

/// Runs the full pipeline with fixed settings. Holds no other state.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    settings: DetectorSettings,
    detector: detect::ZScoreDetector,
}

impl Analyzer {
    pub fn new(settings: DetectorSettings) -> Result<Self> {
        let detector = detect::ZScoreDetector::new(settings.z_threshold)?;
        analysis::validate_filter_quantile(settings.filter_quantile)?;
        Ok(Self { settings, detector })
    }

    pub fn settings(&self) -> DetectorSettings {
        self.settings
    }

    pub fn run_reader<R: BufRead>(&self, reader: R) -> Result<Report> {
        let (timestamps, stats) = parse::parse_reader(reader)?;
        self.analyze_timestamps(&timestamps, stats)
    }

    pub fn run_path(&self, path: &Path) -> Result<Report> {
        let (timestamps, stats) = parse::parse_path(path)?;
        self.analyze_timestamps(&timestamps, stats)
    }

    /// Aggregate, fit and score already-parsed timestamps.
    pub fn analyze_timestamps(
        &self,
        timestamps: &[NaiveDateTime],
        stats: parse::ParseStats,
    ) -> Result<Report> {
        let series = series::aggregate(timestamps);
        info!(points = series.len(), requests = timestamps.len(), "built per-second series");

        let fit = analysis::fit_robust(&series, self.settings.filter_quantile)?;
        let detection = self.detector.detect(&series, &fit)?;

        Ok(Report::new(
            stats,
            self.settings.filter_quantile,
            &fit,
            detection,
            &self.detector,
        ))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            settings: DetectorSettings::default(),
            detector: detect::ZScoreDetector::default(),
        }
    }
}

/// Analyze a log stream with default settings.
pub fn run<R: BufRead>(source: R) -> Result<Report> {
    Analyzer::default().run_reader(source)
}

/// Analyze a log file with default settings.
pub fn run_path(path: &Path) -> Result<Report> {
    Analyzer::default().run_path(path)
}
