//! Z-score anomaly detection against the robust baseline.

pub mod anomaly;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::analysis::ResidualStats;

pub use anomaly::{ZScoreDetector, DEFAULT_Z_THRESHOLD};

/// Severity levels for flagged seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One series point with its baseline prediction and deviation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    pub time: NaiveDateTime,
    pub seconds: f64,
    pub requests: u64,
    pub predicted: f64,
    pub residual: f64,
    pub z_score: f64,
    /// Whether the point was used to fit the robust baseline.
    pub in_baseline: bool,
}

/// Full annotated series plus the flagged subset.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub points: Vec<AnnotatedPoint>,
    pub anomalies: Vec<AnnotatedPoint>,
    /// Residual spread of the normal subset under the robust model.
    pub clean: ResidualStats,
    pub threshold: f64,
}
