use tracing::{info, warn};

use super::{AnnotatedPoint, Detection, Severity};
use crate::analysis::baseline::RobustFit;
use crate::analysis::stats::Sample;
use crate::error::{AnalysisError, Result};
use crate::series::TimeSeriesPoint;

/// Flag seconds more than five standard deviations above the baseline.
pub const DEFAULT_Z_THRESHOLD: f64 = 5.0;

/// Scores every point against the residual spread of the normal subset.
#[derive(Debug, Clone, Copy)]
pub struct ZScoreDetector {
    threshold: f64,
}

impl ZScoreDetector {
    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "z_threshold",
                reason: format!("must be a positive finite number, got {threshold}"),
            });
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_anomaly(&self, z_score: f64) -> bool {
        z_score > self.threshold
    }

    /// `Critical` once the score reaches twice the threshold.
    pub fn severity(&self, z_score: f64) -> Severity {
        if z_score >= 2.0 * self.threshold {
            Severity::Critical
        } else {
            Severity::Warning
        }
    }

    /// Annotate `series` against `fit` and collect the anomalous points.
    ///
    /// `clean_std` is the sample standard deviation of the normal subset's
    /// residuals under the robust model. Zero spread is an error, as is a
    /// `fit` built from a series of a different length.
    pub fn detect(&self, series: &[TimeSeriesPoint], fit: &RobustFit) -> Result<Detection> {
        if fit.in_baseline.len() != series.len() {
            return Err(AnalysisError::InvalidParameter {
                name: "fit",
                reason: format!(
                    "baseline covers {} points but the series has {}",
                    fit.in_baseline.len(),
                    series.len()
                ),
            });
        }

        let residuals = fit.normal_residuals(series);
        let clean = Sample::new(&residuals).summary();
        let (clean_mean, clean_std) = (clean.mean, clean.std_dev);
        if clean_std == 0.0 {
            return Err(AnalysisError::ZeroVariance);
        }

        let points: Vec<AnnotatedPoint> = series
            .iter()
            .zip(&fit.in_baseline)
            .map(|(p, &in_baseline)| {
                let predicted = fit.robust.predict(p.seconds);
                let residual = p.requests as f64 - predicted;
                AnnotatedPoint {
                    time: p.time,
                    seconds: p.seconds,
                    requests: p.requests,
                    predicted,
                    residual,
                    z_score: (residual - clean_mean) / clean_std,
                    in_baseline,
                }
            })
            .collect();

        let anomalies: Vec<AnnotatedPoint> = points
            .iter()
            .filter(|p| self.is_anomaly(p.z_score))
            .cloned()
            .collect();

        if anomalies.is_empty() {
            info!(points = points.len(), threshold = self.threshold, "no anomalies detected");
        } else {
            warn!(
                anomalies = anomalies.len(),
                points = points.len(),
                threshold = self.threshold,
                "anomalous traffic detected"
            );
        }

        Ok(Detection {
            points,
            anomalies,
            clean,
            threshold: self.threshold,
        })
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}
