//! Two-pass robust baseline.
//!
//! Pass one fits the whole series. Points whose pass-one residual reaches
//! the filter quantile are treated as likely spikes and dropped; pass two
//! refits on what is left. The pass-two model is the baseline.

use serde::Serialize;
use tracing::debug;

use super::regression::LinearModel;
use super::stats::Sample;
use crate::error::{AnalysisError, Result};
use crate::series::TimeSeriesPoint;

/// Default quantile of pass-one residuals used as the filtering cut.
pub const DEFAULT_FILTER_QUANTILE: f64 = 0.90;

#[derive(Debug, Clone, Serialize)]
pub struct RobustFit {
    /// Unfiltered pass-one fit.
    pub initial: LinearModel,
    /// Fit over the normal subset only.
    pub robust: LinearModel,
    /// Residual quantile used as the cut; points at or above it were excluded.
    pub filter_threshold: f64,
    /// One flag per series point: `true` if the point was in the normal subset.
    pub in_baseline: Vec<bool>,
}

impl RobustFit {
    pub fn normal_count(&self) -> usize {
        self.in_baseline.iter().filter(|&&b| b).count()
    }

    /// Residuals of normal-subset points against the robust model.
    pub fn normal_residuals(&self, series: &[TimeSeriesPoint]) -> Vec<f64> {
        series
            .iter()
            .zip(&self.in_baseline)
            .filter(|&(_, &keep)| keep)
            .map(|(p, _)| p.requests as f64 - self.robust.predict(p.seconds))
            .collect()
    }
}

/// The filter quantile must lie strictly between 0 and 1.
pub fn validate_filter_quantile(filter_quantile: f64) -> Result<()> {
    if filter_quantile > 0.0 && filter_quantile < 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter {
            name: "filter_quantile",
            reason: format!("must be strictly between 0 and 1, got {filter_quantile}"),
        })
    }
}

/// Fit the robust baseline over `series` with the given filter quantile.
pub fn fit_robust(series: &[TimeSeriesPoint], filter_quantile: f64) -> Result<RobustFit> {
    validate_filter_quantile(filter_quantile)?;

    let xs: Vec<f64> = series.iter().map(|p| p.seconds).collect();
    let ys: Vec<f64> = series.iter().map(|p| p.requests as f64).collect();

    // Pass 1
    let initial = LinearModel::fit(&xs, &ys)?;
    let residuals = initial.residuals(&xs, &ys);
    let filter_threshold = Sample::new(&residuals)
        .quantile(filter_quantile)
        .ok_or(AnalysisError::InsufficientData { needed: 2, have: 0 })?;

    // Strict comparison: ties with the threshold are excluded.
    let in_baseline: Vec<bool> = residuals.iter().map(|&r| r < filter_threshold).collect();

    let (clean_xs, clean_ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(&ys)
        .zip(&in_baseline)
        .filter(|&(_, &keep)| keep)
        .map(|((&x, &y), _)| (x, y))
        .unzip();

    debug!(
        slope = initial.slope,
        intercept = initial.intercept,
        filter_threshold,
        kept = clean_xs.len(),
        total = xs.len(),
        "initial fit"
    );

    // Pass 2
    let robust = LinearModel::fit(&clean_xs, &clean_ys)?;
    debug!(slope = robust.slope, intercept = robust.intercept, "robust fit");

    Ok(RobustFit {
        initial,
        robust,
        filter_threshold,
        in_baseline,
    })
}
