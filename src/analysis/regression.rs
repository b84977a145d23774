use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// `requests = slope * seconds + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearModel {
    /// Ordinary least squares, closed form:
    /// `slope = Sxy / Sxx`, `intercept = mean(y) - slope * mean(x)`.
    ///
    /// Needs at least two points with distinct `x`.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self> {
        debug_assert_eq!(xs.len(), ys.len());
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Err(AnalysisError::InsufficientData { needed: 2, have: n });
        }

        let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
        let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }

        // All x identical: the line would be vertical.
        if sxx == 0.0 {
            return Err(AnalysisError::InsufficientData { needed: 2, have: 1 });
        }

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// `y - predict(x)` for each pair.
    pub fn residuals(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        xs.iter().zip(ys).map(|(&x, &y)| y - self.predict(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x + 2.0).collect();
        let model = LinearModel::fit(&xs, &ys).unwrap();
        assert!((model.slope - 3.0).abs() < 1e-12);
        assert!((model.intercept - 2.0).abs() < 1e-12);
        assert!((model.predict(10.0) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_noisy_matches_closed_form() {
        // y = [1, 3, 2, 5], x = [0, 1, 2, 3]
        // mean_x = 1.5, mean_y = 2.75, Sxx = 5, Sxy = 5.5
        let model = LinearModel::fit(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 2.0, 5.0]).unwrap();
        assert!((model.slope - 1.1).abs() < 1e-12);
        assert!((model.intercept - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_constant_y_gives_flat_line() {
        let model = LinearModel::fit(&[0.0, 1.0, 5.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(model.slope, 0.0);
        assert_eq!(model.intercept, 4.0);
        assert_eq!(model.residuals(&[0.0, 1.0, 5.0], &[4.0, 4.0, 4.0]), vec![0.0; 3]);
    }

    #[test]
    fn test_fit_needs_two_points() {
        let err = LinearModel::fit(&[1.0], &[1.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { needed: 2, have: 1 }));
        let err = LinearModel::fit(&[], &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { have: 0, .. }));
    }

    #[test]
    fn test_fit_rejects_vertical_line() {
        let err = LinearModel::fit(&[2.0, 2.0, 2.0], &[1.0, 5.0, 9.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }
}
