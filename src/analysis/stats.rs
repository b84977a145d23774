use serde::Serialize;

/// Summary statistics over a slice of residuals.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResidualStats {
    pub mean: f64,
    pub std_dev: f64,
    pub sample_count: usize,
}

/// A sample of `f64` values for descriptive statistics.
pub struct Sample<'a> {
    values: &'a [f64],
}

impl<'a> Sample<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Sample variance (n - 1 denominator). Zero for fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq_diff: f64 = self.values.iter().map(|&x| (x - mean).powi(2)).sum();
        sum_sq_diff / (self.values.len() - 1) as f64
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> ResidualStats {
        ResidualStats {
            mean: self.mean(),
            std_dev: self.std_dev(),
            sample_count: self.values.len(),
        }
    }

    /// Quantile `q` in `[0, 1]`, linearly interpolated between the two
    /// closest ranks at position `q * (n - 1)`. `None` on an empty sample.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = Sample::new(&values);
        assert_eq!(s.mean(), 5.0);
        // Population variance is 4.0; sample variance is 32 / 7.
        assert!((s.variance() - 32.0 / 7.0).abs() < 1e-12);
        assert!((s.std_dev() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let s = Sample::new(&[3.5]);
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.summary().sample_count, 1);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let s = Sample::new(&values);
        // pos = 0.9 * 9 = 8.1 -> 9 + 0.1 * (10 - 9)
        assert!((s.quantile(0.9).unwrap() - 9.1).abs() < 1e-12);
        assert_eq!(s.quantile(0.0), Some(1.0));
        assert_eq!(s.quantile(1.0), Some(10.0));
        assert_eq!(s.quantile(0.5), Some(5.5));
    }

    #[test]
    fn test_quantile_ignores_input_order() {
        let a = [5.0, -1.0, 3.0, 0.5];
        let b = [0.5, 3.0, 5.0, -1.0];
        assert_eq!(Sample::new(&a).quantile(0.9), Sample::new(&b).quantile(0.9));
    }

    #[test]
    fn test_quantile_empty() {
        assert_eq!(Sample::new(&[]).quantile(0.9), None);
    }
}
