//! Regression and descriptive statistics behind the traffic baseline.

pub mod baseline;
pub mod regression;
pub mod stats;

pub use baseline::{fit_robust, validate_filter_quantile, RobustFit, DEFAULT_FILTER_QUANTILE};
pub use regression::LinearModel;
pub use stats::{ResidualStats, Sample};
