//! Climate covariates: smoothed weather and ocean-index signals.

pub mod rolling_average;

pub use rolling_average::{RollingAverage, RollingAverageConfig};
