//! Error type for forecasting runs.

use crate::backend::InferenceError;
use dengue_data::{DataError, WindowKeys};
use dengue_features::FeatureError;
use dengue_model::ConfigError;
use dengue_output::ExportError;
use thiserror::Error;

/// Result type for forecasting runs.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure along the forecasting pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or formula
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset loading, annotation or partitioning failed
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Derived covariate computation failed
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    /// The backend failed or returned unusable output
    #[error(
        "Inference failed for covariates [{}] with train weeks {}..{} and test weeks {}..{}: {source}",
        .covariates.join(", "),
        .train.start_key,
        .train.end_key,
        .test.start_key,
        .test.end_key
    )]
    Fit {
        /// Covariates and random effects of the formula
        covariates: Vec<String>,
        /// Training key range
        train: WindowKeys,
        /// Testing key range
        test: WindowKeys,
        /// Backend failure
        source: InferenceError,
    },

    /// Forecast export failed
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
