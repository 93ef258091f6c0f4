//! Error types for feature computation.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors raised while computing derived covariates.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Input column needed by a feature is absent
    #[error("Feature '{feature}' requires missing column '{column}'")]
    MissingColumn {
        /// Feature name
        feature: String,
        /// Missing column
        column: String,
    },

    /// Feature parameter out of range
    #[error("Invalid parameter for '{feature}': {reason}")]
    InvalidParameter {
        /// Feature name
        feature: String,
        /// What is wrong
        reason: String,
    },
}
