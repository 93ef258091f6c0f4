//! Error types for configuration and formula construction.

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Fatal configuration errors.
///
/// All of these are raised before any data is touched or any inference call
/// is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed or is missing a required key
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// IO error while reading the configuration file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Feature declared with a variable type other than `group`
    #[error("Unsupported variable type '{variable_type}' for feature '{feature}'")]
    UnsupportedVariableType {
        /// Feature name
        feature: String,
        /// Variable type found in the configuration
        variable_type: String,
    },

    /// Unknown smoothing model name
    #[error("Unknown smoothing model '{model}' for term '{term}'")]
    UnknownSmoothingModel {
        /// Feature or random effect name
        term: String,
        /// Model name found in the configuration
        model: String,
    },

    /// Random effect declared with a model other than `rw2` or `iid`
    #[error("Random effect '{term}' must use rw2 or iid, got '{model}'")]
    UnsupportedRandomEffectModel {
        /// Random effect name
        term: String,
        /// Model name found in the configuration
        model: String,
    },

    /// A required term list is empty
    #[error("At least one {0} is required")]
    EmptyTerms(&'static str),

    /// Bin count of zero
    #[error("Feature '{0}' must have a positive number of bins")]
    InvalidBins(String),

    /// No precision prior declared
    #[error("model.hyperparameters must declare a precision prior")]
    MissingPrior,

    /// Precision prior with unusable parameters
    #[error("Invalid precision prior: {0}")]
    InvalidPrior(String),

    /// Window whose start is not before its end
    #[error("Invalid {name} window: start {start} is not before end {end}")]
    InvalidWindow {
        /// Window name (train or test)
        name: &'static str,
        /// Start date of the window
        start: String,
        /// End date of the window
        end: String,
    },

    /// Empty string where a value is required
    #[error("Configuration key '{0}' must not be empty")]
    EmptyValue(&'static str),
}
