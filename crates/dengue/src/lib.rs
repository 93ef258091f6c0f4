#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/dengue-forecast/dengue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use dengue_data as data;
pub use dengue_features as features;
pub use dengue_model as model;
pub use dengue_output as output;

pub use backend::{
    FitOutput, FitRequest, FittedValue, InferenceBackend, InferenceError, RInlaBackend,
};
pub use error::{Error, Result};
pub use pipeline::{ForecastRun, RunOutcome};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
