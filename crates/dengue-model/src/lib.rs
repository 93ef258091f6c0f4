#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/dengue-forecast/dengue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod formula;
pub mod registry;
pub mod syntax;

pub use config::{
    EngineeringSpec, FeatureSpec, InlaOptions, ModelConfig, PrecisionPrior, RandomEffectSpec,
    RunConfig, TimeWindow,
};
pub use error::{ConfigError, Result};
pub use formula::{Formula, FormulaBuilder, SmoothTerm, Term, TermSource};
pub use registry::{SmoothingModel, VariableType, available_models, get_model_info};
pub use syntax::{FormulaSyntax, InlaSyntax};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
