#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/dengue-forecast/dengue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod score;

pub use export::{ExportError, ExportFormat, Exporter, ForecastRow};
pub use score::{ForecastScore, INTERVAL_ALPHA, crps_ensemble, interval_score};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
