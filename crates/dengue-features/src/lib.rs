#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/dengue-forecast/dengue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod climate;
pub mod error;
pub mod horizon;
pub mod registry;
pub mod serotype;
pub mod set;
pub mod traits;

pub use climate::{RollingAverage, RollingAverageConfig};
pub use error::{FeatureError, Result};
pub use horizon::{HorizonShift, HorizonShiftConfig};
pub use registry::{FeatureInfo, available_features, features_by_kind, from_spec, get_feature_info};
pub use serotype::{DaysSinceSwitch, DaysSinceSwitchConfig, days_since_switch};
pub use set::FeatureSet;
pub use traits::{ConfigurableFeature, Feature, FeatureKind};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
