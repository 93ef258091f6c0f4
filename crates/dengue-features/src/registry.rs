//! Feature Registry
//!
//! Lists the derived covariates the pipeline knows how to compute and builds
//! them from the `engineering` section of the run configuration.

use crate::climate::{RollingAverage, RollingAverageConfig};
use crate::serotype::{DaysSinceSwitch, DaysSinceSwitchConfig};
use crate::traits::{ConfigurableFeature, Feature, FeatureKind};
use dengue_model::EngineeringSpec;

/// Feature metadata
#[derive(Debug, Clone)]
pub struct FeatureInfo {
    /// Feature name (unique identifier)
    pub name: &'static str,
    /// Feature family
    pub kind: FeatureKind,
    /// Brief description of what the feature measures
    pub description: &'static str,
    /// Columns required besides the configured source column(s)
    pub required_columns: &'static [&'static str],
}

/// Get all available feature info
pub fn available_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            name: "rolling_mean",
            kind: FeatureKind::Climate,
            description: "Trailing mean over a window of weeks, optionally mean-centered, then lagged",
            required_columns: &["year_week_key"],
        },
        FeatureInfo {
            name: "days_since_switch",
            kind: FeatureKind::Serotype,
            description: "Days since the dominant serotype set last changed",
            required_columns: &["year_week_key"],
        },
        FeatureInfo {
            name: "horizon_shift",
            kind: FeatureKind::Horizon,
            description: "Model covariates lagged by the forecast horizon",
            required_columns: &["year_week_key"],
        },
    ]
}

/// Get feature info by name
pub fn get_feature_info(name: &str) -> Option<FeatureInfo> {
    available_features().into_iter().find(|f| f.name == name)
}

/// Get all features of a family
pub fn features_by_kind(kind: FeatureKind) -> Vec<FeatureInfo> {
    available_features()
        .into_iter()
        .filter(|f| f.kind == kind)
        .collect()
}

/// Build the feature an `engineering` entry describes.
pub fn from_spec(spec: &EngineeringSpec) -> Box<dyn Feature> {
    match spec {
        EngineeringSpec::RollingMean {
            source,
            prefix,
            window,
            lag,
            mean_center,
        } => Box::new(RollingAverage::with_config(RollingAverageConfig {
            source: source.clone(),
            prefix: prefix.clone(),
            window: *window,
            lag: *lag,
            mean_center: *mean_center,
        })),
        EngineeringSpec::DaysSinceSwitch { source } => {
            Box::new(DaysSinceSwitch::with_config(DaysSinceSwitchConfig {
                source: source.clone(),
            }))
        }
    }
}
