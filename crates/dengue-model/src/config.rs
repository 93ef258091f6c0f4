//! Run configuration.
//!
//! [`RunConfig`] mirrors the YAML document one key at a time so that a
//! configuration can be read, re-serialized and read again without loss.
//! [`ModelConfig`] is the validated view consumed by the formula builder.
//!
//! ```yaml
//! train: { start_time: 2020-01-01, end_time: 2022-12-31 }
//! test: { start_time: 2023-01-01, end_time: 2023-12-31 }
//! dataset: inla_model_ds
//! target: cases
//! model:
//!   horizon: 0
//!   inla:
//!     family: nbinomial
//!     offset: log(population / 100000)
//!     control: { compute: { dic: true } }
//!   hyperparameters:
//!     - prec: { prior: pc.prec, param: [0.5, 0.01] }
//! features:
//!   - { name: max_t_scale_12_wk_avg_0, variable_type: group, bins: 18, model: rw2, scale_model: true }
//! random_effects:
//!   - { name: eweek, model: rw2, cyclic: true }
//! ```

use crate::error::{ConfigError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    /// First day inside the window
    #[serde(rename = "start_time")]
    pub start: NaiveDate,
    /// First day after the window
    #[serde(rename = "end_time")]
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Create a new window.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` falls inside `[start, end)`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Whether two windows share at least one day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn validate(&self, name: &'static str) -> Result<()> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(ConfigError::InvalidWindow {
                name,
                start: self.start.to_string(),
                end: self.end.to_string(),
            })
        }
    }
}

/// One covariate smoothed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    /// Dataset column holding the covariate
    pub name: String,
    /// How the covariate is presented to the smoother (only `group` is supported)
    pub variable_type: String,
    /// Number of bins the covariate is grouped into before smoothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<u32>,
    /// Latent model name, e.g. `rw2`
    #[serde(rename = "model")]
    pub smoothing_model: String,
    /// Whether the smoother is scaled to a unit generalized variance
    pub scale_model: bool,
}

/// One structured random effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomEffectSpec {
    /// Dataset column indexing the effect levels
    pub name: String,
    /// Latent model name, `rw2` or `iid`
    #[serde(rename = "model")]
    pub smoothing_model: String,
    /// Whether the last level connects back to the first (rw2 only)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cyclic: bool,
}

/// Precision section of a hyperparameter entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrecisionSection {
    /// Prior family, e.g. `pc.prec`
    pub prior: String,
    /// Prior parameters
    pub param: Vec<f64>,
}

/// Entry of `model.hyperparameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HyperparameterEntry {
    /// Precision prior
    pub prec: PrecisionSection,
}

/// Prior over the precision of every smoothing term.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionPrior {
    /// Prior family, e.g. `pc.prec`
    pub prior_family: String,
    /// Prior parameters in declaration order
    pub parameters: Vec<f64>,
}

impl PrecisionPrior {
    /// Create a new precision prior.
    pub fn new(prior_family: impl Into<String>, parameters: Vec<f64>) -> Self {
        Self {
            prior_family: prior_family.into(),
            parameters,
        }
    }
}

impl TryFrom<&PrecisionSection> for PrecisionPrior {
    type Error = ConfigError;

    fn try_from(section: &PrecisionSection) -> Result<Self> {
        if section.prior.trim().is_empty() {
            return Err(ConfigError::InvalidPrior("prior family is empty".into()));
        }
        if section.param.is_empty() {
            return Err(ConfigError::InvalidPrior(format!(
                "prior '{}' has no parameters",
                section.prior
            )));
        }
        if let Some(bad) = section.param.iter().find(|p| !p.is_finite()) {
            return Err(ConfigError::InvalidPrior(format!(
                "prior '{}' has non-finite parameter {bad}",
                section.prior
            )));
        }
        Ok(Self::new(section.prior.clone(), section.param.clone()))
    }
}

/// Options forwarded to the inference backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlaOptions {
    /// Likelihood family, e.g. `nbinomial`
    pub family: String,
    /// Offset expression, e.g. `log(population / 100000)`
    pub offset: String,
    /// `control.*` option groups, forwarded without interpretation
    pub control: BTreeMap<String, serde_yaml::Value>,
    /// Numerical threads used by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<u32>,
    /// Backend verbosity
    #[serde(default)]
    pub verbose: bool,
}

/// `model` section of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    /// Forecast horizon in weeks
    pub horizon: u32,
    /// Backend options
    pub inla: InlaOptions,
    /// Hyperparameter priors; the first entry applies to every term
    pub hyperparameters: Vec<HyperparameterEntry>,
}

/// Derived covariate computed before the dataset is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineeringSpec {
    /// Trailing rolling mean, optionally mean-centered, then lagged
    RollingMean {
        /// Source column
        source: String,
        /// Output name prefix; the column is `{prefix}_{window}_wk_avg_{lag}`
        prefix: String,
        /// Window length in weeks
        window: usize,
        /// Lag in weeks applied after averaging
        #[serde(default)]
        lag: usize,
        /// Subtract the series mean before averaging
        #[serde(default)]
        mean_center: bool,
    },
    /// Days elapsed since the dominant serotype last changed
    DaysSinceSwitch {
        /// Column holding the dominant serotype label(s) for each week
        source: String,
    },
}

/// The YAML run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Training window
    pub train: TimeWindow,
    /// Testing (evaluation) window
    pub test: TimeWindow,
    /// Table, view or file holding the modelling dataset
    pub dataset: String,
    /// Response column
    pub target: String,
    /// Model options
    pub model: ModelSection,
    /// Smoothed covariates in term order
    pub features: Vec<FeatureSpec>,
    /// Random effects in term order
    pub random_effects: Vec<RandomEffectSpec>,
    /// Derived covariates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engineering: Vec<EngineeringSpec>,
}

impl RunConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        info!(
            path = %path.display(),
            features = config.features.len(),
            random_effects = config.random_effects.len(),
            "Loaded run configuration"
        );
        Ok(config)
    }

    /// Serialize back to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the document into a [`ModelConfig`].
    pub fn model_config(&self) -> Result<ModelConfig> {
        ModelConfig::try_from(self)
    }
}

/// Validated model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Response column
    pub target: String,
    /// Forecast horizon in weeks
    pub horizon: u32,
    /// Smoothed covariates in term order
    pub features: Vec<FeatureSpec>,
    /// Random effects in term order
    pub random_effects: Vec<RandomEffectSpec>,
    /// Precision prior shared by every smoothing term
    pub hyperparameters: PrecisionPrior,
    /// Training window
    pub train_window: TimeWindow,
    /// Testing window
    pub test_window: TimeWindow,
    /// Offset expression appended to the formula
    pub offset_expression: String,
    /// Likelihood family
    pub family: String,
}

impl TryFrom<&RunConfig> for ModelConfig {
    type Error = ConfigError;

    fn try_from(config: &RunConfig) -> Result<Self> {
        require_non_empty("target", &config.target)?;
        require_non_empty("model.inla.family", &config.model.inla.family)?;
        require_non_empty("model.inla.offset", &config.model.inla.offset)?;
        config.train.validate("train")?;
        config.test.validate("test")?;

        let entry = config
            .model
            .hyperparameters
            .first()
            .ok_or(ConfigError::MissingPrior)?;
        if config.model.hyperparameters.len() > 1 {
            warn!(
                entries = config.model.hyperparameters.len(),
                "Only the first hyperparameter entry is used"
            );
        }

        Ok(Self {
            target: config.target.clone(),
            horizon: config.model.horizon,
            features: config.features.clone(),
            random_effects: config.random_effects.clone(),
            hyperparameters: PrecisionPrior::try_from(&entry.prec)?,
            train_window: config.train,
            test_window: config.test,
            offset_expression: config.model.inla.offset.clone(),
            family: config.model.inla.family.clone(),
        })
    }
}

fn require_non_empty(key: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyValue(key))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const NATIONAL_YAML: &str = r#"
train:
  start_time: 2020-01-01
  end_time: 2022-12-31
test:
  start_time: 2023-01-01
  end_time: 2023-12-31
dataset: national_analysis.inla_model_ds
target: cases
model:
  horizon: 0
  inla:
    family: nbinomial
    offset: log(population / 100000)
    num_threads: 4
    verbose: false
    control:
      compute:
        dic: true
        waic: true
        config: true
  hyperparameters:
    - prec:
        prior: pc.prec
        param: [0.5, 0.01]
features:
  - name: max_t_scale_12_wk_avg_0
    variable_type: group
    bins: 18
    model: rw2
    scale_model: true
  - name: nino34_12_wk_avg_4
    variable_type: group
    bins: 12
    model: rw2
    scale_model: true
random_effects:
  - name: year
    model: iid
"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_national_config() {
        let config = RunConfig::from_yaml_str(NATIONAL_YAML).unwrap();
        assert_eq!(config.target, "cases");
        assert_eq!(config.train.start, date(2020, 1, 1));
        assert_eq!(config.test.end, date(2023, 12, 31));
        assert_eq!(config.model.inla.num_threads, Some(4));
        assert_eq!(config.features.len(), 2);
        assert_eq!(config.features[0].bins, Some(18));
        assert_eq!(config.features[0].smoothing_model, "rw2");
        assert!(!config.random_effects[0].cyclic);
        assert!(config.model.inla.control.contains_key("compute"));
        assert!(config.engineering.is_empty());
    }

    #[test]
    fn test_model_config_from_document() {
        let model = RunConfig::from_yaml_str(NATIONAL_YAML)
            .unwrap()
            .model_config()
            .unwrap();
        assert_eq!(model.family, "nbinomial");
        assert_eq!(model.offset_expression, "log(population / 100000)");
        assert_eq!(model.hyperparameters.prior_family, "pc.prec");
        assert_eq!(model.hyperparameters.parameters, vec![0.5, 0.01]);
        assert_eq!(model.train_window.end, date(2022, 12, 31));
    }

    #[test]
    fn test_missing_required_key() {
        let yaml = NATIONAL_YAML.replace("target: cases\n", "");
        let err = RunConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn test_missing_control_is_rejected() {
        let yaml = NATIONAL_YAML.replace(
            "    control:\n      compute:\n        dic: true\n        waic: true\n        config: true\n",
            "",
        );
        let err = RunConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("control"));
    }

    #[test]
    fn test_malformed_hyperparameter_rejected() {
        let yaml = NATIONAL_YAML.replace("param: [0.5, 0.01]", "param: [0.5,x: 0.01]");
        assert!(RunConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_unknown_feature_key_rejected() {
        let yaml = NATIONAL_YAML.replace("    bins: 12\n", "    bins: 12\n    lag: 3\n");
        assert!(RunConfig::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn test_empty_hyperparameters() {
        let mut config = RunConfig::from_yaml_str(NATIONAL_YAML).unwrap();
        config.model.hyperparameters.clear();
        assert!(matches!(
            config.model_config(),
            Err(ConfigError::MissingPrior)
        ));
    }

    #[test]
    fn test_prior_without_parameters() {
        let mut config = RunConfig::from_yaml_str(NATIONAL_YAML).unwrap();
        config.model.hyperparameters[0].prec.param.clear();
        assert!(matches!(
            config.model_config(),
            Err(ConfigError::InvalidPrior(_))
        ));
    }

    #[test]
    fn test_inverted_window() {
        let mut config = RunConfig::from_yaml_str(NATIONAL_YAML).unwrap();
        config.test = TimeWindow::new(date(2023, 12, 31), date(2023, 1, 1));
        let err = config.model_config().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow { name: "test", .. }));
    }

    #[test]
    fn test_window_overlap_and_contains() {
        let train = TimeWindow::new(date(2020, 1, 1), date(2022, 12, 31));
        let test = TimeWindow::new(date(2023, 1, 1), date(2023, 12, 31));
        assert!(!train.overlaps(&test));
        assert!(train.contains(date(2020, 1, 1)));
        assert!(!train.contains(date(2022, 12, 31)));

        let late_train = TimeWindow::new(date(2020, 1, 1), date(2023, 6, 1));
        assert!(late_train.overlaps(&test));
        assert!(test.overlaps(&late_train));
    }

    #[test]
    fn test_engineering_section() {
        let yaml = format!(
            "{NATIONAL_YAML}engineering:\n  - kind: rolling_mean\n    source: nino34\n    prefix: nino34\n    window: 12\n    lag: 4\n  - kind: days_since_switch\n    source: dominant_strain\n"
        );
        let config = RunConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(
            config.engineering[0],
            EngineeringSpec::RollingMean {
                source: "nino34".into(),
                prefix: "nino34".into(),
                window: 12,
                lag: 4,
                mean_center: false,
            }
        );
        assert_eq!(
            config.engineering[1],
            EngineeringSpec::DaysSinceSwitch {
                source: "dominant_strain".into()
            }
        );
    }
}
