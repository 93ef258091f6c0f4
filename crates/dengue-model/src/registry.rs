//! Smoothing Model Registry
//!
//! Central registry of the latent models a term may request. Configuration
//! names are looked up here so an unknown model is rejected before any
//! formula is rendered.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Latent smoothing models understood by the formula builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingModel {
    /// First-order random walk
    Rw1,
    /// Second-order random walk
    Rw2,
    /// Independent and identically distributed effects
    Iid,
    /// First-order autoregressive process
    Ar1,
}

impl SmoothingModel {
    /// Name used in configuration files and by R-INLA.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Rw1 => "rw1",
            Self::Rw2 => "rw2",
            Self::Iid => "iid",
            Self::Ar1 => "ar1",
        }
    }

    /// Look up a model by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        available_models()
            .into_iter()
            .find(|m| m.name == name)
            .map(|m| m.model)
    }

    /// Whether the model can wrap its last level onto its first.
    pub const fn supports_cyclic(&self) -> bool {
        matches!(self, Self::Rw1 | Self::Rw2)
    }
}

impl fmt::Display for SmoothingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a feature covariate is presented to its smoothing term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Covariate values are grouped into levels before smoothing
    Group,
}

impl VariableType {
    /// Look up a variable type by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    /// Configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Group => "group",
        }
    }
}

/// Smoothing model metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Configuration name (unique identifier)
    pub name: &'static str,
    /// Model variant
    pub model: SmoothingModel,
    /// Brief description of the prior
    pub description: &'static str,
    /// Whether the model may be used for a random effect
    pub random_effect: bool,
}

/// Get all available model info
pub fn available_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo {
            name: "rw1",
            model: SmoothingModel::Rw1,
            description: "First-order random walk over ordered levels",
            random_effect: false,
        },
        ModelInfo {
            name: "rw2",
            model: SmoothingModel::Rw2,
            description: "Second-order random walk over ordered or cyclic levels",
            random_effect: true,
        },
        ModelInfo {
            name: "iid",
            model: SmoothingModel::Iid,
            description: "Exchangeable Gaussian effects with a shared precision",
            random_effect: true,
        },
        ModelInfo {
            name: "ar1",
            model: SmoothingModel::Ar1,
            description: "Stationary first-order autoregressive process",
            random_effect: false,
        },
    ]
}

/// Get model info by name
pub fn get_model_info(name: &str) -> Option<ModelInfo> {
    available_models().into_iter().find(|m| m.name == name)
}

/// Models accepted for random effects
pub fn random_effect_models() -> Vec<ModelInfo> {
    available_models()
        .into_iter()
        .filter(|m| m.random_effect)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_models_count() {
        assert_eq!(available_models().len(), 4);
    }

    #[test]
    fn test_from_name_round_trips() {
        for info in available_models() {
            let model = SmoothingModel::from_name(info.name).unwrap();
            assert_eq!(model, info.model);
            assert_eq!(model.name(), info.name);
        }
        assert!(SmoothingModel::from_name("besag").is_none());
        assert!(SmoothingModel::from_name("RW2").is_none());
    }

    #[test]
    fn test_random_effect_models() {
        let names: Vec<_> = random_effect_models().iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["rw2", "iid"]);
    }

    #[test]
    fn test_cyclic_support() {
        assert!(SmoothingModel::Rw2.supports_cyclic());
        assert!(SmoothingModel::Rw1.supports_cyclic());
        assert!(!SmoothingModel::Iid.supports_cyclic());
        assert!(!SmoothingModel::Ar1.supports_cyclic());
    }

    #[test]
    fn test_variable_type() {
        assert_eq!(VariableType::from_name("group"), Some(VariableType::Group));
        assert_eq!(VariableType::from_name("numeric"), None);
        assert_eq!(VariableType::Group.name(), "group");
    }

    #[test]
    fn test_get_model_info() {
        let info = get_model_info("iid").unwrap();
        assert_eq!(info.model, SmoothingModel::Iid);
        assert!(info.random_effect);
        assert!(get_model_info("nonexistent").is_none());
    }
}
