//! Additive model terms.
//!
//! A [`Formula`] is the backend-independent meaning of the model: the
//! response, an ordered list of [`Term`]s and the [`PrecisionPrior`] every
//! smoothing term uses. How a particular backend spells it is the business of
//! [`crate::syntax`].

use crate::config::{ModelConfig, PrecisionPrior};
use crate::error::{ConfigError, Result};
use crate::registry::{SmoothingModel, VariableType};
use std::num::NonZeroU32;
use tracing::debug;

/// Where a smoothing term came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSource {
    /// Declared under `features`
    Feature,
    /// Declared under `random_effects`
    RandomEffect,
}

/// A latent smoothing term over one dataset column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothTerm {
    /// Dataset column indexing the term
    pub covariate: String,
    /// Number of bins the covariate is grouped into before smoothing
    pub bins: Option<NonZeroU32>,
    /// Latent model
    pub model: SmoothingModel,
    /// Scale the smoother to unit generalized variance
    pub scale_model: bool,
    /// Connect the last level back to the first
    pub cyclic: bool,
    /// Declaration section
    pub source: TermSource,
}

/// One additive term of the linear predictor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Latent smoothing term
    Smooth(SmoothTerm),
    /// Global intercept
    Intercept,
    /// Fixed offset expression, e.g. `log(population / 100000)`
    Offset(String),
}

/// Typed model specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    response: String,
    terms: Vec<Term>,
    prior: PrecisionPrior,
}

impl Formula {
    /// Response column.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Terms in presentation order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Precision prior shared by the smoothing terms.
    pub const fn prior(&self) -> &PrecisionPrior {
        &self.prior
    }

    /// Smoothing terms only.
    pub fn smooth_terms(&self) -> impl Iterator<Item = &SmoothTerm> {
        self.terms.iter().filter_map(|t| match t {
            Term::Smooth(s) => Some(s),
            _ => None,
        })
    }

    /// Dataset columns the formula references through its smoothing terms.
    pub fn covariates(&self) -> Vec<&str> {
        self.smooth_terms().map(|s| s.covariate.as_str()).collect()
    }
}

/// Builds a [`Formula`] from a [`ModelConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FormulaBuilder;

impl FormulaBuilder {
    /// Create a new builder.
    pub const fn new() -> Self {
        Self
    }

    /// Translate the configuration into a term list.
    ///
    /// Features come first, then random effects, both in declaration order,
    /// followed by the intercept and the offset.
    pub fn build(&self, config: &ModelConfig) -> Result<Formula> {
        if config.features.is_empty() {
            return Err(ConfigError::EmptyTerms("feature"));
        }
        if config.random_effects.is_empty() {
            return Err(ConfigError::EmptyTerms("random effect"));
        }

        let mut terms = Vec::with_capacity(config.features.len() + config.random_effects.len() + 2);

        for feature in &config.features {
            if VariableType::from_name(&feature.variable_type).is_none() {
                return Err(ConfigError::UnsupportedVariableType {
                    feature: feature.name.clone(),
                    variable_type: feature.variable_type.clone(),
                });
            }
            let model = SmoothingModel::from_name(&feature.smoothing_model).ok_or_else(|| {
                ConfigError::UnknownSmoothingModel {
                    term: feature.name.clone(),
                    model: feature.smoothing_model.clone(),
                }
            })?;
            let bins = match feature.bins {
                Some(n) => Some(
                    NonZeroU32::new(n).ok_or_else(|| ConfigError::InvalidBins(feature.name.clone()))?,
                ),
                None => None,
            };
            terms.push(Term::Smooth(SmoothTerm {
                covariate: feature.name.clone(),
                bins,
                model,
                scale_model: feature.scale_model,
                cyclic: false,
                source: TermSource::Feature,
            }));
        }

        for effect in &config.random_effects {
            let model = match SmoothingModel::from_name(&effect.smoothing_model) {
                Some(m @ (SmoothingModel::Rw2 | SmoothingModel::Iid)) => m,
                _ => {
                    return Err(ConfigError::UnsupportedRandomEffectModel {
                        term: effect.name.clone(),
                        model: effect.smoothing_model.clone(),
                    });
                }
            };
            if effect.cyclic && !model.supports_cyclic() {
                debug!(term = %effect.name, %model, "Ignoring cyclic flag");
            }
            terms.push(Term::Smooth(SmoothTerm {
                covariate: effect.name.clone(),
                bins: None,
                model,
                scale_model: false,
                cyclic: effect.cyclic && model.supports_cyclic(),
                source: TermSource::RandomEffect,
            }));
        }

        terms.push(Term::Intercept);
        terms.push(Term::Offset(config.offset_expression.clone()));

        Ok(Formula {
            response: config.target.clone(),
            terms,
            prior: config.hyperparameters.clone(),
        })
    }
}
