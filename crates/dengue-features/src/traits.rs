//! Core feature traits.

use crate::error::Result;
use polars::prelude::*;
use std::fmt::Debug;

/// Broad family a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Smoothed weather and climate-index signals
    Climate,
    /// Serotype circulation history
    Serotype,
    /// Forecast horizon alignment
    Horizon,
}

/// A derived covariate computed from the weekly dataset.
///
/// Inputs are assumed to carry `year_week_key`; implementations sort by it
/// before any order-dependent computation.
pub trait Feature: Send + Sync + Debug {
    /// Unique feature name.
    fn name(&self) -> &str;

    /// Feature family.
    fn kind(&self) -> FeatureKind;

    /// Columns that must exist before [`Feature::compute`] runs.
    fn required_columns(&self) -> Vec<&str>;

    /// Columns added or replaced by [`Feature::compute`].
    fn output_columns(&self) -> Vec<String>;

    /// Add the feature columns to `data`, keeping every existing column.
    fn compute(&self, data: LazyFrame) -> Result<LazyFrame>;
}

/// A feature built from a serializable configuration.
pub trait ConfigurableFeature: Feature + Sized {
    /// Parameter type.
    type Config;

    /// Build the feature from its parameters.
    fn with_config(config: Self::Config) -> Self;

    /// Current parameters.
    fn config(&self) -> &Self::Config;
}
