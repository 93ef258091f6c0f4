//! Ordered application of features.

use crate::error::{FeatureError, Result};
use crate::horizon::{HorizonShift, HorizonShiftConfig};
use crate::registry::from_spec;
use crate::traits::{ConfigurableFeature, Feature};
use dengue_model::EngineeringSpec;
use polars::prelude::*;
use tracing::{debug, info};

/// Features applied in insertion order, each seeing the previous outputs.
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Features declared by the `engineering` section.
    pub fn from_specs(specs: &[EngineeringSpec]) -> Self {
        Self {
            features: specs.iter().map(from_spec).collect(),
        }
    }

    /// Append a horizon shift of `columns`; a no-op for horizon 0.
    pub fn with_horizon(mut self, columns: Vec<String>, horizon: u32) -> Self {
        if horizon > 0 {
            self.push(Box::new(HorizonShift::with_config(HorizonShiftConfig {
                columns,
                horizon,
            })));
        }
        self
    }

    /// Append a feature.
    pub fn push(&mut self, feature: Box<dyn Feature>) {
        self.features.push(feature);
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the set holds no feature.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every column the set adds or replaces.
    pub fn output_columns(&self) -> Vec<String> {
        self.features
            .iter()
            .flat_map(|f| f.output_columns())
            .collect()
    }

    /// Apply every feature to `frame`.
    pub fn apply(&self, frame: DataFrame) -> Result<DataFrame> {
        let mut frame = frame;
        for feature in &self.features {
            if let Some(column) = feature
                .required_columns()
                .into_iter()
                .find(|c| frame.get_column_index(c).is_none())
            {
                return Err(FeatureError::MissingColumn {
                    feature: feature.name().to_string(),
                    column: column.to_string(),
                });
            }
            frame = feature.compute(frame.lazy())?.collect()?;
            debug!(
                feature = feature.name(),
                outputs = ?feature.output_columns(),
                "Computed feature"
            );
        }
        if !self.is_empty() {
            info!(features = self.len(), "Applied derived covariates");
        }
        Ok(frame)
    }
}
