//! Forecast horizon alignment.
//!
//! With horizon `h`, the row for week `t` receives the covariates observed
//! at `t - h`. The first `h` weeks have no such history and are left null.

use crate::error::{FeatureError, Result};
use crate::traits::{ConfigurableFeature, Feature, FeatureKind};
use dengue_data::YEAR_WEEK_KEY;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the HorizonShift feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizonShiftConfig {
    /// Covariates to lag, shifted in place
    pub columns: Vec<String>,
    /// Weeks ahead being forecast
    pub horizon: u32,
}

/// HorizonShift lags model covariates by the forecast horizon
#[derive(Debug)]
pub struct HorizonShift {
    config: HorizonShiftConfig,
}

impl Feature for HorizonShift {
    fn name(&self) -> &str {
        "horizon_shift"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Horizon
    }

    fn required_columns(&self) -> Vec<&str> {
        std::iter::once(YEAR_WEEK_KEY)
            .chain(self.config.columns.iter().map(String::as_str))
            .collect()
    }

    fn output_columns(&self) -> Vec<String> {
        self.config.columns.clone()
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        if self.config.horizon == 0 || self.config.columns.is_empty() {
            return Ok(data);
        }
        if self.config.columns.iter().any(|c| c == YEAR_WEEK_KEY) {
            return Err(FeatureError::InvalidParameter {
                feature: self.name().to_string(),
                reason: format!("{YEAR_WEEK_KEY} cannot be shifted"),
            });
        }
        let weeks = i64::from(self.config.horizon);
        let shifted: Vec<Expr> = self
            .config
            .columns
            .iter()
            .map(|c| col(c.as_str()).shift(lit(weeks)).alias(c.as_str()))
            .collect();
        Ok(data
            .sort(
                [YEAR_WEEK_KEY],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_columns(shifted))
    }
}

impl ConfigurableFeature for HorizonShift {
    type Config = HorizonShiftConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
