//! Trailing rolling average of a weekly signal.
//!
//! Used for temperature (`max_t_scale_12_wk_avg_0`) and ENSO indices
//! (`nino34_12_wk_avg_4`). Partial windows at the start of the series
//! average whatever weeks are available.

use crate::error::{FeatureError, Result};
use crate::traits::{ConfigurableFeature, Feature, FeatureKind};
use dengue_data::YEAR_WEEK_KEY;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for the RollingAverage feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingAverageConfig {
    /// Column to average
    pub source: String,
    /// Output name prefix
    pub prefix: String,
    /// Window length in weeks (default: 12)
    pub window: usize,
    /// Weeks to lag the average by (default: 0)
    pub lag: usize,
    /// Subtract the series mean first (default: false)
    pub mean_center: bool,
}

impl RollingAverageConfig {
    /// Average `source` over `window` weeks, written as `{prefix}_{window}_wk_avg_0`.
    pub fn new(source: impl Into<String>, prefix: impl Into<String>, window: usize) -> Self {
        Self {
            source: source.into(),
            prefix: prefix.into(),
            window,
            lag: 0,
            mean_center: false,
        }
    }
}

/// RollingAverage computes a lagged trailing mean of one column
#[derive(Debug)]
pub struct RollingAverage {
    config: RollingAverageConfig,
    output: String,
}

impl RollingAverage {
    /// Output column name.
    pub fn output_name(&self) -> &str {
        &self.output
    }
}

impl Feature for RollingAverage {
    fn name(&self) -> &str {
        "rolling_mean"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Climate
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![YEAR_WEEK_KEY, self.config.source.as_str()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.output.clone()]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let config = &self.config;
        if config.window == 0 {
            return Err(FeatureError::InvalidParameter {
                feature: self.output.clone(),
                reason: "window must be a positive number of weeks".to_string(),
            });
        }
        let lag = i64::try_from(config.lag).map_err(|_| FeatureError::InvalidParameter {
            feature: self.output.clone(),
            reason: format!("lag {} is too large", config.lag),
        })?;

        let mut value = col(config.source.as_str()).cast(DataType::Float64);
        if config.mean_center {
            value = value.clone() - value.mean();
        }

        let average = value
            .rolling_mean(RollingOptionsFixedWindow {
                window_size: config.window,
                min_periods: 1,
                ..Default::default()
            })
            .shift_and_fill(lit(lag), lit(0.0))
            .alias(self.output.as_str());

        Ok(data
            .sort(
                [YEAR_WEEK_KEY],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .with_column(average))
    }
}

impl ConfigurableFeature for RollingAverage {
    type Config = RollingAverageConfig;

    fn with_config(config: Self::Config) -> Self {
        let output = format!("{}_{}_wk_avg_{}", config.prefix, config.window, config.lag);
        Self { config, output }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use dengue_data::column_f64;

    fn weekly(values: &[f64]) -> LazyFrame {
        let keys: Vec<i64> = (1..=values.len() as i64).map(|w| 202300 + w).collect();
        df!(YEAR_WEEK_KEY => keys, "dbt_max" => values.to_vec())
            .unwrap()
            .lazy()
    }

    fn run(config: RollingAverageConfig, values: &[f64]) -> Vec<f64> {
        let feature = RollingAverage::with_config(config);
        let frame = feature.compute(weekly(values)).unwrap().collect().unwrap();
        column_f64(&frame, feature.output_name())
            .unwrap()
            .into_iter()
            .map(Option::unwrap)
            .collect()
    }

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(*a, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_output_name() {
        let mut config = RollingAverageConfig::new("nino34", "nino34", 12);
        config.lag = 4;
        let feature = RollingAverage::with_config(config);
        assert_eq!(feature.output_name(), "nino34_12_wk_avg_4");
        assert_eq!(feature.required_columns(), vec![YEAR_WEEK_KEY, "nino34"]);
    }

    #[test]
    fn test_partial_windows() {
        let config = RollingAverageConfig::new("dbt_max", "max_t", 3);
        let out = run(config, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_all_close(&out, &[1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_lag_fills_with_zero() {
        let mut config = RollingAverageConfig::new("dbt_max", "max_t", 3);
        config.lag = 1;
        let out = run(config, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_all_close(&out, &[0.0, 1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_mean_centering() {
        let mut config = RollingAverageConfig::new("dbt_max", "max_t_scale", 2);
        config.mean_center = true;
        let out = run(config, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_all_close(&out, &[-2.0, -1.5, -0.5, 0.5, 1.5]);
    }

    #[test]
    fn test_sorts_by_week_first() {
        let frame = df!(
            YEAR_WEEK_KEY => [202303i64, 202301, 202302],
            "dbt_max" => [30.0, 10.0, 20.0],
        )
        .unwrap();
        let feature = RollingAverage::with_config(RollingAverageConfig::new("dbt_max", "t", 2));
        let out = feature.compute(frame.lazy()).unwrap().collect().unwrap();
        assert_eq!(
            column_f64(&out, "t_2_wk_avg_0").unwrap(),
            vec![Some(10.0), Some(15.0), Some(25.0)]
        );
    }

    #[test]
    fn test_repeated_weeks_keep_input_order() {
        let frame = df!(
            YEAR_WEEK_KEY => [202302i64, 202301, 202301],
            "dbt_max" => [30.0, 10.0, 20.0],
        )
        .unwrap();
        let feature = RollingAverage::with_config(RollingAverageConfig::new("dbt_max", "t", 2));
        let out = feature.compute(frame.lazy()).unwrap().collect().unwrap();
        assert_eq!(
            column_f64(&out, "t_2_wk_avg_0").unwrap(),
            vec![Some(10.0), Some(15.0), Some(25.0)]
        );
    }

    #[test]
    fn test_zero_window_rejected() {
        let feature = RollingAverage::with_config(RollingAverageConfig::new("dbt_max", "t", 0));
        assert!(matches!(
            feature.compute(weekly(&[1.0])),
            Err(FeatureError::InvalidParameter { .. })
        ));
    }
}
