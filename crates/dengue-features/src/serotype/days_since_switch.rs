//! Days since the dominant serotype last changed.
//!
//! The source column holds the dominant serotype(s) of each week, e.g. `D2`
//! or `1,3` when several serotypes tie. Labels are compared as sets, so
//! `D3,D1` and `1,3` denote the same week state.

use crate::error::Result;
use crate::traits::{ConfigurableFeature, Feature, FeatureKind};
use dengue_data::YEAR_WEEK_KEY;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Output column name.
pub const DAYS_SINCE_SWITCH: &str = "days_since_switch";

const DAYS_PER_WEEK: i64 = 7;

/// Configuration for the DaysSinceSwitch feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysSinceSwitchConfig {
    /// Column holding the dominant serotype label(s)
    pub source: String,
}

impl Default for DaysSinceSwitchConfig {
    fn default() -> Self {
        Self {
            source: "dominant_serotype".to_string(),
        }
    }
}

/// DaysSinceSwitch counts days since the dominant serotype set changed
#[derive(Debug)]
pub struct DaysSinceSwitch {
    config: DaysSinceSwitchConfig,
}

impl Feature for DaysSinceSwitch {
    fn name(&self) -> &str {
        DAYS_SINCE_SWITCH
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Serotype
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![YEAR_WEEK_KEY, self.config.source.as_str()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![DAYS_SINCE_SWITCH.to_string()]
    }

    fn compute(&self, data: LazyFrame) -> Result<LazyFrame> {
        let mut frame = data.sort(
            [YEAR_WEEK_KEY],
            SortMultipleOptions::default().with_maintain_order(true),
        ).collect()?;
        let labels = frame
            .column(&self.config.source)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let days = days_since_switch(labels.str()?.into_iter());
        frame.with_column(Series::new(DAYS_SINCE_SWITCH.into(), days))?;
        Ok(frame.lazy())
    }
}

impl ConfigurableFeature for DaysSinceSwitch {
    type Config = DaysSinceSwitchConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

impl Default for DaysSinceSwitch {
    fn default() -> Self {
        Self::with_config(DaysSinceSwitchConfig::default())
    }
}

/// Days since the serotype set last changed, one value per week.
///
/// The counter starts at 0, grows by 7 every week and resets to 0 whenever
/// the set differs from the previous week. A missing label always yields 0.
///
/// A week with several dominant serotypes that follows a week with a single
/// one keeps the previous serotype when it is among the current ones, so a
/// tie is not counted as a switch.
pub fn days_since_switch<'a, I>(labels: I) -> Vec<i64>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut previous_raw = BTreeSet::new();
    let mut previous: Option<BTreeSet<String>> = None;
    let mut days = 0;
    labels
        .into_iter()
        .map(|label| {
            let raw = serotype_set(label);
            let tie = raw.len() > 1 && previous_raw.len() == 1 && previous_raw.is_subset(&raw);
            let current = if tie {
                previous_raw.clone()
            } else {
                raw.clone()
            };
            if current.is_empty() || previous.as_ref() != Some(&current) {
                days = 0;
            }
            let out = days;
            days += DAYS_PER_WEEK;
            previous = Some(current);
            previous_raw = raw;
            out
        })
        .collect()
}

fn serotype_set(label: Option<&str>) -> BTreeSet<String> {
    label
        .unwrap_or_default()
        .split([',', ';', '/', ' '])
        .map(|s| s.trim().trim_start_matches(['D', 'd']))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
