//! Derived covariates declared in a run configuration.

use dengue_data::{Dataset, column_f64};
use dengue_features::FeatureSet;
use dengue_model::RunConfig;
use polars::prelude::*;

const CONFIG: &str = r#"
train: {start_time: 2023-01-01, end_time: 2023-02-01}
test: {start_time: 2023-02-01, end_time: 2023-03-01}
dataset: inla_model_ds
target: cases
model:
  horizon: 0
  inla:
    family: nbinomial
    offset: log(population / 100000)
    control: {}
  hyperparameters:
    - prec: {prior: pc.prec, param: [0.5, 0.01]}
features:
  - {name: max_t_scale_3_wk_avg_0, variable_type: group, bins: 10, model: rw2, scale_model: true}
  - {name: days_since_switch, variable_type: group, model: rw1, scale_model: false}
random_effects:
  - {name: year, model: iid}
engineering:
  - {kind: rolling_mean, source: dbt_max, prefix: max_t_scale, window: 3, mean_center: true}
  - {kind: days_since_switch, source: dominant_serotype}
"#;

#[test]
fn test_configured_features_produce_model_columns() {
    let config = RunConfig::from_yaml_str(CONFIG).unwrap();
    let frame = df!(
        "year" => [2023i64; 6],
        "eweek" => [1i64, 2, 3, 4, 5, 6],
        "cases" => [5i64, 7, 9, 4, 3, 8],
        "dbt_max" => [30.0, 32.0, 34.0, 30.0, 28.0, 26.0],
        "dominant_serotype" => ["D1", "D1", "D2", "D2", "D2", "D1,D2"],
    )
    .unwrap();
    let dataset = Dataset::new(frame).annotate().unwrap();

    let set = FeatureSet::from_specs(&config.engineering);
    let out = Dataset::new(set.apply(dataset.into_frame()).unwrap());

    let names: Vec<&str> = config.features.iter().map(|f| f.name.as_str()).collect();
    out.require_columns(names).unwrap();

    // mean is 30, so the centered series is [0, 2, 4, 0, -2, -4]
    assert_eq!(
        column_f64(out.frame(), "max_t_scale_3_wk_avg_0").unwrap(),
        vec![Some(0.0), Some(1.0), Some(2.0), Some(2.0), Some(2.0 / 3.0), Some(-2.0)]
    );
    assert_eq!(
        column_f64(out.frame(), "days_since_switch").unwrap(),
        vec![Some(0.0), Some(7.0), Some(0.0), Some(7.0), Some(14.0), Some(0.0)]
    );
}
