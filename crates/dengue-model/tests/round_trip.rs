//! Integration tests for configuration round trips and formula rendering.

use dengue_model::{
    ConfigError, FormulaBuilder, FormulaSyntax, InlaSyntax, RunConfig, Term, TermSource,
};

const WEEKLY_YAML: &str = r#"
train:
  start_time: 2015-01-01
  end_time: 2022-12-31
test:
  start_time: 2023-01-01
  end_time: 2023-12-31
dataset: national_analysis.inla_model_ds
target: cases
model:
  horizon: 4
  inla:
    family: nbinomial
    offset: log(population / 100000)
    verbose: true
    control:
      compute:
        dic: true
        cpo: false
      predictor:
        compute: true
        link: 1
      inla:
        strategy: adaptive
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
  - name: days_since_switch
    variable_type: group
    model: rw1
    scale_model: false
random_effects:
  - name: eweek
    model: rw2
    cyclic: true
  - name: year
    model: iid
engineering:
  - kind: rolling_mean
    source: dbt_max
    prefix: max_t_scale
    window: 12
    mean_center: true
"#;

fn render(config: &RunConfig) -> String {
    let model = config.model_config().unwrap();
    let formula = FormulaBuilder::new().build(&model).unwrap();
    InlaSyntax::new().render(&formula)
}

#[test]
fn test_yaml_round_trip_builds_identical_formula() {
    let original = RunConfig::from_yaml_str(WEEKLY_YAML).unwrap();
    let serialized = original.to_yaml_string().unwrap();
    let reparsed = RunConfig::from_yaml_str(&serialized).unwrap();

    assert_eq!(original, reparsed);
    assert_eq!(render(&original), render(&reparsed));

    let twice = RunConfig::from_yaml_str(&reparsed.to_yaml_string().unwrap()).unwrap();
    assert_eq!(render(&twice), render(&original));
}

#[test]
fn test_terms_follow_declaration_order() {
    let model = RunConfig::from_yaml_str(WEEKLY_YAML)
        .unwrap()
        .model_config()
        .unwrap();
    let formula = FormulaBuilder::new().build(&model).unwrap();

    // 2 features + 2 random effects + intercept + offset
    assert_eq!(formula.terms().len(), 6);
    let sources: Vec<_> = formula.smooth_terms().map(|t| t.source).collect();
    assert_eq!(
        sources,
        vec![
            TermSource::Feature,
            TermSource::Feature,
            TermSource::RandomEffect,
            TermSource::RandomEffect
        ]
    );
    assert_eq!(
        formula.covariates(),
        vec!["max_t_scale_12_wk_avg_0", "days_since_switch", "eweek", "year"]
    );
    assert!(matches!(formula.terms()[4], Term::Intercept));
    assert!(matches!(formula.terms()[5], Term::Offset(_)));
}

#[test]
fn test_rendered_formula_shape() {
    let rendered = render(&RunConfig::from_yaml_str(WEEKLY_YAML).unwrap());
    assert!(rendered.starts_with("cases ~ f(inla.group(max_t_scale_12_wk_avg_0, n = 18)"));
    assert!(rendered.contains("f(days_since_switch, model = \"rw1\", hyper"));
    assert!(rendered.contains("f(eweek, model = \"rw2\", cyclic = TRUE"));
    assert!(rendered.ends_with(" + 1 + offset(log(population / 100000))"));
    assert_eq!(rendered.matches(" + ").count(), 5);
}

#[test]
fn test_control_passthrough_renders_every_group() {
    let config = RunConfig::from_yaml_str(WEEKLY_YAML).unwrap();
    let args = InlaSyntax::new().render_control(&config.model.inla.control);
    assert_eq!(
        args,
        vec![
            "control.compute = list(dic = TRUE, cpo = FALSE)".to_string(),
            "control.inla = list(strategy = \"adaptive\")".to_string(),
            "control.predictor = list(compute = TRUE, link = 1)".to_string(),
        ]
    );
}

#[test]
fn test_unsupported_variable_type_is_fatal() {
    let yaml = WEEKLY_YAML.replacen("variable_type: group", "variable_type: numeric", 1);
    let model = RunConfig::from_yaml_str(&yaml)
        .unwrap()
        .model_config()
        .unwrap();
    let err = FormulaBuilder::new().build(&model).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVariableType { .. }));
    assert!(err.to_string().contains("max_t_scale_12_wk_avg_0"));
}
