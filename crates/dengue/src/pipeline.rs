//! End-to-end forecasting run.

use crate::backend::{FitRequest, InferenceBackend, InferenceError};
use crate::error::{Error, Result};
use dengue_data::{Dataset, PartitionedDataset, Partitioner, RESPONSE_ACTUAL, column_f64};
use dengue_features::FeatureSet;
use dengue_model::{Formula, FormulaBuilder, FormulaSyntax, InlaSyntax, ModelConfig, RunConfig};
use dengue_output::{ForecastRow, ForecastScore};
use tracing::{info, warn};

/// A validated run configuration with its formula and derived covariates.
#[derive(Debug)]
pub struct ForecastRun {
    config: RunConfig,
    model: ModelConfig,
    formula: Formula,
    features: FeatureSet,
    partitioner: Partitioner,
}

/// Result of [`ForecastRun::execute`].
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// One row per dataset row, in dataset order
    pub forecasts: Vec<ForecastRow>,
    /// Score over masked rows with a known response
    pub score: Option<ForecastScore>,
}

impl ForecastRun {
    /// Validate `config` and build the formula.
    pub fn from_config(config: RunConfig) -> Result<Self> {
        let model = config.model_config()?;
        let formula = FormulaBuilder::new().build(&model)?;
        let covariates = model.features.iter().map(|f| f.name.clone()).collect();
        let features = FeatureSet::from_specs(&config.engineering).with_horizon(covariates, model.horizon);
        let partitioner = Partitioner::new(&model.train_window, &model.test_window);

        info!(
            response = %model.target,
            horizon = model.horizon,
            terms = formula.terms().len(),
            derived = features.len(),
            "Prepared forecasting run"
        );
        Ok(Self {
            config,
            model,
            formula,
            features,
            partitioner,
        })
    }

    /// Run configuration.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Validated model configuration.
    pub const fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// Model formula.
    pub const fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Formula in R-INLA syntax.
    pub fn rendered_formula(&self) -> String {
        InlaSyntax::new().render(&self.formula)
    }

    /// Columns the fitted model reads: response, covariates and random effects.
    pub fn model_columns(&self) -> Vec<&str> {
        std::iter::once(self.model.target.as_str())
            .chain(self.formula.covariates())
            .collect()
    }

    /// Annotate `dataset`, compute derived covariates and check model columns.
    pub fn engineer(&self, dataset: Dataset) -> Result<Dataset> {
        let dataset = if dataset.is_annotated() {
            dataset
        } else {
            dataset.annotate()?
        };
        let dataset = Dataset::new(self.features.apply(dataset.into_frame())?);
        dataset.require_columns(self.model_columns())?;
        Ok(dataset)
    }

    /// [`Self::engineer`] followed by masking of the test window.
    pub fn prepare(&self, dataset: Dataset) -> Result<PartitionedDataset> {
        let dataset = self.engineer(dataset)?;
        let prepared = self.partitioner.partition(dataset, &self.model.target)?;
        if prepared.masked_rows() == 0 {
            warn!("No rows fall inside the test window; nothing will be forecast");
        }
        Ok(prepared)
    }

    /// Fit `prepared` with `backend`, then score the masked rows.
    pub fn execute<B>(&self, backend: &B, prepared: &PartitionedDataset) -> Result<RunOutcome>
    where
        B: InferenceBackend + ?Sized,
    {
        let request = FitRequest {
            frame: prepared.frame(),
            formula: &self.formula,
            options: &self.config.model.inla,
        };
        let output = backend
            .fit(&request)
            .and_then(|output| output.validate(prepared.height()).map(|()| output))
            .map_err(|source| self.fit_error(prepared, source))?;

        let forecasts: Vec<ForecastRow> = prepared
            .dates()
            .iter()
            .copied()
            .zip(output.values())
            .map(|(date, v)| ForecastRow::new(date, v.mean, v.lower_bound, v.upper_bound))
            .collect();

        let actual = column_f64(prepared.frame(), RESPONSE_ACTUAL)?;
        let score = ForecastScore::from_pairs(
            prepared
                .test_mask()
                .iter()
                .zip(&actual)
                .zip(&forecasts)
                .filter_map(|((masked, actual), forecast)| match (*masked, actual) {
                    (true, Some(value)) => Some((*value, forecast)),
                    _ => None,
                }),
        );
        if let Some(score) = &score {
            info!(
                backend = backend.name(),
                rows = score.evaluated_rows,
                mae = score.mae,
                coverage = score.coverage,
                interval_score = score.interval_score,
                "Scored test window"
            );
        }

        Ok(RunOutcome { forecasts, score })
    }

    fn fit_error(&self, prepared: &PartitionedDataset, source: InferenceError) -> Error {
        Error::Fit {
            covariates: self.formula.covariates().into_iter().map(str::to_string).collect(),
            train: prepared.train(),
            test: prepared.test(),
            source,
        }
    }

    /// [`Self::prepare`] then [`Self::execute`].
    pub fn run<B>(&self, backend: &B, dataset: Dataset) -> Result<RunOutcome>
    where
        B: InferenceBackend + ?Sized,
    {
        let prepared = self.prepare(dataset)?;
        self.execute(backend, &prepared)
    }
}
