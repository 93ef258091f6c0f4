//! Subcommand implementations.

use crate::SourceArgs;
use anyhow::{Context, bail};
use dengue::data::{CsvSource, DataSource, Dataset, SqliteSource};
use dengue::model::RunConfig;
use dengue::output::{ExportFormat, Exporter};
use dengue::{ForecastRun, RInlaBackend};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options of the `fit` subcommand.
#[derive(Debug)]
pub(crate) struct FitOptions {
    pub(crate) output: PathBuf,
    pub(crate) format: Option<ExportFormat>,
    pub(crate) work_dir: PathBuf,
    pub(crate) rscript: PathBuf,
}

fn load_run(config: &Path) -> anyhow::Result<ForecastRun> {
    let config = RunConfig::from_path(config)
        .with_context(|| format!("Failed to load configuration {}", config.display()))?;
    Ok(ForecastRun::from_config(config)?)
}

fn load_dataset(run: &ForecastRun, source: &SourceArgs) -> anyhow::Result<Dataset> {
    let name = source
        .table
        .as_deref()
        .unwrap_or(run.config().dataset.as_str());

    let dataset = match (&source.data, &source.database) {
        (Some(path), _) => CsvSource::new(path)
            .load(name)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, Some(path)) => SqliteSource::open(path)
            .and_then(|db| db.load(name))
            .with_context(|| format!("Failed to read `{name}` from {}", path.display()))?,
        (None, None) => bail!("Either --data or --database is required"),
    };
    Ok(dataset)
}

fn resolve_format(explicit: Option<ExportFormat>, output: &Path) -> ExportFormat {
    explicit
        .or_else(|| {
            output
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ExportFormat::from_extension)
        })
        .unwrap_or(ExportFormat::Csv)
}

pub(crate) fn formula(config: &Path) -> anyhow::Result<()> {
    let run = load_run(config)?;
    info!(terms = run.formula().terms().len(), "Built formula");
    println!("{}", run.rendered_formula());
    Ok(())
}

pub(crate) fn validate(config: &Path, source: &SourceArgs) -> anyhow::Result<()> {
    let run = load_run(config)?;
    let prepared = run.prepare(load_dataset(&run, source)?)?;

    println!("Configuration OK");
    println!("  Rows:        {}", prepared.height());
    println!("  Train rows:  {}", prepared.train_rows());
    println!("  Masked rows: {}", prepared.masked_rows());
    println!("  Columns:     {}", run.model_columns().join(", "));
    Ok(())
}

pub(crate) fn partition(config: &Path, source: &SourceArgs, output: &Path) -> anyhow::Result<()> {
    let run = load_run(config)?;
    let prepared = run.prepare(load_dataset(&run, source)?)?;
    let masked = prepared.masked_rows();
    let mut frame = prepared.into_frame();

    let mut file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    CsvWriter::new(&mut file).finish(&mut frame)?;

    info!(
        path = %output.display(),
        rows = frame.height(),
        masked,
        "Wrote partitioned dataset"
    );
    Ok(())
}

pub(crate) fn fit(config: &Path, source: &SourceArgs, options: FitOptions) -> anyhow::Result<()> {
    let run = load_run(config)?;
    let dataset = load_dataset(&run, source)?;
    let backend = RInlaBackend::new(&options.work_dir).with_rscript(&options.rscript);

    let outcome = run.run(&backend, dataset)?;

    let format = resolve_format(options.format, &options.output);
    outcome
        .forecasts
        .export_to_file(&options.output, format)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;

    println!("Forecast written to {}", options.output.display());
    println!("  Rows:   {}", outcome.forecasts.len());
    match &outcome.score {
        Some(score) => {
            println!("  MAE:            {:.3}", score.mae);
            println!("  Coverage (95%): {:.1}%", score.coverage * 100.0);
            println!("  Interval score: {:.3}", score.interval_score);
        }
        None => println!("  No observed values in the test window to score"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(None, Path::new("out/forecast.json")),
            ExportFormat::Json
        );
        assert_eq!(
            resolve_format(Some(ExportFormat::PrettyJson), Path::new("forecast.csv")),
            ExportFormat::PrettyJson
        );
        assert_eq!(resolve_format(None, Path::new("forecast")), ExportFormat::Csv);
    }
}
