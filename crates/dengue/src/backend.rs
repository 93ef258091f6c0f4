//! Inference backends.
//!
//! A backend receives the masked dataset and the model formula and returns
//! one posterior summary per input row, in input order.

use dengue_model::syntax::quote;
use dengue_model::{Formula, FormulaSyntax, InlaOptions, InlaSyntax};
use polars::prelude::*;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Dataset handed to R.
pub const DATA_FILE: &str = "data.csv";

/// Generated R script.
pub const SCRIPT_FILE: &str = "model.R";

/// Posterior summaries written back by R.
pub const FITTED_FILE: &str = "fitted.csv";

const STDERR_TAIL_LINES: usize = 20;

/// Errors raised while fitting the model.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The backend executable could not be started
    #[error("Failed to launch {program}: {source}")]
    Launch {
        /// Executable
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backend process failed
    #[error("Backend exited with status {status:?}: {stderr}")]
    Process {
        /// Exit code, if the process was not killed by a signal
        status: Option<i32>,
        /// Last lines of standard error
        stderr: String,
    },

    /// Output file without the expected columns
    #[error("Malformed backend output: {0}")]
    MalformedOutput(String),

    /// Output row count differs from the input
    #[error("Backend returned {actual} rows for {expected} input rows")]
    RowMismatch {
        /// Input rows
        expected: usize,
        /// Returned rows
        actual: usize,
    },

    /// NaN or infinite posterior summary
    #[error("Backend returned a non-finite value in row {row}")]
    NonFinite {
        /// Zero-based row index
        row: usize,
    },
}

/// Posterior summary of one fitted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedValue {
    /// Posterior mean
    pub mean: f64,
    /// 2.5% quantile
    pub lower_bound: f64,
    /// 97.5% quantile
    pub upper_bound: f64,
}

impl FittedValue {
    /// Whether every field is finite.
    pub const fn is_finite(&self) -> bool {
        self.mean.is_finite() && self.lower_bound.is_finite() && self.upper_bound.is_finite()
    }
}

/// Everything a backend needs to fit the model.
#[derive(Debug, Clone, Copy)]
pub struct FitRequest<'a> {
    /// Masked dataset, every row
    pub frame: &'a DataFrame,
    /// Model formula
    pub formula: &'a Formula,
    /// Likelihood family and backend options
    pub options: &'a InlaOptions,
}

/// Fitted values in input row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOutput {
    values: Vec<FittedValue>,
}

impl FitOutput {
    /// Wrap fitted values.
    pub const fn new(values: Vec<FittedValue>) -> Self {
        Self { values }
    }

    /// Fitted values.
    pub fn values(&self) -> &[FittedValue] {
        &self.values
    }

    /// Number of fitted rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no row was fitted.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check the row count and that every value is finite.
    pub fn validate(&self, expected_rows: usize) -> Result<(), InferenceError> {
        if self.values.len() != expected_rows {
            return Err(InferenceError::RowMismatch {
                expected: expected_rows,
                actual: self.values.len(),
            });
        }
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(row) => Err(InferenceError::NonFinite { row }),
            None => Ok(()),
        }
    }
}

/// Fits the model and returns per-row posterior summaries.
pub trait InferenceBackend {
    /// Backend name for logs and reports.
    fn name(&self) -> &str;

    /// Fit the model described by `request`.
    fn fit(&self, request: &FitRequest<'_>) -> Result<FitOutput, InferenceError>;
}

/// R-INLA driven through `Rscript`.
///
/// Each fit writes [`DATA_FILE`] and [`SCRIPT_FILE`] into the work
/// directory, runs the script there and reads [`FITTED_FILE`].
#[derive(Debug, Clone)]
pub struct RInlaBackend {
    rscript: PathBuf,
    work_dir: PathBuf,
    syntax: InlaSyntax,
}

impl RInlaBackend {
    /// Backend using `Rscript` from `PATH`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            rscript: PathBuf::from("Rscript"),
            work_dir: work_dir.into(),
            syntax: InlaSyntax::new(),
        }
    }

    /// Use a specific `Rscript` executable.
    pub fn with_rscript(mut self, rscript: impl Into<PathBuf>) -> Self {
        self.rscript = rscript.into();
        self
    }

    /// Directory holding the exchanged files.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// The R program fitting `request`.
    pub fn render_script(&self, request: &FitRequest<'_>) -> String {
        let options = request.options;
        let mut args = vec![
            "formula".to_string(),
            "data = data".to_string(),
            format!("family = {}", quote(&options.family)),
        ];
        args.extend(self.syntax.render_control(&control_with_predictor(&options.control)));
        if let Some(threads) = options.num_threads {
            args.push(format!("num.threads = {threads}"));
        }
        args.push(format!(
            "verbose = {}",
            if options.verbose { "TRUE" } else { "FALSE" }
        ));

        let mut script = String::new();
        script.push_str("suppressPackageStartupMessages(library(INLA))\n\n");
        script.push_str(&format!(
            "data <- read.csv({}, check.names = FALSE)\n",
            quote(DATA_FILE)
        ));
        script.push_str(&format!(
            "formula <- {}\n\n",
            self.syntax.render(request.formula)
        ));
        script.push_str(&format!("fit <- inla(\n  {}\n)\n\n", args.join(",\n  ")));
        script.push_str("fitted <- fit$summary.fitted.values\n");
        script.push_str("out <- data.frame(\n");
        script.push_str("  mean = fitted[[\"mean\"]],\n");
        script.push_str("  lower_bound = fitted[[\"0.025quant\"]],\n");
        script.push_str("  upper_bound = fitted[[\"0.975quant\"]]\n");
        script.push_str(")\n");
        script.push_str(&format!(
            "write.csv(out, {}, row.names = FALSE)\n",
            quote(FITTED_FILE)
        ));
        script
    }

    fn write_data(&self, frame: &DataFrame) -> Result<(), InferenceError> {
        let mut file = File::create(self.work_dir.join(DATA_FILE))?;
        let mut frame = frame.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)?;
        Ok(())
    }

    fn run_script(&self) -> Result<(), InferenceError> {
        let output = Command::new(&self.rscript)
            .arg(SCRIPT_FILE)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|source| InferenceError::Launch {
                program: self.rscript.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(InferenceError::Process {
                status: output.status.code(),
                stderr: tail,
            });
        }
        debug!(stdout = %String::from_utf8_lossy(&output.stdout), "Rscript finished");
        Ok(())
    }

    /// Read `mean`, `lower_bound` and `upper_bound` from a fitted-values CSV.
    ///
    /// `NA` and other unparseable cells become NaN and are reported by
    /// [`FitOutput::validate`].
    pub fn read_fitted(path: &Path) -> Result<FitOutput, InferenceError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let index = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| InferenceError::MalformedOutput(format!("missing column '{name}'")))
        };
        let (mean, lower, upper) = (index("mean")?, index("lower_bound")?, index("upper_bound")?);

        let parse = |record: &csv::StringRecord, i: usize| {
            record
                .get(i)
                .and_then(|cell| cell.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        let values = reader
            .records()
            .map(|record| {
                let record = record?;
                Ok(FittedValue {
                    mean: parse(&record, mean),
                    lower_bound: parse(&record, lower),
                    upper_bound: parse(&record, upper),
                })
            })
            .collect::<Result<Vec<_>, InferenceError>>()?;
        Ok(FitOutput::new(values))
    }
}

impl InferenceBackend for RInlaBackend {
    fn name(&self) -> &str {
        "r-inla"
    }

    fn fit(&self, request: &FitRequest<'_>) -> Result<FitOutput, InferenceError> {
        fs::create_dir_all(&self.work_dir)?;
        let fitted_path = self.work_dir.join(FITTED_FILE);
        match fs::remove_file(&fitted_path) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        self.write_data(request.frame)?;
        fs::write(self.work_dir.join(SCRIPT_FILE), self.render_script(request))?;
        info!(
            backend = self.name(),
            work_dir = %self.work_dir.display(),
            rows = request.frame.height(),
            family = %request.options.family,
            "Fitting model"
        );

        self.run_script()?;
        let output = Self::read_fitted(&fitted_path)?;
        output.validate(request.frame.height())?;
        Ok(output)
    }
}

/// `control` with `predictor = list(compute = TRUE, link = 1)` added when
/// absent, so rows with a masked response receive fitted values.
pub fn control_with_predictor(control: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut control = control.clone();
    control.entry("predictor".to_string()).or_insert_with(|| {
        let mut predictor = Mapping::new();
        predictor.insert(Value::from("compute"), Value::from(true));
        predictor.insert(Value::from("link"), Value::from(1));
        Value::Mapping(predictor)
    });
    control
}
