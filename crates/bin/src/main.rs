//! Dengue CLI binary.
//!
//! Builds INLA formulas, partitions datasets and runs forecasts from a YAML
//! run configuration.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dengue::output::ExportFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dengue")]
#[command(about = "Weekly dengue case forecasting with R-INLA", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the modelling dataset comes from.
#[derive(Args, Debug)]
struct SourceArgs {
    /// CSV export of the dataset
    #[arg(long, conflicts_with = "database")]
    data: Option<PathBuf>,

    /// SQLite database holding the dataset
    #[arg(long)]
    database: Option<PathBuf>,

    /// Table or view to read instead of the configured `dataset`
    #[arg(long, requires = "database")]
    table: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the model formula in R-INLA syntax
    Formula {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Check a configuration against a dataset
    Validate {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Write the dataset with the test window masked
    Partition {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Fit the model and write forecasts
    Fit {
        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// Forecast output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format, guessed from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Directory for the files exchanged with R
        #[arg(long, default_value = "inla-work")]
        work_dir: PathBuf,

        /// Rscript executable
        #[arg(long, default_value = "Rscript")]
        rscript: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
    PrettyJson,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
            FormatArg::PrettyJson => Self::PrettyJson,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dengue=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Formula { config } => commands::formula(&config)?,
        Commands::Validate { config, source } => commands::validate(&config, &source)?,
        Commands::Partition {
            config,
            source,
            output,
        } => commands::partition(&config, &source, &output)?,
        Commands::Fit {
            config,
            source,
            output,
            format,
            work_dir,
            rscript,
        } => {
            let options = commands::FitOptions {
                output,
                format: format.map(Into::into),
                work_dir,
                rscript,
            };
            commands::fit(&config, &source, options)?;
        }
    }

    Ok(())
}
