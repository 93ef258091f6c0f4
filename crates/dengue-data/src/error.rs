//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading, annotating or partitioning a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Row with a date that cannot be parsed
    #[error("Invalid date format in row {row}: '{value}'")]
    InvalidDateFormat {
        /// Zero-based row index
        row: usize,
        /// Offending value
        value: String,
    },

    /// Row with a year/week pair that does not name an ISO week
    #[error("Invalid epidemiological week in row {row}: year {year}, week {week}")]
    InvalidWeek {
        /// Zero-based row index
        row: usize,
        /// Year found in the row
        year: i64,
        /// Week found in the row
        week: i64,
    },

    /// Column required by the model is absent
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Neither `year` + week columns nor a `date` column exist
    #[error("Dataset has no date column and no year/epidemiological week columns")]
    MissingKeyColumns,

    /// Column whose type cannot be used
    #[error("Column '{column}' has unsupported type {dtype}")]
    UnsupportedColumnType {
        /// Column name
        column: String,
        /// Type found
        dtype: String,
    },

    /// Table or view name that is not a plain identifier
    #[error("Invalid table identifier: {0}")]
    InvalidIdentifier(String),
}
