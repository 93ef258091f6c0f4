//! Weekly modelling dataset.

use crate::error::{DataError, Result};
use crate::week::YearWeek;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Derived sortable week key column.
pub const YEAR_WEEK_KEY: &str = "year_week_key";

/// Copy of the response taken before masking.
pub const RESPONSE_ACTUAL: &str = "response_actual";

/// Observation date column.
pub const DATE: &str = "date";

/// ISO year column.
pub const YEAR: &str = "year";

/// Accepted names for the epidemiological week column, in lookup order.
pub const WEEK_COLUMNS: [&str; 2] = ["eweek", "epidemiological_week"];

/// Days from 0001-01-01 to 1970-01-01, the epoch of polars `Date`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Ordered weekly observations.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    /// Wrap an existing frame.
    pub const fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Read a CSV export with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        info!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "Loaded dataset"
        );
        Ok(Self::new(frame))
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume the dataset, returning the frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Fail with [`DataError::MissingColumn`] on the first absent column.
    pub fn require_columns<'a, I>(&self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match columns.into_iter().find(|c| !self.has_column(c)) {
            Some(missing) => Err(DataError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Whether [`Self::annotate`] has run.
    pub fn is_annotated(&self) -> bool {
        self.has_column(YEAR_WEEK_KEY)
    }

    /// ISO week of every row.
    ///
    /// Uses `year` with `eweek`/`epidemiological_week` when present, the
    /// `date` column otherwise.
    pub fn weeks(&self) -> Result<Vec<YearWeek>> {
        let week_column = WEEK_COLUMNS.into_iter().find(|c| self.has_column(c));
        if self.has_column(YEAR)
            && let Some(week_column) = week_column
        {
            return self.weeks_from_columns(week_column);
        }
        if self.has_column(DATE) {
            return Ok(self
                .dates()?
                .into_iter()
                .map(YearWeek::from_date)
                .collect());
        }
        Err(DataError::MissingKeyColumns)
    }

    fn weeks_from_columns(&self, week_column: &str) -> Result<Vec<YearWeek>> {
        let years = self.frame.column(YEAR)?.as_materialized_series().cast(&DataType::Int64)?;
        let weeks = self
            .frame
            .column(week_column)?
            .as_materialized_series()
            .cast(&DataType::Int64)?;

        years
            .i64()?
            .into_iter()
            .zip(weeks.i64()?.into_iter())
            .enumerate()
            .map(|(row, pair)| match pair {
                (Some(year), Some(week)) => i32::try_from(year)
                    .ok()
                    .zip(u32::try_from(week).ok())
                    .and_then(|(y, w)| YearWeek::new(y, w))
                    .ok_or(DataError::InvalidWeek { row, year, week }),
                _ => Err(DataError::InvalidDateFormat {
                    row,
                    value: "<null>".to_string(),
                }),
            })
            .collect()
    }

    /// Parsed `date` column.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let series = self.frame.column(DATE)?.as_materialized_series();
        match series.dtype() {
            DataType::String => series
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| parse_date(row, value))
                .collect(),
            DataType::Date => {
                let days = series.cast(&DataType::Int32)?;
                days.i32()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        value
                            .and_then(|d| {
                                NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)
                            })
                            .ok_or_else(|| DataError::InvalidDateFormat {
                                row,
                                value: format!("{value:?}"),
                            })
                    })
                    .collect()
            }
            other => Err(DataError::UnsupportedColumnType {
                column: DATE.to_string(),
                dtype: other.to_string(),
            }),
        }
    }

    /// Add `year_week_key` (and `date` when absent) and sort rows by key.
    pub fn annotate(mut self) -> Result<Self> {
        let weeks = self.weeks()?;
        let keys: Vec<i64> = weeks.iter().map(YearWeek::key).collect();

        let distinct: HashSet<i64> = keys.iter().copied().collect();
        if distinct.len() != keys.len() {
            warn!(
                rows = keys.len(),
                distinct = distinct.len(),
                "Dataset has repeated year-week keys"
            );
        }

        self.frame
            .with_column(Series::new(YEAR_WEEK_KEY.into(), keys))?;
        if !self.has_column(DATE) {
            let mondays: Vec<NaiveDate> = weeks.iter().map(YearWeek::monday).collect();
            self.frame.with_column(Series::new(DATE.into(), mondays))?;
        }

        let frame = self
            .frame
            .lazy()
            .sort(
                [YEAR_WEEK_KEY],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(Self::new(frame))
    }

    /// `year_week_key` of every row.
    pub fn year_week_keys(&self) -> Result<Vec<i64>> {
        let keys = self
            .frame
            .column(YEAR_WEEK_KEY)
            .map_err(|_| DataError::MissingColumn(YEAR_WEEK_KEY.to_string()))?
            .as_materialized_series()
            .cast(&DataType::Int64)?;
        Ok(keys.i64()?.into_iter().map(|k| k.unwrap_or_default()).collect())
    }

    /// A numeric column as `f64`, nulls preserved.
    pub fn column_f64(&self, name: &str) -> Result<Vec<Option<f64>>> {
        column_f64(&self.frame, name)
    }
}

impl From<DataFrame> for Dataset {
    fn from(frame: DataFrame) -> Self {
        Self::new(frame)
    }
}

/// A numeric column of `frame` as `f64`, nulls preserved.
pub fn column_f64(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = frame
        .column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn parse_date(row: usize, value: Option<&str>) -> Result<NaiveDate> {
    let invalid = || DataError::InvalidDateFormat {
        row,
        value: value.unwrap_or("<null>").to_string(),
    };
    let text = value.map(str::trim).ok_or_else(invalid)?;
    // Datetime strings such as `2023-01-02 00:00:00` or `2023-01-02T00:00:00`.
    let day = match text.get(10..11) {
        Some(" " | "T") => &text[..10],
        _ => text,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| invalid())
}
