//! Train/test partitioning by masking.
//!
//! Rows are never dropped. The target column is copied to
//! [`RESPONSE_ACTUAL`] and then set to null for every week inside the test
//! window, so the backend fits on the remaining rows and predicts the masked
//! ones. The `date` column is parsed here so a malformed date fails before
//! any fitting starts.

use crate::dataset::{Dataset, RESPONSE_ACTUAL, YEAR_WEEK_KEY};
use crate::error::Result;
use crate::week::WindowKeys;
use chrono::NaiveDate;
use dengue_model::TimeWindow;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Masks the test window of a dataset.
#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    train: WindowKeys,
    test: WindowKeys,
}

impl Partitioner {
    /// Build from the configured date windows.
    pub fn new(train: &TimeWindow, test: &TimeWindow) -> Self {
        Self::from_keys(WindowKeys::from_window(train), WindowKeys::from_window(test))
    }

    /// Build from key bounds directly.
    pub fn from_keys(train: WindowKeys, test: WindowKeys) -> Self {
        if train.overlaps(&test) {
            warn!(
                train_start = train.start_key,
                train_end = train.end_key,
                test_start = test.start_key,
                test_end = test.end_key,
                "Train and test windows overlap; overlapping weeks are masked"
            );
        }
        if test.is_empty() {
            warn!(
                test_start = test.start_key,
                test_end = test.end_key,
                "Test window contains no week"
            );
        }
        Self { train, test }
    }

    /// Train key bounds.
    pub const fn train(&self) -> WindowKeys {
        self.train
    }

    /// Test key bounds.
    pub const fn test(&self) -> WindowKeys {
        self.test
    }

    /// Mask `target` inside the test window.
    ///
    /// The dataset is annotated first if it has no `year_week_key` yet.
    pub fn partition(&self, dataset: Dataset, target: &str) -> Result<PartitionedDataset> {
        let dataset = if dataset.is_annotated() {
            dataset
        } else {
            dataset.annotate()?
        };
        dataset.require_columns([target])?;

        let dates = dataset.dates()?;
        let keys = dataset.year_week_keys()?;
        let test_mask: Vec<bool> = keys.iter().map(|k| self.test.contains(*k)).collect();
        let masked_rows = test_mask.iter().filter(|m| **m).count();
        let train_rows = keys.iter().filter(|k| self.train.contains(**k)).count();
        let outside = keys
            .iter()
            .filter(|k| !self.train.contains(**k) && !self.test.contains(**k))
            .count();

        let key = col(YEAR_WEEK_KEY);
        let in_test = key
            .clone()
            .gt_eq(lit(self.test.start_key))
            .and(key.lt(lit(self.test.end_key)));

        let frame = dataset
            .into_frame()
            .lazy()
            .with_column(col(target).alias(RESPONSE_ACTUAL))
            .with_column(
                when(in_test)
                    .then(lit(NULL))
                    .otherwise(col(target))
                    .alias(target),
            )
            .collect()?;

        info!(
            response = target,
            rows = frame.height(),
            train_rows,
            masked_rows,
            "Partitioned dataset"
        );
        if outside > 0 {
            debug!(rows = outside, "Rows outside both windows keep their response");
        }

        Ok(PartitionedDataset {
            frame,
            target: target.to_string(),
            train: self.train,
            test: self.test,
            test_mask,
            train_rows,
            dates,
        })
    }
}

/// A dataset whose test-window responses are masked.
#[derive(Debug, Clone)]
pub struct PartitionedDataset {
    frame: DataFrame,
    target: String,
    train: WindowKeys,
    test: WindowKeys,
    test_mask: Vec<bool>,
    train_rows: usize,
    dates: Vec<NaiveDate>,
}

impl PartitionedDataset {
    /// Masked frame, still holding every input row.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume, returning the masked frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Name of the masked response column.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Train key bounds.
    pub const fn train(&self) -> WindowKeys {
        self.train
    }

    /// Test key bounds.
    pub const fn test(&self) -> WindowKeys {
        self.test
    }

    /// Per-row flag, `true` where the response was masked.
    pub fn test_mask(&self) -> &[bool] {
        &self.test_mask
    }

    /// Date of every row, in frame order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of masked rows.
    pub fn masked_rows(&self) -> usize {
        self.test_mask.iter().filter(|m| **m).count()
    }

    /// Number of rows inside the train window.
    pub const fn train_rows(&self) -> usize {
        self.train_rows
    }

    /// Total number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}
