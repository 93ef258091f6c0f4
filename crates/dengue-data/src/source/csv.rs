//! CSV exports of the modelling dataset.

use super::DataSource;
use crate::dataset::Dataset;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A dataset exported to a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    /// Source backed by the file at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the export.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for CsvSource {
    fn load(&self, name: &str) -> Result<Dataset> {
        debug!(dataset = name, path = %self.path.display(), "Reading dataset export");
        Dataset::from_csv(&self.path)
    }
}
