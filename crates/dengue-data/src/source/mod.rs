//! Dataset sources.

pub mod csv;
pub mod sqlite;

pub use self::csv::CsvSource;
pub use self::sqlite::SqliteSource;

use crate::dataset::Dataset;
use crate::error::Result;

/// Anything that can produce the modelling dataset by name.
pub trait DataSource {
    /// Load the dataset called `name`.
    fn load(&self, name: &str) -> Result<Dataset>;
}
