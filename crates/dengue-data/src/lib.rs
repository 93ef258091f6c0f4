#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/dengue-forecast/dengue/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod error;
pub mod partition;
pub mod source;
pub mod week;

pub use dataset::{DATE, Dataset, RESPONSE_ACTUAL, YEAR, YEAR_WEEK_KEY, column_f64};
pub use error::{DataError, Result};
pub use partition::{PartitionedDataset, Partitioner};
pub use source::{CsvSource, DataSource, SqliteSource};
pub use week::{WindowKeys, YearWeek, year_week_key};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
