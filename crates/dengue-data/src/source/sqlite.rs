//! Read-only SQLite access to the modelling dataset.

use super::DataSource;
use crate::dataset::Dataset;
use crate::error::{DataError, Result};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{info, warn};

/// SQLite database holding the modelling tables.
///
/// Dotted names such as `analysis.inla_model_ds` resolve through SQLite
/// schema names (`main`, `temp` or an attached database).
#[derive(Debug)]
pub struct SqliteSource {
    conn: Connection,
}

/// Storage class a column widens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnKind {
    Integer,
    Real,
    Text,
}

impl SqliteSource {
    /// Open the database at `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection (useful for testing).
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Read every row of `name` into a frame.
    pub fn load_frame(&self, name: &str) -> Result<DataFrame> {
        let reference = table_reference(name)?;
        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {reference}"))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut values: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, column) in values.iter_mut().enumerate() {
                column.push(row.get::<_, Value>(i)?);
            }
        }

        let columns = names
            .iter()
            .zip(values)
            .map(|(name, column)| to_column(name, column))
            .collect::<Result<Vec<_>>>()?;
        let frame = DataFrame::new(columns)?;

        if frame.height() == 0 {
            warn!(table = name, "Table is empty");
        }
        info!(
            table = name,
            rows = frame.height(),
            columns = frame.width(),
            "Loaded table"
        );
        Ok(frame)
    }
}

impl DataSource for SqliteSource {
    fn load(&self, name: &str) -> Result<Dataset> {
        self.load_frame(name).map(Dataset::new)
    }
}

/// Validate a possibly schema-qualified name and quote each part.
fn table_reference(name: &str) -> Result<String> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(DataError::InvalidIdentifier(name.to_string()));
    }
    Ok(parts
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join("."))
}

fn to_column(name: &str, values: Vec<Value>) -> Result<Column> {
    let mut kind: Option<ColumnKind> = None;
    for value in &values {
        let seen = match value {
            Value::Null => continue,
            Value::Integer(_) => ColumnKind::Integer,
            Value::Real(_) => ColumnKind::Real,
            Value::Text(_) => ColumnKind::Text,
            Value::Blob(_) => {
                return Err(DataError::UnsupportedColumnType {
                    column: name.to_string(),
                    dtype: "BLOB".to_string(),
                });
            }
        };
        kind = kind.max(Some(seen));
    }

    let series = match kind {
        Some(ColumnKind::Integer) => {
            let ints: Vec<Option<i64>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), ints)
        }
        Some(ColumnKind::Real) | None => {
            let reals: Vec<Option<f64>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i as f64),
                    Value::Real(r) => Some(r),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), reals)
        }
        Some(ColumnKind::Text) => {
            let texts: Vec<Option<String>> = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i.to_string()),
                    Value::Real(r) => Some(r.to_string()),
                    Value::Text(s) => Some(s),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), texts)
        }
    };
    Ok(series.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column_f64;

    fn seeded() -> SqliteSource {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE inla_model_ds (
                year INTEGER, eweek INTEGER, cases INTEGER, dbt_max REAL, region TEXT
             );
             INSERT INTO inla_model_ds VALUES (2022, 52, 10, 31.5, 'north');
             INSERT INTO inla_model_ds VALUES (2023, 1, NULL, 30, 'north');
             INSERT INTO inla_model_ds VALUES (2023, 2, 14, NULL, NULL);",
        )
        .unwrap();
        SqliteSource::from_connection(conn)
    }

    #[test]
    fn test_load_infers_column_types() {
        let frame = seeded().load_frame("inla_model_ds").unwrap();
        assert_eq!(frame.shape(), (3, 5));
        assert_eq!(frame.column("year").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("dbt_max").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("region").unwrap().dtype(), &DataType::String);
        assert_eq!(
            column_f64(&frame, "cases").unwrap(),
            vec![Some(10.0), None, Some(14.0)]
        );
        assert_eq!(
            column_f64(&frame, "dbt_max").unwrap(),
            vec![Some(31.5), Some(30.0), None]
        );
    }

    #[test]
    fn test_schema_qualified_name() {
        let frame = seeded().load_frame("main.inla_model_ds").unwrap();
        assert_eq!(frame.height(), 3);
    }

    #[test]
    fn test_rejects_non_identifiers() {
        for name in ["cases; DROP TABLE x", "a.b.c", "", "1table", "tab le"] {
            assert!(matches!(
                table_reference(name),
                Err(DataError::InvalidIdentifier(_))
            ));
        }
        assert_eq!(
            table_reference("analysis.inla_model_ds").unwrap(),
            "\"analysis\".\"inla_model_ds\""
        );
    }

    #[test]
    fn test_load_as_dataset_annotates() {
        let dataset = seeded().load("inla_model_ds").unwrap().annotate().unwrap();
        assert_eq!(dataset.year_week_keys().unwrap(), vec![202252, 202301, 202302]);
    }
}
