//! SQLite persistence: one table per dataset.
//!
//! Saving replaces any existing table of the same name. The whole collection
//! is written in a single transaction, so a failed save leaves the previous
//! database contents untouched.

use crate::error::DatasetError;
use crate::frame::{class_counts, feature_count, NamedFrame};
use polars::prelude::*;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Quote an SQL identifier (table or column name).
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Float32 | DataType::Float64 => "REAL",
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "INTEGER",
        _ => "TEXT",
    }
}

/// Materialize a column as SQLite values.
fn column_values(column: &Column) -> Result<Vec<Value>, DatasetError> {
    let values = match sql_type(column.dtype()) {
        "REAL" => column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Real))
            .collect(),
        "INTEGER" => column
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Integer))
            .collect(),
        _ => column
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.to_string())))
            .collect(),
    };
    Ok(values)
}

fn write_table(conn: &Connection, dataset: &NamedFrame) -> Result<(), DatasetError> {
    let table = quote_ident(&dataset.name);
    let columns = dataset.frame.get_columns();

    let definitions: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name().as_str()), sql_type(c.dtype())))
        .collect();

    conn.execute(&format!("DROP TABLE IF EXISTS {table}"), [])?;
    conn.execute(
        &format!("CREATE TABLE {table} ({})", definitions.join(", ")),
        [],
    )?;

    let values = columns
        .iter()
        .map(column_values)
        .collect::<Result<Vec<_>, _>>()?;

    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut insert = conn.prepare(&format!("INSERT INTO {table} VALUES ({placeholders})"))?;
    for row in 0..dataset.frame.height() {
        insert.execute(params_from_iter(values.iter().map(|col| &col[row])))?;
    }

    debug!(table = %dataset.name, rows = dataset.frame.height(), "table written");
    Ok(())
}

/// Write every dataset to the database at `path`, creating it if needed.
pub fn save_datasets(path: &Path, datasets: &[NamedFrame]) -> Result<(), DatasetError> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    for dataset in datasets {
        write_table(&tx, dataset)?;
    }
    tx.commit()?;

    info!(path = %path.display(), tables = datasets.len(), "datasets saved");
    Ok(())
}

/// User tables in name order.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>, DatasetError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Read a table back into a frame, typed by the declared column types.
pub fn load_table(conn: &Connection, name: &str) -> Result<DataFrame, DatasetError> {
    let mut info = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
    let schema = info
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if schema.is_empty() {
        return Err(DatasetError::UnknownDataset(name.to_string()));
    }

    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let rows = stmt
        .query_map([], |row| {
            (0..schema.len())
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let columns = schema
        .iter()
        .enumerate()
        .map(|(i, (column, declared))| {
            let cells = rows.iter().map(|r| &r[i]);
            let name = PlSmallStr::from(column.as_str());
            match declared.to_ascii_uppercase().as_str() {
                "REAL" => Column::new(
                    name,
                    cells
                        .map(|v| match v {
                            Value::Real(f) => Some(*f),
                            Value::Integer(n) => Some(*n as f64),
                            _ => None,
                        })
                        .collect::<Vec<Option<f64>>>(),
                ),
                "INTEGER" if column == crate::frame::TARGET => Column::new(
                    name,
                    cells
                        .map(|v| match v {
                            Value::Integer(n) => i32::try_from(*n).ok(),
                            _ => None,
                        })
                        .collect::<Vec<Option<i32>>>(),
                ),
                "INTEGER" => Column::new(
                    name,
                    cells
                        .map(|v| match v {
                            Value::Integer(n) => Some(*n),
                            _ => None,
                        })
                        .collect::<Vec<Option<i64>>>(),
                ),
                _ => Column::new(
                    name,
                    cells
                        .map(|v| match v {
                            Value::Text(s) => Some(s.clone()),
                            Value::Integer(n) => Some(n.to_string()),
                            Value::Real(f) => Some(f.to_string()),
                            _ => None,
                        })
                        .collect::<Vec<Option<String>>>(),
                ),
            }
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Shape and class balance of one stored table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub features: usize,
    pub positives: usize,
    pub imbalance_ratio: f64,
}

/// Summarize every table of a database.
pub fn summarize(conn: &Connection) -> Result<Vec<TableSummary>, DatasetError> {
    list_tables(conn)?
        .into_iter()
        .map(|name| {
            let frame = load_table(conn, &name)?;
            let counts = class_counts(&frame)?;
            Ok(TableSummary {
                rows: frame.height(),
                features: feature_count(&frame),
                positives: counts.positive,
                imbalance_ratio: counts.imbalance_ratio(),
                name,
            })
        })
        .collect()
}
