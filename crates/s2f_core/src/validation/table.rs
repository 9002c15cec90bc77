//! Validation table CSV
//!
//! Header: key columns (`mtype`, or `from`,`to`) followed by
//! `Mean (data)`, `Std (data)`, `Mean (ref.)`, `Std (ref.)`, `Error`.
//! Missing values are empty fields.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ValidationRecord;
use crate::stats::{Key, KeyLayout};

pub const MEAN_MODEL_COLUMN: &str = "Mean (data)";
pub const STD_MODEL_COLUMN: &str = "Std (data)";
pub const MEAN_REF_COLUMN: &str = "Mean (ref.)";
pub const STD_REF_COLUMN: &str = "Std (ref.)";
pub const ERROR_COLUMN: &str = "Error";

const VALUE_COLUMNS: [&str; 5] = [
    MEAN_MODEL_COLUMN,
    STD_MODEL_COLUMN,
    MEAN_REF_COLUMN,
    STD_REF_COLUMN,
    ERROR_COLUMN,
];

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Validation table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Validation table {path} is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Validation table {path} has {count} key columns (expected 1 or 2)")]
    KeyColumns { path: PathBuf, count: usize },

    #[error("Validation table {path}, row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to write validation table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write the full validation table, including rows with missing values.
pub fn write_validation_table(
    path: &Path,
    layout: &KeyLayout,
    records: &[ValidationRecord],
) -> Result<(), TableError> {
    let csv_err = |source: csv::Error| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    let header: Vec<&str> = layout
        .columns()
        .into_iter()
        .chain(VALUE_COLUMNS)
        .collect();
    writer.write_record(&header).map_err(csv_err)?;

    for record in records {
        let mut row: Vec<String> = record.key.labels().into_iter().map(str::to_string).collect();
        row.extend(
            [
                record.mean_model,
                record.std_model,
                record.mean_ref,
                record.std_ref,
                record.error,
            ]
            .into_iter()
            .map(format_value),
        );
        writer.write_record(&row).map_err(csv_err)?;
    }

    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote {} validation rows to {}", records.len(), path.display());
    Ok(())
}

/// Read a validation table written by [`write_validation_table`] (or any CSV
/// with the same value columns).
///
/// Columns other than the five value columns are treated as key columns, in
/// order. `Std (data)` and `Std (ref.)` may be absent.
pub fn read_validation_table(path: &Path) -> Result<Vec<ValidationRecord>, TableError> {
    let csv_err = |source: csv::Error| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| TableError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    };

    let mean_model_idx = require(MEAN_MODEL_COLUMN)?;
    let mean_ref_idx = require(MEAN_REF_COLUMN)?;
    let error_idx = require(ERROR_COLUMN)?;
    let std_model_idx = find(STD_MODEL_COLUMN);
    let std_ref_idx = find(STD_REF_COLUMN);

    let key_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !VALUE_COLUMNS.contains(h))
        .map(|(idx, _)| idx)
        .collect();
    if !(1..=2).contains(&key_indices.len()) {
        return Err(TableError::KeyColumns {
            path: path.to_path_buf(),
            count: key_indices.len(),
        });
    }

    let mut records = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result.map_err(csv_err)?;

        let value = |idx: Option<usize>, column: &str| -> Result<Option<f64>, TableError> {
            let Some(idx) = idx else {
                return Ok(None);
            };
            parse_value(record.get(idx).unwrap_or("")).map_err(|raw| TableError::InvalidValue {
                path: path.to_path_buf(),
                row,
                column: column.to_string(),
                value: raw,
            })
        };

        let labels: Vec<&str> = key_indices
            .iter()
            .map(|&idx| record.get(idx).unwrap_or(""))
            .collect();
        let key = match labels.as_slice() {
            [label] => Key::single(*label),
            [from, to] => Key::pair(*from, *to),
            _ => unreachable!("key column count checked above"),
        };

        records.push(ValidationRecord {
            key,
            mean_model: value(Some(mean_model_idx), MEAN_MODEL_COLUMN)?,
            std_model: value(std_model_idx, STD_MODEL_COLUMN)?,
            mean_ref: value(Some(mean_ref_idx), MEAN_REF_COLUMN)?,
            std_ref: value(std_ref_idx, STD_REF_COLUMN)?,
            error: value(Some(error_idx), ERROR_COLUMN)?,
        });
    }

    tracing::debug!("Read {} validation rows from {}", records.len(), path.display());
    Ok(records)
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Empty and NaN fields are missing values.
fn parse_value(raw: &str) -> Result<Option<f64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(raw.to_string()),
    }
}
