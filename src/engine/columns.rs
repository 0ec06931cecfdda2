// src/engine/columns.rs

use super::error::EngineError;
use super::VALUE;
use arrow::{
    array::{Array, ArrayRef, AsArray},
    compute::cast,
    datatypes::{DataType, Field, Float64Type, Schema, SchemaRef},
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use std::sync::Arc;

/// Fail with `SchemaMismatch` on the first of `names` missing from `batch`.
pub fn require_columns(batch: &RecordBatch, names: &[&str]) -> Result<(), EngineError> {
    for name in names {
        column(batch, name)?;
    }
    Ok(())
}

pub(crate) fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, EngineError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| EngineError::SchemaMismatch {
            column: name.to_string(),
            available: batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect(),
        })
}

/// Render an integral float without its fraction, so a numeric `2023.0`
/// year compares equal to the text `"2023"`.
pub fn format_key_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Text rendering of a key column, one entry per row. Nulls become "".
pub fn key_strings(batch: &RecordBatch, name: &str) -> Result<Vec<String>, EngineError> {
    let arr = column(batch, name)?;
    match arr.data_type() {
        DataType::Utf8 => Ok(arr
            .as_string::<i32>()
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()),
        DataType::LargeUtf8 => Ok(arr
            .as_string::<i64>()
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()),
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let floats = cast(arr, &DataType::Float64)?;
            Ok(floats
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.map(format_key_number).unwrap_or_default())
                .collect())
        }
        DataType::Null => Ok(vec![String::new(); arr.len()]),
        dt if dt.is_primitive() || *dt == DataType::Boolean => (0..arr.len())
            .map(|row| {
                if arr.is_null(row) {
                    Ok(String::new())
                } else {
                    array_value_to_string(arr.as_ref(), row).map_err(EngineError::from)
                }
            })
            .collect(),
        other => Err(EngineError::UnsupportedType {
            column: name.to_string(),
            data_type: other.to_string(),
        }),
    }
}

fn malformed(name: &str, row: usize, value: Option<&str>) -> EngineError {
    EngineError::MalformedNumeric {
        column: name.to_string(),
        row,
        value: value.map(str::to_string),
    }
}

/// Numeric values of an amount column, one per row.
///
/// Integer, float and decimal columns are widened to `f64`; text columns are
/// parsed. A null, unparseable or non-finite (NaN, inf) cell is an error,
/// never a zero.
pub fn numeric_values(batch: &RecordBatch, name: &str) -> Result<Vec<f64>, EngineError> {
    let arr = column(batch, name)?;
    match arr.data_type() {
        DataType::Utf8 => parse_text(name, arr.as_string::<i32>().iter()),
        DataType::LargeUtf8 => parse_text(name, arr.as_string::<i64>().iter()),
        DataType::Null if arr.is_empty() => Ok(Vec::new()),
        DataType::Null => Err(malformed(name, 0, None)),
        dt if dt.is_numeric() => {
            let floats = cast(arr, &DataType::Float64)?;
            floats
                .as_primitive::<Float64Type>()
                .iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Some(v) if v.is_finite() => Ok(v),
                    Some(v) => Err(malformed(name, row, Some(&v.to_string()))),
                    None => Err(malformed(name, row, None)),
                })
                .collect()
        }
        other => Err(EngineError::UnsupportedType {
            column: name.to_string(),
            data_type: other.to_string(),
        }),
    }
}

fn parse_text<'a>(
    name: &str,
    cells: impl Iterator<Item = Option<&'a str>>,
) -> Result<Vec<f64>, EngineError> {
    cells
        .enumerate()
        .map(|(row, cell)| {
            let raw = cell.ok_or_else(|| malformed(name, row, None))?;
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(malformed(name, row, Some(raw))),
            }
        })
        .collect()
}

/// Schema of a long-form table: every named column as text, then `value`.
pub(crate) fn text_value_schema(names: &[&str]) -> SchemaRef {
    let mut fields: Vec<Field> = names
        .iter()
        .map(|name| Field::new(*name, DataType::Utf8, false))
        .collect();
    fields.push(Field::new(VALUE, DataType::Float64, false));
    Arc::new(Schema::new(fields))
}
