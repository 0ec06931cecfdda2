// src/engine/reshape.rs

use super::columns::{key_strings, numeric_values, require_columns, text_value_schema};
use super::error::EngineError;
use super::PERIOD;
use arrow::{
    array::{ArrayRef, Float64Array, Float64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Unpivot the wide month columns of `batch` into one row per (row, month).
///
/// Output columns are `id_columns` (as text), `period` (the month column's
/// name) and `value`. Rows come out in input order, and within a row in
/// `month_columns` order, so the result always has
/// `batch.num_rows() * month_columns.len()` rows.
pub fn reshape_wide_to_long(
    batch: &RecordBatch,
    id_columns: &[&str],
    month_columns: &[&str],
) -> Result<RecordBatch, EngineError> {
    require_columns(batch, id_columns)?;
    require_columns(batch, month_columns)?;

    // 1) Materialise ids and amounts up front; any bad cell fails the whole call
    let ids: Vec<Vec<String>> = id_columns
        .iter()
        .map(|name| key_strings(batch, name))
        .collect::<Result<_, _>>()?;
    let amounts: Vec<Vec<f64>> = month_columns
        .iter()
        .map(|name| numeric_values(batch, name))
        .collect::<Result<_, _>>()?;

    // 2) Emit row-major: every month of row 0, then row 1, ...
    let rows = batch.num_rows();
    let out_len = rows * month_columns.len();
    let mut id_builders: Vec<StringBuilder> = ids
        .iter()
        .map(|_| StringBuilder::with_capacity(out_len, out_len * 8))
        .collect();
    let mut period = StringBuilder::with_capacity(out_len, out_len * 3);
    let mut value = Float64Builder::with_capacity(out_len);

    for row in 0..rows {
        for (month, name) in month_columns.iter().enumerate() {
            for (builder, col) in id_builders.iter_mut().zip(&ids) {
                builder.append_value(&col[row]);
            }
            period.append_value(name);
            value.append_value(amounts[month][row]);
        }
    }

    // 3) Assemble
    let mut arrays: Vec<ArrayRef> = id_builders
        .into_iter()
        .map(|mut b| Arc::new(b.finish()) as ArrayRef)
        .collect();
    arrays.push(Arc::new(period.finish()));
    arrays.push(Arc::new(value.finish()));

    let mut names: Vec<&str> = id_columns.to_vec();
    names.push(PERIOD);
    RecordBatch::try_new(text_value_schema(&names), arrays).map_err(Into::into)
}

/// Replace the listed amount columns with their absolute values (as `f64`).
/// Every other column passes through untouched.
pub fn abs_columns(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch, EngineError> {
    require_columns(batch, columns)?;
    if columns.is_empty() {
        return Ok(batch.clone());
    }

    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut arrays = Vec::with_capacity(batch.num_columns());
    for (i, field) in schema.fields().iter().enumerate() {
        if columns.contains(&field.name().as_str()) {
            let magnitudes: Float64Array = numeric_values(batch, field.name())?
                .into_iter()
                .map(f64::abs)
                .map(Some)
                .collect();
            fields.push(Field::new(field.name(), DataType::Float64, field.is_nullable()));
            arrays.push(Arc::new(magnitudes) as ArrayRef);
        } else {
            fields.push(field.as_ref().clone());
            arrays.push(batch.column(i).clone());
        }
    }

    let schema = Schema::new(fields).with_metadata(schema.metadata().clone());
    RecordBatch::try_new(Arc::new(schema), arrays).map_err(Into::into)
}
