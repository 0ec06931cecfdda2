// src/dashboard/preview.rs

use crate::engine::key_strings;
use arrow::{record_batch::RecordBatch, util::display::array_value_to_string};
use serde::Serialize;

/// First rows of the source, rendered as text for a table widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

pub fn preview(batch: &RecordBatch, limit: usize) -> DataPreview {
    let head = batch.slice(0, limit.min(batch.num_rows()));
    let schema = head.schema();
    let columns: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    // Years and other integral floats read better without ".0"; anything the
    // key renderer does not handle falls back to Arrow's display.
    let rendered: Vec<Vec<String>> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            key_strings(&head, name).unwrap_or_else(|_| {
                let col = head.column(i);
                (0..head.num_rows())
                    .map(|row| array_value_to_string(col.as_ref(), row).unwrap_or_default())
                    .collect()
            })
        })
        .collect();

    let rows = (0..head.num_rows())
        .map(|row| rendered.iter().map(|col| col[row].clone()).collect())
        .collect();

    DataPreview {
        columns,
        rows,
        total_rows: batch.num_rows(),
    }
}
