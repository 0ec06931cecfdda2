// src/load/csv_source.rs

use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use csv::ReaderBuilder;
use std::{io::Cursor, sync::Arc};
use tracing::debug;

/// Trim whitespace and strip one pair of outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_finite(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A column is numeric when it has at least one value and every non-empty
/// cell parses as a finite number. `NaN` and `inf` keep a column textual.
fn infer_column_type(cells: &[Option<String>]) -> DataType {
    let mut present = cells.iter().flatten().peekable();
    if present.peek().is_none() {
        return DataType::Utf8;
    }
    if present.all(|c| parse_finite(c).is_some()) {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

/// Parse CSV bytes (header row required) into a single record batch.
///
/// Numeric-looking columns become `Float64`, the rest `Utf8`. Empty cells are
/// null. Rows with a different field count than the header are an error.
pub fn read_csv(bytes: &[u8]) -> Result<RecordBatch> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(bytes));

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(clean_str)
        .collect();
    if headers.iter().all(String::is_empty) {
        bail!("CSV input has no header row");
    }

    // 1) Collect cells column-wise
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error at data record {}", idx + 1))?;
        for (col, raw) in cells.iter_mut().zip(record.iter()) {
            let cleaned = clean_str(raw);
            col.push(if cleaned.is_empty() { None } else { Some(cleaned) });
        }
    }

    typed_batch(&headers, cells).context("assembling CSV record batch")
}

/// Type each column of column-wise `cells` (one vector per header) and build
/// the batch. Shared by the CSV and spreadsheet readers.
pub(crate) fn typed_batch(
    headers: &[String],
    cells: Vec<Vec<Option<String>>>,
) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(headers.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(headers.len());
    for (name, col) in headers.iter().zip(cells) {
        let ty = infer_column_type(&col);
        debug!(column = %name, ty = %ty, "inferred column type");
        let array: ArrayRef = match ty {
            DataType::Float64 => Arc::new(
                col.iter()
                    .map(|c| c.as_deref().and_then(parse_finite))
                    .collect::<Float64Array>(),
            ),
            _ => Arc::new(StringArray::from(col)),
        };
        fields.push(Field::new(name, ty, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::Float64Type;

    #[test]
    fn clean_str_trims_and_unquotes() {
        assert_eq!(clean_str("  \"Software\" "), "Software");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" Sales "), "Sales");
    }

    #[test]
    fn numeric_columns_are_inferred() -> Result<()> {
        let text = "Scenario,Year,Jan,Note\nBudget,2023,100.5,\nForecast,2023,-3,x\n";
        let batch = read_csv(text.as_bytes())?;
        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);

        let jan = batch.column(2).as_primitive::<Float64Type>();
        assert_eq!(jan.values().to_vec(), vec![100.5, -3.0]);
        assert!(batch.column(3).is_null(0));
        Ok(())
    }

    #[test]
    fn text_in_a_month_column_stays_text() -> Result<()> {
        let text = "Jan\n1\nabc\n";
        let batch = read_csv(text.as_bytes())?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.column(0).as_string::<i32>().value(1), "abc");
        Ok(())
    }

    #[test]
    fn non_finite_cells_keep_a_column_textual() -> Result<()> {
        let batch = read_csv(b"Jan,Feb\nNaN,1\n2,inf\n3,4\n")?;
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Utf8);
        Ok(())
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "a,b\n1,2\n3\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn header_only_is_empty_table() -> Result<()> {
        let batch = read_csv(b"Scenario,Jan\n")?;
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 2);
        Ok(())
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_csv(b"").is_err());
    }
}
