// src/load/xlsx_source.rs

use super::csv_source::{clean_str, typed_batch};
use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(clean_str(s)).filter(|c| !c.is_empty()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read the first worksheet of an `.xlsx` workbook; its first row is the
/// header. Columns are typed the same way as CSV columns.
pub fn read_xlsx(bytes: &[u8]) -> Result<RecordBatch> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("opening xlsx workbook")?;

    // 1) First sheet
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook has no sheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet {}", sheet))?;
    debug!(sheet = %sheet, rows = range.height(), columns = range.width(), "worksheet loaded");

    // 2) Header row, then cells column-wise
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|c| cell_text(c).unwrap_or_default())
            .collect(),
        None => bail!("sheet {} is empty", sheet),
    };
    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, cell) in cells.iter_mut().zip(row) {
            col.push(cell_text(cell));
        }
    }

    typed_batch(&headers, cells).with_context(|| format!("assembling sheet {}", sheet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::AsArray;
    use arrow::datatypes::{DataType, Float64Type};
    use rust_xlsxwriter::Workbook;

    fn workbook(header: &[&str], rows: &[(&str, f64, f64)]) -> Result<Vec<u8>> {
        let mut book = Workbook::new();
        let sheet = book.add_worksheet();
        for (c, name) in header.iter().enumerate() {
            sheet.write_string(0, c as u16, *name)?;
        }
        for (r, (scenario, year, jan)) in rows.iter().enumerate() {
            let r = r as u32 + 1;
            sheet.write_string(r, 0, *scenario)?;
            sheet.write_number(r, 1, *year)?;
            sheet.write_number(r, 2, *jan)?;
        }
        Ok(book.save_to_buffer()?)
    }

    #[test]
    fn first_sheet_becomes_a_typed_batch() -> Result<()> {
        let bytes = workbook(
            &["Scenario", "Year", "Jan"],
            &[("Budget", 2023.0, 100.5), ("Actuals", 2022.0, -3.0)],
        )?;
        let batch = read_xlsx(&bytes)?;
        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), "Scenario");
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(batch.column(0).as_string::<i32>().value(1), "Actuals");
        assert_eq!(
            batch.column(2).as_primitive::<Float64Type>().values().to_vec(),
            vec![100.5, -3.0]
        );
        Ok(())
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(read_xlsx(b"not a workbook").is_err());
    }
}
