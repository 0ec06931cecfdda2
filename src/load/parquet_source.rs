// src/load/parquet_source.rs

use anyhow::{Context, Result};
use arrow::{compute::concat_batches, record_batch::RecordBatch};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::File,
    io::{Seek, SeekFrom, Write},
};

/// Read every row group of a Parquet file into one batch.
pub fn read_parquet_file(file: File) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("opening Parquet reader")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building Parquet record batch reader")?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .context("reading Parquet record batches")?;
    concat_batches(&schema, &batches).context("concatenating Parquet record batches")
}

/// Read Parquet from memory, spooling through an anonymous temp file.
pub fn read_parquet(bytes: &[u8]) -> Result<RecordBatch> {
    let mut spool = tempfile::tempfile().context("creating Parquet spool file")?;
    spool
        .write_all(bytes)
        .context("writing Parquet spool file")?;
    spool
        .seek(SeekFrom::Start(0))
        .context("rewinding Parquet spool file")?;
    read_parquet_file(spool)
}
