// src/summary/export.rs

use super::Summaries;
use anyhow::{anyhow, Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::info;

/// Write one summary table to `path` as Snappy-compressed Parquet.
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for summary")?;
    writer.write(batch).context("writing summary batch")?;
    writer.close().context("closing summary writer")?;
    Ok(())
}

/// Write every summary to `<dir>/<name>.parquet`.
///
/// All three must have succeeded; a failed summary aborts before anything is
/// written.
pub fn export_all(summaries: &Summaries, dir: &Path) -> Result<Vec<PathBuf>> {
    let ready: Vec<(&str, &RecordBatch)> = summaries
        .iter()
        .map(|(name, outcome)| {
            outcome
                .as_ref()
                .map(|batch| (name, batch))
                .map_err(|e| anyhow!("summary {} failed: {}", name, e))
        })
        .collect::<Result<_>>()?;

    fs::create_dir_all(dir).with_context(|| format!("creating export directory {:?}", dir))?;
    let mut written = Vec::with_capacity(ready.len());
    for (name, batch) in ready {
        let path = dir.join(format!("{}.parquet", name));
        write_parquet(batch, &path)?;
        info!(summary = name, rows = batch.num_rows(), path = %path.display(), "exported");
        written.push(path);
    }
    Ok(written)
}
