// src/load/mod.rs

pub mod csv_source;
pub mod identity;
pub mod parquet_source;
pub mod xlsx_source;

pub use identity::InputIdentity;

use anyhow::{bail, Context, Result};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::{fmt, fs, path::Path};
use tracing::info;

/// Dataset shipped with the binary, used until the user supplies their own.
pub const BUNDLED_CSV: &[u8] = include_bytes!("../../data/financial_data.csv");
pub const BUNDLED_NAME: &str = "financial_data.csv";

static BUNDLED_IDENTITY: Lazy<InputIdentity> =
    Lazy::new(|| InputIdentity::of(InputFormat::Csv, BUNDLED_CSV));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Csv,
    Parquet,
    Xlsx,
}

impl InputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Parquet => "parquet",
            InputFormat::Xlsx => "xlsx",
        }
    }

    /// Pick the format from a file name's extension.
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("parquet") | Some("pq") => Ok(InputFormat::Parquet),
            Some("xlsx") => Ok(InputFormat::Xlsx),
            Some(other) => bail!("unsupported input format `.{}` for {}", other, name),
            None => bail!("cannot tell the format of {} (no extension)", name),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw input as handed over by the user (or the bundled default), before
/// parsing. Identity is computed once from the bytes.
#[derive(Debug, Clone)]
pub struct Input {
    origin: String,
    format: InputFormat,
    bytes: Vec<u8>,
    identity: InputIdentity,
    bundled: bool,
}

impl Input {
    pub fn bundled() -> Self {
        Input {
            origin: BUNDLED_NAME.to_string(),
            format: InputFormat::Csv,
            bytes: BUNDLED_CSV.to_vec(),
            identity: BUNDLED_IDENTITY.clone(),
            bundled: true,
        }
    }

    /// An uploaded file: `name` decides the format.
    pub fn upload(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let origin = name.into();
        let format = InputFormat::from_name(&origin)?;
        let identity = InputIdentity::of(format, &bytes);
        Ok(Input {
            origin,
            format,
            bytes,
            identity,
            bundled: false,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("reading input file {:?}", path))?;
        Self::upload(path.display().to_string(), bytes)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn identity(&self) -> &InputIdentity {
        &self.identity
    }

    pub fn is_bundled(&self) -> bool {
        self.bundled
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parse into a record batch.
    #[tracing::instrument(level = "info", skip(self), fields(origin = %self.origin, format = %self.format, id = %self.identity.short()))]
    pub fn parse(&self) -> Result<RecordBatch> {
        let batch = match self.format {
            InputFormat::Csv => csv_source::read_csv(&self.bytes),
            InputFormat::Parquet => parquet_source::read_parquet(&self.bytes),
            InputFormat::Xlsx => xlsx_source::read_xlsx(&self.bytes),
        }
        .with_context(|| format!("loading {}", self.origin))?;
        info!(
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "input parsed"
        );
        Ok(batch)
    }
}
