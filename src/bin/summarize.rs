// src/bin/summarize.rs
//
// Print the three dashboard summaries as tables and optionally export them
// to Parquet.

use anyhow::Result;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use salesdash::{
    config::DashboardConfig,
    load::Input,
    summary::{compute_all, export::export_all},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Compute and print the dashboard summaries")]
struct Args {
    /// CSV or Parquet file; the bundled example data is used when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// YAML dashboard config (months and summary parameters)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write unit_sales, monthly_trend and yearly_accounts as Parquet here
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::default(),
    };
    let input = match &args.input {
        Some(path) => Input::from_path(path)?,
        None => Input::bundled(),
    };

    let table = input.parse()?;
    let summaries = compute_all(&table, &config.month_names(), &config.summary);

    for (name, outcome) in summaries.iter() {
        println!("== {} ==", name);
        match outcome {
            Ok(batch) => println!("{}", pretty_format_batches(std::slice::from_ref(batch))?),
            Err(e) => {
                warn!(summary = name, error = %e, "summary failed");
                println!("error: {}", e);
            }
        }
    }

    if let Some(dir) = &args.export_dir {
        let written = export_all(&summaries, dir)?;
        info!(files = written.len(), dir = %dir.display(), "summaries exported");
    }
    Ok(())
}
