// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use salesdash::{config::DashboardConfig, dashboard::DashboardSession, load::Input};
use std::{fs, io::Write, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Render the sales dashboard for a scenario table as JSON"
)]
struct Args {
    /// CSV or Parquet file; the bundled example data is used when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// YAML dashboard config
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the dashboard here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean JSON
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // 1) Config
    let config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)?,
        None => DashboardConfig::default(),
    };

    // 2) Input
    let input = match &args.input {
        Some(path) => Input::from_path(path)?,
        None => Input::bundled(),
    };

    // 3) Render
    let session = DashboardSession::new(config)?;
    let dashboard = session.render(&input)?;
    let json = if args.compact {
        serde_json::to_string(&dashboard)?
    } else {
        serde_json::to_string_pretty(&dashboard)?
    };

    // 4) Emit
    match &args.output {
        Some(path) => {
            fs::write(path, json.as_bytes())
                .with_context(|| format!("writing dashboard to {:?}", path))?;
            info!(path = %path.display(), "dashboard written");
        }
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{}", json).context("writing dashboard to stdout")?;
        }
    }
    Ok(())
}
