// src/dashboard/mod.rs
//
// Turns a loaded scenario table into the document a front end draws: KPI
// tiles, gauges, three charts and a data preview.

pub mod charts;
pub mod palette;
pub mod preview;
pub mod widgets;

pub use charts::{ChartKind, ChartPanel, ChartSpec, Charts};
pub use preview::DataPreview;
pub use widgets::{Gauge, MetricTile, Provenance, Sparkline, TileValue};

use crate::cache::{CacheStats, ContentCache};
use crate::config::DashboardConfig;
use crate::load::{Input, InputFormat, InputIdentity};
use crate::summary::{compute_all, Summaries};
use anyhow::Result;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub origin: String,
    pub format: InputFormat,
    pub identity: InputIdentity,
    /// True when the bundled example data is shown instead of an upload.
    pub bundled: bool,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub source: SourceInfo,
    pub preview: DataPreview,
    pub metrics: Vec<MetricTile>,
    pub gauges: Vec<Gauge>,
    pub charts: Charts,
}

/// One user's view: config plus caches of parsed tables and summaries, both
/// keyed by input content identity.
pub struct DashboardSession {
    config: DashboardConfig,
    tables: ContentCache<Arc<RecordBatch>>,
    summaries: ContentCache<Arc<Summaries>>,
}

impl DashboardSession {
    pub fn new(config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.cache_capacity;
        Ok(Self {
            config,
            tables: ContentCache::new(capacity),
            summaries: ContentCache::new(capacity),
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Parsed table for `input`, reusing an earlier parse of identical bytes.
    pub fn table(&self, input: &Input) -> Result<Arc<RecordBatch>> {
        self.tables
            .get_or_try_insert_with(input.identity(), || input.parse().map(Arc::new))
    }

    /// Summaries for `input`, reusing earlier work on identical bytes.
    pub fn summaries(&self, input: &Input) -> Result<Arc<Summaries>> {
        let table = self.table(input)?;
        let months = self.config.month_names();
        Ok(self.summaries.get_or_insert_with(input.identity(), || {
            Arc::new(compute_all(&table, &months, &self.config.summary))
        }))
    }

    /// Full render. Load failures are errors; aggregation failures become
    /// failed panels or tiles so the rest of the page still draws.
    #[tracing::instrument(level = "info", skip(self, input), fields(origin = input.origin(), id = input.identity().short()))]
    pub fn render(&self, input: &Input) -> Result<Dashboard> {
        if input.is_bundled() {
            info!("using the bundled example data; supply a file to use your own");
        }
        let table = self.table(input)?;
        let summaries = self.summaries(input)?;
        let months = self.config.month_names();

        let metrics = self
            .config
            .metrics
            .iter()
            .map(|spec| widgets::metric_tile(spec, &table, &months))
            .collect();
        let gauges = self
            .config
            .gauges
            .iter()
            .map(|spec| widgets::gauge(spec, &table, &months))
            .collect();

        let dashboard = Dashboard {
            generated_at: Utc::now(),
            source: SourceInfo {
                origin: input.origin().to_string(),
                format: input.format(),
                identity: input.identity().clone(),
                bundled: input.is_bundled(),
                rows: table.num_rows(),
                columns: table.num_columns(),
            },
            preview: preview::preview(&table, self.config.preview_rows),
            metrics,
            gauges,
            charts: charts::build_charts(&summaries, &self.config),
        };
        info!(
            rows = dashboard.source.rows,
            metrics = dashboard.metrics.len(),
            gauges = dashboard.gauges.len(),
            "dashboard rendered"
        );
        Ok(dashboard)
    }

    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.tables.stats(), self.summaries.stats())
    }
}
