// src/dashboard/charts.rs

use super::palette::cycle_colors;
use crate::config::DashboardConfig;
use crate::engine::{
    key_strings, numeric_values, EngineError, ACCOUNT, BUSINESS_UNIT, PERIOD, SCENARIO, VALUE,
    YEAR,
};
use crate::summary::Summaries;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    GroupedBar,
    StackedBar,
    Line,
}

/// Renderer-neutral description of one chart: which columns map to which
/// channel, how categories are colored, and the tidy rows themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub color: String,
    pub color_map: BTreeMap<String, String>,
    /// Print each value next to its mark.
    pub data_labels: bool,
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartPanel {
    Ready(ChartSpec),
    /// Valid result with nothing in it; drawn as a placeholder.
    Empty { title: String },
    /// The summary could not be computed; drawn as a visible error.
    Failed { title: String, error: String },
}

impl ChartPanel {
    pub fn title(&self) -> &str {
        match self {
            ChartPanel::Ready(spec) => &spec.title,
            ChartPanel::Empty { title } | ChartPanel::Failed { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    pub unit_sales: ChartPanel,
    pub monthly_trend: ChartPanel,
    pub yearly_accounts: ChartPanel,
}

/// Summary rows as JSON objects: key columns as strings, `value` as a number.
pub fn records(batch: &RecordBatch) -> Result<Vec<Map<String, Value>>, EngineError> {
    let schema = batch.schema();
    let mut columns: Vec<(String, Vec<Value>)> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let name = field.name();
        let cells: Vec<Value> = if name == VALUE {
            numeric_values(batch, name)?
                .into_iter()
                .map(Value::from)
                .collect()
        } else {
            key_strings(batch, name)?
                .into_iter()
                .map(Value::String)
                .collect()
        };
        columns.push((name.clone(), cells));
    }

    Ok((0..batch.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|(name, cells)| (name.clone(), cells[row].clone()))
                .collect()
        })
        .collect())
}

struct Layout<'a> {
    title: &'a str,
    kind: ChartKind,
    x: &'a str,
    color: &'a str,
    data_labels: bool,
}

fn panel(
    outcome: &Result<RecordBatch, EngineError>,
    layout: Layout<'_>,
    color_map: impl FnOnce(&RecordBatch) -> Result<BTreeMap<String, String>, EngineError>,
) -> ChartPanel {
    let title = layout.title.to_string();
    let batch = match outcome {
        Ok(batch) if batch.num_rows() == 0 => return ChartPanel::Empty { title },
        Ok(batch) => batch,
        Err(e) => {
            return ChartPanel::Failed {
                title,
                error: e.to_string(),
            }
        }
    };
    let built = records(batch).and_then(|rows| Ok((rows, color_map(batch)?)));
    match built {
        Ok((rows, color_map)) => ChartPanel::Ready(ChartSpec {
            title,
            kind: layout.kind,
            x: layout.x.to_string(),
            y: VALUE.to_string(),
            color: layout.color.to_string(),
            color_map,
            data_labels: layout.data_labels,
            rows,
        }),
        Err(e) => ChartPanel::Failed {
            title,
            error: e.to_string(),
        },
    }
}

/// Turn the three summary outcomes into chart panels.
pub fn build_charts(summaries: &Summaries, config: &DashboardConfig) -> Charts {
    let titles = config.chart_titles();
    Charts {
        unit_sales: panel(
            &summaries.unit_sales,
            Layout {
                title: &titles.unit_sales,
                kind: ChartKind::GroupedBar,
                x: BUSINESS_UNIT,
                color: SCENARIO,
                data_labels: true,
            },
            |_| Ok(config.unit_sales_colors.clone()),
        ),
        monthly_trend: panel(
            &summaries.monthly_trend,
            Layout {
                title: &titles.monthly_trend,
                kind: ChartKind::Line,
                x: PERIOD,
                color: SCENARIO,
                data_labels: true,
            },
            |_| Ok(config.trend_colors.clone()),
        ),
        yearly_accounts: panel(
            &summaries.yearly_accounts,
            Layout {
                title: &titles.yearly_accounts,
                kind: ChartKind::StackedBar,
                x: YEAR,
                color: ACCOUNT,
                data_labels: false,
            },
            |batch| {
                let accounts = key_strings(batch, ACCOUNT)?;
                Ok(cycle_colors(
                    accounts.iter().map(String::as_str),
                    &config.palette,
                ))
            },
        ),
    }
}
