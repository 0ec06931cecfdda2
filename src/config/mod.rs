// src/config/mod.rs

use crate::engine::{columns::format_key_number, MONTHS};
use crate::summary::SummaryParams;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// Accept a key literal written as text or as a bare YAML number
/// (`year: 2023` and `year: "2023"` mean the same thing).
pub(crate) fn key_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Int(i64),
        Float(f64),
        Text(String),
    }
    Ok(match Key::deserialize(d)? {
        Key::Int(i) => i.to_string(),
        Key::Float(f) => format_key_number(f),
        Key::Text(s) => s,
    })
}

fn opt_key_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "key_text")] String);
    Ok(Option::<Wrapped>::deserialize(d)?.map(|Wrapped(s)| s))
}

/// Where a tile or gauge value comes from.
///
/// `Fixed` values are placeholders typed into the config and are always shown
/// as illustrative; `Derived` values are summed from the loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    Fixed { value: f64 },
    Derived(DerivedMetric),
}

/// Sum of every month amount matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetric {
    pub scenario: String,
    pub account: String,
    #[serde(default, deserialize_with = "opt_key_text")]
    pub year: Option<String>,
    #[serde(default)]
    pub business_unit: Option<String>,
    /// Report the magnitude (expense accounts are stored negative).
    #[serde(default)]
    pub absolute: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub label: String,
    pub source: ValueSource,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub sparkline_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaugeSpec {
    pub title: String,
    pub source: ValueSource,
    pub max_bound: f64,
    #[serde(default)]
    pub suffix: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartTitles {
    pub unit_sales: String,
    pub monthly_trend: String,
    pub yearly_accounts: String,
}

impl ChartTitles {
    /// Titles with every `{year}` replaced by `year`.
    pub fn for_year(&self, year: &str) -> ChartTitles {
        let fill = |t: &str| t.replace("{year}", year);
        ChartTitles {
            unit_sales: fill(&self.unit_sales),
            monthly_trend: fill(&self.monthly_trend),
            yearly_accounts: fill(&self.yearly_accounts),
        }
    }
}

impl Default for ChartTitles {
    fn default() -> Self {
        Self {
            unit_sales: "Sales for Year {year}".into(),
            monthly_trend: "Monthly Budget vs Forecast {year}".into(),
            yearly_accounts: "Actual Yearly Sales Per Account".into(),
        }
    }
}

/// Everything the dashboard needs besides the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Wide month columns to unpivot, in display order.
    pub months: Vec<String>,
    pub summary: SummaryParams,
    pub preview_rows: usize,
    /// Distinct inputs kept parsed and summarised.
    pub cache_capacity: usize,
    /// Colors cycled over accounts in the yearly chart.
    pub palette: Vec<String>,
    pub unit_sales_colors: BTreeMap<String, String>,
    pub trend_colors: BTreeMap<String, String>,
    pub titles: ChartTitles,
    pub metrics: Vec<MetricSpec>,
    pub gauges: Vec<GaugeSpec>,
}

fn colors(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fixed_metric(label: &str, value: f64, prefix: &str, suffix: &str, color: &str) -> MetricSpec {
    MetricSpec {
        label: label.into(),
        source: ValueSource::Fixed { value },
        prefix: prefix.into(),
        suffix: suffix.into(),
        sparkline_color: Some(color.into()),
    }
}

fn fixed_gauge(title: &str, value: f64, max_bound: f64, suffix: &str, color: &str) -> GaugeSpec {
    GaugeSpec {
        title: title.into(),
        source: ValueSource::Fixed { value },
        max_bound,
        suffix: suffix.into(),
        color: color.into(),
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            months: MONTHS.iter().map(|m| m.to_string()).collect(),
            summary: SummaryParams::default(),
            preview_rows: 10,
            cache_capacity: 8,
            palette: [
                "#ADD8E6", "#FFD700", "#FFA07A", "#98FB98", "#FFB6C1", "#87CEFA", "#FFA500",
                "#F0E68C",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            unit_sales_colors: colors(&[
                ("Budget", "rgba(148, 0, 211, 0.2)"),
                ("Forecast", "rgba(255, 255, 150, 0.5)"),
            ]),
            trend_colors: colors(&[
                ("Budget", "rgba(255, 99, 71, 0.5)"),
                ("Forecast", "rgba(135, 206, 235, 0.5)"),
            ]),
            titles: ChartTitles::default(),
            metrics: vec![
                fixed_metric(
                    "Total Accounts Receivable",
                    6_621_280.0,
                    "$",
                    "",
                    "rgba(0, 104, 201, 0.2)",
                ),
                fixed_metric(
                    "Total Accounts Payable",
                    1_630_270.0,
                    "$",
                    "",
                    "rgba(255, 165, 0, 0.2)",
                ),
                fixed_metric("Equity Ratio", 75.38, "", " %", "rgba(255, 43, 43, 0.2)"),
                fixed_metric("Debt Equity", 1.10, "", " %", "rgba(43, 131, 59, 0.2)"),
            ],
            gauges: vec![
                fixed_gauge("Current Ratio", 1.86, 3.0, "%", "#0068C9"),
                fixed_gauge("In Stock", 10.0, 31.0, " days", "#FF8700"),
                fixed_gauge("Out Stock", 7.0, 31.0, " days", "#FF2B2B"),
                fixed_gauge("Delay", 28.0, 31.0, " days", "#29B09D"),
            ],
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: DashboardConfig =
            serde_yaml::from_str(text).context("parsing dashboard config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {:?}", path))
    }

    pub fn validate(&self) -> Result<()> {
        if self.months.is_empty() {
            bail!("config: `months` must list at least one column");
        }
        if self.palette.is_empty() {
            bail!("config: `palette` must have at least one color");
        }
        if self.cache_capacity == 0 {
            bail!("config: `cache_capacity` must be at least 1");
        }
        for g in &self.gauges {
            if !(g.max_bound > 0.0) {
                bail!(
                    "config: gauge `{}` needs a positive max_bound, got {}",
                    g.title,
                    g.max_bound
                );
            }
        }
        Ok(())
    }

    /// Chart titles as displayed, following `summary.year`.
    pub fn chart_titles(&self) -> ChartTitles {
        self.titles.for_year(&self.summary.year)
    }

    pub fn month_names(&self) -> Vec<&str> {
        self.months.iter().map(String::as_str).collect()
    }
}
