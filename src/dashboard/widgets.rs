// src/dashboard/widgets.rs

use crate::config::{DerivedMetric, GaugeSpec, MetricSpec, ValueSource};
use crate::engine::{
    abs_columns, filter_and_group, filter_rows, key_strings, numeric_values,
    reshape_wide_to_long, EngineError, Predicate, ACCOUNT, BUSINESS_UNIT, PERIOD, SCENARIO,
    VALUE, YEAR,
};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::collections::HashMap;

/// Whether a number came out of the data or was typed into the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Derived,
    Illustrative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TileValue {
    Ready { value: f64 },
    /// No row matched the metric's filter.
    Empty,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sparkline {
    pub color: String,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTile {
    pub label: String,
    pub prefix: String,
    pub suffix: String,
    pub provenance: Provenance,
    pub value: TileValue,
    pub sparkline: Option<Sparkline>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub title: String,
    pub suffix: String,
    pub color: String,
    pub max_bound: f64,
    pub provenance: Provenance,
    pub value: TileValue,
}

/// Monthly totals for one derived metric, in `months` order. Months with no
/// matching rows are left out.
///
/// Only rows matching the metric are parsed. With `absolute` each cell is
/// made positive before summing, so mixed-sign accounts add magnitudes.
fn monthly_series(
    source: &RecordBatch,
    metric: &DerivedMetric,
    months: &[&str],
) -> Result<Vec<f64>, EngineError> {
    let mut predicate =
        Predicate::eq(SCENARIO, &metric.scenario).and(Predicate::eq(ACCOUNT, &metric.account));
    if let Some(year) = &metric.year {
        predicate = predicate.and(Predicate::eq(YEAR, year));
    }
    if let Some(unit) = &metric.business_unit {
        predicate = predicate.and(Predicate::eq(BUSINESS_UNIT, unit));
    }
    let mut rows = filter_rows(source, &predicate)?;
    if metric.absolute {
        rows = abs_columns(&rows, months)?;
    }
    let tidy = reshape_wide_to_long(&rows, &[], months)?;
    let by_month = filter_and_group(&tidy, &Predicate::All, &[PERIOD])?;
    let totals: HashMap<String, f64> = key_strings(&by_month, PERIOD)?
        .into_iter()
        .zip(numeric_values(&by_month, VALUE)?)
        .collect();
    Ok(months.iter().filter_map(|m| totals.get(*m).copied()).collect())
}

/// Value and optional monthly points for a source.
fn evaluate(
    value_source: &ValueSource,
    source: &RecordBatch,
    months: &[&str],
) -> (Provenance, TileValue, Option<Vec<f64>>) {
    match value_source {
        ValueSource::Fixed { value } => {
            (Provenance::Illustrative, TileValue::Ready { value: *value }, None)
        }
        ValueSource::Derived(metric) => match monthly_series(source, metric, months) {
            Ok(points) if points.is_empty() => (Provenance::Derived, TileValue::Empty, None),
            Ok(points) => {
                let value = points.iter().sum();
                (Provenance::Derived, TileValue::Ready { value }, Some(points))
            }
            Err(e) => (
                Provenance::Derived,
                TileValue::Failed {
                    error: e.to_string(),
                },
                None,
            ),
        },
    }
}

/// Build a metric tile from the wide source table.
pub fn metric_tile(spec: &MetricSpec, source: &RecordBatch, months: &[&str]) -> MetricTile {
    let (provenance, value, points) = evaluate(&spec.source, source, months);
    let sparkline = match (&spec.sparkline_color, points) {
        (Some(color), Some(points)) => Some(Sparkline {
            color: color.clone(),
            points,
        }),
        _ => None,
    };
    MetricTile {
        label: spec.label.clone(),
        prefix: spec.prefix.clone(),
        suffix: spec.suffix.clone(),
        provenance,
        value,
        sparkline,
    }
}

pub fn gauge(spec: &GaugeSpec, source: &RecordBatch, months: &[&str]) -> Gauge {
    let (provenance, value, _) = evaluate(&spec.source, source, months);
    Gauge {
        title: spec.title.clone(),
        suffix: spec.suffix.clone(),
        color: spec.color.clone(),
        max_bound: spec.max_bound,
        provenance,
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MONTHS;
    use crate::summary::tests::{ramp, scenario_table};
    use arrow::array::{ArrayRef, StringArray};
    use std::sync::Arc;

    fn derived(account: &str, year: Option<&str>, absolute: bool) -> ValueSource {
        ValueSource::Derived(DerivedMetric {
            scenario: "Actuals".into(),
            account: account.into(),
            year: year.map(str::to_string),
            business_unit: None,
            absolute,
        })
    }

    fn spec(source: ValueSource) -> MetricSpec {
        MetricSpec {
            label: "tile".into(),
            source,
            prefix: "$".into(),
            suffix: String::new(),
            sparkline_color: Some("#123456".into()),
        }
    }

    #[test]
    fn fixed_values_are_flagged_illustrative() {
        let table = scenario_table(&[]);
        let tile = metric_tile(&spec(ValueSource::Fixed { value: 6_621_280.0 }), &table, &MONTHS);
        assert_eq!(tile.provenance, Provenance::Illustrative);
        assert_eq!(tile.value, TileValue::Ready { value: 6_621_280.0 });
        assert!(tile.sparkline.is_none());
    }

    #[test]
    fn derived_values_sum_the_data() {
        let table = scenario_table(&[
            ("Actuals", "Software", "Sales", "2023", ramp(10.0, 1.0)),
            ("Actuals", "Hardware", "Sales", "2023", ramp(1.0, 0.0)),
            ("Actuals", "Software", "Sales", "2022", ramp(1000.0, 0.0)),
            ("Actuals", "Software", "Payroll", "2023", ramp(-3.0, 0.0)),
        ]);
        let tile = metric_tile(&spec(derived("Sales", Some("2023"), false)), &table, &MONTHS);
        assert_eq!(tile.provenance, Provenance::Derived);
        // 10..=21 plus twelve ones
        assert_eq!(tile.value, TileValue::Ready { value: 186.0 + 12.0 });
        let line = tile.sparkline.unwrap();
        assert_eq!(line.points.len(), 12);
        assert_eq!(line.points[0], 11.0);

        let payroll = metric_tile(&spec(derived("Payroll", None, true)), &table, &MONTHS);
        assert_eq!(payroll.value, TileValue::Ready { value: 36.0 });
    }

    #[test]
    fn absolute_applies_to_each_cell() {
        let table = scenario_table(&[
            ("Actuals", "Software", "Travel", "2023", ramp(-3.0, 0.0)),
            ("Actuals", "Hardware", "Travel", "2023", ramp(2.0, 0.0)),
        ]);
        let tile = metric_tile(&spec(derived("Travel", None, true)), &table, &MONTHS);
        // 3 + 2 per month, not |-3 + 2|
        assert_eq!(tile.value, TileValue::Ready { value: 60.0 });
        assert_eq!(tile.sparkline.unwrap().points[0], 5.0);

        let signed = metric_tile(&spec(derived("Travel", None, false)), &table, &MONTHS);
        assert_eq!(signed.value, TileValue::Ready { value: -12.0 });
    }

    #[test]
    fn derived_with_no_rows_is_empty() {
        let table = scenario_table(&[("Budget", "Software", "Sales", "2023", ramp(1.0, 0.0))]);
        let tile = metric_tile(&spec(derived("Sales", None, false)), &table, &MONTHS);
        assert_eq!(tile.value, TileValue::Empty);
    }

    #[test]
    fn schema_failure_surfaces_on_the_gauge() {
        let table = RecordBatch::try_from_iter(vec![(
            "Scenario",
            Arc::new(StringArray::from(vec!["Actuals"])) as ArrayRef,
        )])
        .unwrap();
        let g = gauge(
            &GaugeSpec {
                title: "Sales".into(),
                source: derived("Sales", None, false),
                max_bound: 10.0,
                suffix: String::new(),
                color: "#000".into(),
            },
            &table,
            &MONTHS,
        );
        assert!(matches!(g.value, TileValue::Failed { ref error } if error.contains("Account")));
    }
}
