// src/summary/mod.rs
//
// The three chart summaries the dashboard draws: filter the wide rows, unpivot
// the survivors, then group.

pub mod export;

use crate::engine::{
    abs_columns, filter_and_group, filter_rows, require_columns, reshape_wide_to_long, EngineError, Predicate,
    ACCOUNT, BUSINESS_UNIT, PERIOD, SCENARIO, YEAR,
};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Filter literals shared by the summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryParams {
    /// Year the sales charts look at.
    #[serde(deserialize_with = "crate::config::key_text")]
    pub year: String,
    pub sales_account: String,
    /// Business unit of the month-by-month trend line.
    pub trend_business_unit: String,
    pub actuals_scenario: String,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            year: "2023".into(),
            sales_account: "Sales".into(),
            trend_business_unit: "Software".into(),
            actuals_scenario: "Actuals".into(),
        }
    }
}

/// Id columns every sales summary carries through the unpivot.
const SALES_IDS: [&str; 4] = [SCENARIO, BUSINESS_UNIT, ACCOUNT, YEAR];

/// Sales per (Scenario, business_unit) for one year.
pub fn unit_sales(
    source: &RecordBatch,
    months: &[&str],
    params: &SummaryParams,
) -> Result<RecordBatch, EngineError> {
    require_columns(source, &SALES_IDS)?;
    let predicate =
        Predicate::eq(YEAR, &params.year).and(Predicate::eq(ACCOUNT, &params.sales_account));
    let rows = filter_rows(source, &predicate)?;
    let tidy = reshape_wide_to_long(&rows, &SALES_IDS, months)?;
    filter_and_group(&tidy, &Predicate::All, &[SCENARIO, BUSINESS_UNIT])
}

/// Month-by-month sales of one business unit, one row per (Scenario, period).
pub fn monthly_trend(
    source: &RecordBatch,
    months: &[&str],
    params: &SummaryParams,
) -> Result<RecordBatch, EngineError> {
    require_columns(source, &SALES_IDS)?;
    let predicate = Predicate::eq(YEAR, &params.year)
        .and(Predicate::eq(ACCOUNT, &params.sales_account))
        .and(Predicate::eq(BUSINESS_UNIT, &params.trend_business_unit));
    let rows = filter_rows(source, &predicate)?;
    let tidy = reshape_wide_to_long(&rows, &SALES_IDS, months)?;
    filter_and_group(&tidy, &Predicate::All, &[SCENARIO, PERIOD])
}

/// Actual spend magnitude per (Account, Year) for every non-sales account.
///
/// Expense accounts carry outflows as negatives; amounts are made absolute
/// cell by cell before reshaping.
pub fn yearly_accounts(
    source: &RecordBatch,
    months: &[&str],
    params: &SummaryParams,
) -> Result<RecordBatch, EngineError> {
    let ids = [SCENARIO, ACCOUNT, YEAR];
    require_columns(source, &ids)?;
    let predicate = Predicate::eq(SCENARIO, &params.actuals_scenario)
        .and(Predicate::not_eq(ACCOUNT, &params.sales_account));
    let rows = filter_rows(source, &predicate)?;
    let magnitudes = abs_columns(&rows, months)?;
    let tidy = reshape_wide_to_long(&magnitudes, &ids, months)?;
    filter_and_group(&tidy, &Predicate::All, &[ACCOUNT, YEAR])
}

/// Outcome of each summary, kept apart so one failure leaves the others
/// drawable.
#[derive(Debug, Clone)]
pub struct Summaries {
    pub unit_sales: Result<RecordBatch, EngineError>,
    pub monthly_trend: Result<RecordBatch, EngineError>,
    pub yearly_accounts: Result<RecordBatch, EngineError>,
}

impl Summaries {
    /// `(name, outcome)` pairs in dashboard order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Result<RecordBatch, EngineError>)> {
        [
            ("unit_sales", &self.unit_sales),
            ("monthly_trend", &self.monthly_trend),
            ("yearly_accounts", &self.yearly_accounts),
        ]
        .into_iter()
    }
}

#[tracing::instrument(level = "info", skip(source, months), fields(rows = source.num_rows()))]
pub fn compute_all(source: &RecordBatch, months: &[&str], params: &SummaryParams) -> Summaries {
    let summaries = Summaries {
        unit_sales: unit_sales(source, months, params),
        monthly_trend: monthly_trend(source, months, params),
        yearly_accounts: yearly_accounts(source, months, params),
    };
    for (name, outcome) in summaries.iter() {
        match outcome {
            Ok(batch) => debug!(summary = name, rows = batch.num_rows(), "summary ready"),
            Err(e) => warn!(summary = name, error = %e, "summary failed"),
        }
    }
    summaries
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::{key_strings, numeric_values, MONTHS, VALUE};
    use arrow::array::{ArrayRef, Float64Array, StringArray};
    use std::sync::Arc;

    /// Wide scenario table with `Year` as text, the way a CSV upload of
    /// mixed columns arrives.
    pub(crate) fn scenario_table(rows: &[(&str, &str, &str, &str, [f64; 12])]) -> RecordBatch {
        let mut columns: Vec<(&str, ArrayRef)> = vec![
            (
                SCENARIO,
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0))) as ArrayRef,
            ),
            (
                BUSINESS_UNIT,
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.1))) as ArrayRef,
            ),
            (
                ACCOUNT,
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.2))) as ArrayRef,
            ),
            (
                YEAR,
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.3))) as ArrayRef,
            ),
        ];
        for (m, name) in MONTHS.iter().enumerate() {
            columns.push((
                *name,
                Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.4[m]))) as ArrayRef,
            ));
        }
        RecordBatch::try_from_iter(columns).unwrap()
    }

    pub(crate) fn ramp(start: f64, step: f64) -> [f64; 12] {
        std::array::from_fn(|i| start + step * i as f64)
    }

    fn keyed(batch: &RecordBatch, keys: &[&str]) -> Vec<(Vec<String>, f64)> {
        let cols: Vec<Vec<String>> = keys.iter().map(|k| key_strings(batch, k).unwrap()).collect();
        numeric_values(batch, VALUE)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(row, v)| (cols.iter().map(|c| c[row].clone()).collect(), v))
            .collect()
    }

    #[test]
    fn unit_sales_sums_each_row_of_months() {
        let budget = ramp(100.0, 10.0);
        let forecast = ramp(150.0, -5.0);
        let t = scenario_table(&[
            ("Budget", "Software", "Sales", "2023", budget),
            ("Forecast", "Software", "Sales", "2023", forecast),
            ("Budget", "Software", "Sales", "2022", ramp(1.0, 1.0)),
            ("Budget", "Software", "Payroll Expense", "2023", ramp(-9.0, 0.0)),
        ]);
        let out = unit_sales(&t, &MONTHS, &SummaryParams::default()).unwrap();
        assert_eq!(
            keyed(&out, &[SCENARIO, BUSINESS_UNIT]),
            vec![
                (vec!["Budget".into(), "Software".into()], budget.iter().sum()),
                (vec!["Forecast".into(), "Software".into()], forecast.iter().sum()),
            ]
        );
    }

    #[test]
    fn monthly_trend_keeps_one_row_per_month() {
        let t = scenario_table(&[
            ("Budget", "Software", "Sales", "2023", ramp(10.0, 1.0)),
            ("Forecast", "Software", "Sales", "2023", ramp(20.0, 1.0)),
            ("Budget", "Hardware", "Sales", "2023", ramp(99.0, 0.0)),
        ]);
        let out = monthly_trend(&t, &MONTHS, &SummaryParams::default()).unwrap();
        assert_eq!(out.num_rows(), 24);
        let rows = keyed(&out, &[SCENARIO, PERIOD]);
        assert_eq!(rows[0], (vec!["Budget".into(), "Jan".into()], 10.0));
        assert_eq!(rows[11], (vec!["Budget".into(), "Dec".into()], 21.0));
        assert_eq!(rows[12], (vec!["Forecast".into(), "Jan".into()], 20.0));
    }

    #[test]
    fn yearly_accounts_sum_magnitudes() {
        let mut payroll = [0.0; 12];
        payroll[0] = -500.0;
        let t = scenario_table(&[
            ("Actuals", "Software", "Payroll Expense", "2023", payroll),
            ("Actuals", "Hardware", "Payroll Expense", "2023", ramp(-1.0, 0.0)),
            ("Actuals", "Software", "Sales", "2023", ramp(1000.0, 0.0)),
            ("Budget", "Software", "Payroll Expense", "2023", ramp(-7.0, 0.0)),
            ("Actuals", "Software", "Marketing Expense", "2022", ramp(-2.0, 0.0)),
        ]);
        let out = yearly_accounts(&t, &MONTHS, &SummaryParams::default()).unwrap();
        assert_eq!(
            keyed(&out, &[ACCOUNT, YEAR]),
            vec![
                (vec!["Payroll Expense".into(), "2023".into()], 512.0),
                (vec!["Marketing Expense".into(), "2022".into()], 24.0),
            ]
        );
    }

    #[test]
    fn empty_source_gives_empty_summaries() {
        let t = scenario_table(&[]);
        let all = compute_all(&t, &MONTHS, &SummaryParams::default());
        for (name, outcome) in all.iter() {
            let batch = outcome.as_ref().unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(batch.num_rows(), 0, "{name}");
        }
    }

    #[test]
    fn missing_business_unit_only_breaks_the_charts_that_need_it() {
        let t = scenario_table(&[("Actuals", "Software", "Payroll Expense", "2023", ramp(-1.0, 0.0))]);
        let idx = t.schema().index_of(BUSINESS_UNIT).unwrap();
        let t = t.project(
            &(0..t.num_columns())
                .filter(|i| *i != idx)
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let all = compute_all(&t, &MONTHS, &SummaryParams::default());
        assert!(all.unit_sales.as_ref().unwrap_err().is_schema_mismatch());
        assert!(all.monthly_trend.as_ref().unwrap_err().is_schema_mismatch());
        assert_eq!(all.yearly_accounts.as_ref().unwrap().num_rows(), 1);
    }

    /// `table` with one month cell of `row` blanked out.
    fn blank_cell(table: &RecordBatch, month: &str, row: usize) -> RecordBatch {
        let idx = table.schema().index_of(month).unwrap();
        let cells = numeric_values(table, month).unwrap();
        let blanked: Float64Array = cells
            .iter()
            .enumerate()
            .map(|(r, v)| (r != row).then_some(*v))
            .collect();
        let mut columns = table.columns().to_vec();
        columns[idx] = Arc::new(blanked) as ArrayRef;
        let schema = table.schema();
        RecordBatch::try_from_iter(schema.fields().iter().map(|f| f.name().as_str()).zip(columns)).unwrap()
    }

    #[test]
    fn blank_cells_outside_the_filter_do_not_matter() {
        let t = scenario_table(&[
            ("Budget", "Software", "Sales", "2023", ramp(1.0, 1.0)),
            ("Actuals", "Software", "Payroll", "2023", ramp(-2.0, 0.0)),
            ("Forecast", "Hardware", "Travel", "2025", ramp(1.0, 0.0)),
        ]);
        let all = compute_all(&blank_cell(&t, "Dec", 2), &MONTHS, &SummaryParams::default());
        assert_eq!(all.unit_sales.as_ref().unwrap().num_rows(), 1);
        assert_eq!(all.monthly_trend.as_ref().unwrap().num_rows(), 12);
        assert_eq!(
            keyed(all.yearly_accounts.as_ref().unwrap(), &[ACCOUNT, YEAR]),
            vec![(vec!["Payroll".into(), "2023".into()], 24.0)]
        );
    }

    #[test]
    fn blank_cells_inside_the_filter_fail_loudly() {
        let t = scenario_table(&[
            ("Budget", "Software", "Sales", "2023", ramp(1.0, 1.0)),
            ("Actuals", "Software", "Payroll", "2023", ramp(-2.0, 0.0)),
        ]);
        let all = compute_all(&blank_cell(&t, "Dec", 0), &MONTHS, &SummaryParams::default());
        assert!(matches!(
            all.unit_sales,
            Err(EngineError::MalformedNumeric { ref column, value: None, .. }) if column == "Dec"
        ));
        assert!(matches!(
            all.monthly_trend,
            Err(EngineError::MalformedNumeric { .. })
        ));
        // the payroll row is intact
        assert!(all.yearly_accounts.is_ok());
    }

    #[test]
    fn summaries_are_repeatable() {
        let t = scenario_table(&[
            ("Budget", "Software", "Sales", "2023", ramp(3.0, 2.0)),
            ("Actuals", "Software", "Travel", "2023", ramp(-3.0, -2.0)),
        ]);
        let params = SummaryParams::default();
        let a = compute_all(&t, &MONTHS, &params);
        let b = compute_all(&t, &MONTHS, &params);
        assert_eq!(a.unit_sales, b.unit_sales);
        assert_eq!(a.monthly_trend, b.monthly_trend);
        assert_eq!(a.yearly_accounts, b.yearly_accounts);
    }
}
