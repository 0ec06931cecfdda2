// src/engine/group.rs

use super::columns::{key_strings, numeric_values, text_value_schema};
use super::error::EngineError;
use super::VALUE;
use arrow::{
    array::{ArrayRef, BooleanArray, Float64Builder, StringBuilder},
    compute::filter_record_batch,
    record_batch::RecordBatch,
};
use std::{collections::HashMap, sync::Arc};

/// Row filter over the text rendering of columns.
///
/// Built from values, never from query text, so column names and literals
/// cannot change the shape of the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Keep every row.
    All,
    Eq { column: String, value: String },
    NotEq { column: String, value: String },
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn not_eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::NotEq {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Conjunction, flattening nested `And`s and dropping `All`.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::All, p) | (p, Predicate::All) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(mut right)) => {
                right.insert(0, p);
                Predicate::And(right)
            }
            (a, b) => Predicate::And(vec![a, b]),
        }
    }

    /// Resolve column references against `batch` once, up front.
    fn bind(&self, batch: &RecordBatch) -> Result<Bound<'_>, EngineError> {
        Ok(match self {
            Predicate::All => Bound::All,
            Predicate::Eq { column, value } => Bound::Eq(key_strings(batch, column)?, value),
            Predicate::NotEq { column, value } => {
                Bound::NotEq(key_strings(batch, column)?, value)
            }
            Predicate::And(parts) => Bound::And(
                parts
                    .iter()
                    .map(|p| p.bind(batch))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

enum Bound<'a> {
    All,
    Eq(Vec<String>, &'a str),
    NotEq(Vec<String>, &'a str),
    And(Vec<Bound<'a>>),
}

impl Bound<'_> {
    fn matches(&self, row: usize) -> bool {
        match self {
            Bound::All => true,
            Bound::Eq(cells, value) => cells[row] == *value,
            Bound::NotEq(cells, value) => cells[row] != *value,
            Bound::And(parts) => parts.iter().all(|p| p.matches(row)),
        }
    }
}

/// Keep the rows of `batch` matching `predicate`, every column intact.
///
/// Run on the wide table before unpivoting so cells of rows the filter drops
/// are never parsed.
pub fn filter_rows(batch: &RecordBatch, predicate: &Predicate) -> Result<RecordBatch, EngineError> {
    if *predicate == Predicate::All {
        return Ok(batch.clone());
    }
    let bound = predicate.bind(batch)?;
    let mask: BooleanArray = (0..batch.num_rows())
        .map(|row| Some(bound.matches(row)))
        .collect();
    filter_record_batch(batch, &mask).map_err(Into::into)
}

/// Keep the rows of `tidy` matching `predicate` and sum `value` per distinct
/// combination of `group_keys`.
///
/// Groups appear in order of first appearance. No zero-fill: a combination
/// with no surviving rows is absent. With no `group_keys` the result is a
/// single grand-total row, or nothing if the filter removed every row.
pub fn filter_and_group(
    tidy: &RecordBatch,
    predicate: &Predicate,
    group_keys: &[&str],
) -> Result<RecordBatch, EngineError> {
    let bound = predicate.bind(tidy)?;
    let keys: Vec<Vec<String>> = group_keys
        .iter()
        .map(|name| key_strings(tidy, name))
        .collect::<Result<_, _>>()?;
    let values = numeric_values(tidy, VALUE)?;

    let mut index: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<&str>, f64)> = Vec::new();
    for (row, value) in values.iter().enumerate() {
        if !bound.matches(row) {
            continue;
        }
        let key: Vec<&str> = keys.iter().map(|col| col[row].as_str()).collect();
        match index.get(&key) {
            Some(&slot) => groups[slot].1 += value,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, *value));
            }
        }
    }

    let mut key_builders: Vec<StringBuilder> = group_keys
        .iter()
        .map(|_| StringBuilder::with_capacity(groups.len(), groups.len() * 8))
        .collect();
    let mut sums = Float64Builder::with_capacity(groups.len());
    for (key, total) in &groups {
        for (builder, part) in key_builders.iter_mut().zip(key) {
            builder.append_value(part);
        }
        sums.append_value(*total);
    }

    let mut arrays: Vec<ArrayRef> = key_builders
        .into_iter()
        .map(|mut b| Arc::new(b.finish()) as ArrayRef)
        .collect();
    arrays.push(Arc::new(sums.finish()));
    RecordBatch::try_new(text_value_schema(group_keys), arrays).map_err(Into::into)
}
