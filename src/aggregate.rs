//! Group-by helpers shared by the dashboards.
//!
//! Groups come out ordered by key ascending; rows whose key is missing are
//! dropped, and missing measures are skipped.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;

use crate::{data::Value, dataset::Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

impl GroupTotal {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

fn accumulate(table: &Table, key: &str, measure: &str) -> Option<BTreeMap<Value, Accumulator>> {
    let keys = table.values(key)?;
    let measures = table.values(measure)?;
    let mut groups: BTreeMap<Value, Accumulator> = BTreeMap::new();
    for (group, value) in keys.iter().zip(measures) {
        if group.is_missing() {
            continue;
        }
        let entry = groups.entry(group.clone()).or_default();
        if let Some(n) = value.as_number() {
            entry.sum += n;
            entry.count += 1;
        }
    }
    Some(groups)
}

/// Sum of `measure` per distinct `key`. `None` when either column is absent.
pub fn sum_by(table: &Table, key: &str, measure: &str) -> Option<Vec<GroupTotal>> {
    let groups = accumulate(table, key, measure)?;
    Some(
        groups
            .into_iter()
            .map(|(group, acc)| GroupTotal::new(group.as_display(), acc.sum))
            .collect(),
    )
}

/// Mean of `measure` per distinct `key`; a group without any numeric
/// measure averages to zero.
pub fn mean_by(table: &Table, key: &str, measure: &str) -> Option<Vec<GroupTotal>> {
    let groups = accumulate(table, key, measure)?;
    Some(
        groups
            .into_iter()
            .map(|(group, acc)| {
                let mean = if acc.count > 0 {
                    acc.sum / acc.count as f64
                } else {
                    0.0
                };
                GroupTotal::new(group.as_display(), mean)
            })
            .collect(),
    )
}

/// Occurrences of each distinct non-missing value, ordered by value.
pub fn value_counts(table: &Table, column: &str) -> Vec<(Value, usize)> {
    let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
    for value in table.values(column).unwrap_or_default() {
        if !value.is_missing() {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}

/// Sorts by value descending. Ties keep their key order.
pub fn sort_descending(totals: &mut [GroupTotal]) {
    totals.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
}

pub fn top_n(mut totals: Vec<GroupTotal>, n: usize) -> Vec<GroupTotal> {
    sort_descending(&mut totals);
    totals.truncate(n);
    totals
}
