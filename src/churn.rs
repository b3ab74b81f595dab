//! Customer churn dashboard pipeline.

use log::debug;
use serde::Serialize;

use crate::{
    aggregate::{self, GroupTotal},
    coerce::ensure_numeric,
    data::Value,
    dataset::Table,
    filter::ChurnFilters,
    report::{KpiReport, round2},
};

/// Optional charge/tenure columns coerced to numbers when present.
pub const NUMERIC_COLUMNS: &[&str] = &[
    "monthlycharges",
    "totalcharges",
    "tenure",
    "monthly_charges",
    "total_charges",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChurnKpis {
    pub total_customers: usize,
    pub churned: usize,
    pub churn_rate: f64,
}

impl ChurnKpis {
    pub fn compute(table: &Table) -> Self {
        let total_customers = table.row_count();
        let churned: f64 = table
            .values("churn")
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_number)
            .sum();
        let churned = churned as usize;
        let churn_rate = if total_customers > 0 {
            churned as f64 / total_customers as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_customers,
            churned,
            churn_rate,
        }
    }

    pub fn report(&self) -> KpiReport {
        KpiReport::new()
            .with("total_customers", self.total_customers as f64)
            .with("churned_customers", self.churned as f64)
            .with("churn_rate_percent", round2(self.churn_rate))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnStatusCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnDashboard {
    pub kpis: ChurnKpis,
    pub status_counts: Vec<ChurnStatusCount>,
    pub churn_by_contract: Option<Vec<GroupTotal>>,
    pub contract_options: Option<Vec<String>>,
    #[serde(skip)]
    pub table: Table,
}

impl ChurnDashboard {
    pub fn kpi_report(&self) -> KpiReport {
        self.kpis.report()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChurnPipeline;

impl ChurnPipeline {
    pub fn clean(&self, table: Table) -> Table {
        let table = normalize_churn_flags(table);
        NUMERIC_COLUMNS
            .iter()
            .fold(table, |table, column| ensure_numeric(table, column))
    }

    pub fn run(&self, table: Table, filters: &ChurnFilters) -> ChurnDashboard {
        let cleaned = self.clean(table);
        let contract_options = cleaned.has_column("contract").then(|| {
            cleaned
                .distinct_values("contract")
                .iter()
                .map(Value::as_display)
                .collect::<Vec<_>>()
        });
        let filtered = filters.apply(&cleaned);

        let kpis = ChurnKpis::compute(&filtered);
        let status_counts = status_counts(&filtered);
        let churn_by_contract = aggregate::mean_by(&filtered, "contract", "churn").map(|means| {
            let mut rates: Vec<GroupTotal> = means
                .into_iter()
                .map(|g| GroupTotal::new(g.key, g.value * 100.0))
                .collect();
            aggregate::sort_descending(&mut rates);
            rates
        });

        ChurnDashboard {
            kpis,
            status_counts,
            churn_by_contract,
            contract_options,
            table: filtered,
        }
    }
}

/// Turns the `churn` column into 0/1 flags. Text columns map `yes`/`no` and
/// `true`/`false` (trimmed, any case); every other value, and anything
/// missing, counts as not churned. Numeric flags are truncated and clamped into 0..=1.
fn normalize_churn_flags(mut table: Table) -> Table {
    let is_text = table.column("churn").is_some_and(|c| c.has_text());
    if is_text {
        table.map_column("churn", |value| match value {
            Value::Text(text) => match text.trim().to_lowercase().as_str() {
                "yes" | "true" => Value::Number(1.0),
                "no" | "false" => Value::Number(0.0),
                _ => Value::Missing,
            },
            _ => Value::Missing,
        });
    }
    let mut table = ensure_numeric(table, "churn");
    table.map_column("churn", |value| {
        let flag = value.as_number().map_or(0.0, |n| n.trunc().clamp(0.0, 1.0));
        Value::Number(flag)
    });
    debug!("Normalized churn flags (text input: {is_text})");
    table
}

fn status_counts(table: &Table) -> Vec<ChurnStatusCount> {
    let counts = aggregate::value_counts(table, "churn");
    let binary = counts.len() == 2;
    counts
        .into_iter()
        .enumerate()
        .map(|(idx, (value, count))| {
            let label = match (binary, idx) {
                (true, 0) => "Not Churned".to_string(),
                (true, _) => "Churned".to_string(),
                (false, _) => value.as_display(),
            };
            ChurnStatusCount { label, count }
        })
        .collect()
}
