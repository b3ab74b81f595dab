//! Sales dashboard pipeline.
//!
//! Cleans a sales-shaped table, applies the inclusion filters, and derives
//! the KPIs, monthly revenue trend, group totals, and top products.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::{
    aggregate::{self, GroupTotal},
    coerce::{ensure_datetime, ensure_numeric},
    data::Value,
    dataset::Table,
    filter::{SalesFilters, date_extent},
    report::KpiReport,
};

pub const DEFAULT_TOP_PRODUCTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalesKpis {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub avg_order_value: f64,
}

impl SalesKpis {
    pub fn compute(table: &Table) -> Self {
        let total_revenue: f64 = table
            .values("sales")
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_number)
            .sum();
        let total_orders = match table.values("order_id") {
            Some(ids) => ids
                .iter()
                .filter(|id| !id.is_missing())
                .collect::<HashSet<_>>()
                .len(),
            None => table.row_count(),
        };
        let avg_order_value = if total_orders > 0 {
            total_revenue / total_orders as f64
        } else {
            0.0
        };
        Self {
            total_revenue,
            total_orders,
            avg_order_value,
        }
    }

    pub fn report(&self) -> KpiReport {
        KpiReport::new()
            .with("total_revenue", self.total_revenue)
            .with("total_orders", self.total_orders as f64)
            .with("average_order_value", self.avg_order_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: String,
    pub sales: f64,
}

/// Options offered to the user for narrowing the cleaned table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesFilterOptions {
    pub regions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesDashboard {
    pub kpis: SalesKpis,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub best_month: Option<MonthlyRevenue>,
    pub category_sales: Option<Vec<GroupTotal>>,
    pub region_sales: Option<Vec<GroupTotal>>,
    pub top_products: Option<Vec<GroupTotal>>,
    pub filter_options: SalesFilterOptions,
    /// Cleaned and filtered rows, with the derived `month` column.
    #[serde(skip)]
    pub table: Table,
}

impl SalesDashboard {
    pub fn kpi_report(&self) -> KpiReport {
        self.kpis.report()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesPipeline {
    pub day_first: bool,
    pub top_products: usize,
}

impl Default for SalesPipeline {
    fn default() -> Self {
        Self {
            day_first: true,
            top_products: DEFAULT_TOP_PRODUCTS,
        }
    }
}

impl SalesPipeline {
    /// Type coercion and row hygiene; rows without a usable `order_date` or
    /// `sales` are dropped.
    pub fn clean(&self, table: Table) -> Table {
        let table = ensure_datetime(table, "order_date", self.day_first);
        let table = ensure_datetime(table, "ship_date", self.day_first);
        let mut table = ensure_numeric(table, "sales");

        table.map_column("postal_code", |value| match value {
            Value::Missing => Value::Number(0.0),
            other => other,
        });
        if table.drop_column("row_id") {
            debug!("Dropped identifier column 'row_id'");
        }

        let table = table.drop_duplicate_rows();
        let before = table.row_count();
        let table = table.drop_rows_missing(&["order_date", "sales"]);
        debug!(
            "Dropped {} row(s) without order_date or sales; {} remain",
            before - table.row_count(),
            table.row_count()
        );
        table
    }

    pub fn run(&self, table: Table, filters: &SalesFilters) -> SalesDashboard {
        let cleaned = self.clean(table);
        let filter_options = filter_options(&cleaned);
        let mut filtered = filters.apply(&cleaned);

        let kpis = SalesKpis::compute(&filtered);
        let months = month_labels(&filtered);
        let monthly_revenue = monthly_revenue(&filtered, &months);
        let best_month = best_month(&monthly_revenue);
        filtered.set_column("month", months);

        let category_sales = grouped_sales(&filtered, "category");
        let region_sales = grouped_sales(&filtered, "region");
        let top_products = aggregate::sum_by(&filtered, "product_name", "sales")
            .map(|totals| aggregate::top_n(totals, self.top_products));

        SalesDashboard {
            kpis,
            monthly_revenue,
            best_month,
            category_sales,
            region_sales,
            top_products,
            filter_options,
            table: filtered,
        }
    }
}

fn filter_options(table: &Table) -> SalesFilterOptions {
    let distinct = |column: &str| -> Option<Vec<String>> {
        table.has_column(column).then(|| {
            table
                .distinct_values(column)
                .iter()
                .map(Value::as_display)
                .collect()
        })
    };
    let extent = date_extent(table, "order_date");
    SalesFilterOptions {
        regions: distinct("region"),
        categories: distinct("category"),
        min_date: extent.map(|(min, _)| min),
        max_date: extent.map(|(_, max)| max),
    }
}

/// `YYYY-MM` label of each row's `order_date`.
fn month_labels(table: &Table) -> Vec<Value> {
    table
        .values("order_date")
        .unwrap_or_default()
        .iter()
        .map(|value| match value.as_date() {
            Some(dt) => Value::Text(dt.format("%Y-%m").to_string()),
            None => Value::Missing,
        })
        .collect()
}

fn monthly_revenue(table: &Table, months: &[Value]) -> Vec<MonthlyRevenue> {
    let sales = table.values("sales").unwrap_or_default();
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (month, value) in months.iter().zip(sales) {
        if let Value::Text(month) = month {
            *totals.entry(month.clone()).or_insert(0.0) += value.as_number().unwrap_or(0.0);
        }
    }
    totals
        .into_iter()
        .map(|(month, sales)| MonthlyRevenue { month, sales })
        .collect()
}

/// Month with the highest revenue; the earliest month wins a tie.
pub fn best_month(monthly: &[MonthlyRevenue]) -> Option<MonthlyRevenue> {
    monthly
        .iter()
        .fold(None::<&MonthlyRevenue>, |best, month| match best {
            Some(current) if current.sales >= month.sales => Some(current),
            _ => Some(month),
        })
        .cloned()
}

fn grouped_sales(table: &Table, column: &str) -> Option<Vec<GroupTotal>> {
    let mut totals = aggregate::sum_by(table, column, "sales")?;
    aggregate::sort_descending(&mut totals);
    Some(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::Column,
        filter::{DateRange, Selection},
    };

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn orders() -> Table {
        Table::from_columns(vec![
            Column::new(
                "row_id",
                (1..=6).map(|i| Value::Number(i as f64)).collect(),
            ),
            Column::new(
                "order_id",
                vec![text("A"), text("A"), text("B"), text("C"), text("D"), text("E")],
            ),
            Column::new(
                "order_date",
                vec![
                    text("05/01/2023"),
                    text("05/01/2023"),
                    text("10/02/2023"),
                    text("11/02/2023"),
                    text("bad"),
                    text("12/03/2023"),
                ],
            ),
            Column::new(
                "sales",
                vec![
                    Value::Number(100.0),
                    Value::Number(50.0),
                    Value::Number(70.0),
                    Value::Number(30.0),
                    Value::Number(999.0),
                    text("n/a-ish"),
                ],
            ),
            Column::new(
                "region",
                vec![text("East"), text("East"), text("West"), text("East"), text("West"), text("West")],
            ),
            Column::new(
                "product_name",
                vec![text("Pen"), text("Ink"), text("Pen"), text("Desk"), text("Pen"), text("Ink")],
            ),
            Column::new(
                "postal_code",
                vec![Value::Number(10001.0), Value::Missing, Value::Number(94105.0), Value::Missing, Value::Missing, Value::Missing],
            ),
        ])
    }

    #[test]
    fn clean_drops_identifier_and_unusable_rows() {
        let cleaned = SalesPipeline::default().clean(orders());
        assert!(!cleaned.has_column("row_id"));
        assert_eq!(cleaned.row_count(), 4);
        assert!(
            cleaned
                .values("postal_code")
                .unwrap()
                .iter()
                .all(|v| v.as_number().is_some())
        );
    }

    #[test]
    fn run_computes_kpis_over_distinct_orders() {
        let dashboard = SalesPipeline::default().run(orders(), &SalesFilters::default());
        assert_eq!(dashboard.kpis.total_revenue, 250.0);
        assert_eq!(dashboard.kpis.total_orders, 3);
        assert!((dashboard.kpis.avg_order_value - 250.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_revenue_and_best_month() {
        let dashboard = SalesPipeline::default().run(orders(), &SalesFilters::default());
        assert_eq!(
            dashboard.monthly_revenue,
            vec![
                MonthlyRevenue { month: "2023-01".into(), sales: 150.0 },
                MonthlyRevenue { month: "2023-02".into(), sales: 100.0 },
            ]
        );
        assert_eq!(dashboard.best_month.unwrap().month, "2023-01");
        assert!(dashboard.table.has_column("month"));
    }

    #[test]
    fn best_month_prefers_earliest_on_tie() {
        let monthly = vec![
            MonthlyRevenue { month: "2023-01".into(), sales: 5.0 },
            MonthlyRevenue { month: "2023-02".into(), sales: 9.0 },
            MonthlyRevenue { month: "2023-03".into(), sales: 9.0 },
        ];
        assert_eq!(best_month(&monthly).unwrap().month, "2023-02");
        assert_eq!(best_month(&[]), None);
    }

    #[test]
    fn group_totals_sorted_descending_and_optional() {
        let dashboard = SalesPipeline::default().run(orders(), &SalesFilters::default());
        assert_eq!(
            dashboard.region_sales.unwrap(),
            vec![GroupTotal::new("East", 180.0), GroupTotal::new("West", 70.0)]
        );
        assert!(dashboard.category_sales.is_none());
        assert_eq!(
            dashboard.top_products.unwrap(),
            vec![
                GroupTotal::new("Pen", 170.0),
                GroupTotal::new("Ink", 50.0),
                GroupTotal::new("Desk", 30.0),
            ]
        );
    }

    #[test]
    fn top_products_respects_limit() {
        let pipeline = SalesPipeline {
            top_products: 1,
            ..SalesPipeline::default()
        };
        let dashboard = pipeline.run(orders(), &SalesFilters::default());
        assert_eq!(dashboard.top_products.unwrap().len(), 1);
    }

    #[test]
    fn region_filter_narrows_kpis() {
        let filters = SalesFilters {
            regions: Selection::only(["West"]),
            ..SalesFilters::default()
        };
        let dashboard = SalesPipeline::default().run(orders(), &filters);
        assert_eq!(dashboard.kpis.total_revenue, 70.0);
        assert_eq!(dashboard.kpis.total_orders, 1);
        assert_eq!(
            dashboard.filter_options.regions,
            Some(vec!["East".to_string(), "West".to_string()])
        );
    }

    #[test]
    fn empty_result_yields_zero_kpis() {
        let filters = SalesFilters {
            regions: Selection::only(["North"]),
            ..SalesFilters::default()
        };
        let dashboard = SalesPipeline::default().run(orders(), &filters);
        assert_eq!(dashboard.kpis.total_revenue, 0.0);
        assert_eq!(dashboard.kpis.total_orders, 0);
        assert_eq!(dashboard.kpis.avg_order_value, 0.0);
        assert!(dashboard.monthly_revenue.is_empty());
        assert!(dashboard.best_month.is_none());
    }

    #[test]
    fn unusable_rows_leave_an_empty_dashboard() {
        let table = Table::from_columns(vec![
            Column::new("order_date", vec![text("bad"), text("01/02/2023"), Value::Missing]),
            Column::new("sales", vec![Value::Number(100.0), text("abc"), Value::Number(5.0)]),
            Column::new("region", vec![text("East"), text("West"), text("East")]),
        ]);
        let filters = SalesFilters {
            dates: DateRange::new(NaiveDate::from_ymd_opt(2023, 1, 1), None).unwrap(),
            ..SalesFilters::default()
        };
        let dashboard = SalesPipeline::default().run(table, &filters);

        assert_eq!(dashboard.table.row_count(), 0);
        assert_eq!(dashboard.kpis.total_revenue, 0.0);
        assert_eq!(dashboard.kpis.total_orders, 0);
        assert_eq!(dashboard.kpis.avg_order_value, 0.0);
        assert!(dashboard.monthly_revenue.is_empty());
        assert!(dashboard.best_month.is_none());
        assert_eq!(dashboard.region_sales, Some(Vec::new()));
        assert_eq!(dashboard.filter_options.min_date, None);
        assert_eq!(dashboard.filter_options.max_date, None);
        assert_eq!(dashboard.filter_options.regions, Some(Vec::new()));
    }
}
