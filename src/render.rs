//! Terminal rendering of dashboards.
//!
//! Everything here only formats values the pipelines already computed.

use std::{borrow::Cow, fmt::Write as _};

use itertools::Itertools;

use crate::{
    aggregate::GroupTotal,
    churn::ChurnDashboard,
    dashboard::Dashboard,
    sales::SalesDashboard,
};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect_vec();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect_vec();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

/// Formats with two decimals and thousands separators, e.g. `1,234.50`.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let digits = whole.len();
    let mut grouped = String::with_capacity(digits + digits / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (digits - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn section(output: &mut String, title: &str, table: String) {
    let _ = writeln!(output, "\n{title}");
    output.push_str(&table);
}

fn group_section(output: &mut String, title: &str, columns: &[&str], totals: &[GroupTotal]) {
    let rows = totals
        .iter()
        .map(|t| vec![t.key.clone(), format_amount(t.value)])
        .collect_vec();
    section(output, title, render_table(&headers(columns), &rows));
}

pub fn render_sales(dashboard: &SalesDashboard) -> String {
    let mut output = String::from("Detected: Sales Dataset\n");
    let kpis = &dashboard.kpis;
    let metrics = vec![
        vec!["Total Revenue".to_string(), format_amount(kpis.total_revenue)],
        vec!["Total Orders".to_string(), kpis.total_orders.to_string()],
        vec!["Avg Order Value".to_string(), format_amount(kpis.avg_order_value)],
    ];
    section(
        &mut output,
        "Key Metrics (Sales)",
        render_table(&headers(&["metric", "value"]), &metrics),
    );

    if let Some(best) = &dashboard.best_month {
        let _ = writeln!(
            output,
            "\nBest Month: {} | Sales: {}",
            best.month,
            format_amount(best.sales)
        );
    }

    let monthly = dashboard
        .monthly_revenue
        .iter()
        .map(|m| vec![m.month.clone(), format_amount(m.sales)])
        .collect_vec();
    section(
        &mut output,
        "Monthly Revenue Trend",
        render_table(&headers(&["month", "sales"]), &monthly),
    );

    if let Some(totals) = &dashboard.category_sales {
        group_section(&mut output, "Sales by Category", &["category", "sales"], totals);
    }
    if let Some(totals) = &dashboard.region_sales {
        group_section(&mut output, "Revenue by Region", &["region", "sales"], totals);
    }
    if let Some(totals) = &dashboard.top_products {
        let title = format!("Top {} Products", totals.len());
        group_section(&mut output, &title, &["product_name", "product_sales"], totals);
    }
    output
}

pub fn render_churn(dashboard: &ChurnDashboard) -> String {
    let mut output = String::from("Detected: Customer Churn Dataset\n");
    let kpis = &dashboard.kpis;
    let metrics = vec![
        vec!["Total Customers".to_string(), kpis.total_customers.to_string()],
        vec!["Churned Customers".to_string(), kpis.churned.to_string()],
        vec!["Churn Rate".to_string(), format!("{:.2}%", kpis.churn_rate)],
    ];
    section(
        &mut output,
        "Key Metrics (Churn)",
        render_table(&headers(&["metric", "value"]), &metrics),
    );

    let statuses = dashboard
        .status_counts
        .iter()
        .map(|s| vec![s.label.clone(), s.count.to_string()])
        .collect_vec();
    section(
        &mut output,
        "Customer Status",
        render_table(&headers(&["status", "count"]), &statuses),
    );

    if let Some(rates) = &dashboard.churn_by_contract {
        let rows = rates
            .iter()
            .map(|r| vec![r.key.clone(), format!("{:.2}", r.value)])
            .collect_vec();
        section(
            &mut output,
            "Churn Rate by Contract",
            render_table(&headers(&["contract", "churn_rate_percent"]), &rows),
        );
    }
    output
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    match dashboard {
        Dashboard::Sales(sales) => render_sales(sales),
        Dashboard::Churn(churn) => render_churn(churn),
        Dashboard::Unknown(unknown) => format!("{unknown}\n"),
    }
}
