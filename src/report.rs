//! Downloadable report artifacts.
//!
//! A KPI report is a `metric,value` CSV; the cleaned table is written with
//! the same columns the pipeline ended up with.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{data::format_number, dataset::Table, io_utils};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KpiReport {
    rows: Vec<KpiRow>,
}

impl KpiReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: &str, value: f64) -> Self {
        self.rows.push(KpiRow {
            metric: metric.to_string(),
            value,
        });
        self
    }

    pub fn rows(&self) -> &[KpiRow] {
        &self.rows
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.metric == metric).map(|r| r.value)
    }

    pub fn write_csv<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer
            .write_record(["metric", "value"])
            .context("Writing KPI report header")?;
        for row in &self.rows {
            writer
                .write_record([row.metric.as_str(), format_number(row.value).as_str()])
                .with_context(|| format!("Writing KPI '{}'", row.metric))?;
        }
        writer.flush().context("Flushing KPI report")?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        self.write_csv(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("Finishing KPI report: {err}"))?;
        String::from_utf8(bytes).context("KPI report is not valid UTF-8")
    }
}

pub fn save_kpi_report(report: &KpiReport, path: &Path) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path))?;
    report
        .write_csv(&mut writer)
        .with_context(|| format!("Writing KPI report to {path:?}"))?;
    info!("KPI report written to {path:?}");
    Ok(())
}

pub fn save_table(table: &Table, path: &Path) -> Result<()> {
    let mut writer = io_utils::open_csv_writer(Some(path))?;
    table
        .write_csv(&mut writer)
        .with_context(|| format!("Writing cleaned data to {path:?}"))?;
    info!(
        "{} row(s) across {} column(s) written to {path:?}",
        table.row_count(),
        table.column_count()
    );
    Ok(())
}

/// Rounds to two decimals, the precision used for percentages in reports.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kpi_report_writes_metric_value_rows() {
        let report = KpiReport::new()
            .with("total_revenue", 300.0)
            .with("total_orders", 2.0)
            .with("average_order_value", 150.5);
        assert_eq!(
            report.to_csv_string().unwrap(),
            "metric,value\ntotal_revenue,300\ntotal_orders,2\naverage_order_value,150.5\n"
        );
        assert_eq!(report.get("total_orders"), Some(2.0));
        assert_eq!(report.get("profit"), None);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }
}
