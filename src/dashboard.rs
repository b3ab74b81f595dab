use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    churn::{ChurnDashboard, ChurnPipeline},
    classify::{DatasetKind, UnknownDataset, classify},
    cli::AnalyzeArgs,
    columns::standardize_columns,
    config::{DashboardConfig, DashboardOptions},
    dataset::{self, Table},
    io_utils,
    render,
    report::{self, KpiReport},
    sales::{SalesDashboard, SalesPipeline},
};

/// Result of one dashboard run, handed to whatever presents it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dashboard {
    Sales(SalesDashboard),
    Churn(ChurnDashboard),
    Unknown(UnknownDataset),
}

impl Dashboard {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dashboard::Sales(_) => DatasetKind::Sales,
            Dashboard::Churn(_) => DatasetKind::Churn,
            Dashboard::Unknown(_) => DatasetKind::Unknown,
        }
    }

    pub fn kpi_report(&self) -> Option<KpiReport> {
        match self {
            Dashboard::Sales(sales) => Some(sales.kpi_report()),
            Dashboard::Churn(churn) => Some(churn.kpi_report()),
            Dashboard::Unknown(_) => None,
        }
    }

    /// The working table at the end of the pipeline.
    pub fn table(&self) -> Option<&Table> {
        match self {
            Dashboard::Sales(sales) => Some(&sales.table),
            Dashboard::Churn(churn) => Some(&churn.table),
            Dashboard::Unknown(_) => None,
        }
    }

    /// File names used for the two artifacts when only a directory is given.
    fn default_artifact_names(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Dashboard::Sales(_) => Some(("sales_kpi_report.csv", "sales_cleaned_filtered.csv")),
            Dashboard::Churn(_) => Some(("churn_kpi_report.csv", "churn_cleaned.csv")),
            Dashboard::Unknown(_) => None,
        }
    }
}

/// Standardizes, classifies, and runs the matching pipeline.
pub fn build_dashboard(raw: Table, options: &DashboardOptions) -> Dashboard {
    let table = standardize_columns(raw);
    let kind = classify(&table);
    info!("Detected {kind} dataset");
    match kind {
        DatasetKind::Sales => {
            let pipeline = SalesPipeline {
                day_first: options.day_first,
                top_products: options.top_products,
            };
            Dashboard::Sales(pipeline.run(table, &options.sales))
        }
        DatasetKind::Churn => Dashboard::Churn(ChurnPipeline.run(table, &options.churn)),
        DatasetKind::Unknown => Dashboard::Unknown(UnknownDataset::from_table(&table)),
    }
}

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let config = match &args.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    let options = config.resolve(args)?;

    let raw = dataset::read_csv(&args.input, delimiter, encoding)?;
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        raw.row_count(),
        raw.column_count(),
        args.input
    );

    let dashboard = build_dashboard(raw, &options);
    if args.json {
        let json = serde_json::to_string_pretty(&dashboard).context("Serializing dashboard")?;
        println!("{json}");
    } else {
        print!("{}", render::render_dashboard(&dashboard));
    }
    export_artifacts(&dashboard, args)
}

fn artifact_path(explicit: Option<&PathBuf>, dir: Option<&Path>, name: &str) -> Option<PathBuf> {
    explicit
        .cloned()
        .or_else(|| dir.map(|dir| dir.join(name)))
}

fn export_artifacts(dashboard: &Dashboard, args: &AnalyzeArgs) -> Result<()> {
    let (Some((kpi_name, data_name)), Some(report), Some(table)) = (
        dashboard.default_artifact_names(),
        dashboard.kpi_report(),
        dashboard.table(),
    ) else {
        return Ok(());
    };
    let dir = args.output_dir.as_deref();
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
    }
    if let Some(path) = artifact_path(args.kpi_output.as_ref(), dir, kpi_name) {
        report::save_kpi_report(&report, &path)?;
    }
    if let Some(path) = artifact_path(args.data_output.as_ref(), dir, data_name) {
        report::save_table(table, &path)?;
    }
    Ok(())
}
