//! Dashboard configuration file.
//!
//! A YAML file may preset the filters and display options for `analyze`:
//!
//! ```yaml
//! day_first: true
//! top_products: 5
//! sales:
//!   regions: [East, West]
//!   start_date: 2023-01-01
//! churn:
//!   contracts: [Month-to-month]
//! ```
//!
//! Every key is optional. Command-line flags override the file field by field.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    cli::AnalyzeArgs,
    filter::{ChurnFilters, DateRange, SalesFilters, Selection, parse_date_bound},
    sales::DEFAULT_TOP_PRODUCTS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub day_first: bool,
    pub top_products: usize,
    pub sales: SalesFilterConfig,
    pub churn: ChurnFilterConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            day_first: true,
            top_products: DEFAULT_TOP_PRODUCTS,
            sales: SalesFilterConfig::default(),
            churn: ChurnFilterConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SalesFilterConfig {
    pub regions: Selection,
    pub categories: Selection,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChurnFilterConfig {
    pub contracts: Selection,
}

/// Fully resolved options for one dashboard run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    pub day_first: bool,
    pub top_products: usize,
    pub sales: SalesFilters,
    pub churn: ChurnFilters,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            day_first: true,
            top_products: DEFAULT_TOP_PRODUCTS,
            sales: SalesFilters::default(),
            churn: ChurnFilters::default(),
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("Parsing config YAML")
    }

    /// Merges command-line flags over this configuration.
    pub fn resolve(self, args: &AnalyzeArgs) -> Result<DashboardOptions> {
        let pick = |cli: &[String], preset: Selection| {
            let selection = Selection::from_cli(cli);
            if selection.is_all() { preset } else { selection }
        };
        let day_first = self.day_first && !args.month_first;
        let bound = |flag: Option<&str>, preset: Option<NaiveDate>| -> Result<Option<NaiveDate>> {
            match flag {
                Some(raw) => Ok(Some(parse_date_bound(raw, day_first)?)),
                None => Ok(preset),
            }
        };
        let start = bound(args.start_date.as_deref(), self.sales.start_date)
            .context("Parsing --start-date")?;
        let end = bound(args.end_date.as_deref(), self.sales.end_date).context("Parsing --end-date")?;
        let dates = DateRange::new(start, end).context("Resolving order date range")?;
        Ok(DashboardOptions {
            day_first,
            top_products: args.top.unwrap_or(self.top_products),
            sales: SalesFilters {
                regions: pick(&args.regions, self.sales.regions),
                categories: pick(&args.categories, self.sales.categories),
                dates,
            },
            churn: ChurnFilters {
                contracts: pick(&args.contracts, self.churn.contracts),
            },
        })
    }
}
