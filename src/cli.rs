use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Sales and churn dashboards from CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Preview a CSV file with standardized column names and its detected dataset type
    Inspect(InspectArgs),
    /// Detect the dataset type and render its dashboard, optionally exporting reports
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Input CSV file to preview ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct AnalyzeArgs {
    /// Input CSV file to analyze ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML configuration with filter presets; flags given here take precedence
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Keep only these regions (sales; repeatable or comma-separated)
    #[arg(long = "region", action = clap::ArgAction::Append)]
    pub regions: Vec<String>,
    /// Keep only these categories (sales; repeatable or comma-separated)
    #[arg(long = "category", action = clap::ArgAction::Append)]
    pub categories: Vec<String>,
    /// Keep only these contract types (churn; repeatable or comma-separated)
    #[arg(long = "contract", action = clap::ArgAction::Append)]
    pub contracts: Vec<String>,
    /// First order date to include (sales; same day/month order as the data)
    #[arg(long = "start-date")]
    pub start_date: Option<String>,
    /// Last order date to include (sales; same day/month order as the data)
    #[arg(long = "end-date")]
    pub end_date: Option<String>,
    /// Read ambiguous dates, in the data and in date flags, as month/day instead of day/month
    #[arg(long = "month-first")]
    pub month_first: bool,
    /// Number of products in the top products ranking
    #[arg(long = "top")]
    pub top: Option<usize>,
    /// Write the KPI report CSV to this path
    #[arg(long = "kpi-output")]
    pub kpi_output: Option<PathBuf>,
    /// Write the cleaned (and filtered) data CSV to this path
    #[arg(long = "data-output")]
    pub data_output: Option<PathBuf>,
    /// Write both reports into this directory using their default file names
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Emit the dashboard as JSON instead of tables
    #[arg(long)]
    pub json: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
