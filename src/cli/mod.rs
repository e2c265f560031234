//! Command-line parsing for the Superstore sales analytics tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code; `app` turns these structs into load options
//! and filters.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::RowPolicy;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "superstore",
    version,
    about = "Superstore sales analytics: filter, aggregate, chart"
)]
pub struct Cli {
    /// Config file (default: ./superstore.toml if present).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the dataset overview: shape, column types, missing values, statistics.
    Overview(DataArgs),
    /// Print KPIs, ranked tables and the monthly series for the filtered data.
    Summary(SummaryArgs),
    /// Write the dashboard charts as SVG files.
    Charts(ChartsArgs),
    /// Plot a previously exported summary JSON.
    Plot(PlotArgs),
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
    /// Write a synthetic Superstore-style CSV.
    Sample(SampleArgs),
    /// Write a default config file.
    InitConfig(InitConfigArgs),
}

/// Where the dataset comes from.
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Sales CSV. Without it, the config's `data.path` is used, then an interactive picker.
    #[arg(short = 'd', long, env = "SUPERSTORE_DATA", value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Abort on the first invalid row (`fail`) or skip and report it (`skip`).
    #[arg(long, value_enum)]
    pub on_invalid_row: Option<RowPolicy>,
}

/// The query filter. Omitted flags select the full observed range/domain.
#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    /// First order date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last order date to include (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Category to include (repeatable).
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Region to include (repeatable).
    #[arg(long = "region", value_name = "NAME")]
    pub regions: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Skip the ASCII plot of the monthly series.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns); defaults to the config value.
    #[arg(long)]
    pub width: Option<usize>,

    /// Plot height (rows); defaults to the config value.
    #[arg(long)]
    pub height: Option<usize>,

    /// Write the filtered rows to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_filtered: Option<PathBuf>,

    /// Write the aggregation result to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ChartsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output directory; defaults to the config value (`screenshots`).
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Options for plotting a saved summary.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Summary JSON produced by `superstore summary --export-summary`.
    #[arg(long, value_name = "JSON")]
    pub summary: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TuiArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long, default_value = "superstore_sample.csv")]
    pub output: PathBuf,

    /// Number of orders to generate.
    #[arg(short = 'n', long, default_value_t = 500)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First order date (YYYY-MM-DD).
    #[arg(long, default_value = "2014-01-01")]
    pub from: NaiveDate,

    /// Last order date (YYYY-MM-DD).
    #[arg(long, default_value = "2017-12-31")]
    pub to: NaiveDate,
}

#[derive(Debug, Args, Clone)]
pub struct InitConfigArgs {
    /// Where to write the config.
    #[arg(default_value = "superstore.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}
