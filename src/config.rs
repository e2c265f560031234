//! Configuration file handling.
//!
//! Settings come from an optional `superstore.toml` in the working directory
//! (or `--config <path>`). Every field has a default, so a partial file or no
//! file at all is fine. CLI flags and environment variables override the file;
//! see `app::load_options_from`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{ColumnMap, RowPolicy};
use crate::error::AppError;
use crate::io::ingest::DEFAULT_DATE_FORMATS;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "superstore.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Where the dataset lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Dataset path used when neither `--data` nor `SUPERSTORE_DATA` is set.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// `chrono` formats tried in order for the order-date column.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// What to do with rows that fail validation.
    #[serde(default)]
    pub on_invalid_row: RowPolicy,

    /// Names of the columns the pipeline reads.
    #[serde(default)]
    pub columns: ColumnMap,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            date_formats: default_date_formats(),
            on_invalid_row: RowPolicy::default(),
            columns: ColumnMap::default(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
}

/// Where and how outputs are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for chart files.
    #[serde(default = "default_chart_dir")]
    pub chart_dir: PathBuf,

    /// Chart size in pixels.
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,

    /// File name used by the dashboard's filtered-data export.
    #[serde(default = "default_filtered_export")]
    pub filtered_export: PathBuf,

    /// Terminal plot size (columns x rows).
    #[serde(default = "default_plot_width")]
    pub plot_width: usize,
    #[serde(default = "default_plot_height")]
    pub plot_height: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            chart_dir: default_chart_dir(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            filtered_export: default_filtered_export(),
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
        }
    }
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_chart_width() -> u32 {
    800
}

fn default_chart_height() -> u32 {
    500
}

fn default_filtered_export() -> PathBuf {
    PathBuf::from("filtered_superstore_data.csv")
}

fn default_plot_width() -> usize {
    80
}

fn default_plot_height() -> usize {
    20
}

impl Settings {
    /// Load settings from a specific file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read config '{}': {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))
    }

    /// Load `superstore.toml` from the working directory if it exists.
    pub fn load_default() -> Result<Option<Self>, AppError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Default configuration as TOML text (for `superstore init-config`).
    pub fn default_toml() -> String {
        // Serializing a plain struct of strings/numbers cannot fail.
        toml::to_string_pretty(&Settings::default()).unwrap_or_default()
    }
}
