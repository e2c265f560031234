//! Read/write summary JSON files.
//!
//! Summary JSON is the portable representation of one dashboard query:
//! - the filter that was applied
//! - the full aggregate result (decimals as strings, months as `YYYY-MM`)
//!
//! The schema is defined by `SummaryFile`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{AggregateResult, FilterSpec};
use crate::error::AppError;

/// A saved summary file (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFile {
    pub tool: String,
    pub generated_at: NaiveDateTime,
    pub source: Option<String>,
    pub filter: FilterSpec,
    pub result: AggregateResult,
}

impl SummaryFile {
    pub fn new(source: Option<&Path>, filter: &FilterSpec, result: &AggregateResult) -> Self {
        Self {
            tool: "superstore".to_string(),
            generated_at: Local::now().naive_local(),
            source: source.map(|p| p.display().to_string()),
            filter: filter.clone(),
            result: result.clone(),
        }
    }
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &SummaryFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;

    tracing::info!(path = %path.display(), "wrote summary JSON");
    Ok(())
}

/// Read a summary JSON file.
pub fn read_summary_json(path: &Path) -> Result<SummaryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    let summary: SummaryFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid summary JSON: {e}")))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn inverted_filter_in_json_is_rejected() {
        let json = r#"{
            "tool": "superstore",
            "generated_at": "2024-01-01T00:00:00",
            "source": null,
            "filter": {
                "date_start": "2023-02-01",
                "date_end": "2023-01-01",
                "categories": [],
                "regions": []
            },
            "result": {
                "order_count": 0,
                "total_sales": "0",
                "total_profit": "0",
                "average_order_value": "0",
                "sales_by_category": [],
                "profit_by_category": [],
                "sales_by_region": [],
                "profit_by_region": [],
                "monthly_sales_series": []
            }
        }"#;
        let err = serde_json::from_str::<SummaryFile>(json).unwrap_err();
        assert!(err.to_string().contains("inverted"));
    }

    #[test]
    fn months_serialize_as_year_month() {
        let spec = FilterSpec::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            ["Tech"],
            ["West"],
        )
        .unwrap();
        let result = AggregateResult {
            monthly_sales_series: vec![crate::domain::MonthlySales {
                month: crate::domain::MonthKey { year: 2023, month: 2 },
                sales: "200".parse().unwrap(),
            }],
            ..AggregateResult::default()
        };
        let summary = SummaryFile::new(None, &spec, &result);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""month":"2023-02""#));
        assert!(json.contains(r#""sales":"200""#));
    }
}
