//! CSV ingest and normalization.
//!
//! This module turns a Superstore-style sales export into a `Dataset` of typed
//! records. Everything downstream (filtering, aggregation, exports) works on the
//! in-memory dataset only.
//!
//! Design goals:
//! - **Strict schema** for the five columns the pipeline reads (exit code 2)
//! - **Explicit row policy**: fail on the first bad row, or skip and report
//! - **Pass-through**: every raw field is kept for row-level exports

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;

use crate::domain::{ColumnMap, Dataset, Record, RowPolicy};
use crate::error::{AppError, ValidationError};

/// Date formats tried in order when none are configured.
///
/// The Superstore export writes US-style `M/D/YYYY`.
pub const DEFAULT_DATE_FORMATS: [&str; 4] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

/// Largest accepted magnitude for a sales or profit value.
///
/// Keeps every sum the engine forms well inside `Decimal`'s range.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// How to read a sales CSV.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub path: PathBuf,
    pub columns: ColumnMap,
    pub date_formats: Vec<String>,
    pub row_policy: RowPolicy,
}

impl LoadOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: ColumnMap::default(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            row_policy: RowPolicy::Fail,
        }
    }
}

/// A row-level error encountered during ingest (only collected with `RowPolicy::Skip`).
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the dataset plus bookkeeping about skipped rows.
///
/// The dataset is immutable from here on and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Arc<Dataset>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Column positions of the fields the pipeline reads.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    order_date: usize,
    category: usize,
    region: usize,
    sales: usize,
    profit: usize,
}

/// Load a sales CSV from disk.
pub fn load_dataset(options: &LoadOptions) -> Result<LoadedDataset, AppError> {
    let file = File::open(&options.path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open CSV '{}': {e}", options.path.display()),
        )
    })?;

    let loaded = read_dataset(file, options)?;
    tracing::info!(
        path = %options.path.display(),
        rows = loaded.dataset.len(),
        skipped = loaded.row_errors.len(),
        "loaded dataset"
    );
    Ok(loaded)
}

/// Parse a sales CSV from any reader.
pub fn read_dataset<R: Read>(reader: R, options: &LoadOptions) -> Result<LoadedDataset, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_names: Vec<String> = headers.iter().map(clean_header_name).collect();
    let index = resolve_columns(&header_names, &options.columns)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Quoted fields may span lines, so take the line from the reader.
        let position = match &result {
            Ok(row) => row.position(),
            Err(e) => e.position(),
        };
        let line = position.map(|p| p.line() as usize).unwrap_or(idx + 2);
        rows_read += 1;

        let parsed = match result {
            Ok(row) => parse_row(&row, index, &options.columns, &options.date_formats)
                .map_err(|e| e.at_line(line).to_string()),
            Err(e) => Err(format!("line {line}: CSV parse error: {e}")),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(message) => match options.row_policy {
                RowPolicy::Fail => return Err(AppError::new(2, message)),
                RowPolicy::Skip => {
                    tracing::warn!("skipping row: {message}");
                    row_errors.push(RowError { line, message });
                }
            },
        }
    }

    if records.is_empty() {
        return Err(AppError::new(3, "No valid rows in the dataset."));
    }

    Ok(LoadedDataset {
        dataset: Arc::new(Dataset::new(header_names, records)),
        row_errors,
        rows_read,
    })
}

fn clean_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn resolve_columns(headers: &[String], columns: &ColumnMap) -> Result<ColumnIndex, AppError> {
    let map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_lowercase(), idx))
        .collect();

    let find = |name: &str| -> Result<usize, ValidationError> {
        map.get(&name.trim().to_lowercase())
            .copied()
            .ok_or_else(|| ValidationError::MissingColumn(name.to_string()))
    };

    Ok(ColumnIndex {
        order_date: find(&columns.order_date)?,
        category: find(&columns.category)?,
        region: find(&columns.region)?,
        sales: find(&columns.sales)?,
        profit: find(&columns.profit)?,
    })
}

fn parse_row(
    row: &StringRecord,
    index: ColumnIndex,
    columns: &ColumnMap,
    date_formats: &[String],
) -> Result<Record, ValidationError> {
    let order_date = parse_date(get_required(row, index.order_date, &columns.order_date)?, &columns.order_date, date_formats)?;
    let category = get_required(row, index.category, &columns.category)?.to_string();
    let region = get_required(row, index.region, &columns.region)?.to_string();

    let sales_raw = get_required(row, index.sales, &columns.sales)?;
    let sales = parse_amount(sales_raw, &columns.sales)?;
    if sales.is_sign_negative() && !sales.is_zero() {
        return Err(ValidationError::NegativeSales {
            line: None,
            raw: sales_raw.to_string(),
        });
    }
    let profit = parse_amount(get_required(row, index.profit, &columns.profit)?, &columns.profit)?;

    Ok(Record {
        order_date,
        category,
        region,
        sales,
        profit,
        fields: row.iter().map(str::to_string).collect(),
    })
}

fn get_required<'a>(row: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, ValidationError> {
    row.get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ValidationError::MissingField {
            line: None,
            field: name.to_string(),
        })
}

/// Parse a calendar date, trying each format in order.
pub fn parse_date(raw: &str, field: &str, formats: &[String]) -> Result<NaiveDate, ValidationError> {
    // Some exports carry a time component ("2016-11-08 00:00:00"); only the
    // date part matters for aggregation.
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| ValidationError::InvalidDate {
            line: None,
            field: field.to_string(),
            raw: raw.to_string(),
        })
}

/// Parse a decimal amount (plain or scientific notation), bounded by `AMOUNT_LIMIT`.
pub fn parse_amount(raw: &str, field: &str) -> Result<Decimal, ValidationError> {
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount {
            line: None,
            field: field.to_string(),
            raw: raw.to_string(),
        })?;
    if amount.abs() > AMOUNT_LIMIT {
        return Err(ValidationError::AmountOutOfRange {
            line: None,
            field: field.to_string(),
            raw: raw.to_string(),
            limit: AMOUNT_LIMIT,
        });
    }
    Ok(amount)
}

/// Does `path` look like something `load_dataset` can read?
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}Row ID,Order Date,Ship Mode,Category,Region,Sales,Profit\n\
1,11/8/2016,Second Class,Furniture,South,261.96,41.9136\n\
2,6/12/2016,Second Class,Office Supplies,West,14.62,-6.8714\n";

    fn options() -> LoadOptions {
        LoadOptions::new("unused.csv")
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn reads_superstore_rows_and_keeps_raw_fields() {
        let loaded = read_dataset(CSV.as_bytes(), &options()).unwrap();
        let ds = &loaded.dataset;
        assert_eq!(ds.headers[0], "Row ID");
        assert_eq!(ds.len(), 2);
        let r = &ds.records[0];
        assert_eq!(r.order_date, NaiveDate::from_ymd_opt(2016, 11, 8).unwrap());
        assert_eq!(r.category, "Furniture");
        assert_eq!(r.sales, dec("261.96"));
        assert_eq!(ds.records[1].profit, dec("-6.8714"));
        assert_eq!(r.fields[2], "Second Class");
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Order Date,Category,Sales,Profit\n1/1/2020,A,1,1\n";
        let err = read_dataset(csv.as_bytes(), &options()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("`Region`"));
    }

    #[test]
    fn bad_date_fails_with_raw_value_by_default() {
        let csv = "Order Date,Category,Region,Sales,Profit\nnot-a-date,A,East,1,1\n";
        let err = read_dataset(csv.as_bytes(), &options()).unwrap_err();
        assert_eq!(err.to_string(), "line 2: invalid date 'not-a-date' in `Order Date`");
    }

    #[test]
    fn skip_policy_collects_row_errors() {
        let csv = "Order Date,Category,Region,Sales,Profit\n\
1/1/2020,A,East,abc,1\n\
1/2/2020,A,East,-4,1\n\
1/3/2020,A,East,5,1\n";
        let mut opts = options();
        opts.row_policy = RowPolicy::Skip;
        let loaded = read_dataset(csv.as_bytes(), &opts).unwrap();
        assert_eq!(loaded.rows_read, 3);
        assert_eq!(loaded.dataset.len(), 1);
        assert_eq!(loaded.row_errors.len(), 2);
        assert_eq!(loaded.row_errors[0].line, 2);
        assert!(loaded.row_errors[1].message.contains("negative sales amount '-4'"));
    }

    #[test]
    fn no_valid_rows_is_exit_code_3() {
        let csv = "Order Date,Category,Region,Sales,Profit\n";
        let err = read_dataset(csv.as_bytes(), &options()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn custom_column_names_are_case_insensitive() {
        let csv = "date,cat,area,revenue,margin\n2021-05-01,A,North,10,2\n";
        let mut opts = options();
        opts.columns = ColumnMap {
            order_date: "Date".to_string(),
            category: "CAT".to_string(),
            region: "Area".to_string(),
            sales: "Revenue".to_string(),
            profit: "Margin".to_string(),
        };
        let loaded = read_dataset(csv.as_bytes(), &opts).unwrap();
        assert_eq!(loaded.dataset.records[0].region, "North");
    }

    #[test]
    fn parse_date_ignores_time_component() {
        let formats = vec!["%Y-%m-%d".to_string()];
        let d = parse_date("2016-11-08 00:00:00", "Order Date", &formats).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2016, 11, 8).unwrap());
    }

    #[test]
    fn parse_amount_accepts_scientific_notation() {
        assert_eq!(parse_amount("1.5e2", "Sales").unwrap(), dec("150"));
        assert!(parse_amount("$5", "Sales").is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected_before_aggregation() {
        let csv = "Order Date,Category,Region,Sales,Profit\n\
2023-01-15,Furniture,East,79228162514264337593543950335,1\n\
2023-01-16,Furniture,East,1,1\n";
        let err = read_dataset(csv.as_bytes(), &options()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("line 2"), "{err}");
        assert!(err.to_string().contains("79228162514264337593543950335"));

        let mut skip = options();
        skip.row_policy = RowPolicy::Skip;
        let loaded = read_dataset(csv.as_bytes(), &skip).unwrap();
        assert_eq!(loaded.dataset.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 2);

        assert_eq!(parse_amount("1000000000000000", "Sales").unwrap(), AMOUNT_LIMIT);
        assert!(matches!(
            parse_amount("-1000000000000000.01", "Profit"),
            Err(ValidationError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn line_numbers_follow_multiline_quoted_fields() {
        let csv = "Order Date,Category,Region,Sales,Profit,Note\n\
2023-01-15,Furniture,East,10,1,\"two\nlines\"\n\
2023-01-16,Furniture,East,oops,1,x\n";
        let mut skip = options();
        skip.row_policy = RowPolicy::Skip;
        let loaded = read_dataset(csv.as_bytes(), &skip).unwrap();
        assert_eq!(loaded.dataset.len(), 1);
        assert_eq!(loaded.row_errors[0].line, 4);
        assert!(loaded.row_errors[0].message.starts_with("line 4:"));
    }
}
