//! Export filtered rows to CSV.
//!
//! The export mirrors the source file: same header row, same raw field values,
//! UTF-8 encoded. Datasets built in memory are written as typed columns. Either
//! way the file loads back through `read_dataset`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{ColumnMap, Record};
use crate::engine::FilteredDataset;
use crate::error::AppError;

/// Write the filtered rows to a CSV file.
pub fn write_filtered_csv(path: &Path, filtered: &FilteredDataset<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    write_filtered(file, filtered)?;
    tracing::info!(path = %path.display(), rows = filtered.len(), "wrote filtered CSV");
    Ok(())
}

/// Write the filtered rows as CSV to any writer.
///
/// Rows read from a file are written back verbatim under the source header.
/// A dataset built in memory has no raw rows, so it is written as the five
/// typed columns under the default column names instead.
pub fn write_filtered<W: Write>(writer: W, filtered: &FilteredDataset<'_>) -> Result<(), AppError> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    let dataset = filtered.dataset();
    let raw = !dataset.headers.is_empty() && dataset.records.iter().all(|r| !r.fields.is_empty());

    let header = if raw { dataset.headers.clone() } else { typed_header(&ColumnMap::default()) };
    out.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in filtered.iter() {
        let row = if raw { r.fields.clone() } else { typed_row(r) };
        out.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn typed_header(columns: &ColumnMap) -> Vec<String> {
    vec![
        columns.order_date.clone(),
        columns.category.clone(),
        columns.region.clone(),
        columns.sales.clone(),
        columns.profit.clone(),
    ]
}

fn typed_row(r: &Record) -> Vec<String> {
    vec![
        r.order_date.format("%Y-%m-%d").to_string(),
        r.category.clone(),
        r.region.clone(),
        r.sales.to_string(),
        r.profit.to_string(),
    ]
}
