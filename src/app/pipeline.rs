//! Shared query pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (once) -> filter -> summarize
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::domain::{AggregateResult, Dataset, FilterSpec};
use crate::engine::{filter, summarize};
use crate::error::AppError;
use crate::io::ingest::{LoadOptions, LoadedDataset, load_dataset};

/// Lazily loaded, immutable dataset.
///
/// The file is read on the first `get()`; later calls return the same `Arc`.
/// The handle is owned by whichever front-end created it and passed to the
/// query calls explicitly.
#[derive(Debug)]
pub struct DatasetHandle {
    options: LoadOptions,
    cell: OnceCell<LoadedDataset>,
}

impl DatasetHandle {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            cell: OnceCell::new(),
        }
    }

    /// Wrap an already loaded dataset (tests, synthetic data).
    pub fn from_loaded(options: LoadOptions, loaded: LoadedDataset) -> Self {
        Self {
            options,
            cell: OnceCell::with_value(loaded),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// The shared dataset, loading it on first use.
    pub fn get(&self) -> Result<Arc<Dataset>, AppError> {
        Ok(Arc::clone(&self.loaded()?.dataset))
    }

    /// The dataset together with the load bookkeeping (rows read, skipped rows).
    pub fn loaded(&self) -> Result<&LoadedDataset, AppError> {
        self.cell.get_or_try_init(|| load_dataset(&self.options))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Outputs of one filter-and-aggregate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    /// Number of records that passed the filter.
    pub matched: usize,
    pub result: AggregateResult,
}

/// Filter the dataset and aggregate the matching records.
pub fn run_query(dataset: &Dataset, spec: &FilterSpec) -> QueryOutput {
    let filtered = filter(dataset, spec);
    let result = summarize(filtered.iter());
    QueryOutput {
        matched: filtered.len(),
        result,
    }
}
