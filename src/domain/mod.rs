//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sales transactions and the loaded dataset (`Record`, `Dataset`)
//! - the per-query filter (`FilterSpec`)
//! - aggregation outputs (`AggregateResult`, `Ranked`, `MonthlySales`)

pub mod types;

pub use types::*;
