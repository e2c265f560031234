//! Filter-and-aggregate engine.
//!
//! Responsibilities:
//!
//! - select the records matching a `FilterSpec` (`filter`)
//! - reduce a record set to KPIs, ranked groupings and a monthly series (`summarize`)
//!
//! Both steps are pure: no I/O, no shared mutable state. The dataset is only
//! borrowed, so concurrent calls over one `Arc<Dataset>` are safe.

pub mod filter;
pub mod summarize;

pub use filter::*;
pub use summarize::*;
