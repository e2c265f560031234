//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - filtered row exports (`export`)
//! - summary JSON read/write (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
