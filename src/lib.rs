//! `superstore` library crate.
//!
//! The binary (`superstore`) is a thin wrapper around this library so that:
//!
//! - the filter-and-aggregate engine is testable without spawning processes
//! - every front-end (CLI text, SVG charts, dashboard) shares one pipeline

pub mod app;
pub mod chart;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod tui;
