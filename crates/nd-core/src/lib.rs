//! # nd-core
//!
//! Core types shared by the network-decomposition regression crates.
//!
//! This crate provides:
//! - the error type and `Result` alias used across the workspace
//! - [`Table`], the named-column input consumed by the orchestrators
//! - [`RegressionReport`], the named scalar/array result mapping
//! - [`Device`], the explicit compute-placement setting threaded through fits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod table;
pub mod types;

pub use error::{Error, Result};
pub use table::Table;
pub use types::{Device, RegressionReport, ReportValue};
