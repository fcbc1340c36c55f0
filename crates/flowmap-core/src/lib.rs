//! Shared types for flowmap.
//!
//! Holds the region and flow-vector tables, the record and frame models,
//! the error type, CLI settings and formatting helpers used by the data,
//! render and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod regions;
pub mod settings;
pub mod vectors;
