//! Data ingestion layer for flowmap.
//!
//! Reads observation and reconstructed-movement CSV files, collapses cells
//! into regions and serves dense per-frame aggregates to the renderer.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use flowmap_core as core;
