use std::path::PathBuf;
use thiserror::Error;

use crate::models::FrameKey;

/// All errors produced by flowmap.
#[derive(Error, Debug)]
pub enum FlowMapError {
    /// An input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file is structurally unusable (bad header, no rows).
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A grid cell id fell outside the modelled 10x10 grid.
    #[error("Cell {cell} is outside the grid (year {}, day {})", .frame.year, .frame.day)]
    CellOutOfRange { cell: usize, frame: FrameKey },

    /// A region index fell outside `0..10`.
    #[error("Region index out of range: {0}")]
    RegionOutOfRange(usize),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Drawing or encoding a frame failed.
    #[error("Render error: {0}")]
    Render(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Summing bird counts for a frame overflowed the counter type.
    #[error("Bird count overflow (year {}, day {})", .frame.year, .frame.day)]
    CountOverflow { frame: FrameKey },
}

/// Convenience alias used throughout the flowmap crates.
pub type Result<T> = std::result::Result<T, FlowMapError>;
