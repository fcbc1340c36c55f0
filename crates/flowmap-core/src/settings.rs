use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{FlowMapError, Result};
use crate::models::FrameKey;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Render bird observation and migration flow maps, one per (year, day)
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flowmap",
    about = "Render bird observation and migration flow maps, one per (year, day)",
    version
)]
pub struct Settings {
    /// Observation CSV (Year,Day,Cell1..CellN)
    #[arg(long)]
    pub observations: PathBuf,

    /// Reconstructed movement CSV (Year,Day,FromCell,ToCell,NumberOfBirds)
    #[arg(long)]
    pub reconstruction: PathBuf,

    /// GeoJSON file with US state boundaries
    #[arg(long)]
    pub boundaries: Option<PathBuf>,

    /// Directory frames are written to
    #[arg(long, default_value = "viz")]
    pub output_dir: PathBuf,

    /// Output image format
    #[arg(long, default_value = "png", value_parser = ["png", "svg"])]
    pub format: String,

    /// Write each frame as SVG to stdout instead of saving files
    #[arg(long)]
    pub preview: bool,

    /// Number of years to render, starting at year 0
    #[arg(long, default_value = "3")]
    pub years: u32,

    /// Number of days per year to render, starting at day 0
    #[arg(long, default_value = "19")]
    pub days: u32,

    /// Observation count mapped to the hottest colour
    #[arg(long, default_value = "0")]
    pub value_min: f64,

    /// Observation count mapped to the coolest colour
    #[arg(long, default_value = "1000")]
    pub value_max: f64,

    /// Whether cell ids in the reconstruction file start at 0 or 1
    #[arg(long, default_value = "one", value_parser = ["zero", "one"])]
    pub cell_base: String,

    /// JSON file overriding map style defaults
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Enumerated options ─────────────────────────────────────────────────────────

/// Image format of a written frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FlowMapError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(FlowMapError::Config(format!("unknown format: {other}"))),
        }
    }
}

/// Numbering base of cell ids inside input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellIndexBase {
    Zero,
    #[default]
    One,
}

impl CellIndexBase {
    /// Convert a file cell id to a 0-based cell id.
    ///
    /// Returns `None` for id 0 under one-based numbering.
    pub fn to_zero_based(self, id: usize) -> Option<usize> {
        match self {
            CellIndexBase::Zero => Some(id),
            CellIndexBase::One => id.checked_sub(1),
        }
    }
}

impl FromStr for CellIndexBase {
    type Err = FlowMapError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "zero" | "0" => Ok(CellIndexBase::Zero),
            "one" | "1" => Ok(CellIndexBase::One),
            other => Err(FlowMapError::Config(format!("unknown cell base: {other}"))),
        }
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and resolve derived values.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`load`](Self::load) but with an explicit argument list, for tests.
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings = Settings::parse_from(args);
        settings.resolve()
    }

    /// Apply `--debug` and validate cross-field constraints.
    fn resolve(mut self) -> Result<Self> {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        if !self.value_min.is_finite() || !self.value_max.is_finite() {
            return Err(FlowMapError::Config(
                "value range must be finite".to_string(),
            ));
        }
        if self.value_min > self.value_max {
            return Err(FlowMapError::Config(format!(
                "value_min ({}) exceeds value_max ({})",
                self.value_min, self.value_max
            )));
        }
        Ok(self)
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse()
    }

    pub fn cell_index_base(&self) -> Result<CellIndexBase> {
        self.cell_base.parse()
    }

    /// Every frame in the configured range, year-major.
    pub fn frame_keys(&self) -> impl Iterator<Item = FrameKey> {
        let days = self.days;
        (0..self.years).flat_map(move |y| (0..days).map(move |d| FrameKey::new(y, d)))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = [
        "flowmap",
        "--observations",
        "obs.csv",
        "--reconstruction",
        "moves.csv",
    ];

    fn args(extra: &[&str]) -> Vec<String> {
        REQUIRED
            .iter()
            .chain(extra.iter())
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(args(&[]));

        assert_eq!(settings.observations, PathBuf::from("obs.csv"));
        assert_eq!(settings.reconstruction, PathBuf::from("moves.csv"));
        assert!(settings.boundaries.is_none());
        assert_eq!(settings.output_dir, PathBuf::from("viz"));
        assert_eq!(settings.format, "png");
        assert!(!settings.preview);
        assert_eq!(settings.years, 3);
        assert_eq!(settings.days, 19);
        assert_eq!(settings.value_min, 0.0);
        assert_eq!(settings.value_max, 1000.0);
        assert_eq!(settings.cell_base, "one");
        assert!(settings.style.is_none());
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_requires_inputs() {
        assert!(Settings::try_parse_from(["flowmap"]).is_err());
    }

    #[test]
    fn test_settings_rejects_unknown_format() {
        assert!(Settings::try_parse_from(args(&["--format", "gif"])).is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::load_from_args(args(&["--debug"])).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_inverted_value_range_is_config_error() {
        let err = Settings::load_from_args(args(&["--value-min", "10", "--value-max", "5"]))
            .unwrap_err();
        assert!(matches!(err, FlowMapError::Config(_)));
    }

    #[test]
    fn test_equal_value_range_is_accepted() {
        let settings =
            Settings::load_from_args(args(&["--value-min", "5", "--value-max", "5"])).unwrap();
        assert_eq!(settings.value_min, settings.value_max);
    }

    #[test]
    fn test_frame_keys_year_major() {
        let settings =
            Settings::load_from_args(args(&["--years", "2", "--days", "3"])).unwrap();
        let keys: Vec<FrameKey> = settings.frame_keys().collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], FrameKey::new(0, 0));
        assert_eq!(keys[2], FrameKey::new(0, 2));
        assert_eq!(keys[3], FrameKey::new(1, 0));
    }

    #[test]
    fn test_output_format_parse() {
        let settings = Settings::load_from_args(args(&["--format", "svg"])).unwrap();
        assert_eq!(settings.output_format().unwrap(), OutputFormat::Svg);
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert!("bmp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cell_index_base() {
        assert_eq!(CellIndexBase::One.to_zero_based(1), Some(0));
        assert_eq!(CellIndexBase::One.to_zero_based(0), None);
        assert_eq!(CellIndexBase::Zero.to_zero_based(0), Some(0));
        assert_eq!("zero".parse::<CellIndexBase>().unwrap(), CellIndexBase::Zero);
        assert_eq!(CellIndexBase::default(), CellIndexBase::One);
    }
}
