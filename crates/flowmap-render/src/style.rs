//! Map style: colours, line widths, projection and canvas size.
//!
//! A style can be loaded from a JSON file; any field left out falls back to
//! the built-in default.

use std::path::Path;

use flowmap_core::error::{FlowMapError, Result};
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

use crate::projection::{MapExtent, Stereographic};

/// Complete set of drawing options used by [`MapRenderer`](crate::map::MapRenderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapStyle {
    // ── Canvas ───────────────────────────────────────────────────────────────
    /// Image width in pixels; height follows the map's aspect ratio.
    pub width: u32,
    /// Space reserved around the map, pixels.
    pub margin: u32,
    /// Title font size, pixels.
    pub title_size: u32,
    /// Draw graticule labels. The title is always drawn.
    pub draw_labels: bool,

    // ── Colours ──────────────────────────────────────────────────────────────
    pub ocean_color: String,
    pub land_color: String,
    pub boundary_color: String,
    pub graticule_color: String,
    pub label_color: String,
    pub arrow_color: String,

    // ── Lines ────────────────────────────────────────────────────────────────
    pub boundary_width: u32,
    pub graticule_width: u32,
    pub arrow_width: u32,

    // ── Arrows ───────────────────────────────────────────────────────────────
    /// Map metres drawn per unit of arrow magnitude.
    pub arrow_scale_m: f64,
    /// Head length as a fraction of the shaft.
    pub arrow_head_ratio: f64,
    /// Angle between each barb and the shaft, degrees.
    pub arrow_head_angle_deg: f64,

    // ── Projection ───────────────────────────────────────────────────────────
    pub center_lon: f64,
    pub center_lat: f64,
    /// `[lon, lat]` of the lower-left corner.
    pub lower_left: [f64; 2],
    /// `[lon, lat]` of the upper-right corner.
    pub upper_right: [f64; 2],
    /// Graticule spacing, degrees.
    pub graticule_step_deg: f64,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            margin: 10,
            title_size: 20,
            draw_labels: true,

            ocean_color: "#99ffff".to_string(),
            land_color: "#ffcc99".to_string(),
            boundary_color: "#000000".to_string(),
            graticule_color: "#000000".to_string(),
            label_color: "#000000".to_string(),
            arrow_color: "#3333ff".to_string(),

            boundary_width: 1,
            graticule_width: 1,
            arrow_width: 2,

            arrow_scale_m: 60_000.0,
            arrow_head_ratio: 0.3,
            arrow_head_angle_deg: 25.0,

            center_lon: -80.0,
            center_lat: 36.0,
            lower_left: [-96.0, 24.0],
            upper_right: [-60.0, 48.0],
            graticule_step_deg: 10.0,
        }
    }
}

impl MapStyle {
    /// Load overrides from a JSON file and validate them.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| FlowMapError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let style: MapStyle = serde_json::from_str(text)?;
        style.validate()?;
        Ok(style)
    }

    /// Reject values that cannot produce a map.
    pub fn validate(&self) -> Result<()> {
        if self.width < 100 {
            return Err(FlowMapError::Config(format!(
                "width must be at least 100 pixels, got {}",
                self.width
            )));
        }
        if !(self.arrow_scale_m.is_finite() && self.arrow_scale_m > 0.0) {
            return Err(FlowMapError::Config(
                "arrow_scale_m must be positive".to_string(),
            ));
        }
        if !(self.graticule_step_deg.is_finite() && self.graticule_step_deg > 0.0) {
            return Err(FlowMapError::Config(
                "graticule_step_deg must be positive".to_string(),
            ));
        }
        for color in [
            &self.ocean_color,
            &self.land_color,
            &self.boundary_color,
            &self.graticule_color,
            &self.label_color,
            &self.arrow_color,
        ] {
            parse_hex_color(color)?;
        }
        self.extent().map(|_| ())
    }

    pub fn projection(&self) -> Stereographic {
        Stereographic::new(self.center_lon, self.center_lat)
    }

    pub fn extent(&self) -> Result<MapExtent> {
        MapExtent::from_corners(&self.projection(), self.lower_left, self.upper_right)
    }

    /// Canvas height for `extent`, keeping the map's aspect ratio.
    pub fn height_for(&self, extent: &MapExtent) -> u32 {
        let map_width = self.width.saturating_sub(2 * self.margin).max(1) as f64;
        let map_height = map_width * extent.height() / extent.width();
        map_height.round() as u32 + 2 * self.margin + self.title_size * 2
    }
}

/// Parse `#rrggbb` (or `rrggbb`) into a colour.
pub fn parse_hex_color(value: &str) -> Result<RGBColor> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || FlowMapError::Config(format!("invalid colour: {value:?}"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}
