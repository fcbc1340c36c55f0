//! Frame rendering with plotters.
//!
//! Layers are drawn bottom to top under the title: ocean, land, graticule,
//! labels, region fills, boundary outlines, flow arrows. Boundaries and the graticule are
//! projected and clipped once when the renderer is built and reused for
//! every frame.

use std::path::Path;

use flowmap_core::error::{FlowMapError, Result};
use flowmap_core::models::{Frame, Region, RegionFlow, REGION_COUNT};
use flowmap_core::settings::OutputFormat;
use geo::{LineString, MultiLineString, MultiPolygon, TriangulateEarcut};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::arrows::{build_arrows, Arrow};
use crate::boundaries::Boundary;
use crate::colormap::ValueScale;
use crate::projection::{MapExtent, MapPoint, Stereographic};
use crate::style::{parse_hex_color, MapStyle};

const LABEL_FONT: (&str, f64) = ("sans-serif", 12.0);

// ── Frame input ───────────────────────────────────────────────────────────────

/// Everything that changes from one frame to the next.
#[derive(Debug, Clone)]
pub struct MapFrame<'a> {
    pub title: &'a str,
    /// Observation totals indexed by region.
    pub observations: [f64; REGION_COUNT],
    pub scale: ValueScale,
    pub flows: &'a [RegionFlow],
}

impl<'a> MapFrame<'a> {
    pub fn new(frame: &'a Frame, scale: ValueScale, title: &'a str) -> Self {
        Self {
            title,
            observations: frame.observation_values(),
            scale,
            flows: &frame.flows,
        }
    }

    fn fill_for(&self, region: Region) -> RGBColor {
        self.scale.fill_color(self.observations[region.index()])
    }
}

// ── Pre-projected geometry ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Palette {
    ocean: RGBColor,
    land: RGBColor,
    boundary: RGBColor,
    graticule: RGBColor,
    label: RGBColor,
    arrow: RGBColor,
}

impl Palette {
    fn from_style(style: &MapStyle) -> Result<Self> {
        Ok(Self {
            ocean: parse_hex_color(&style.ocean_color)?,
            land: parse_hex_color(&style.land_color)?,
            boundary: parse_hex_color(&style.boundary_color)?,
            graticule: parse_hex_color(&style.graticule_color)?,
            label: parse_hex_color(&style.label_color)?,
            arrow: parse_hex_color(&style.arrow_color)?,
        })
    }
}

#[derive(Debug, Clone)]
struct ProjectedBoundary {
    region: Option<Region>,
    fills: Vec<Vec<MapPoint>>,
    outlines: Vec<Vec<MapPoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GraticuleKind {
    Parallel,
    Meridian,
}

#[derive(Debug, Clone)]
struct GraticuleLine {
    kind: GraticuleKind,
    degrees: f64,
    runs: Vec<Vec<MapPoint>>,
}

impl GraticuleLine {
    fn label(&self) -> String {
        match self.kind {
            GraticuleKind::Parallel => format!("{}°N", self.degrees),
            GraticuleKind::Meridian => format!("{}°W", -self.degrees),
        }
    }

    /// Where the line meets the left edge (parallels) or bottom edge
    /// (meridians) of the map.
    fn label_anchor(&self, extent: &MapExtent) -> Option<MapPoint> {
        let tol = 1e-6 * extent.width().max(extent.height());
        let mut points = self.runs.iter().flatten().copied();
        match self.kind {
            GraticuleKind::Parallel => points.find(|p| (p.0 - extent.x_min).abs() <= tol),
            GraticuleKind::Meridian => points.find(|p| (p.1 - extent.y_min).abs() <= tol),
        }
    }
}

fn line_points(line: &LineString<f64>) -> Vec<MapPoint> {
    line.coords().map(|c| c.x_y()).collect()
}

/// Plotters polygons have no holes, so a polygon with interiors is drawn as
/// its triangulation.
fn fill_pieces(polygon: &geo::Polygon<f64>) -> Vec<Vec<MapPoint>> {
    if polygon.interiors().is_empty() {
        return vec![line_points(polygon.exterior())];
    }
    polygon
        .earcut_triangles()
        .iter()
        .map(|t| t.to_array().iter().map(|c| c.x_y()).collect())
        .collect()
}

fn project_boundary(
    projection: &Stereographic,
    extent: &MapExtent,
    boundary: &Boundary,
) -> ProjectedBoundary {
    let projected: MultiPolygon<f64> = boundary
        .geometry
        .0
        .iter()
        .filter_map(|p| projection.project_geometry(p))
        .collect();
    let fills = extent
        .clip_area(&projected)
        .0
        .iter()
        .flat_map(fill_pieces)
        .collect();
    let rings: MultiLineString<f64> = projected
        .0
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .cloned()
        .collect();
    let outlines = extent.clip_lines(&rings).0.iter().map(line_points).collect();
    ProjectedBoundary {
        region: boundary.region,
        fills,
        outlines,
    }
}

fn build_graticule(
    projection: &Stereographic,
    extent: &MapExtent,
    step: f64,
) -> Vec<GraticuleLine> {
    let clip = |points: Vec<MapPoint>| -> Vec<Vec<MapPoint>> {
        if points.len() < 2 {
            return Vec::new();
        }
        let line = MultiLineString::new(vec![LineString::from(points)]);
        extent.clip_lines(&line).0.iter().map(line_points).collect()
    };

    let parallels = (0u32..)
        .map(|i| i as f64 * step)
        .take_while(|lat| *lat < 90.0)
        .map(|lat| GraticuleLine {
            kind: GraticuleKind::Parallel,
            degrees: lat,
            runs: clip(
                (0..=360)
                    .filter_map(|i| projection.project(-180.0 + i as f64 * 0.5, lat))
                    .collect(),
            ),
        });

    let meridians = (0u32..)
        .map(|i| -180.0 + i as f64 * step)
        .take_while(|lon| *lon < 0.0)
        .map(|lon| GraticuleLine {
            kind: GraticuleKind::Meridian,
            degrees: lon,
            runs: clip(
                (0..=178)
                    .filter_map(|i| projection.project(lon, i as f64 * 0.5))
                    .collect(),
            ),
        });

    parallels
        .chain(meridians)
        .filter(|line| !line.runs.is_empty())
        .collect()
}

fn render_error(err: impl std::fmt::Display) -> FlowMapError {
    FlowMapError::Render(err.to_string())
}

// ── MapRenderer ───────────────────────────────────────────────────────────────

/// Draws frames onto a fixed basemap.
#[derive(Debug, Clone)]
pub struct MapRenderer {
    style: MapStyle,
    projection: Stereographic,
    extent: MapExtent,
    palette: Palette,
    boundaries: Vec<ProjectedBoundary>,
    graticule: Vec<GraticuleLine>,
}

impl MapRenderer {
    /// Validate `style` and project `boundaries` onto the map.
    pub fn new(style: MapStyle, boundaries: &[Boundary]) -> Result<Self> {
        style.validate()?;
        let projection = style.projection();
        let extent = style.extent()?;
        let palette = Palette::from_style(&style)?;
        let boundaries: Vec<ProjectedBoundary> = boundaries
            .iter()
            .map(|b| project_boundary(&projection, &extent, b))
            .collect();
        let graticule = build_graticule(&projection, &extent, style.graticule_step_deg);
        debug!(
            "Map renderer ready: {} boundaries, {} graticule lines",
            boundaries.len(),
            graticule.len()
        );
        Ok(Self {
            style,
            projection,
            extent,
            palette,
            boundaries,
            graticule,
        })
    }

    /// Output image size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.style.width, self.style.height_for(&self.extent))
    }

    /// Write one frame to `path` in the given format.
    pub fn render(&self, path: &Path, format: OutputFormat, frame: &MapFrame<'_>) -> Result<()> {
        match format {
            OutputFormat::Png => self.render_png(path, frame),
            OutputFormat::Svg => self.render_svg(path, frame),
        }
    }

    pub fn render_png(&self, path: &Path, frame: &MapFrame<'_>) -> Result<()> {
        let root = BitMapBackend::new(path, self.canvas_size()).into_drawing_area();
        self.draw(&root, frame)?;
        root.present().map_err(render_error)
    }

    pub fn render_svg(&self, path: &Path, frame: &MapFrame<'_>) -> Result<()> {
        let root = SVGBackend::new(path, self.canvas_size()).into_drawing_area();
        self.draw(&root, frame)?;
        root.present().map_err(render_error)
    }

    /// Render one frame to an in-memory SVG document.
    pub fn render_svg_string(&self, frame: &MapFrame<'_>) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.canvas_size()).into_drawing_area();
            self.draw(&root, frame)?;
            root.present().map_err(render_error)?;
        }
        Ok(svg)
    }

    /// Map-space polyline for one arrow: tail, head, barb, head, barb.
    ///
    /// The arrow pivots on its anchor. Arrows anchored off the map, or
    /// with zero length, are dropped.
    fn arrow_path(&self, arrow: &Arrow) -> Option<Vec<MapPoint>> {
        let (cx, cy) = self.projection.project(arrow.lon, arrow.lat)?;
        if !self.extent.contains((cx, cy)) {
            return None;
        }
        let (u, v) = self
            .projection
            .rotate_vector(arrow.lon, arrow.lat, arrow.u, arrow.v)?;
        let (dx, dy) = (u * self.style.arrow_scale_m, v * self.style.arrow_scale_m);
        let length = dx.hypot(dy);
        if length == 0.0 {
            return None;
        }

        let tail = (cx - dx / 2.0, cy - dy / 2.0);
        let head = (cx + dx / 2.0, cy + dy / 2.0);
        let back = (-dy).atan2(-dx);
        let spread = self.style.arrow_head_angle_deg.to_radians();
        let barb_len = length * self.style.arrow_head_ratio;
        let barb = |angle: f64| (head.0 + barb_len * angle.cos(), head.1 + barb_len * angle.sin());
        Some(vec![tail, head, barb(back + spread), head, barb(back - spread)])
    }

    /// Draw all layers for one frame onto `root`.
    pub fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        frame: &MapFrame<'_>,
    ) -> Result<()> {
        root.fill(&WHITE).map_err(render_error)?;

        let extent = self.extent;
        let mut chart = ChartBuilder::on(root)
            .margin(self.style.margin)
            .caption(frame.title, ("sans-serif", self.style.title_size))
            .build_cartesian_2d(extent.x_min..extent.x_max, extent.y_min..extent.y_max)
            .map_err(render_error)?;

        // ── Ocean and land ────────────────────────────────────────────────────
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(extent.x_min, extent.y_min), (extent.x_max, extent.y_max)],
                self.palette.ocean.filled(),
            )))
            .map_err(render_error)?;
        chart
            .draw_series(
                self.boundaries
                    .iter()
                    .flat_map(|b| b.fills.iter())
                    .map(|ring| Polygon::new(ring.clone(), self.palette.land.filled())),
            )
            .map_err(render_error)?;

        // ── Graticule ─────────────────────────────────────────────────────────
        let graticule_style = self
            .palette
            .graticule
            .mix(0.5)
            .stroke_width(self.style.graticule_width);
        chart
            .draw_series(
                self.graticule
                    .iter()
                    .flat_map(|line| line.runs.iter())
                    .map(|run| PathElement::new(run.clone(), graticule_style)),
            )
            .map_err(render_error)?;

        if self.style.draw_labels {
            let font = LABEL_FONT.into_font().color(&self.palette.label);
            chart
                .draw_series(self.graticule.iter().filter_map(|line| {
                    line.label_anchor(&extent)
                        .map(|at| Text::new(line.label(), at, font.clone()))
                }))
                .map_err(render_error)?;
        }

        // ── Regions ───────────────────────────────────────────────────────────
        chart
            .draw_series(self.boundaries.iter().flat_map(|b| {
                let region = b.region;
                b.fills.iter().filter_map(move |ring| {
                    region.map(|r| Polygon::new(ring.clone(), frame.fill_for(r).filled()))
                })
            }))
            .map_err(render_error)?;

        let outline_style = self
            .palette
            .boundary
            .stroke_width(self.style.boundary_width);
        chart
            .draw_series(
                self.boundaries
                    .iter()
                    .flat_map(|b| b.outlines.iter())
                    .map(|run| PathElement::new(run.clone(), outline_style)),
            )
            .map_err(render_error)?;

        // ── Arrows ────────────────────────────────────────────────────────────
        let arrows = build_arrows(frame.flows);
        if arrows.is_empty() {
            debug!("{}: no arrows", frame.title);
            return Ok(());
        }
        let arrow_style = self.palette.arrow.stroke_width(self.style.arrow_width);
        let paths: Vec<Vec<MapPoint>> = arrows.iter().filter_map(|a| self.arrow_path(a)).collect();
        debug!("{}: drawing {} arrows", frame.title, paths.len());
        chart
            .draw_series(paths.into_iter().map(|p| PathElement::new(p, arrow_style)))
            .map_err(render_error)?;

        Ok(())
    }
}
