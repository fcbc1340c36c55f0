//! Spherical stereographic projection and map-extent clipping.
//!
//! Coordinates are projected to metres on a sphere of radius
//! [`EARTH_RADIUS_M`]. The visible map is the axis-aligned rectangle spanned
//! by two projected corners; areas and lines are clipped to it with `geo`
//! boolean operations before drawing.

use flowmap_core::error::{FlowMapError, Result};
use geo::{coord, BooleanOps, Coord, MapCoords, MultiLineString, MultiPolygon, Rect};

/// Sphere radius used by the projection, metres.
pub const EARTH_RADIUS_M: f64 = 6_370_997.0;

/// Projected `(x, y)` in metres.
pub type MapPoint = (f64, f64);

// ── Stereographic ─────────────────────────────────────────────────────────────

/// Oblique stereographic projection centred on `(lon0, lat0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stereographic {
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    radius: f64,
}

impl Stereographic {
    pub fn new(lon0_deg: f64, lat0_deg: f64) -> Self {
        let lat0 = lat0_deg.to_radians();
        Self {
            lon0: lon0_deg.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
            radius: EARTH_RADIUS_M,
        }
    }

    /// Project a geographic point. Returns `None` at the antipode of the
    /// centre, where the projection is undefined.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<MapPoint> {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let cos_c = self.sin_lat0 * sin_lat + self.cos_lat0 * cos_lat * dlon.cos();
        let denom = 1.0 + cos_c;
        if denom <= 1e-12 {
            return None;
        }
        let k = 2.0 * self.radius / denom;
        let x = k * cos_lat * dlon.sin();
        let y = k * (self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * dlon.cos());
        Some((x, y))
    }

    /// Turn an east/north vector anchored at `(lon, lat)` into map axes.
    ///
    /// The result keeps the vector's length and takes its heading from the
    /// projected image of a short step along it.
    pub fn rotate_vector(&self, lon: f64, lat: f64, u: f64, v: f64) -> Option<MapPoint> {
        let speed = u.hypot(v);
        if speed == 0.0 {
            return Some((0.0, 0.0));
        }
        const STEP_DEG: f64 = 1e-3;
        let cos_lat = lat.to_radians().cos().max(1e-6);
        let (x0, y0) = self.project(lon, lat)?;
        let (x1, y1) = self.project(
            lon + STEP_DEG * u / speed / cos_lat,
            lat + STEP_DEG * v / speed,
        )?;
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = dx.hypot(dy);
        if len == 0.0 {
            return None;
        }
        Some((speed * dx / len, speed * dy / len))
    }

    /// Project every coordinate of a `(lon, lat)` geometry. `None` if any
    /// coordinate is the antipode.
    pub fn project_geometry<G>(&self, geometry: &G) -> Option<G::Output>
    where
        G: MapCoords<f64, f64>,
    {
        geometry
            .try_map_coords(|c| self.project(c.x, c.y).map(Coord::from).ok_or(()))
            .ok()
    }
}

// ── MapExtent ─────────────────────────────────────────────────────────────────

/// Visible rectangle in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl MapExtent {
    /// Extent spanned by the projected lower-left and upper-right corners,
    /// both given as `[lon, lat]`.
    pub fn from_corners(
        projection: &Stereographic,
        lower_left: [f64; 2],
        upper_right: [f64; 2],
    ) -> Result<Self> {
        let ll = projection.project(lower_left[0], lower_left[1]);
        let ur = projection.project(upper_right[0], upper_right[1]);
        let ((x0, y0), (x1, y1)) = match (ll, ur) {
            (Some(ll), Some(ur)) => (ll, ur),
            _ => {
                return Err(FlowMapError::Config(
                    "map corner cannot be projected".to_string(),
                ))
            }
        };
        if x1 <= x0 || y1 <= y0 {
            return Err(FlowMapError::Config(format!(
                "map corners {lower_left:?} and {upper_right:?} do not span an area"
            )));
        }
        Ok(Self {
            x_min: x0,
            x_max: x1,
            y_min: y0,
            y_max: y1,
        })
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, (x, y): MapPoint) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// The extent as a single-rectangle area.
    fn bounds(&self) -> MultiPolygon<f64> {
        let rect = Rect::new(
            coord! { x: self.x_min, y: self.y_min },
            coord! { x: self.x_max, y: self.y_max },
        );
        MultiPolygon::new(vec![rect.to_polygon()])
    }

    /// The visible part of `area`, holes included.
    pub fn clip_area(&self, area: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        area.intersection(&self.bounds())
    }

    /// The visible runs of `lines`; a line that leaves and re-enters the
    /// extent comes back as several runs.
    pub fn clip_lines(&self, lines: &MultiLineString<f64>) -> MultiLineString<f64> {
        self.bounds().clip(lines, false)
    }
}
