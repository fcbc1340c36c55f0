//! Value-to-colour mapping for region fills.
//!
//! Region fills use the "hot" colormap read backwards: the low end of the
//! value range is white and the high end is near-black red.

use plotters::style::RGBColor;

// ── Hot colormap ──────────────────────────────────────────────────────────────

/// Control points `(x, level)` for each channel of the hot colormap.
const HOT_RED: [(f64, f64); 3] = [(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)];
const HOT_GREEN: [(f64, f64); 4] = [(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)];
const HOT_BLUE: [(f64, f64); 3] = [(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)];

fn channel(points: &[(f64, f64)], x: f64) -> f64 {
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if x1 <= x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    points.last().map(|&(_, y)| y).unwrap_or(0.0)
}

fn to_byte(level: f64) -> u8 {
    (level.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Sample the hot colormap at `x`, clamped to `[0, 1]`.
///
/// `hot(0.0)` is near-black, `hot(1.0)` is white. NaN samples as 0.
pub fn hot(x: f64) -> RGBColor {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    RGBColor(
        to_byte(channel(&HOT_RED, x)),
        to_byte(channel(&HOT_GREEN, x)),
        to_byte(channel(&HOT_BLUE, x)),
    )
}

// ── ValueScale ────────────────────────────────────────────────────────────────

/// Linear scale from observation counts onto the fill colormap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f64,
    pub max: f64,
}

impl ValueScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `value` within the scale, clamped to `[0, 1]`.
    ///
    /// A degenerate scale (`max == min`) places every value at 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 || !span.is_finite() {
            return 0.0;
        }
        let t = (value - self.min) / span;
        if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, 1.0)
        }
    }

    /// Fill colour for a region holding `value` observations.
    pub fn fill_color(&self, value: f64) -> RGBColor {
        hot(1.0 - self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hot_endpoints() {
        assert_eq!(hot(1.0), RGBColor(255, 255, 255));
        assert_eq!(hot(0.0), RGBColor(11, 0, 0));
    }

    #[test]
    fn test_hot_breakpoints() {
        // Red saturates first, then green, then blue.
        assert_eq!(hot(0.365079), RGBColor(255, 0, 0));
        assert_eq!(hot(0.746032), RGBColor(255, 255, 0));
    }

    #[test]
    fn test_hot_is_clamped() {
        assert_eq!(hot(-3.0), hot(0.0));
        assert_eq!(hot(7.0), hot(1.0));
        assert_eq!(hot(f64::NAN), hot(0.0));
    }

    #[test]
    fn test_hot_channels_monotonic() {
        let mut prev = hot(0.0);
        for i in 1..=100 {
            let c = hot(i as f64 / 100.0);
            assert!(c.0 >= prev.0 && c.1 >= prev.1 && c.2 >= prev.2);
            prev = c;
        }
    }

    #[test]
    fn test_normalize() {
        let scale = ValueScale::new(0.0, 1000.0);
        assert_eq!(scale.normalize(0.0), 0.0);
        assert_eq!(scale.normalize(250.0), 0.25);
        assert_eq!(scale.normalize(1000.0), 1.0);
        assert_eq!(scale.normalize(5000.0), 1.0);
        assert_eq!(scale.normalize(-10.0), 0.0);
    }

    #[test]
    fn test_fill_color_low_values_are_white() {
        let scale = ValueScale::new(0.0, 1000.0);
        assert_eq!(scale.fill_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(scale.fill_color(1000.0), hot(0.0));
    }

    #[test]
    fn test_degenerate_scale_is_white() {
        let scale = ValueScale::new(5.0, 5.0);
        assert_eq!(scale.normalize(5.0), 0.0);
        assert_eq!(scale.normalize(1e9), 0.0);
        assert_eq!(scale.fill_color(123.0), RGBColor(255, 255, 255));
    }
}
