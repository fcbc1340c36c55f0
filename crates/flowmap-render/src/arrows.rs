//! Conversion of region flows into map arrows.

use flowmap_core::models::{Region, RegionFlow};
use flowmap_core::vectors::lookup_flow_vector;
use tracing::trace;

/// A flow arrow in geographic terms: anchor plus east/north components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub from: Region,
    pub to: Region,
    pub lon: f64,
    pub lat: f64,
    pub u: f64,
    pub v: f64,
}

/// Signed log-scaled arrow length: `sign(count) * ln(1 + |count|)`.
pub fn arrow_magnitude(count: i64) -> f64 {
    count.signum() as f64 * (count.unsigned_abs() as f64).ln_1p()
}

/// The arrow for one flow, or `None` when the flow is zero or its pair has
/// no registered anchor.
pub fn arrow_for_flow(flow: &RegionFlow) -> Option<Arrow> {
    if flow.count == 0 {
        return None;
    }
    let Some((vector, orientation)) = lookup_flow_vector(flow.from, flow.to) else {
        trace!("No flow vector for {} -> {}", flow.from, flow.to);
        return None;
    };
    let magnitude = arrow_magnitude(orientation.apply(flow.count));
    let angle = vector.angle_rad();
    Some(Arrow {
        from: flow.from,
        to: flow.to,
        lon: vector.lon,
        lat: vector.lat,
        u: magnitude * angle.cos(),
        v: magnitude * angle.sin(),
    })
}

/// Arrows for every drawable flow of a frame, in input order.
pub fn build_arrows(flows: &[RegionFlow]) -> Vec<Arrow> {
    flows.iter().filter_map(arrow_for_flow).collect()
}
