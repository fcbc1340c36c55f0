use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlowMapError, Result};

/// Number of coarse regions every cell and state collapses into.
pub const REGION_COUNT: usize = 10;

/// Identifier of a fine-grained grid cell, `0..CELL_COUNT`.
pub type CellId = usize;

/// One of the ten coarse regions, always in `0..REGION_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Region(u8);

impl Region {
    /// Build a region from its index, rejecting anything outside `0..10`.
    pub fn new(index: usize) -> Result<Self> {
        if index < REGION_COUNT {
            Ok(Region(index as u8))
        } else {
            Err(FlowMapError::RegionOutOfRange(index))
        }
    }

    /// Construct from a table entry already known to be in range.
    pub(crate) const fn from_table(index: u8) -> Self {
        Region(index)
    }

    /// The region's position in dense per-region vectors.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All regions in ascending order.
    pub fn all() -> impl Iterator<Item = Region> {
        (0..REGION_COUNT as u8).map(Region)
    }
}

impl TryFrom<u8> for Region {
    type Error = FlowMapError;

    fn try_from(value: u8) -> Result<Self> {
        Region::new(value as usize)
    }
}

impl From<Region> for u8 {
    fn from(region: Region) -> u8 {
        region.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// A (year, day) pair identifying one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameKey {
    pub year: u32,
    pub day: u32,
}

impl FrameKey {
    pub fn new(year: u32, day: u32) -> Self {
        Self { year, day }
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "year {} day {}", self.year, self.day)
    }
}

/// Number of birds observed in one cell on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub year: u32,
    pub day: u32,
    pub cell: CellId,
    pub count: u64,
}

impl ObservationRecord {
    pub fn key(&self) -> FrameKey {
        FrameKey::new(self.year, self.day)
    }
}

/// Net signed number of birds inferred to move from `from_cell` to
/// `to_cell` on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub year: u32,
    pub day: u32,
    pub from_cell: CellId,
    pub to_cell: CellId,
    pub count: i64,
}

impl FlowRecord {
    pub fn key(&self) -> FrameKey {
        FrameKey::new(self.year, self.day)
    }
}

/// Net flow between two regions. Positive counts move from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionFlow {
    pub from: Region,
    pub to: Region,
    pub count: i64,
}

impl RegionFlow {
    /// True for flows that start and end in the same region.
    pub fn is_self_flow(&self) -> bool {
        self.from == self.to
    }
}

/// Aggregated data for a single (year, day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub key: FrameKey,
    /// Observation totals indexed by region.
    pub observations: [u64; REGION_COUNT],
    /// Dense row-major list of all ordered region pairs, or empty when the
    /// frame had no flow records at all.
    pub flows: Vec<RegionFlow>,
}

impl Frame {
    /// A frame with no observations and no flows.
    pub fn empty(key: FrameKey) -> Self {
        Self {
            key,
            observations: [0; REGION_COUNT],
            flows: Vec::new(),
        }
    }

    /// Sum of all region observation counts, saturating at `u64::MAX`.
    pub fn total_observed(&self) -> u64 {
        self.observations
            .iter()
            .fold(0u64, |total, &n| total.saturating_add(n))
    }

    /// Non-zero flows between distinct regions.
    pub fn net_flows(&self) -> impl Iterator<Item = &RegionFlow> {
        self.flows
            .iter()
            .filter(|f| f.count != 0 && !f.is_self_flow())
    }

    /// Observation counts as floating-point values for colour scaling.
    pub fn observation_values(&self) -> [f64; REGION_COUNT] {
        self.observations.map(|n| n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_new_accepts_valid_indices() {
        for i in 0..REGION_COUNT {
            assert_eq!(Region::new(i).unwrap().index(), i);
        }
    }

    #[test]
    fn test_region_new_rejects_ten() {
        assert!(matches!(
            Region::new(10),
            Err(FlowMapError::RegionOutOfRange(10))
        ));
    }

    #[test]
    fn test_region_all_is_ordered() {
        let all: Vec<usize> = Region::all().map(Region::index).collect();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_region_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Region>("11").is_err());
        let r: Region = serde_json::from_str("4").unwrap();
        assert_eq!(r.index(), 4);
    }

    #[test]
    fn test_frame_key_orders_by_year_then_day() {
        let mut keys = vec![
            FrameKey::new(1, 0),
            FrameKey::new(0, 18),
            FrameKey::new(0, 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![FrameKey::new(0, 2), FrameKey::new(0, 18), FrameKey::new(1, 0)]
        );
    }

    #[test]
    fn test_frame_net_flows_skips_zero_and_self() {
        let r = |i| Region::new(i).unwrap();
        let frame = Frame {
            key: FrameKey::new(0, 0),
            observations: [0; REGION_COUNT],
            flows: vec![
                RegionFlow { from: r(0), to: r(0), count: 9 },
                RegionFlow { from: r(0), to: r(1), count: 0 },
                RegionFlow { from: r(0), to: r(2), count: -3 },
            ],
        };
        let net: Vec<_> = frame.net_flows().collect();
        assert_eq!(net.len(), 1);
        assert_eq!(net[0].count, -3);
    }

    #[test]
    fn test_frame_total_observed() {
        let mut frame = Frame::empty(FrameKey::new(0, 0));
        frame.observations[1] = 5;
        frame.observations[9] = 7;
        assert_eq!(frame.total_observed(), 12);
        assert_eq!(frame.observation_values()[9], 7.0);

        frame.observations[2] = u64::MAX;
        assert_eq!(frame.total_observed(), u64::MAX);
    }
}
