//! Region-level aggregation of per-cell observations and movements.
//!
//! Cells are collapsed into regions with the static grid table. Flows are
//! stored under a canonical key with the lower region first; when the
//! mapped regions arrive in descending order the pair is swapped and the
//! count negated. Flows whose endpoints land in the same region are kept
//! under the `(r, r)` key and never leak into any other bucket.

use std::collections::{BTreeMap, BTreeSet};

use flowmap_core::error::{FlowMapError, Result};
use flowmap_core::models::{
    FlowRecord, Frame, FrameKey, ObservationRecord, Region, RegionFlow, REGION_COUNT,
};
use flowmap_core::regions::region_of_cell;

// ── Canonicalisation ──────────────────────────────────────────────────────────

/// Order a region pair so the lower region comes first, negating `count`
/// when a swap was needed. Returns `None` when the negation overflows.
pub fn canonicalize(from: Region, to: Region, count: i64) -> Option<(Region, Region, i64)> {
    if from > to {
        Some((to, from, count.checked_neg()?))
    } else {
        Some((from, to, count))
    }
}

// ── RegionAggregator ──────────────────────────────────────────────────────────

/// Accumulated per-region totals for every frame seen in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionAggregator {
    observations: BTreeMap<(FrameKey, Region), u64>,
    flows: BTreeMap<(FrameKey, Region, Region), i64>,
    observed_frames: BTreeSet<FrameKey>,
    flow_frames: BTreeSet<FrameKey>,
}

impl RegionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate both record sets in one pass each.
    ///
    /// Fails on the first record whose cell lies outside the grid.
    pub fn build(observations: &[ObservationRecord], flows: &[FlowRecord]) -> Result<Self> {
        let mut aggregator = Self::new();
        for record in observations {
            aggregator.add_observation(record)?;
        }
        for record in flows {
            aggregator.add_flow(record)?;
        }
        Ok(aggregator)
    }

    /// Accumulate one observation into its region's running total.
    pub fn add_observation(&mut self, record: &ObservationRecord) -> Result<()> {
        let key = record.key();
        let region = region_of_cell(record.cell, key)?;
        let total = self.observations.entry((key, region)).or_insert(0);
        *total = total
            .checked_add(record.count)
            .ok_or(FlowMapError::CountOverflow { frame: key })?;
        self.observed_frames.insert(key);
        Ok(())
    }

    /// Accumulate one movement under its canonical region pair.
    pub fn add_flow(&mut self, record: &FlowRecord) -> Result<()> {
        let key = record.key();
        let from = region_of_cell(record.from_cell, key)?;
        let to = region_of_cell(record.to_cell, key)?;
        let overflow = || FlowMapError::CountOverflow { frame: key };
        let (lo, hi, count) = canonicalize(from, to, record.count).ok_or_else(overflow)?;
        let total = self.flows.entry((key, lo, hi)).or_insert(0);
        *total = total.checked_add(count).ok_or_else(overflow)?;
        self.flow_frames.insert(key);
        Ok(())
    }

    /// Dense view of one frame.
    ///
    /// `observations` always has ten entries. `flows` lists all 100 ordered
    /// pairs row-major, or is empty when the frame had no flow records.
    pub fn frame(&self, key: FrameKey) -> Frame {
        let mut observations = [0u64; REGION_COUNT];
        for region in Region::all() {
            observations[region.index()] = self.observation(key, region);
        }

        let flows = if self.flow_frames.contains(&key) {
            Region::all()
                .flat_map(|from| Region::all().map(move |to| (from, to)))
                .map(|(from, to)| RegionFlow {
                    from,
                    to,
                    count: self.flow(key, from, to),
                })
                .collect()
        } else {
            Vec::new()
        };

        Frame {
            key,
            observations,
            flows,
        }
    }

    /// Convenience form of [`frame`](Self::frame) taking `(year, day)`.
    pub fn aggregate(&self, year: u32, day: u32) -> Frame {
        self.frame(FrameKey::new(year, day))
    }

    /// Observation total for one region, 0 when absent.
    pub fn observation(&self, key: FrameKey, region: Region) -> u64 {
        self.observations.get(&(key, region)).copied().unwrap_or(0)
    }

    /// Stored net flow for the ordered pair `(from, to)`.
    ///
    /// Only canonical keys (`from <= to`) are ever stored, so a descending
    /// pair reads as 0.
    pub fn flow(&self, key: FrameKey, from: Region, to: Region) -> i64 {
        self.flows.get(&(key, from, to)).copied().unwrap_or(0)
    }

    /// Net birds leaving `region` in `key`, summed over every other region.
    ///
    /// Saturates at the `i64` bounds.
    pub fn net_outflow(&self, key: FrameKey, region: Region) -> i64 {
        Region::all()
            .filter(|&other| other != region)
            .map(|other| {
                let (lo, hi, sign) = if region < other {
                    (region, other, 1)
                } else {
                    (other, region, -1)
                };
                self.flow(key, lo, hi).saturating_mul(sign)
            })
            .fold(0i64, i64::saturating_add)
    }

    /// Every frame that appeared in either input, ascending.
    pub fn frame_keys(&self) -> Vec<FrameKey> {
        self.observed_frames
            .union(&self.flow_frames)
            .copied()
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
