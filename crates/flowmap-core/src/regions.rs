//! Static tables collapsing grid cells and US states into the ten regions.

use crate::error::{FlowMapError, Result};
use crate::models::{CellId, FrameKey, Region};

// ── Grid ──────────────────────────────────────────────────────────────────────

/// Width and height of the square model grid.
pub const GRID_SIZE: usize = 10;

/// Number of cells in the model grid.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Region of each grid cell, row-major from the south-west corner.
static CELL_REGIONS: [u8; CELL_COUNT] = [
    0, 0, 0, 1, 2, 2, 2, 2, 3, 3, //
    0, 0, 0, 1, 2, 2, 2, 2, 3, 3, //
    4, 0, 0, 1, 1, 2, 2, 2, 3, 3, //
    4, 5, 5, 1, 1, 2, 2, 2, 3, 3, //
    4, 5, 5, 1, 1, 2, 2, 2, 3, 8, //
    4, 5, 5, 6, 7, 7, 8, 8, 8, 8, //
    4, 5, 6, 6, 7, 7, 8, 8, 8, 8, //
    4, 5, 6, 6, 7, 7, 8, 8, 9, 9, //
    4, 5, 6, 6, 7, 7, 8, 9, 9, 9, //
    5, 6, 6, 6, 7, 7, 8, 9, 9, 9, //
];

// ── States ────────────────────────────────────────────────────────────────────

static STATE_REGIONS: [(&str, Region); 26] = [
    ("Mississippi", Region::from_table(0)),
    ("Alabama", Region::from_table(0)),
    ("Tennessee", Region::from_table(1)),
    ("Kentucky", Region::from_table(1)),
    ("Illinois", Region::from_table(2)),
    ("Indiana", Region::from_table(2)),
    ("Ohio", Region::from_table(2)),
    ("Michigan", Region::from_table(3)),
    ("Wisconsin", Region::from_table(3)),
    ("Florida", Region::from_table(4)),
    ("Georgia", Region::from_table(5)),
    ("South Carolina", Region::from_table(6)),
    ("North Carolina", Region::from_table(6)),
    ("Virginia", Region::from_table(7)),
    ("West Virginia", Region::from_table(7)),
    ("Maryland", Region::from_table(7)),
    ("Delaware", Region::from_table(7)),
    ("Pennsylvania", Region::from_table(8)),
    ("New Jersey", Region::from_table(8)),
    ("New York", Region::from_table(8)),
    ("Connecticut", Region::from_table(9)),
    ("Rhode Island", Region::from_table(9)),
    ("Massachusetts", Region::from_table(9)),
    ("Vermont", Region::from_table(9)),
    ("New Hampshire", Region::from_table(9)),
    ("Maine", Region::from_table(9)),
];

// ── Lookups ───────────────────────────────────────────────────────────────────

/// Map a grid cell to its region.
///
/// Cells outside `0..CELL_COUNT` are an error; `frame` is only used to make
/// the error message point at the offending record.
pub fn region_of_cell(cell: CellId, frame: FrameKey) -> Result<Region> {
    CELL_REGIONS
        .get(cell)
        .map(|&r| Region::from_table(r))
        .ok_or(FlowMapError::CellOutOfRange { cell, frame })
}

/// Map a state name to its region.
///
/// States outside the modelled area return `None`; that is not an error.
pub fn region_of_state(name: &str) -> Option<Region> {
    STATE_REGIONS
        .iter()
        .find(|(state, _)| *state == name)
        .map(|(_, region)| *region)
}

/// States belonging to `region`, in table order.
pub fn states_in_region(region: Region) -> impl Iterator<Item = &'static str> {
    STATE_REGIONS
        .iter()
        .filter(move |(_, r)| *r == region)
        .map(|(state, _)| *state)
}

/// Short human-readable label, e.g. `"Mississippi/Alabama"`.
pub fn region_label(region: Region) -> String {
    states_in_region(region).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::REGION_COUNT;

    fn key() -> FrameKey {
        FrameKey::new(0, 0)
    }

    #[test]
    fn test_every_cell_maps_into_region_range() {
        for cell in 0..CELL_COUNT {
            let region = region_of_cell(cell, key()).unwrap();
            assert!(region.index() < REGION_COUNT, "cell {cell}");
        }
    }

    #[test]
    fn test_known_cells() {
        assert_eq!(region_of_cell(3, key()).unwrap().index(), 1);
        assert_eq!(region_of_cell(5, key()).unwrap().index(), 2);
        assert_eq!(region_of_cell(20, key()).unwrap().index(), 4);
        assert_eq!(region_of_cell(49, key()).unwrap().index(), 8);
        assert_eq!(region_of_cell(99, key()).unwrap().index(), 9);
    }

    #[test]
    fn test_cell_out_of_range_is_error() {
        let err = region_of_cell(CELL_COUNT, FrameKey::new(1, 4)).unwrap_err();
        assert!(matches!(
            err,
            FlowMapError::CellOutOfRange { cell: 100, frame } if frame == FrameKey::new(1, 4)
        ));
    }

    #[test]
    fn test_every_region_has_cells_and_states() {
        for region in Region::all() {
            let has_cell = (0..CELL_COUNT).any(|c| region_of_cell(c, key()).unwrap() == region);
            assert!(has_cell, "{region} has no cells");
            assert!(states_in_region(region).next().is_some(), "{region} has no states");
        }
    }

    #[test]
    fn test_region_of_state_known() {
        assert_eq!(region_of_state("Ohio").unwrap().index(), 2);
        assert_eq!(region_of_state("Maine").unwrap().index(), 9);
        assert_eq!(region_of_state("South Carolina").unwrap().index(), 6);
    }

    #[test]
    fn test_region_of_state_unknown_is_none() {
        assert!(region_of_state("Texas").is_none());
        assert!(region_of_state("ohio").is_none(), "lookup is case-sensitive");
    }

    #[test]
    fn test_region_label() {
        assert_eq!(region_label(Region::new(0).unwrap()), "Mississippi/Alabama");
        assert_eq!(region_label(Region::new(4).unwrap()), "Florida");
    }
}
