//! Hex tile coordinates and 6-neighbor connectivity.
//!
//! The host map is hex-connected (6 neighbors per tile), unlike
//! [`rts_core::pathfinding::NavGrid`]'s square, 8-directional grid. The AI
//! engine works entirely in axial coordinates and never touches the host's
//! own grid representation directly; `HostView` implementations are
//! responsible for translating to/from whatever the host map actually uses.

use serde::{Deserialize, Serialize};

/// An axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    /// Axial column.
    pub q: i32,
    /// Axial row.
    pub r: i32,
}

impl HexCoord {
    /// Construct a new coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Neighbor in the given direction.
    #[must_use]
    pub fn neighbor(self, dir: HexDirection) -> Self {
        let (dq, dr) = dir.offset();
        Self::new(self.q + dq, self.r + dr)
    }

    /// All six neighbors, in a fixed deterministic order.
    #[must_use]
    pub fn all_neighbors(self) -> [Self; 6] {
        HexDirection::ALL.map(|dir| self.neighbor(dir))
    }

    /// Whether `self`'s south-east neighbor is among `flagged` — used by the
    /// Field Index to set a field's `preferred` bit.
    #[must_use]
    pub fn south_east_in(self, flagged: &std::collections::HashSet<HexCoord>) -> bool {
        flagged.contains(&self.neighbor(HexDirection::SouthEast))
    }

    /// Axial (hex) distance between two coordinates.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).unsigned_abs();
        dq.max(dr).max(ds)
    }

    /// All coordinates within `radius` hex steps (inclusive), in deterministic
    /// row-major order over the bounding parallelogram — used by blocked-field
    /// ring reservations and nearby-feature scans.
    #[must_use]
    pub fn ring_area(self, radius: i32) -> Vec<Self> {
        let mut out = Vec::new();
        for dq in -radius..=radius {
            let r_lo = (-radius).max(-dq - radius);
            let r_hi = radius.min(-dq + radius);
            for dr in r_lo..=r_hi {
                out.push(Self::new(self.q + dq, self.r + dr));
            }
        }
        out
    }
}

/// The six hex neighbor directions.
///
/// Named to match the host's own direction scheme: a hex grid has exactly
/// six neighbors, spaced 60 degrees apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HexDirection {
    /// North-east neighbor.
    NorthEast,
    /// East neighbor.
    East,
    /// South-east neighbor.
    SouthEast,
    /// South-west neighbor.
    SouthWest,
    /// West neighbor.
    West,
    /// North-west neighbor.
    NorthWest,
}

impl HexDirection {
    /// All six directions, in a fixed deterministic order.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::NorthEast,
        HexDirection::East,
        HexDirection::SouthEast,
        HexDirection::SouthWest,
        HexDirection::West,
        HexDirection::NorthWest,
    ];

    const fn offset(self) -> (i32, i32) {
        match self {
            HexDirection::NorthEast => (1, -1),
            HexDirection::East => (1, 0),
            HexDirection::SouthEast => (0, 1),
            HexDirection::SouthWest => (-1, 1),
            HexDirection::West => (-1, 0),
            HexDirection::NorthWest => (0, -1),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            HexDirection::NorthEast => HexDirection::SouthWest,
            HexDirection::East => HexDirection::West,
            HexDirection::SouthEast => HexDirection::NorthWest,
            HexDirection::SouthWest => HexDirection::NorthEast,
            HexDirection::West => HexDirection::East,
            HexDirection::NorthWest => HexDirection::SouthEast,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_distance_is_one() {
        let origin = HexCoord::new(0, 0);
        for dir in HexDirection::ALL {
            assert_eq!(origin.distance(origin.neighbor(dir)), 1);
        }
    }

    #[test]
    fn opposite_directions_cancel() {
        let origin = HexCoord::new(3, -2);
        for dir in HexDirection::ALL {
            let there_and_back = origin.neighbor(dir).neighbor(dir.opposite());
            assert_eq!(there_and_back, origin);
        }
    }

    #[test]
    fn ring_area_radius_zero_is_self() {
        let origin = HexCoord::new(5, 5);
        assert_eq!(origin.ring_area(0), vec![origin]);
    }

    #[test]
    fn ring_area_radius_one_has_seven_tiles() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(origin.ring_area(1).len(), 7);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = HexCoord::new(2, -1);
        let b = HexCoord::new(-3, 4);
        assert_eq!(a.distance(b), b.distance(a));
    }
}
