//! Hierarchical node identity: district → sector → room.
//!
//! Child ids are derived from the parent id as
//! `parent_id * multiplier + local_index`. The multiplier must exceed the
//! number of siblings a parent can ever have or ids collide, so callers bound
//! sibling counts with [`max_siblings`] before deriving ids.
//!
//! ```
//! use gatewright_logic::identity::{child_id, HierarchyLevel};
//!
//! assert_eq!(child_id(7, HierarchyLevel::Sector, 3), Some(7003));
//! assert_eq!(child_id(7003, HierarchyLevel::Room, 12), Some(700312));
//! ```

use serde::{Deserialize, Serialize};

/// Id reserved as "no node" (parent of a district, invalid link endpoint).
pub const INVALID_ID: u32 = 0;

/// Sector ids are `district_id * 1000 + local_index`.
pub const SECTOR_ID_MULTIPLIER: u32 = 1000;

/// Room ids are `sector_id * 100 + local_index`.
pub const ROOM_ID_MULTIPLIER: u32 = 100;

/// Largest district id that keeps ids unique across all three levels.
///
/// Sector ids of district 99 top out at 99_999, below the smallest room id
/// (100_000), so no sector id can equal a room id.
pub const MAX_DISTRICTS: u32 = 99;

/// Depth of a node in the world hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HierarchyLevel {
    District = 0,
    Sector = 1,
    Room = 2,
}

impl HierarchyLevel {
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::District),
            1 => Some(Self::Sector),
            2 => Some(Self::Room),
            _ => None,
        }
    }

    /// Multiplier applied to the parent id when deriving an id at this level.
    /// Districts have no parent and so no multiplier.
    pub fn id_multiplier(self) -> Option<u32> {
        match self {
            Self::District => None,
            Self::Sector => Some(SECTOR_ID_MULTIPLIER),
            Self::Room => Some(ROOM_ID_MULTIPLIER),
        }
    }

    pub fn child(self) -> Option<Self> {
        match self {
            Self::District => Some(Self::Sector),
            Self::Sector => Some(Self::Room),
            Self::Room => None,
        }
    }
}

/// Unique, immutable identity of a node at any hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub id: u32,
    pub level: HierarchyLevel,
    /// [`INVALID_ID`] for districts.
    pub parent_id: u32,
    pub coordinates: (i32, i32),
}

impl NodeIdentity {
    pub fn district(id: u32, coordinates: (i32, i32)) -> Self {
        Self {
            id,
            level: HierarchyLevel::District,
            parent_id: INVALID_ID,
            coordinates,
        }
    }

    /// Build the identity of a child node one level below `parent`. Returns
    /// `None` for rooms, or when the derived id would overflow/collide.
    pub fn child_of(
        parent: &NodeIdentity,
        local_index: u32,
        coordinates: (i32, i32),
    ) -> Option<Self> {
        let level = parent.level.child()?;
        let id = child_id(parent.id, level, local_index)?;
        Some(Self {
            id,
            level,
            parent_id: parent.id,
            coordinates,
        })
    }

    pub fn is_district(&self) -> bool {
        self.level == HierarchyLevel::District
    }

    pub fn is_room(&self) -> bool {
        self.level == HierarchyLevel::Room
    }
}

/// Derive a child id. `None` when `local_index` would spill into the next
/// parent's id range or the multiplication overflows `u32`.
pub fn child_id(parent_id: u32, level: HierarchyLevel, local_index: u32) -> Option<u32> {
    let multiplier = level.id_multiplier()?;
    if local_index >= multiplier {
        return None;
    }
    parent_id.checked_mul(multiplier)?.checked_add(local_index)
}

/// Largest sibling count that can be given unique ids at `level`.
pub fn max_siblings(level: HierarchyLevel) -> u32 {
    level.id_multiplier().unwrap_or(MAX_DISTRICTS + 1) - 1
}

/// Recover the parent id from a derived id.
pub fn parent_of(id: u32, level: HierarchyLevel) -> u32 {
    match level.id_multiplier() {
        Some(m) => id / m,
        None => INVALID_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_id_derivation() {
        assert_eq!(child_id(1, HierarchyLevel::Sector, 0), Some(1000));
        assert_eq!(child_id(1000, HierarchyLevel::Room, 5), Some(100_005));
        assert_eq!(child_id(99, HierarchyLevel::Sector, 999), Some(99_999));
    }

    #[test]
    fn test_child_id_rejects_sibling_overflow() {
        assert_eq!(child_id(3, HierarchyLevel::Sector, 1000), None);
        assert_eq!(child_id(3001, HierarchyLevel::Room, 100), None);
        assert_eq!(child_id(1, HierarchyLevel::District, 0), None);
    }

    #[test]
    fn test_child_id_rejects_u32_overflow() {
        assert_eq!(child_id(u32::MAX / 10, HierarchyLevel::Room, 1), None);
    }

    #[test]
    fn test_parent_roundtrip() {
        let sector = child_id(42, HierarchyLevel::Sector, 17).unwrap();
        let room = child_id(sector, HierarchyLevel::Room, 4).unwrap();
        assert_eq!(parent_of(room, HierarchyLevel::Room), sector);
        assert_eq!(parent_of(sector, HierarchyLevel::Sector), 42);
    }

    #[test]
    fn test_levels_do_not_collide_within_district_bound() {
        let max_sector = child_id(MAX_DISTRICTS, HierarchyLevel::Sector, 999).unwrap();
        let min_room = child_id(
            child_id(1, HierarchyLevel::Sector, 0).unwrap(),
            HierarchyLevel::Room,
            0,
        )
        .unwrap();
        assert!(MAX_DISTRICTS < SECTOR_ID_MULTIPLIER);
        assert!(max_sector < min_room);
    }

    #[test]
    fn test_child_of_sets_level_and_parent() {
        let district = NodeIdentity::district(5, (2, 3));
        let sector = NodeIdentity::child_of(&district, 2, (1, 0)).unwrap();
        assert_eq!(sector.level, HierarchyLevel::Sector);
        assert_eq!(sector.parent_id, 5);
        assert_eq!(sector.id, 5002);

        let room = NodeIdentity::child_of(&sector, 1, (0, 4)).unwrap();
        assert!(room.is_room());
        assert!(NodeIdentity::child_of(&room, 0, (0, 0)).is_none());
    }

    #[test]
    fn test_max_siblings() {
        assert_eq!(max_siblings(HierarchyLevel::Sector), 999);
        assert_eq!(max_siblings(HierarchyLevel::Room), 99);
        assert_eq!(max_siblings(HierarchyLevel::District), MAX_DISTRICTS);
    }
}
