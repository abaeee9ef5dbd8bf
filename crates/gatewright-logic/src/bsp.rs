//! Room layout by binary space partitioning.
//!
//! A sector's local bound is split recursively into leaf rooms. Rectangles
//! are taken from a worklist; one becomes a leaf when either side is at most
//! `min_room_size`, when neither side is long enough to split, or when
//! splitting would exceed `max_rooms`. Otherwise it is cut across an axis
//! chosen with a bias toward the longer side, at a uniformly drawn coordinate
//! that leaves at least `min_room_size` on both halves.
//!
//! The leaves always tile the bound exactly: pairwise disjoint, union equal
//! to the bound, between 1 and `max_rooms` of them.

use crate::geometry::RectI;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Chance that a cut runs across the longer side of a rectangle.
pub const LONG_AXIS_BIAS: f32 = 0.7;

/// Chance that the first room of a sector becomes its entrance.
pub const ENTRANCE_CHANCE: f32 = 0.3;

/// Rooms with an area above this may roll a special type.
pub const SPECIAL_ROOM_MIN_AREA: i32 = 6;

pub const BOSS_CHANCE: f32 = 0.1;
pub const TREASURE_CHANCE: f32 = 0.1;
pub const SAVE_CHANCE: f32 = 0.1;

/// Partitioning parameters for one sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BspConfig {
    pub width: i32,
    pub height: i32,
    pub min_room_size: i32,
    pub max_rooms: usize,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            min_room_size: 2,
            max_rooms: 6,
        }
    }
}

impl BspConfig {
    pub fn bound(&self) -> RectI {
        RectI::new(0, 0, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Normal,
    Entrance,
    Exit,
    Boss,
    Treasure,
    Shop,
    Save,
    Hub,
}

/// A room produced by partitioning. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Sector-local cell bounds.
    pub bounds: RectI,
    pub room_type: RoomType,
    pub is_leaf: bool,
}

/// Split the configured bound into leaf rectangles, in emission order.
pub fn split_rooms<R: Rng>(config: &BspConfig, rng: &mut R) -> Vec<RectI> {
    let bound = config.bound();
    if bound.area() == 0 {
        return Vec::new();
    }

    let min = config.min_room_size.max(1);
    let max_rooms = config.max_rooms.max(1);
    let mut worklist = vec![bound];
    let mut leaves = Vec::new();

    while let Some(rect) = worklist.pop() {
        // A split turns one pending rectangle into two.
        let would_exceed = leaves.len() + worklist.len() + 2 > max_rooms;
        if rect.width <= min || rect.height <= min || would_exceed {
            leaves.push(rect);
            continue;
        }

        let can_cut_x = rect.width >= 2 * min;
        let can_cut_y = rect.height >= 2 * min;
        let roll: f32 = rng.gen();
        let cut_x = match (can_cut_x, can_cut_y) {
            (true, true) if rect.width >= rect.height => roll < LONG_AXIS_BIAS,
            (true, true) => roll < 1.0 - LONG_AXIS_BIAS,
            (true, false) => true,
            (false, true) => false,
            (false, false) => {
                leaves.push(rect);
                continue;
            }
        };

        let (a, b) = if cut_x {
            let at = rng.gen_range(rect.x + min..=rect.right() - min);
            (
                RectI::new(rect.x, rect.y, at - rect.x, rect.height),
                RectI::new(at, rect.y, rect.right() - at, rect.height),
            )
        } else {
            let at = rng.gen_range(rect.y + min..=rect.bottom() - min);
            (
                RectI::new(rect.x, rect.y, rect.width, at - rect.y),
                RectI::new(rect.x, at, rect.width, rect.bottom() - at),
            )
        };
        worklist.push(a);
        worklist.push(b);
    }

    log::debug!(
        "BSP split {}x{} into {} rooms",
        bound.width,
        bound.height,
        leaves.len()
    );
    leaves
}

/// Roll a type for each room. The first room may become the entrance; large
/// later rooms may become boss, treasure, or save rooms.
pub fn assign_room_types<R: Rng>(rooms: &[RectI], rng: &mut R) -> Vec<RoomRecord> {
    rooms
        .iter()
        .enumerate()
        .map(|(i, bounds)| {
            let room_type = if i == 0 {
                if rng.gen::<f32>() < ENTRANCE_CHANCE {
                    RoomType::Entrance
                } else {
                    RoomType::Normal
                }
            } else if bounds.area() > SPECIAL_ROOM_MIN_AREA {
                let roll: f32 = rng.gen();
                if roll < BOSS_CHANCE {
                    RoomType::Boss
                } else if roll < BOSS_CHANCE + TREASURE_CHANCE {
                    RoomType::Treasure
                } else if roll < BOSS_CHANCE + TREASURE_CHANCE + SAVE_CHANCE {
                    RoomType::Save
                } else {
                    RoomType::Normal
                }
            } else {
                RoomType::Normal
            };
            RoomRecord {
                bounds: *bounds,
                room_type,
                is_leaf: true,
            }
        })
        .collect()
}

/// Partition and type the rooms of one sector.
pub fn generate_rooms<R: Rng>(config: &BspConfig, rng: &mut R) -> Vec<RoomRecord> {
    let rects = split_rooms(config, rng);
    assign_room_types(&rects, rng)
}
