//! Hierarchy generation: district layout stand-in and seeded subdivision.
//!
//! [`subdivide`] turns one laid-out district into sectors on a jittered grid
//! and each sector into BSP rooms. All randomness for a district comes from
//! one `StdRng` seeded with the district's own seed, so identical
//! `(seed, grid, count)` inputs give identical placements wherever the
//! district sits in the world.

use crate::world::{SectorSubdivisionState, World};
use gatewright_logic::bsp::{self, BspConfig};
use gatewright_logic::config::WorldConfig;
use gatewright_logic::identity::{max_siblings, HierarchyLevel, NodeIdentity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Maximum jitter applied to a sector's grid cell, per axis.
pub const SECTOR_JITTER: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubdivisionOutcome {
    Subdivided { sectors: usize, rooms: usize },
    /// Already done; nothing changed.
    AlreadySubdivided,
    /// The external layout pass hasn't finished this district yet.
    LayoutPending,
    /// No district with that id.
    UnknownDistrict,
}

impl SubdivisionOutcome {
    pub fn changed_world(&self) -> bool {
        matches!(self, SubdivisionOutcome::Subdivided { .. })
    }
}

/// Per-district seed derived from the world seed.
pub fn district_seed(world_seed: u32, index: u32) -> u32 {
    world_seed ^ index.wrapping_add(1).wrapping_mul(0x9E37_79B9)
}

/// Place `config.district_count` districts row-major on the district grid.
/// Stands in for the external layout pass; districts still need their
/// layout signal before they can be subdivided.
pub fn seed_districts(world: &mut World, config: &WorldConfig) -> Vec<u32> {
    let cols = config.district_grid.0.max(1);
    let mut placed = Vec::new();
    for i in 0..config.district_count {
        let coordinates = ((i as i32) % cols, (i as i32) / cols);
        let state = SectorSubdivisionState::new(
            config.sector_grid,
            config.sector_count,
            district_seed(config.seed, i),
        );
        match world.add_district(coordinates, state) {
            Some(id) => placed.push(id),
            None => break,
        }
    }
    log::info!(
        "Seeded {} districts on a {}x{} grid (seed {})",
        placed.len(),
        config.district_grid.0,
        config.district_grid.1,
        config.seed
    );
    placed
}

/// Sector count actually placed: bounded by the grid and by the id scheme.
fn actual_sector_count(state: &SectorSubdivisionState, district_id: u32) -> u32 {
    let (gx, gy) = state.local_grid_size;
    let cells = gx.max(0) as i64 * gy.max(0) as i64;
    let requested = (state.sector_count.max(0) as i64).min(cells);
    let cap = max_siblings(HierarchyLevel::Sector) as i64;
    if requested > cap {
        log::warn!(
            "District {} asks for {} sectors; capping at {} to keep ids unique",
            district_id,
            requested,
            cap
        );
    }
    requested.min(cap) as u32
}

/// Local coordinates for sector `index` on a `grid_width`-wide grid.
fn jittered_cell<R: Rng>(index: u32, grid_width: i32, rng: &mut R) -> (i32, i32) {
    let gx = grid_width.max(1) as u32;
    let base_x = (index % gx) as f32;
    let base_y = (index / gx) as f32;
    let jx = rng.gen_range(-SECTOR_JITTER..=SECTOR_JITTER);
    let jy = rng.gen_range(-SECTOR_JITTER..=SECTOR_JITTER);
    ((base_x + jx) as i32, (base_y + jy) as i32)
}

/// Subdivide one district into sectors and rooms. Idempotent: a second call
/// reports `AlreadySubdivided` and leaves the world untouched.
pub fn subdivide(world: &mut World, district_id: u32, bsp_config: &BspConfig) -> SubdivisionOutcome {
    let district = match world.node(district_id) {
        Some(node) if node.is_district() => *node,
        _ => return SubdivisionOutcome::UnknownDistrict,
    };
    let state = match world.subdivision_state(district_id) {
        Some(state) => *state,
        None => return SubdivisionOutcome::UnknownDistrict,
    };
    if state.is_subdivided {
        log::warn!("District {} is already subdivided; skipping", district_id);
        return SubdivisionOutcome::AlreadySubdivided;
    }
    if !world.is_layout_done(district_id) {
        return SubdivisionOutcome::LayoutPending;
    }

    let mut rng = StdRng::seed_from_u64(state.seed as u64);
    let sector_total = actual_sector_count(&state, district_id);
    let room_cap = max_siblings(HierarchyLevel::Room) as usize;
    let mut sectors = 0;
    let mut rooms = 0;

    for i in 0..sector_total {
        let coordinates = jittered_cell(i, state.local_grid_size.0, &mut rng);
        let Some(sector) = NodeIdentity::child_of(&district, i, coordinates) else {
            break;
        };
        if world.insert_node(sector).is_none() {
            continue;
        }
        sectors += 1;

        let records = bsp::generate_rooms(bsp_config, &mut rng);
        if records.len() > room_cap {
            log::warn!(
                "Sector {} produced {} rooms; only {} fit the id scheme",
                sector.id,
                records.len(),
                room_cap
            );
        }
        for (j, record) in records.into_iter().take(room_cap).enumerate() {
            let origin = (record.bounds.x, record.bounds.y);
            let Some(room) = NodeIdentity::child_of(&sector, j as u32, origin) else {
                break;
            };
            if world.insert_node(room).is_some() {
                world.set_room_record(room.id, record);
                rooms += 1;
            }
        }
        log::debug!("Sector {} at {:?}: {} rooms", sector.id, coordinates, world.children(sector.id).len());
    }

    world.mark_subdivided(district_id);
    log::info!(
        "Subdivided district {} into {} sectors, {} rooms",
        district_id,
        sectors,
        rooms
    );
    SubdivisionOutcome::Subdivided { sectors, rooms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewright_logic::geometry::RectI;

    fn ready_world(state: SectorSubdivisionState) -> (World, u32) {
        let mut world = World::new();
        let d = world.add_district((0, 0), state).unwrap();
        world.mark_layout_done(d);
        (world, d)
    }

    #[test]
    fn test_subdivide_creates_sectors_and_rooms() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((6, 6), 5, 99));
        let outcome = subdivide(&mut world, d, &BspConfig::default());
        let SubdivisionOutcome::Subdivided { sectors, rooms } = outcome else {
            panic!("expected Subdivided, got {:?}", outcome);
        };
        assert_eq!(sectors, 5);
        assert!(rooms >= 5 && rooms <= 30);
        assert_eq!(world.children(d).len(), 5);
        for (i, &sector) in world.children(d).iter().enumerate() {
            assert_eq!(sector, d * 1000 + i as u32);
            let kids = world.children(sector);
            assert!(!kids.is_empty() && kids.len() <= 6);
            for (j, &room) in kids.iter().enumerate() {
                assert_eq!(room, sector * 100 + j as u32);
                assert!(world.room_record(room).is_some());
            }
        }
        assert!(world.subdivision_state(d).unwrap().is_subdivided);
    }

    #[test]
    fn test_subdivide_is_idempotent() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((6, 6), 5, 7));
        assert!(subdivide(&mut world, d, &BspConfig::default()).changed_world());
        let snapshot: Vec<_> = world.nodes().to_vec();
        let revision = world.revision();

        assert_eq!(
            subdivide(&mut world, d, &BspConfig::default()),
            SubdivisionOutcome::AlreadySubdivided
        );
        assert_eq!(world.nodes(), snapshot.as_slice());
        assert_eq!(world.revision(), revision);
    }

    #[test]
    fn test_subdivide_waits_for_layout() {
        let mut world = World::new();
        let d = world
            .add_district((0, 0), SectorSubdivisionState::new((2, 2), 2, 1))
            .unwrap();
        assert_eq!(
            subdivide(&mut world, d, &BspConfig::default()),
            SubdivisionOutcome::LayoutPending
        );
        assert_eq!(world.len(), 1);
        world.mark_layout_done(d);
        assert!(subdivide(&mut world, d, &BspConfig::default()).changed_world());
    }

    #[test]
    fn test_subdivide_unknown_or_non_district() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((2, 2), 1, 1));
        assert_eq!(
            subdivide(&mut world, 42, &BspConfig::default()),
            SubdivisionOutcome::UnknownDistrict
        );
        subdivide(&mut world, d, &BspConfig::default());
        let sector = world.children(d)[0];
        assert_eq!(
            subdivide(&mut world, sector, &BspConfig::default()),
            SubdivisionOutcome::UnknownDistrict
        );
    }

    #[test]
    fn test_sector_count_capped_by_grid() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((2, 2), 10, 3));
        assert!(matches!(
            subdivide(&mut world, d, &BspConfig::default()),
            SubdivisionOutcome::Subdivided { sectors: 4, .. }
        ));
    }

    #[test]
    fn test_zero_sectors_still_marks_subdivided() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((3, 3), 0, 3));
        assert_eq!(
            subdivide(&mut world, d, &BspConfig::default()),
            SubdivisionOutcome::Subdivided { sectors: 0, rooms: 0 }
        );
        assert!(world.subdivision_state(d).unwrap().is_subdivided);
    }

    #[test]
    fn test_jitter_stays_near_grid_cell() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((6, 6), 36, 5));
        subdivide(&mut world, d, &BspConfig::default());
        for (i, &sector) in world.children(d).iter().enumerate() {
            let (x, y) = world.node(sector).unwrap().coordinates;
            let (bx, by) = ((i % 6) as i32, (i / 6) as i32);
            // Truncation toward zero moves a cell by at most one.
            assert!((x - bx).abs() <= 1 && (y - by).abs() <= 1);
            assert!(x >= 0 && y >= 0);
        }
    }

    #[test]
    fn test_rooms_tile_each_sector() {
        let (mut world, d) = ready_world(SectorSubdivisionState::new((6, 6), 5, 1234));
        subdivide(&mut world, d, &BspConfig::default());
        for &sector in world.children(d) {
            let area: i32 = world
                .children(sector)
                .iter()
                .map(|&r| world.room_record(r).unwrap().bounds.area())
                .sum();
            assert_eq!(area, RectI::new(0, 0, 8, 8).area());
        }
    }

    #[test]
    fn test_seed_districts_row_major() {
        let config = WorldConfig {
            district_grid: (3, 2),
            district_count: 5,
            ..Default::default()
        };
        let mut world = World::new();
        let ids = seed_districts(&mut world, &config);
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(world.node(4).unwrap().coordinates, (0, 1));
        assert_eq!(world.node(5).unwrap().coordinates, (1, 1));
        let seeds: Vec<u32> = ids
            .iter()
            .map(|&d| world.subdivision_state(d).unwrap().seed)
            .collect();
        let mut unique = seeds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), seeds.len());
    }

    #[test]
    fn test_district_seed_is_stable() {
        assert_eq!(district_seed(42, 0), district_seed(42, 0));
        assert_ne!(district_seed(42, 0), district_seed(42, 1));
        assert_ne!(district_seed(42, 0), district_seed(43, 0));
    }
}
