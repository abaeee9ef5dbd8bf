//! Navigation graph construction from the world hierarchy.
//!
//! Districts and rooms become nav nodes; sectors only group rooms. Links:
//! - district ↔ district for grid neighbours
//! - district ↔ the entry room of each of its sectors
//! - room ↔ room when two rooms of a sector share a wall
//!
//! Gates are rolled per link from an RNG keyed by the world seed and the two
//! endpoint ids, so a rebuild reproduces the same gates. Stored gate states
//! from the world (unlocks, deactivations) are applied on top.

use crate::world::World;
use gatewright_logic::bsp::RoomType;
use gatewright_logic::capability::{Ability, Polarity};
use gatewright_logic::config::GatePolicy;
use gatewright_logic::gate::{GateCondition, Softness};
use gatewright_logic::geometry::Vec3;
use gatewright_logic::identity::NodeIdentity;
use gatewright_logic::navigation::{BiomeType, NavLink, NavNode, NavigationGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// World units between neighbouring district cells.
pub const DISTRICT_SPACING: f32 = 100.0;
/// World units between neighbouring sector cells inside a district.
pub const SECTOR_SPACING: f32 = 10.0;

const ENTRY_ABILITIES: [Ability; 6] = [
    Ability::JUMP,
    Ability::DOUBLE_JUMP,
    Ability::DASH,
    Ability::WALL_JUMP,
    Ability::GRAPPLE,
    Ability::CLIMB,
];

const ROOM_ABILITIES: [Ability; 6] = [
    Ability::HEAT_RESIST,
    Ability::COLD_RESIST,
    Ability::TOXIN_RESIST,
    Ability::PRESSURE_SUIT,
    Ability::DARK_VISION,
    Ability::SWIM,
];

fn link_rng(seed: u32, a: u32, b: u32) -> StdRng {
    let key = (seed as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ ((a as u64) << 32 | b as u64);
    StdRng::seed_from_u64(key)
}

/// A district's primary polarity: its tile's affinity, else a seeded pick.
pub fn district_polarity(world: &World, seed: u32, district_id: u32) -> Polarity {
    let affinity = world
        .tile(district_id)
        .map(|t| t.biome.affinity())
        .unwrap_or(Polarity::NONE);
    if !affinity.is_empty() {
        return affinity;
    }
    let mut rng = link_rng(seed, district_id, 0);
    Polarity::BASE[rng.gen_range(0..Polarity::BASE.len())]
}

fn biome_of(world: &World, id: u32, fallback: BiomeType) -> BiomeType {
    world.tile(id).map(|t| t.biome).unwrap_or(fallback)
}

fn district_position(district: &NodeIdentity) -> Vec3 {
    let (x, y) = district.coordinates;
    Vec3::new(x as f32 * DISTRICT_SPACING, 0.0, y as f32 * DISTRICT_SPACING)
}

/// The room a district link enters a sector through: its entrance room,
/// else the first room.
pub fn entry_room(world: &World, sector_id: u32) -> Option<u32> {
    let rooms = world.children(sector_id);
    rooms
        .iter()
        .copied()
        .find(|&r| world.room_record(r).is_some_and(|rec| rec.room_type == RoomType::Entrance))
        .or_else(|| rooms.first().copied())
}

struct Builder<'a> {
    world: &'a World,
    policy: &'a GatePolicy,
    seed: u32,
    biomes: HashMap<u32, BiomeType>,
    gated: usize,
}

impl Builder<'_> {
    fn base_cost(&self, to: u32) -> f32 {
        self.biomes.get(&to).copied().unwrap_or_default().base_cost()
    }

    fn push(&mut self, graph: &mut NavigationGraph, mut link: NavLink) {
        if let Some(state) = self.world.gate_state(link.from_node_id, link.to_node_id) {
            link.gate.is_active = state.is_active;
            link.gate.is_unlocked = state.is_unlocked;
        }
        if link.gate.is_blocking() {
            self.gated += 1;
        }
        graph.push_link(link);
    }

    fn district_link(&self, a: u32, b: u32) -> NavLink {
        let link = NavLink::bidirectional(a, b).with_base_cost(self.base_cost(b));
        let mut rng = link_rng(self.seed, a, b);
        if rng.gen::<f32>() >= self.policy.district_gate_chance {
            return link;
        }
        let polarity = district_polarity(self.world, self.seed, b);
        link.with_gate(
            GateCondition::new(Softness::Medium)
                .requiring_polarity(polarity)
                .with_skill_threshold(self.policy.skill_threshold)
                .with_description(format!("Polarity seal into district {} ({:?})", b, polarity)),
        )
    }

    fn entry_link(&self, district: u32, room: u32) -> NavLink {
        let link = NavLink::bidirectional(district, room).with_base_cost(self.base_cost(room));
        let mut rng = link_rng(self.seed, district, room);
        if rng.gen::<f32>() >= self.policy.entry_gate_chance {
            return link;
        }
        let ability = ENTRY_ABILITIES[rng.gen_range(0..ENTRY_ABILITIES.len())];
        let softness = [Softness::Easy, Softness::Medium, Softness::Difficult][rng.gen_range(0..3)];
        link.with_gate(
            GateCondition::new(softness)
                .requiring_abilities(ability)
                .with_skill_threshold(self.policy.skill_threshold)
                .with_description(format!("Traversal gate into room {} ({:?})", room, ability)),
        )
    }

    fn room_link(&self, a: u32, b: u32) -> NavLink {
        let link = NavLink::bidirectional(a, b).with_base_cost(self.base_cost(b));
        let is_boss = |id: u32| {
            self.world
                .room_record(id)
                .is_some_and(|r| r.room_type == RoomType::Boss)
        };
        if self.policy.gate_boss_rooms && (is_boss(a) || is_boss(b)) {
            return link.with_gate(
                GateCondition::new(Softness::Hard)
                    .requiring_abilities(Ability::JUMP | Ability::DASH)
                    .with_description(format!("Boss door between rooms {} and {}", a, b)),
            );
        }
        let mut rng = link_rng(self.seed, a, b);
        if rng.gen::<f32>() >= self.policy.room_gate_chance {
            return link;
        }
        let ability = ROOM_ABILITIES[rng.gen_range(0..ROOM_ABILITIES.len())];
        let softness =
            [Softness::Trivial, Softness::Easy, Softness::VeryDifficult][rng.gen_range(0..3)];
        link.with_gate(
            GateCondition::new(softness)
                .requiring_abilities(ability)
                .with_skill_threshold(self.policy.skill_threshold)
                .with_description(format!("Hazard between rooms {} and {} ({:?})", a, b, ability)),
        )
    }
}

/// Rebuild `graph` from scratch. The graph reads not-ready until the last
/// link is in place.
pub fn build_navigation_graph(
    world: &World,
    policy: &GatePolicy,
    seed: u32,
    graph: &mut NavigationGraph,
    now: f64,
) {
    graph.begin_rebuild();
    let mut builder = Builder {
        world,
        policy,
        seed,
        biomes: HashMap::new(),
        gated: 0,
    };

    let districts: Vec<NodeIdentity> = world.districts().copied().collect();

    for district in &districts {
        let biome = biome_of(world, district.id, BiomeType::Neutral);
        let polarity = district_polarity(world, seed, district.id);
        let origin = district_position(district);
        builder.biomes.insert(district.id, biome);
        graph.push_node(NavNode {
            node_id: district.id,
            world_position: origin,
            biome_type: biome,
            primary_polarity: polarity,
        });

        for &sector_id in world.children(district.id) {
            let Some(sector) = world.node(sector_id) else {
                continue;
            };
            let (sx, sy) = sector.coordinates;
            for &room_id in world.children(sector_id) {
                let Some(record) = world.room_record(room_id) else {
                    continue;
                };
                let (cx, cy) = record.bounds.center();
                let offset = Vec3::new(
                    sx as f32 * SECTOR_SPACING + cx,
                    0.0,
                    sy as f32 * SECTOR_SPACING + cy,
                );
                let room_biome = biome_of(world, room_id, biome);
                builder.biomes.insert(room_id, room_biome);
                graph.push_node(NavNode {
                    node_id: room_id,
                    world_position: origin + offset,
                    biome_type: room_biome,
                    primary_polarity: polarity,
                });
            }
        }
    }

    for (i, a) in districts.iter().enumerate() {
        for b in &districts[i + 1..] {
            let dx = (a.coordinates.0 - b.coordinates.0).abs();
            let dy = (a.coordinates.1 - b.coordinates.1).abs();
            if dx + dy == 1 {
                let link = builder.district_link(a.id, b.id);
                builder.push(graph, link);
            }
        }
    }

    for district in &districts {
        for &sector_id in world.children(district.id) {
            if let Some(entry) = entry_room(world, sector_id) {
                let link = builder.entry_link(district.id, entry);
                builder.push(graph, link);
            }

            let rooms: Vec<(u32, _)> = world
                .children(sector_id)
                .iter()
                .filter_map(|&r| world.room_record(r).map(|rec| (r, rec.bounds)))
                .collect();
            for (i, (a, bounds_a)) in rooms.iter().enumerate() {
                for (b, bounds_b) in &rooms[i + 1..] {
                    if bounds_a.shares_edge(bounds_b) {
                        let link = builder.room_link(*a, *b);
                        builder.push(graph, link);
                    }
                }
            }
        }
    }

    log::debug!("{} of {} links gated", builder.gated, graph.link_count());
    graph.finish_rebuild(now);
}
