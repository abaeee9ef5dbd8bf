//! The world arena: every node record plus per-node optional data.
//!
//! Nodes live in one dense `Vec` in insertion order; an id → slot map gives
//! O(1) lookup. Optional per-node data (subdivision state, room record,
//! tile) sits in parallel vectors indexed by the same slot.

use gatewright_logic::bsp::RoomRecord;
use gatewright_logic::identity::{HierarchyLevel, NodeIdentity, INVALID_ID, MAX_DISTRICTS};
use gatewright_logic::navigation::TileDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Subdivision input and idempotency guard owned by a district.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSubdivisionState {
    pub local_grid_size: (i32, i32),
    pub sector_count: i32,
    /// Flips to true exactly once.
    pub is_subdivided: bool,
    pub seed: u32,
}

impl SectorSubdivisionState {
    pub fn new(local_grid_size: (i32, i32), sector_count: i32, seed: u32) -> Self {
        Self {
            local_grid_size,
            sector_count,
            is_subdivided: false,
            seed,
        }
    }
}

/// Gate state set by game logic, re-applied after every graph rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    pub is_active: bool,
    pub is_unlocked: bool,
}

#[derive(Debug, Default)]
pub struct World {
    nodes: Vec<NodeIdentity>,
    slots: HashMap<u32, usize>,
    subdivision: Vec<Option<SectorSubdivisionState>>,
    rooms: Vec<Option<RoomRecord>>,
    tiles: Vec<Option<TileDescriptor>>,
    layout_done: Vec<bool>,
    children: Vec<Vec<u32>>,
    /// Keyed by (min id, max id) of the link endpoints.
    gate_states: HashMap<(u32, u32), GateState>,
    /// Bumped on every hierarchy change.
    revision: u64,
}

fn link_key(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a district with the next free id. Returns `None` once
    /// `MAX_DISTRICTS` is reached.
    pub fn add_district(
        &mut self,
        coordinates: (i32, i32),
        state: SectorSubdivisionState,
    ) -> Option<u32> {
        let id = self.count_at(HierarchyLevel::District) as u32 + 1;
        if id > MAX_DISTRICTS {
            log::error!(
                "Refusing district #{}: more than {} districts would collide ids",
                id,
                MAX_DISTRICTS
            );
            return None;
        }
        let slot = self.insert_node(NodeIdentity::district(id, coordinates))?;
        self.subdivision[slot] = Some(state);
        Some(id)
    }

    /// Insert a node record. Duplicate ids are refused, never overwritten.
    pub fn insert_node(&mut self, identity: NodeIdentity) -> Option<usize> {
        if identity.id == INVALID_ID || self.slots.contains_key(&identity.id) {
            log::error!(
                "Node id {} collides with an existing node (level {:?}, parent {})",
                identity.id,
                identity.level,
                identity.parent_id
            );
            return None;
        }
        if identity.parent_id != INVALID_ID {
            match self.slots.get(&identity.parent_id) {
                Some(&parent) => self.children[parent].push(identity.id),
                None => {
                    log::error!(
                        "Node {} names unknown parent {}",
                        identity.id,
                        identity.parent_id
                    );
                    return None;
                }
            }
        }
        let slot = self.nodes.len();
        self.slots.insert(identity.id, slot);
        self.nodes.push(identity);
        self.subdivision.push(None);
        self.rooms.push(None);
        self.tiles.push(None);
        self.layout_done.push(false);
        self.children.push(Vec::new());
        self.revision += 1;
        Some(slot)
    }

    /// Tear the whole world down.
    pub fn clear(&mut self) {
        *self = Self {
            revision: self.revision + 1,
            ..Self::default()
        };
    }

    pub fn node(&self, id: u32) -> Option<&NodeIdentity> {
        self.slots.get(&id).map(|&s| &self.nodes[s])
    }

    pub fn contains(&self, id: u32) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn nodes(&self) -> &[NodeIdentity] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn count_at(&self, level: HierarchyLevel) -> usize {
        self.nodes.iter().filter(|n| n.level == level).count()
    }

    pub fn districts(&self) -> impl Iterator<Item = &NodeIdentity> + '_ {
        self.nodes.iter().filter(|n| n.is_district())
    }

    /// Child ids in creation order. Empty for unknown nodes.
    pub fn children(&self, id: u32) -> &[u32] {
        self.slots
            .get(&id)
            .map(|&s| self.children[s].as_slice())
            .unwrap_or(&[])
    }

    /// The district a node belongs to (itself for districts).
    pub fn district_of(&self, id: u32) -> Option<u32> {
        let mut node = self.node(id)?;
        while !node.is_district() {
            node = self.node(node.parent_id)?;
        }
        Some(node.id)
    }

    // ── Layout signal ──────────────────────────────────────────────────

    /// Record that the external layout pass has finalized this district.
    pub fn mark_layout_done(&mut self, district_id: u32) -> bool {
        match self.slots.get(&district_id) {
            Some(&s) if self.nodes[s].is_district() => {
                self.layout_done[s] = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_layout_done(&self, district_id: u32) -> bool {
        self.slots
            .get(&district_id)
            .is_some_and(|&s| self.layout_done[s])
    }

    // ── Per-node optional data ─────────────────────────────────────────

    pub fn subdivision_state(&self, district_id: u32) -> Option<&SectorSubdivisionState> {
        self.slots
            .get(&district_id)
            .and_then(|&s| self.subdivision[s].as_ref())
    }

    pub(crate) fn mark_subdivided(&mut self, district_id: u32) {
        if let Some(&s) = self.slots.get(&district_id) {
            if let Some(state) = self.subdivision[s].as_mut() {
                state.is_subdivided = true;
                self.revision += 1;
            }
        }
    }

    pub fn room_record(&self, room_id: u32) -> Option<&RoomRecord> {
        self.slots.get(&room_id).and_then(|&s| self.rooms[s].as_ref())
    }

    pub(crate) fn set_room_record(&mut self, room_id: u32, record: RoomRecord) {
        if let Some(&s) = self.slots.get(&room_id) {
            self.rooms[s] = Some(record);
        }
    }

    /// Attach a tile from the tile-selection system. Metadata only.
    pub fn assign_tile(&mut self, id: u32, tile: TileDescriptor) -> bool {
        match self.slots.get(&id) {
            Some(&s) => {
                self.tiles[s] = Some(tile);
                true
            }
            None => false,
        }
    }

    pub fn tile(&self, id: u32) -> Option<&TileDescriptor> {
        self.slots.get(&id).and_then(|&s| self.tiles[s].as_ref())
    }

    // ── Gate state overrides ───────────────────────────────────────────

    pub fn set_gate_state(&mut self, a: u32, b: u32, state: GateState) {
        self.gate_states.insert(link_key(a, b), state);
    }

    pub fn gate_state(&self, a: u32, b: u32) -> Option<&GateState> {
        self.gate_states.get(&link_key(a, b))
    }
}
