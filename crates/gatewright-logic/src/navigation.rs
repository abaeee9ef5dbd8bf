//! Navigation layer: nodes and gated links over the world hierarchy.
//!
//! `NavigationGraph` holds a node list, a link list, and a pre-built
//! adjacency index from node id to the links that can be entered from it.
//! It is rebuilt wholesale whenever the hierarchy changes; consumers check
//! [`NavigationGraph::is_ready`] before reading it.

use crate::capability::{AgentCapabilities, Polarity};
use crate::gate::{GateCheck, GateCondition};
use crate::geometry::Vec3;
use crate::identity::INVALID_ID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Biome painted onto a node by the tile-selection system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BiomeType {
    #[default]
    Neutral,
    Forest,
    Cavern,
    Volcanic,
    Glacier,
    Ruins,
    Skyway,
    Sanctum,
}

impl BiomeType {
    pub const ALL: [BiomeType; 8] = [
        BiomeType::Neutral,
        BiomeType::Forest,
        BiomeType::Cavern,
        BiomeType::Volcanic,
        BiomeType::Glacier,
        BiomeType::Ruins,
        BiomeType::Skyway,
        BiomeType::Sanctum,
    ];

    /// Cost of entering a node of this biome.
    pub fn base_cost(self) -> f32 {
        match self {
            BiomeType::Neutral => 1.0,
            BiomeType::Forest => 1.2,
            BiomeType::Cavern => 1.5,
            BiomeType::Volcanic => 2.0,
            BiomeType::Glacier => 1.8,
            BiomeType::Ruins => 1.3,
            BiomeType::Skyway => 1.1,
            BiomeType::Sanctum => 1.0,
        }
    }

    pub fn affinity(self) -> Polarity {
        match self {
            BiomeType::Neutral => Polarity::NONE,
            BiomeType::Forest => Polarity::EARTH,
            BiomeType::Cavern => Polarity::DARK,
            BiomeType::Volcanic => Polarity::HEAT,
            BiomeType::Glacier => Polarity::COLD,
            BiomeType::Ruins => Polarity::MOON,
            BiomeType::Skyway => Polarity::WIND,
            BiomeType::Sanctum => Polarity::SUN,
        }
    }
}

/// Tile assignment supplied by the external tile-selection system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    pub tile_id: u32,
    pub biome: BiomeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    pub node_id: u32,
    pub world_position: Vec3,
    pub biome_type: BiomeType,
    pub primary_polarity: Polarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Only traversable from `from_node_id`.
    Directional,
    Bidirectional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    pub from_node_id: u32,
    pub to_node_id: u32,
    pub connection_type: ConnectionType,
    pub gate: GateCondition,
    /// Seeded from the destination's biome.
    pub base_cost: f32,
}

impl NavLink {
    pub fn new(from_node_id: u32, to_node_id: u32, connection_type: ConnectionType) -> Self {
        Self {
            from_node_id,
            to_node_id,
            connection_type,
            gate: GateCondition::open(),
            base_cost: 1.0,
        }
    }

    pub fn bidirectional(from_node_id: u32, to_node_id: u32) -> Self {
        Self::new(from_node_id, to_node_id, ConnectionType::Bidirectional)
    }

    pub fn directional(from_node_id: u32, to_node_id: u32) -> Self {
        Self::new(from_node_id, to_node_id, ConnectionType::Directional)
    }

    pub fn with_gate(mut self, gate: GateCondition) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_base_cost(mut self, cost: f32) -> Self {
        self.base_cost = cost.max(0.0);
        self
    }

    pub fn connects(&self, a: u32, b: u32) -> bool {
        (self.from_node_id == a && self.to_node_id == b)
            || (self.from_node_id == b && self.to_node_id == a)
    }

    /// The endpoint reached when leaving `from_node_id`, or [`INVALID_ID`]
    /// when the link can't be entered from there.
    pub fn get_destination(&self, from_node_id: u32) -> u32 {
        if from_node_id == self.from_node_id {
            self.to_node_id
        } else if from_node_id == self.to_node_id
            && self.connection_type == ConnectionType::Bidirectional
        {
            self.from_node_id
        } else {
            INVALID_ID
        }
    }

    /// Directionality plus the gate check.
    pub fn can_traverse_with(&self, capabilities: &AgentCapabilities, from_node_id: u32) -> bool {
        if self.get_destination(from_node_id) == INVALID_ID {
            return false;
        }
        self.gate.evaluate_for(capabilities).passed()
    }

    /// Non-negative cost for path-cost visualization. A skill bypass costs
    /// extra in proportion to the gate's softness; a blocked link is
    /// infinitely expensive.
    pub fn calculate_traversal_cost(&self, capabilities: &AgentCapabilities) -> f32 {
        match self.gate.evaluate_for(capabilities) {
            GateCheck::Open | GateCheck::Satisfied => self.base_cost,
            GateCheck::Bypassed => {
                let penalty = self.gate.softness.bypass_penalty();
                self.base_cost * (1.0 + penalty * (2.0 - capabilities.skill_level))
            }
            GateCheck::Blocked => f32::INFINITY,
        }
    }
}

/// The navigation graph plus the summary counters HUD/editor consumers read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationGraph {
    nodes: Vec<NavNode>,
    links: Vec<NavLink>,
    /// node id → index into `nodes`
    node_index: HashMap<u32, usize>,
    /// node id → indices of links that can be entered from it
    adjacency: HashMap<u32, Vec<usize>>,
    is_ready: bool,
    unreachable_area_count: u32,
    last_rebuild_time: f64,
}

impl NavigationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ready graph in one step.
    pub fn from_parts(nodes: Vec<NavNode>, links: Vec<NavLink>) -> Self {
        let mut graph = Self::new();
        graph.begin_rebuild();
        for node in nodes {
            graph.push_node(node);
        }
        for link in links {
            graph.push_link(link);
        }
        graph.finish_rebuild(0.0);
        graph
    }

    /// Drop all nodes and links and mark the graph not ready.
    pub fn begin_rebuild(&mut self) {
        self.is_ready = false;
        self.nodes.clear();
        self.links.clear();
        self.node_index.clear();
        self.adjacency.clear();
    }

    /// Returns false (and keeps the first) if the id is already present.
    pub fn push_node(&mut self, node: NavNode) -> bool {
        if self.node_index.contains_key(&node.node_id) {
            log::warn!("Duplicate nav node {} ignored", node.node_id);
            return false;
        }
        self.node_index.insert(node.node_id, self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn push_link(&mut self, link: NavLink) {
        let index = self.links.len();
        self.adjacency
            .entry(link.from_node_id)
            .or_default()
            .push(index);
        if link.connection_type == ConnectionType::Bidirectional
            && link.to_node_id != link.from_node_id
        {
            self.adjacency.entry(link.to_node_id).or_default().push(index);
        }
        self.links.push(link);
    }

    /// Mark the graph ready once nodes and links are fully populated.
    pub fn finish_rebuild(&mut self, now: f64) {
        self.last_rebuild_time = now;
        self.is_ready = true;
        log::info!(
            "Navigation graph rebuilt: {} nodes, {} links",
            self.nodes.len(),
            self.links.len()
        );
    }

    /// A read-only copy with gate states frozen as of now.
    pub fn snapshot(&self) -> NavigationGraph {
        self.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn link_count(&self) -> u32 {
        self.links.len() as u32
    }

    pub fn unreachable_area_count(&self) -> u32 {
        self.unreachable_area_count
    }

    pub fn last_rebuild_time(&self) -> f64 {
        self.last_rebuild_time
    }

    /// Single write of the validation summary.
    pub fn record_unreachable_areas(&mut self, count: u32) {
        self.unreachable_area_count = count;
    }

    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[NavLink] {
        &self.links
    }

    pub fn node(&self, node_id: u32) -> Option<&NavNode> {
        self.node_index.get(&node_id).map(|&i| &self.nodes[i])
    }

    pub fn has_node(&self, node_id: u32) -> bool {
        self.node_index.contains_key(&node_id)
    }

    /// Links that can be entered from `node_id`. Empty for unknown nodes.
    pub fn outgoing_links(&self, node_id: u32) -> impl Iterator<Item = &NavLink> + '_ {
        self.adjacency
            .get(&node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.links[i])
    }

    pub fn has_links(&self, node_id: u32) -> bool {
        self.adjacency.get(&node_id).is_some_and(|v| !v.is_empty())
    }

    /// Every link touching `node_id`, in either direction.
    pub fn links_touching(&self, node_id: u32) -> impl Iterator<Item = &NavLink> + '_ {
        self.links
            .iter()
            .filter(move |l| l.from_node_id == node_id || l.to_node_id == node_id)
    }

    pub fn find_link_mut(&mut self, a: u32, b: u32) -> Option<&mut NavLink> {
        self.links.iter_mut().find(|l| l.connects(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Ability;
    use crate::gate::Softness;

    fn node(id: u32) -> NavNode {
        NavNode {
            node_id: id,
            world_position: Vec3::ZERO,
            biome_type: BiomeType::Neutral,
            primary_polarity: Polarity::NONE,
        }
    }

    fn jump_gate() -> GateCondition {
        GateCondition::new(Softness::Hard).requiring_abilities(Ability::JUMP)
    }

    #[test]
    fn test_get_destination_bidirectional() {
        let link = NavLink::bidirectional(1, 2);
        assert_eq!(link.get_destination(1), 2);
        assert_eq!(link.get_destination(2), 1);
        assert_eq!(link.get_destination(3), INVALID_ID);
    }

    #[test]
    fn test_directional_link_only_from_origin() {
        let link = NavLink::directional(1, 2);
        let agent = AgentCapabilities::new("a");
        assert_eq!(link.get_destination(1), 2);
        assert_eq!(link.get_destination(2), INVALID_ID);
        assert!(link.can_traverse_with(&agent, 1));
        assert!(!link.can_traverse_with(&agent, 2));
    }

    #[test]
    fn test_can_traverse_delegates_to_gate() {
        let link = NavLink::bidirectional(1, 2).with_gate(jump_gate());
        let novice = AgentCapabilities::new("novice");
        let jumper = AgentCapabilities::new("jumper").with_abilities(Ability::JUMP);
        assert!(!link.can_traverse_with(&novice, 1));
        assert!(link.can_traverse_with(&jumper, 1));
        assert!(link.can_traverse_with(&jumper, 2));
        assert!(!link.can_traverse_with(&jumper, 9));
    }

    #[test]
    fn test_traversal_cost() {
        let base = NavLink::bidirectional(1, 2).with_base_cost(2.0);
        let agent = AgentCapabilities::new("a").with_skill(1.0);
        assert_eq!(base.calculate_traversal_cost(&agent), 2.0);

        let gated = base.clone().with_gate(jump_gate());
        assert!(gated.calculate_traversal_cost(&agent).is_infinite());

        let soft = base.with_gate(
            GateCondition::new(Softness::Medium)
                .requiring_abilities(Ability::JUMP)
                .with_skill_threshold(0.2),
        );
        let cost = soft.calculate_traversal_cost(&agent);
        assert!(cost > 2.0 && cost.is_finite());
    }

    #[test]
    fn test_negative_base_cost_is_clamped() {
        let link = NavLink::bidirectional(1, 2).with_base_cost(-3.0);
        assert_eq!(link.base_cost, 0.0);
    }

    #[test]
    fn test_rebuild_cycle() {
        let mut graph = NavigationGraph::from_parts(
            vec![node(1), node(2), node(3)],
            vec![NavLink::bidirectional(1, 2), NavLink::directional(2, 3)],
        );
        assert!(graph.is_ready());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.outgoing_links(2).count(), 2);
        assert_eq!(graph.outgoing_links(3).count(), 0);
        assert!(!graph.has_links(3));

        graph.begin_rebuild();
        assert!(!graph.is_ready());
        assert_eq!(graph.node_count(), 0);
        graph.push_node(node(7));
        graph.finish_rebuild(12.5);
        assert!(graph.is_ready());
        assert_eq!(graph.last_rebuild_time(), 12.5);
    }

    #[test]
    fn test_duplicate_node_ignored() {
        let mut graph = NavigationGraph::new();
        assert!(graph.push_node(node(1)));
        assert!(!graph.push_node(node(1)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_unknown_node_has_no_links() {
        let graph = NavigationGraph::from_parts(vec![node(1)], vec![]);
        assert_eq!(graph.outgoing_links(42).count(), 0);
        assert!(graph.node(42).is_none());
    }

    #[test]
    fn test_find_link_mut_either_order() {
        let mut graph = NavigationGraph::from_parts(
            vec![node(1), node(2)],
            vec![NavLink::bidirectional(1, 2).with_gate(jump_gate())],
        );
        graph.find_link_mut(2, 1).unwrap().gate.is_unlocked = true;
        assert!(graph.links()[0].gate.is_unlocked);
    }

    #[test]
    fn test_biome_affinities_are_single_flags() {
        for biome in BiomeType::ALL {
            assert!(biome.affinity().bits().count_ones() <= 1);
            assert!(biome.base_cost() > 0.0);
        }
    }
}
