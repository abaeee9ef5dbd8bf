//! World engine - owns the world, the navigation graph, and the staged
//! generation pipeline.
//!
//! Each [`WorldEngine::tick`] runs the stages in dependency order:
//!
//! 1. **Subdivide** up to `subdivisions_per_tick` queued districts whose
//!    layout is done. Each district is one atomic unit of work.
//! 2. **Rebuild** the navigation graph when the hierarchy or gate data
//!    changed and no laid-out district is still waiting.
//! 3. **Validate** once the graph is ready and a pass is pending.

use crate::generation::{self, SubdivisionOutcome};
use crate::links;
use crate::world::{GateState, World};
use gatewright_logic::capability::AgentCapabilities;
use gatewright_logic::config::WorldConfig;
use gatewright_logic::navigation::{NavigationGraph, TileDescriptor};
use gatewright_logic::reachability::{run_validation_pass, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upper bound on ticks `run_to_completion` will spend.
pub const MAX_PIPELINE_TICKS: usize = 10_000;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub subdivided: Vec<u32>,
    /// Queued districts still waiting on their layout signal.
    pub deferred: usize,
    pub rebuilt: bool,
    pub validated: bool,
    /// Unreachable count written by this tick's validation, if any.
    pub unreachable_node_count: Option<u32>,
}

impl TickSummary {
    pub fn did_work(&self) -> bool {
        !self.subdivided.is_empty() || self.rebuilt || self.validated
    }
}

/// Main engine
pub struct WorldEngine {
    /// Node arena
    pub world: World,
    /// Navigation layer built from `world`
    pub graph: NavigationGraph,
    config: WorldConfig,
    profiles: Vec<AgentCapabilities>,
    /// Seconds since start
    clock: f64,
    pending: VecDeque<u32>,
    graph_dirty: bool,
    validation_pending: bool,
    last_report: Option<ValidationReport>,
}

impl WorldEngine {
    pub fn new(config: WorldConfig) -> Self {
        let profiles = config.profiles();
        Self {
            world: World::new(),
            graph: NavigationGraph::new(),
            config,
            profiles,
            clock: 0.0,
            pending: VecDeque::new(),
            graph_dirty: false,
            validation_pending: false,
            last_report: None,
        }
    }

    /// Tear down any previous world, lay out districts from the config, and
    /// queue them all for subdivision. Returns the district ids.
    pub fn generate(&mut self) -> Vec<u32> {
        self.world.clear();
        self.graph = NavigationGraph::new();
        self.pending.clear();
        self.last_report = None;

        let districts = generation::seed_districts(&mut self.world, &self.config);
        for &id in &districts {
            self.world.mark_layout_done(id);
            self.pending.push_back(id);
        }
        self.graph_dirty = true;
        districts
    }

    /// Queue a district for subdivision on a later tick.
    pub fn queue_district(&mut self, district_id: u32) {
        if !self.pending.contains(&district_id) {
            self.pending.push_back(district_id);
        }
    }

    /// Forward the external layout signal for a district.
    pub fn mark_layout_done(&mut self, district_id: u32) -> bool {
        self.world.mark_layout_done(district_id)
    }

    /// Subdivide one district right away. A queued district leaves the
    /// queue unless its layout is still pending.
    pub fn subdivide(&mut self, district_id: u32) -> SubdivisionOutcome {
        let outcome = generation::subdivide(&mut self.world, district_id, &self.config.bsp);
        if outcome != SubdivisionOutcome::LayoutPending {
            self.pending.retain(|&p| p != district_id);
        }
        if outcome.changed_world() {
            self.graph_dirty = true;
        }
        outcome
    }

    /// Rebuild the navigation graph from the current hierarchy.
    pub fn rebuild_navigation_graph(&mut self) {
        links::build_navigation_graph(
            &self.world,
            &self.config.gates,
            self.config.seed,
            &mut self.graph,
            self.clock,
        );
        self.graph_dirty = false;
        if self.config.pipeline.validate_after_rebuild {
            self.validation_pending = true;
        }
    }

    /// Run a validation pass over a snapshot of the graph. `None` while the
    /// graph is not ready.
    pub fn generate_validation_report(&mut self) -> Option<ValidationReport> {
        let report = run_validation_pass(&mut self.graph, &self.profiles)?;
        self.validation_pending = false;
        self.last_report = Some(report.clone());
        Some(report)
    }

    /// Unlock the gate on the link between `a` and `b` (key pickup, story
    /// flag). The live graph is patched and the state survives rebuilds.
    pub fn unlock_gate(&mut self, a: u32, b: u32) -> bool {
        self.update_gate(a, b, |state| state.is_unlocked = true)
    }

    pub fn set_gate_active(&mut self, a: u32, b: u32, active: bool) -> bool {
        self.update_gate(a, b, |state| state.is_active = active)
    }

    fn update_gate(&mut self, a: u32, b: u32, apply: impl FnOnce(&mut GateState)) -> bool {
        let Some(link) = self.graph.find_link_mut(a, b) else {
            log::warn!("No link between {} and {} to update", a, b);
            return false;
        };
        let mut state = GateState {
            is_active: link.gate.is_active,
            is_unlocked: link.gate.is_unlocked,
        };
        apply(&mut state);
        link.gate.is_active = state.is_active;
        link.gate.is_unlocked = state.is_unlocked;
        self.world.set_gate_state(a, b, state);
        self.validation_pending = true;
        true
    }

    /// Attach tile metadata; the graph picks it up on the next rebuild.
    pub fn assign_tile(&mut self, node_id: u32, tile: TileDescriptor) -> bool {
        let assigned = self.world.assign_tile(node_id, tile);
        if assigned {
            self.graph_dirty = true;
        }
        assigned
    }

    /// Advance the pipeline by one step.
    pub fn tick(&mut self, delta_seconds: f32) -> TickSummary {
        self.clock += delta_seconds.max(0.0) as f64;
        let mut summary = TickSummary::default();

        // Stage 1: subdivision
        let budget = self.config.pipeline.subdivisions_per_tick.max(1);
        let mut deferred = VecDeque::new();
        while summary.subdivided.len() < budget {
            let Some(id) = self.pending.pop_front() else {
                break;
            };
            match self.subdivide(id) {
                SubdivisionOutcome::Subdivided { .. } => summary.subdivided.push(id),
                SubdivisionOutcome::LayoutPending => deferred.push_back(id),
                SubdivisionOutcome::AlreadySubdivided | SubdivisionOutcome::UnknownDistrict => {}
            }
        }
        summary.deferred = deferred.len();
        self.pending.extend(deferred);

        // Stage 2: rebuild
        if self.graph_dirty && !self.has_ready_work() {
            self.rebuild_navigation_graph();
            summary.rebuilt = true;
        }

        // Stage 3: validation
        if self.validation_pending && self.graph.is_ready() {
            if let Some(report) = self.generate_validation_report() {
                summary.validated = true;
                summary.unreachable_node_count = Some(report.unreachable_node_count);
            }
        }

        summary
    }

    /// Tick until nothing is left to do. Returns the latest report.
    pub fn run_to_completion(&mut self, delta_seconds: f32) -> Option<&ValidationReport> {
        for _ in 0..MAX_PIPELINE_TICKS {
            let summary = self.tick(delta_seconds);
            if !summary.did_work() && self.is_idle() {
                break;
            }
        }
        self.last_report.as_ref()
    }

    /// A queued district is waiting with its layout done.
    fn has_ready_work(&self) -> bool {
        self.pending.iter().any(|&id| self.world.is_layout_done(id))
    }

    pub fn is_idle(&self) -> bool {
        !self.has_ready_work() && !self.graph_dirty && !self.validation_pending
    }

    pub fn pending_districts(&self) -> usize {
        self.pending.len()
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn profiles(&self) -> &[AgentCapabilities] {
        &self.profiles
    }

    pub fn set_profiles(&mut self, profiles: Vec<AgentCapabilities>) {
        self.profiles = profiles;
        self.validation_pending = true;
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }
}
