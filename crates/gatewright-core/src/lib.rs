//! Gatewright Core - hierarchical world generation engine
//!
//! Owns the mutable side of Gatewright: the explicit [`world::World`] arena,
//! seeded subdivision of districts into sectors and rooms, navigation graph
//! rebuilds with gate placement, and the staged per-tick pipeline.
//!
//! # Architecture
//!
//! - **World**: dense node records plus parallel per-node data
//!   (subdivision state, room records, tiles, gate states)
//! - **Generation**: district layout stand-in and BSP subdivision
//! - **Links**: districts and rooms become nav nodes with gated links
//! - **Engine**: subdivide → rebuild → validate, one stage budget per tick
//!
//! # Example
//!
//! ```rust,no_run
//! use gatewright_core::prelude::*;
//!
//! let mut engine = WorldEngine::new(WorldConfig::default());
//! engine.generate();
//!
//! while !engine.is_idle() {
//!     engine.tick(1.0 / 60.0);
//! }
//! if let Some(report) = engine.last_report() {
//!     println!("{} unreachable", report.unreachable_node_count);
//! }
//! ```

pub mod engine;
pub mod generation;
pub mod links;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{TickSummary, WorldEngine};
    pub use crate::generation::SubdivisionOutcome;
    pub use crate::world::{SectorSubdivisionState, World};
    pub use gatewright_logic::capability::{standard_profiles, Ability, AgentCapabilities, Polarity};
    pub use gatewright_logic::config::WorldConfig;
    pub use gatewright_logic::reachability::ValidationReport;
}
