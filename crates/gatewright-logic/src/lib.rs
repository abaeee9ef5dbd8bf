//! Pure gating and reachability logic for Gatewright.
//!
//! This crate holds everything that can be expressed as plain data in and
//! results out: the hierarchical id scheme, capability bitmasks, gate
//! evaluation, BSP room layout, the navigation graph, and multi-profile
//! reachability validation. World state and the staged pipeline live in
//! `gatewright-core`.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`bsp`] | Seeded binary space partitioning of a sector into typed rooms |
//! | [`capability`] | Polarity/ability bitmasks, agent profiles, the standard battery |
//! | [`config`] | `WorldConfig` JSON loading and validation |
//! | [`gate`] | Gate conditions with softness-tier skill bypass |
//! | [`geometry`] | `Vec3` and integer cell rectangles |
//! | [`identity`] | District/sector/room ids and their derivation |
//! | [`navigation`] | Nav nodes, gated links, and the navigation graph |
//! | [`reachability`] | Flood-fill validation, issues, and quick fixes |

pub mod bsp;
pub mod capability;
pub mod config;
pub mod gate;
pub mod geometry;
pub mod identity;
pub mod navigation;
pub mod reachability;
