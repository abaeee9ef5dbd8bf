//! World generation configuration and validation.
//!
//! Every field has a default, so a JSON document only needs the values it
//! changes:
//!
//! ```
//! use gatewright_logic::config::{validate_config, WorldConfig};
//!
//! let config = WorldConfig::from_json_str(r#"{ "seed": 7, "district_count": 4 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert!(validate_config(&config).is_empty());
//! ```

use crate::bsp::BspConfig;
use crate::capability::{standard_profiles, AgentCapabilities};
use crate::identity::{max_siblings, HierarchyLevel, MAX_DISTRICTS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How gates are placed when links are built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    /// Chance a district↔district link is gated by the far district's polarity.
    pub district_gate_chance: f32,
    /// Chance a district→sector entry link is gated by a movement ability.
    pub entry_gate_chance: f32,
    /// Chance a room↔room link inside a sector is gated.
    pub room_gate_chance: f32,
    /// Links into boss rooms are always gated.
    pub gate_boss_rooms: bool,
    /// Stored skill threshold of generated gates.
    pub skill_threshold: f32,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            district_gate_chance: 0.35,
            entry_gate_chance: 0.25,
            room_gate_chance: 0.15,
            gate_boss_rooms: true,
            skill_threshold: 0.5,
        }
    }
}

/// Incremental scheduling of the staged pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Districts subdivided per tick.
    pub subdivisions_per_tick: usize,
    /// Run a validation pass automatically after each rebuild.
    pub validate_after_rebuild: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subdivisions_per_tick: 4,
            validate_after_rebuild: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u32,
    /// Grid the districts are laid out on (columns, rows).
    pub district_grid: (i32, i32),
    pub district_count: u32,
    /// Per-district sector grid (columns, rows).
    pub sector_grid: (i32, i32),
    pub sector_count: i32,
    pub bsp: BspConfig,
    pub gates: GatePolicy,
    pub pipeline: PipelineConfig,
    /// Profiles to validate against; empty means the standard battery.
    pub profiles: Vec<AgentCapabilities>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            district_grid: (4, 3),
            district_count: 8,
            sector_grid: (6, 6),
            sector_count: 5,
            bsp: BspConfig::default(),
            gates: GatePolicy::default(),
            pipeline: PipelineConfig::default(),
            profiles: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        let issues = validate_config(&config);
        if issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The profile battery a validation pass runs.
    pub fn profiles(&self) -> Vec<AgentCapabilities> {
        if self.profiles.is_empty() {
            standard_profiles()
        } else {
            self.profiles.clone()
        }
    }
}

/// A single problem found by [`validate_config`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("district count must be at least 1")]
    NoDistricts,
    #[error("district count {0} exceeds {max} and would collide hierarchical ids", max = MAX_DISTRICTS)]
    TooManyDistricts(u32),
    #[error("district grid {cols}x{rows} has fewer cells than {count} districts")]
    DistrictGridTooSmall { cols: i32, rows: i32, count: u32 },
    #[error("sector grid {0}x{1} must be positive in both dimensions")]
    EmptySectorGrid(i32, i32),
    #[error("sector count {0} must be between 0 and {max}", max = max_siblings(HierarchyLevel::Sector))]
    SectorCountOutOfRange(i32),
    #[error("room bound {0}x{1} must be positive in both dimensions")]
    EmptyRoomBound(i32, i32),
    #[error("minimum room size {0} must be at least 1")]
    InvalidMinRoomSize(i32),
    #[error("max rooms {0} must be between 1 and {max}", max = max_siblings(HierarchyLevel::Room))]
    MaxRoomsOutOfRange(usize),
    #[error("{name} = {value} is not a probability")]
    ChanceOutOfRange { name: &'static str, value: f32 },
    #[error("skill threshold {0} must not be negative")]
    NegativeSkillThreshold(f32),
    #[error("pipeline must subdivide at least one district per tick")]
    ZeroSubdivisionBudget,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse world config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid world config: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a world configuration, returning all issues found.
pub fn validate_config(config: &WorldConfig) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if config.district_count == 0 {
        issues.push(ConfigIssue::NoDistricts);
    }
    if config.district_count > MAX_DISTRICTS {
        issues.push(ConfigIssue::TooManyDistricts(config.district_count));
    }
    let (cols, rows) = config.district_grid;
    let cells = cols.max(0) as i64 * rows.max(0) as i64;
    if cells < config.district_count as i64 {
        issues.push(ConfigIssue::DistrictGridTooSmall {
            cols,
            rows,
            count: config.district_count,
        });
    }

    let (sx, sy) = config.sector_grid;
    if sx <= 0 || sy <= 0 {
        issues.push(ConfigIssue::EmptySectorGrid(sx, sy));
    }
    let max_sectors = max_siblings(HierarchyLevel::Sector) as i32;
    if config.sector_count < 0 || config.sector_count > max_sectors {
        issues.push(ConfigIssue::SectorCountOutOfRange(config.sector_count));
    }

    if config.bsp.width <= 0 || config.bsp.height <= 0 {
        issues.push(ConfigIssue::EmptyRoomBound(config.bsp.width, config.bsp.height));
    }
    if config.bsp.min_room_size < 1 {
        issues.push(ConfigIssue::InvalidMinRoomSize(config.bsp.min_room_size));
    }
    let max_rooms = max_siblings(HierarchyLevel::Room) as usize;
    if config.bsp.max_rooms == 0 || config.bsp.max_rooms > max_rooms {
        issues.push(ConfigIssue::MaxRoomsOutOfRange(config.bsp.max_rooms));
    }

    let chances = [
        ("district_gate_chance", config.gates.district_gate_chance),
        ("entry_gate_chance", config.gates.entry_gate_chance),
        ("room_gate_chance", config.gates.room_gate_chance),
    ];
    for (name, value) in chances {
        if !(0.0..=1.0).contains(&value) {
            issues.push(ConfigIssue::ChanceOutOfRange { name, value });
        }
    }
    if config.gates.skill_threshold < 0.0 {
        issues.push(ConfigIssue::NegativeSkillThreshold(config.gates.skill_threshold));
    }

    if config.pipeline.subdivisions_per_tick == 0 {
        issues.push(ConfigIssue::ZeroSubdivisionBudget);
    }

    issues
}
