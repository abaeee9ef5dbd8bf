//! Capability value types: polarity, abilities, and agent profiles.
//!
//! Both flag sets are plain fixed-width bitmasks combined with `|` and `&`.
//! Wildcards are sentinel constants compared explicitly, never inferred from
//! "all bits set":
//!
//! | Sentinel | Side | Meaning |
//! |----------|------|---------|
//! | [`Polarity::ANY`] | required | any polarity (including none) passes |
//! | [`Ability::ANY`] | required | owning at least one concrete ability passes |
//! | [`Ability::EVERYTHING`] | owned | satisfies every ability requirement |

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Elemental polarity. Eight base flags plus the `ANY` sentinel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Polarity: u16 {
        const SUN = 1 << 0;
        const MOON = 1 << 1;
        const HEAT = 1 << 2;
        const COLD = 1 << 3;
        const EARTH = 1 << 4;
        const WIND = 1 << 5;
        const LIGHT = 1 << 6;
        const DARK = 1 << 7;

        const SUN_MOON = Self::SUN.bits() | Self::MOON.bits();
        const HEAT_COLD = Self::HEAT.bits() | Self::COLD.bits();
        const EARTH_WIND = Self::EARTH.bits() | Self::WIND.bits();
        const LIGHT_DARK = Self::LIGHT.bits() | Self::DARK.bits();
        const ALL_BASE = 0x00ff;

        /// Requirement wildcard. Only meaningful as a whole value.
        const ANY = 1 << 15;
    }
}

impl Polarity {
    pub const NONE: Self = Self::empty();

    /// The eight single-flag polarities in bit order.
    pub const BASE: [Polarity; 8] = [
        Polarity::SUN,
        Polarity::MOON,
        Polarity::HEAT,
        Polarity::COLD,
        Polarity::EARTH,
        Polarity::WIND,
        Polarity::LIGHT,
        Polarity::DARK,
    ];

    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    /// Dual-flag polarity for two base flags.
    pub fn pair(a: Polarity, b: Polarity) -> Polarity {
        a | b
    }

    /// Whether an owner of `self` meets `required` (full superset).
    pub fn satisfies(self, required: Polarity) -> bool {
        if required.is_any() {
            return true;
        }
        self & required == required
    }

    /// Bits of `required` that `self` lacks.
    pub fn missing_from(self, required: Polarity) -> Polarity {
        if required.is_any() {
            return Polarity::NONE;
        }
        required & !self
    }
}

bitflags! {
    /// Traversal abilities: movement, environmental, and two wildcards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Ability: u32 {
        // Movement
        const JUMP = 1 << 0;
        const DOUBLE_JUMP = 1 << 1;
        const DASH = 1 << 2;
        const WALL_JUMP = 1 << 3;
        const GLIDE = 1 << 4;
        const GRAPPLE = 1 << 5;
        const CLIMB = 1 << 6;
        const SWIM = 1 << 7;
        const DIVE = 1 << 8;
        const PHASE = 1 << 9;

        // Environmental
        const HEAT_RESIST = 1 << 16;
        const COLD_RESIST = 1 << 17;
        const TOXIN_RESIST = 1 << 18;
        const PRESSURE_SUIT = 1 << 19;
        const DARK_VISION = 1 << 20;

        const MOVEMENT = 0x0000_03ff;
        const ENVIRONMENTAL = 0x001f_0000;

        /// Requirement wildcard: any concrete ability will do.
        const ANY = 1 << 30;
        /// Owned wildcard: satisfies every requirement.
        const EVERYTHING = 1 << 31;
    }
}

impl Ability {
    pub const NONE: Self = Self::empty();

    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    pub fn is_everything(self) -> bool {
        self.contains(Self::EVERYTHING)
    }

    /// Concrete ability bits with both wildcards removed.
    pub fn concrete(self) -> Ability {
        self & !(Self::ANY | Self::EVERYTHING)
    }

    /// Whether an owner of `self` meets `required` (full superset).
    pub fn satisfies(self, required: Ability) -> bool {
        if self.is_everything() {
            return true;
        }
        if required.is_any() {
            return !self.concrete().is_empty();
        }
        self & required == required
    }

    /// Bits of `required` that `self` lacks.
    pub fn missing_from(self, required: Ability) -> Ability {
        if self.is_everything() {
            return Ability::NONE;
        }
        if required.is_any() {
            return if self.concrete().is_empty() {
                Ability::ANY
            } else {
                Ability::NONE
            };
        }
        required & !self
    }
}

/// Immutable capability snapshot evaluated against gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub owned_polarity: Polarity,
    pub owned_abilities: Ability,
    /// 0.0–1.0.
    pub skill_level: f32,
    pub label: String,
}

impl AgentCapabilities {
    /// A profile owning nothing, with zero skill.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            owned_polarity: Polarity::NONE,
            owned_abilities: Ability::NONE,
            skill_level: 0.0,
            label: label.into(),
        }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.owned_polarity = polarity;
        self
    }

    pub fn with_abilities(mut self, abilities: Ability) -> Self {
        self.owned_abilities = abilities;
        self
    }

    /// Clamped to 0.0–1.0.
    pub fn with_skill(mut self, skill_level: f32) -> Self {
        self.skill_level = skill_level.clamp(0.0, 1.0);
        self
    }

    /// Whether `self` owns at least everything `other` owns.
    pub fn dominates(&self, other: &AgentCapabilities) -> bool {
        let abilities = self.owned_abilities.is_everything()
            || self.owned_abilities.contains(other.owned_abilities);
        abilities
            && self.owned_polarity.contains(other.owned_polarity)
            && self.skill_level >= other.skill_level
    }
}

/// The fixed battery of profiles a validation pass evaluates, spanning the
/// capability spectrum from nothing to everything.
pub fn standard_profiles() -> Vec<AgentCapabilities> {
    vec![
        AgentCapabilities::new("Novice"),
        AgentCapabilities::new("Runner")
            .with_abilities(
                Ability::JUMP
                    | Ability::DOUBLE_JUMP
                    | Ability::DASH
                    | Ability::WALL_JUMP
                    | Ability::CLIMB,
            )
            .with_skill(0.5),
        AgentCapabilities::new("Elementalist")
            .with_polarity(Polarity::HEAT_COLD | Polarity::EARTH_WIND)
            .with_abilities(Ability::ENVIRONMENTAL | Ability::SWIM)
            .with_skill(0.5),
        AgentCapabilities::new("Attuned")
            .with_polarity(Polarity::ALL_BASE)
            .with_skill(0.5),
        AgentCapabilities::new("Master")
            .with_polarity(Polarity::ALL_BASE)
            .with_abilities(Ability::EVERYTHING)
            .with_skill(1.0),
    ]
}
