//! Gate conditions: capability requirements on a navigation link.
//!
//! A gate passes when it is inactive or unlocked, or when the agent owns a
//! full superset of the required polarity and abilities. A gate that fails
//! those checks may still be bypassed by skill, depending on its softness:
//!
//! | Softness | Effective threshold | Comparison |
//! |----------|---------------------|------------|
//! | Trivial | `t` | `skill >= t` |
//! | Easy | `1.25 t` | `skill >= 1.25 t` |
//! | Medium | `1.5 t` | `skill > 1.5 t` |
//! | Difficult | `2 t` | `skill > 2 t` |
//! | VeryDifficult | `3 t` | `skill > 3 t` |
//! | Hard | n/a | never bypassed |
//!
//! ```
//! use gatewright_logic::capability::{Ability, Polarity};
//! use gatewright_logic::gate::{GateCondition, Softness};
//!
//! let gate = GateCondition::new(Softness::Hard)
//!     .requiring_polarity(Polarity::SUN_MOON)
//!     .requiring_abilities(Ability::JUMP | Ability::DASH);
//! assert!(!gate.can_pass(Polarity::SUN, Ability::JUMP | Ability::DASH, 0.0));
//! assert!(gate.can_pass(Polarity::SUN_MOON, Ability::JUMP | Ability::DASH, 0.0));
//! ```

use crate::capability::{Ability, AgentCapabilities, Polarity};
use serde::{Deserialize, Serialize};

/// Skill threshold used when a gate is built without one.
pub const DEFAULT_SKILL_THRESHOLD: f32 = 0.5;

/// How forgiving a gate is to a skilled agent missing the requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Softness {
    Trivial,
    Easy,
    Medium,
    Difficult,
    VeryDifficult,
    Hard,
}

impl Softness {
    pub const ALL: [Softness; 6] = [
        Softness::Trivial,
        Softness::Easy,
        Softness::Medium,
        Softness::Difficult,
        Softness::VeryDifficult,
        Softness::Hard,
    ];

    /// Scale applied to the stored threshold; `None` for tiers that can't be
    /// bypassed at all.
    pub fn threshold_scale(self) -> Option<f32> {
        match self {
            Softness::Trivial => Some(1.0),
            Softness::Easy => Some(1.25),
            Softness::Medium => Some(1.5),
            Softness::Difficult => Some(2.0),
            Softness::VeryDifficult => Some(3.0),
            Softness::Hard => None,
        }
    }

    /// Whether reaching the effective threshold exactly is enough.
    pub fn inclusive(self) -> bool {
        matches!(self, Softness::Trivial | Softness::Easy)
    }

    pub fn effective_threshold(self, skill_threshold: f32) -> Option<f32> {
        self.threshold_scale().map(|s| skill_threshold * s)
    }

    /// Whether `skill_level` bypasses a gate of this tier.
    pub fn bypassed_by(self, skill_threshold: f32, skill_level: f32) -> bool {
        match self.effective_threshold(skill_threshold) {
            Some(threshold) if self.inclusive() => skill_level >= threshold,
            Some(threshold) => skill_level > threshold,
            None => false,
        }
    }

    /// Extra traversal cost factor paid when this tier is bypassed by skill.
    pub fn bypass_penalty(self) -> f32 {
        match self {
            Softness::Trivial => 0.25,
            Softness::Easy => 0.5,
            Softness::Medium => 1.0,
            Softness::Difficult => 2.0,
            Softness::VeryDifficult => 4.0,
            Softness::Hard => 0.0,
        }
    }
}

/// Outcome of evaluating a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateCheck {
    /// Inactive or unlocked.
    Open,
    /// Requirements owned.
    Satisfied,
    /// Requirements missing but skill was enough.
    Bypassed,
    Blocked,
}

impl GateCheck {
    pub fn passed(self) -> bool {
        !matches!(self, GateCheck::Blocked)
    }
}

/// Traversal constraint attached to a link.
///
/// Only `is_active` and `is_unlocked` change after construction, flipped by
/// game logic (key pickups, story flags).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCondition {
    pub required_polarity: Polarity,
    pub required_abilities: Ability,
    pub softness: Softness,
    pub skill_threshold: f32,
    pub description: String,
    pub is_active: bool,
    pub is_unlocked: bool,
}

impl Default for GateCondition {
    fn default() -> Self {
        Self::open()
    }
}

impl GateCondition {
    /// An active, locked gate with no requirements yet.
    pub fn new(softness: Softness) -> Self {
        Self {
            required_polarity: Polarity::NONE,
            required_abilities: Ability::NONE,
            softness,
            skill_threshold: DEFAULT_SKILL_THRESHOLD,
            description: String::new(),
            is_active: true,
            is_unlocked: false,
        }
    }

    /// A gate that lets everyone through.
    pub fn open() -> Self {
        Self::new(Softness::Trivial).inactive()
    }

    pub fn requiring_polarity(mut self, polarity: Polarity) -> Self {
        self.required_polarity = polarity;
        self
    }

    pub fn requiring_abilities(mut self, abilities: Ability) -> Self {
        self.required_abilities = abilities;
        self
    }

    pub fn with_skill_threshold(mut self, threshold: f32) -> Self {
        self.skill_threshold = threshold.max(0.0);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn unlocked(mut self) -> Self {
        self.is_unlocked = true;
        self
    }

    /// Whether this gate currently constrains anyone.
    pub fn is_blocking(&self) -> bool {
        self.is_active && !self.is_unlocked
    }

    /// Whether the gate asks for anything at all.
    pub fn has_requirements(&self) -> bool {
        !self.required_polarity.is_empty() || !self.required_abilities.is_empty()
    }

    pub fn evaluate(
        &self,
        owned_polarity: Polarity,
        owned_abilities: Ability,
        skill_level: f32,
    ) -> GateCheck {
        if !self.is_blocking() {
            return GateCheck::Open;
        }

        let polarity_ok = owned_polarity.satisfies(self.required_polarity);
        let abilities_ok = owned_abilities.satisfies(self.required_abilities);
        if polarity_ok && abilities_ok {
            return GateCheck::Satisfied;
        }

        if self
            .softness
            .bypassed_by(self.skill_threshold, skill_level)
        {
            GateCheck::Bypassed
        } else {
            GateCheck::Blocked
        }
    }

    pub fn can_pass(&self, owned_polarity: Polarity, owned_abilities: Ability, skill_level: f32) -> bool {
        self.evaluate(owned_polarity, owned_abilities, skill_level)
            .passed()
    }

    pub fn evaluate_for(&self, agent: &AgentCapabilities) -> GateCheck {
        self.evaluate(agent.owned_polarity, agent.owned_abilities, agent.skill_level)
    }

    /// Exactly the requirement bits the agent lacks; `(NONE, NONE)` when all
    /// requirements are owned.
    pub fn missing_requirements(
        &self,
        owned_polarity: Polarity,
        owned_abilities: Ability,
    ) -> (Polarity, Ability) {
        (
            owned_polarity.missing_from(self.required_polarity),
            owned_abilities.missing_from(self.required_abilities),
        )
    }

    /// Human-readable summary, falling back to the requirement bits.
    pub fn summary(&self) -> String {
        if !self.description.is_empty() {
            return self.description.clone();
        }
        if !self.has_requirements() {
            return format!("{:?} gate with no requirements", self.softness);
        }
        format!(
            "{:?} gate requiring polarity {:?} and abilities {:?}",
            self.softness, self.required_polarity, self.required_abilities
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hard_sun_moon_gate() -> GateCondition {
        GateCondition::new(Softness::Hard)
            .requiring_polarity(Polarity::SUN_MOON)
            .requiring_abilities(Ability::JUMP | Ability::DASH)
    }

    #[test]
    fn test_inactive_or_unlocked_always_passes() {
        let gate = hard_sun_moon_gate();
        for skill in [0.0, 0.5, 1.0] {
            assert!(gate.clone().inactive().can_pass(Polarity::NONE, Ability::NONE, skill));
            assert!(gate.clone().unlocked().can_pass(Polarity::NONE, Ability::NONE, skill));
        }
        assert_eq!(
            gate.unlocked().evaluate(Polarity::NONE, Ability::NONE, 0.0),
            GateCheck::Open
        );
    }

    #[test]
    fn test_hard_gate_requires_full_superset() {
        let gate = hard_sun_moon_gate();
        assert!(!gate.can_pass(Polarity::SUN, Ability::JUMP | Ability::DASH, 0.0));
        assert!(!gate.can_pass(Polarity::SUN_MOON, Ability::JUMP, 0.0));
        assert!(gate.can_pass(Polarity::SUN_MOON, Ability::JUMP | Ability::DASH, 0.0));
    }

    #[test]
    fn test_hard_gate_never_bypassed() {
        let gate = hard_sun_moon_gate().with_skill_threshold(0.0);
        assert!(!gate.can_pass(Polarity::NONE, Ability::NONE, 1.0));
    }

    #[test]
    fn test_missing_requirements() {
        let gate = GateCondition::new(Softness::Medium)
            .requiring_polarity(Polarity::HEAT_COLD)
            .requiring_abilities(Ability::JUMP | Ability::DASH);
        assert_eq!(
            gate.missing_requirements(Polarity::HEAT, Ability::JUMP),
            (Polarity::COLD, Ability::DASH)
        );
        assert_eq!(
            gate.missing_requirements(Polarity::HEAT_COLD, Ability::JUMP | Ability::DASH),
            (Polarity::NONE, Ability::NONE)
        );
    }

    #[test]
    fn test_trivial_bypass_is_inclusive() {
        let gate = GateCondition::new(Softness::Trivial)
            .requiring_abilities(Ability::GRAPPLE)
            .with_skill_threshold(0.2);
        assert!(!gate.can_pass(Polarity::NONE, Ability::NONE, 0.1));
        assert!(gate.can_pass(Polarity::NONE, Ability::NONE, 0.2));
        assert!(gate.can_pass(Polarity::NONE, Ability::NONE, 0.9));
        assert_eq!(
            gate.evaluate(Polarity::NONE, Ability::NONE, 0.2),
            GateCheck::Bypassed
        );
    }

    #[test]
    fn test_very_difficult_bypass_is_exclusive_and_higher() {
        let gate = GateCondition::new(Softness::VeryDifficult)
            .requiring_abilities(Ability::GRAPPLE)
            .with_skill_threshold(0.2);
        assert!(!gate.can_pass(Polarity::NONE, Ability::NONE, 0.2));
        assert!(!gate.can_pass(Polarity::NONE, Ability::NONE, 0.6));
        assert!(gate.can_pass(Polarity::NONE, Ability::NONE, 0.61));
    }

    #[test]
    fn test_middle_tier_bypass_boundaries() {
        // 0.25 keeps every scaled threshold exact in f32.
        let cases = [
            (Softness::Easy, 0.3125, true),
            (Softness::Medium, 0.375, false),
            (Softness::Difficult, 0.5, false),
        ];
        for (softness, at, passes_at_threshold) in cases {
            let gate = GateCondition::new(softness)
                .requiring_abilities(Ability::GRAPPLE)
                .with_skill_threshold(0.25);
            assert_eq!(softness.effective_threshold(0.25), Some(at));
            assert!(!gate.can_pass(Polarity::NONE, Ability::NONE, at - 0.01), "{:?}", softness);
            assert_eq!(
                gate.can_pass(Polarity::NONE, Ability::NONE, at),
                passes_at_threshold,
                "{:?} at {}",
                softness,
                at
            );
            assert!(gate.can_pass(Polarity::NONE, Ability::NONE, at + 0.01), "{:?}", softness);
        }
    }

    #[test]
    fn test_bypass_monotonic_in_skill() {
        for softness in Softness::ALL {
            let gate = GateCondition::new(softness)
                .requiring_polarity(Polarity::DARK)
                .with_skill_threshold(0.25);
            let mut passed_before = false;
            for step in 0..=20 {
                let skill = step as f32 / 20.0;
                let passed = gate.can_pass(Polarity::NONE, Ability::NONE, skill);
                assert!(
                    passed || !passed_before,
                    "{:?} stopped passing at skill {}",
                    softness,
                    skill
                );
                passed_before = passed;
            }
        }
    }

    #[test]
    fn test_polarity_any_passes_every_single_polarity() {
        let gate = GateCondition::new(Softness::Hard).requiring_polarity(Polarity::ANY);
        for p in Polarity::BASE {
            assert!(gate.can_pass(p, Ability::NONE, 0.0));
        }
        for (i, &a) in Polarity::BASE.iter().enumerate() {
            for &b in &Polarity::BASE[i + 1..] {
                assert!(gate.can_pass(Polarity::pair(a, b), Ability::NONE, 0.0));
            }
        }
        assert!(gate.can_pass(Polarity::SUN_MOON, Ability::NONE, 0.0));
        assert!(gate.can_pass(Polarity::ALL_BASE, Ability::NONE, 0.0));
    }

    #[test]
    fn test_satisfied_beats_bypass() {
        let gate = GateCondition::new(Softness::Trivial)
            .requiring_abilities(Ability::SWIM)
            .with_skill_threshold(0.0);
        assert_eq!(
            gate.evaluate(Polarity::NONE, Ability::SWIM, 1.0),
            GateCheck::Satisfied
        );
    }

    #[test]
    fn test_summary_prefers_description() {
        let gate = hard_sun_moon_gate().with_description("Eclipse door");
        assert_eq!(gate.summary(), "Eclipse door");
        assert!(hard_sun_moon_gate().summary().contains("Hard"));
    }
}
