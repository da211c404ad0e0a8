//! Projectiles, ability storms, and ability cooldowns.
//!
//! Projectiles and storms are hecs entities; these are their components.
//! They live here rather than in the shared core crate because they hold
//! `hecs::Entity` references.

use std::collections::{BTreeMap, HashSet};

use glam::DVec2;

use rampart_core::components::Payload;
use rampart_core::enums::{AbilityKind, DamageType, ProjectileKind};
use rampart_core::error::Rejection;
use rampart_core::profiles::ability_profile;

/// A homing shot. Holds a handle to its target, never a reference.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub damage_type: DamageType,
    pub position: DVec2,
    pub target: hecs::Entity,
    pub speed: f64,
    pub damage: f64,
    pub payload: Payload,
}

/// A cast travelling along the path from the exit back to the spawn.
#[derive(Debug, Clone)]
pub struct Storm {
    pub ability: AbilityKind,
    pub elapsed: f64,
    /// Fraction of the path travelled, 0.0 at the exit.
    pub progress: f64,
    pub head: DVec2,
    /// Enemies already affected by this cast. Never shrinks.
    pub touched: HashSet<hecs::Entity>,
    pub consume_on_first_touch: bool,
    pub consumed: bool,
}

impl Storm {
    pub fn new(ability: AbilityKind, head: DVec2) -> Self {
        Self {
            ability,
            elapsed: 0.0,
            progress: 0.0,
            head,
            touched: HashSet::new(),
            consume_on_first_touch: ability_profile(ability).consume_on_first_touch,
            consumed: false,
        }
    }
}

/// Remaining cooldown per ability.
#[derive(Debug, Clone, Default)]
pub struct AbilityBook {
    cooldowns: BTreeMap<AbilityKind, f64>,
}

impl AbilityBook {
    /// Tick every cooldown toward zero.
    pub fn decay(&mut self, dt: f64) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
    }

    pub fn remaining(&self, ability: AbilityKind) -> f64 {
        self.cooldowns.get(&ability).copied().unwrap_or(0.0)
    }

    pub fn ensure_ready(&self, ability: AbilityKind) -> Result<(), Rejection> {
        let remaining = self.remaining(ability);
        if remaining > 0.0 {
            return Err(Rejection::AbilityOnCooldown { ability, remaining });
        }
        Ok(())
    }

    /// Start the cooldown after a successful cast.
    pub fn trigger(&mut self, ability: AbilityKind) {
        self.cooldowns
            .insert(ability, ability_profile(ability).cooldown);
    }
}
