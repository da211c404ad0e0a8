//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Game logic lives in systems, not components.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{GridCell, TowerBuild, TowerId};

/// Identity of an enemy, resolved once at spawn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Enemy {
    pub archetype: EnemyArchetype,
    pub rank: EnemyRank,
    pub flying: bool,
    /// Body radius in world units; widens storm touches.
    pub size: f64,
    /// World the enemy was spawned for.
    pub world: u32,
}

/// Health, shield, and armor of an enemy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: f64,
    pub max_hp: f64,
    pub shield: f64,
    pub max_shield: f64,
    /// Fraction of hit damage removed before the shield (0.0 - 1.0).
    pub armor: f64,
}

/// Progress along the level path.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PathFollower {
    /// Normalized progress, 0.0 at the spawn end, 1.0 at the exit.
    pub t: f64,
    /// Unmodified movement speed (units/s).
    pub speed: f64,
    /// Position sampled from `t` after the last movement step.
    pub position: DVec2,
}

/// Timed status effects. Durations are seconds remaining.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub freeze: f64,
    pub poison: f64,
    pub burn: f64,
    pub burn_stacks: f64,
    pub slow: f64,
    /// Fraction of speed removed while `slow` is active.
    pub slow_factor: f64,
}

/// Secondary effects carried by a projectile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Fraction of speed removed on hit (0.0 = none).
    pub slow: f64,
    /// Splash radius around the impact point (0.0 = single target).
    pub aoe_radius: f64,
    pub chain_count: u32,
    pub chain_range: f64,
    /// Probability per hit of a short freeze.
    pub freeze_chance: f64,
    /// Armor-ignoring stacks.
    pub pierce: u32,
    pub shock: bool,
    pub shatter: bool,
    pub pulse: bool,
}

/// How a tower's shots fly and what they are tagged with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectileProfile {
    pub kind: ProjectileKind,
    /// Travel speed (units/s).
    pub speed: f64,
    pub damage_type: DamageType,
}

/// Derived tower stats, recomputed on placement, upgrade, and meta purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TowerStats {
    /// Damage per hit with level and meta scaling applied.
    pub damage: f64,
    /// Targeting range with level scaling applied.
    pub range: f64,
    /// Cooldown before the overclock buff and floor are applied.
    pub rate: f64,
    pub projectile: ProjectileProfile,
    pub payload: Payload,
}

/// A placed tower. The cell never changes after placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tower {
    pub id: TowerId,
    pub build: TowerBuild,
    pub cell: GridCell,
    /// Starts at 1.
    pub level: u32,
    pub cooldown: f64,
    /// Money paid at placement; the sale refund is based on it.
    pub placement_cost: u32,
    /// Level-1 stats before meta scaling.
    pub base: TowerStats,
    pub stats: TowerStats,
}
