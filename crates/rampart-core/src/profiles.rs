//! Behavior tables resolved once at spawn or placement.
//!
//! Consolidates per-archetype, per-tower, per-module, and per-ability parameters
//! so that systems never branch on kind every tick.

use crate::components::{Payload, ProjectileProfile};
use crate::constants::*;
use crate::enums::*;

/// Base stats of an enemy before world, mode, and ramp scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    pub hp: f64,
    /// Base speed (units/s).
    pub speed: f64,
    pub shield: f64,
    pub size: f64,
    pub flying: bool,
}

/// Get the base stats for an archetype at a given rank.
/// Bosses ignore the archetype table and use fixed values on the tank lineage.
pub fn enemy_profile(archetype: EnemyArchetype, rank: EnemyRank) -> EnemyProfile {
    match rank {
        EnemyRank::Boss => EnemyProfile {
            hp: 900.0,
            speed: 0.6,
            shield: 0.0,
            size: 0.6,
            flying: false,
        },
        EnemyRank::FinalBoss => EnemyProfile {
            hp: 6000.0,
            speed: 0.5,
            shield: 800.0,
            size: 0.8,
            flying: false,
        },
        EnemyRank::Normal => match archetype {
            EnemyArchetype::Runner => EnemyProfile {
                hp: 40.0,
                speed: 1.7,
                shield: 0.0,
                size: 0.28,
                flying: false,
            },
            EnemyArchetype::Tank => EnemyProfile {
                hp: 130.0,
                speed: 0.75,
                shield: 0.0,
                size: 0.42,
                flying: false,
            },
            EnemyArchetype::Shielded => EnemyProfile {
                hp: 70.0,
                speed: 1.1,
                shield: 45.0,
                size: 0.36,
                flying: false,
            },
            EnemyArchetype::Flyer => EnemyProfile {
                hp: 48.0,
                speed: 1.45,
                shield: 0.0,
                size: 0.3,
                flying: true,
            },
        },
    }
}

/// Health multiplier of a game mode.
pub fn mode_scale(mode: GameMode) -> f64 {
    match mode {
        GameMode::Campaign => 1.0,
        GameMode::Endless => 1.1,
        GameMode::FinalBoss => 1.25,
    }
}

/// Level-1 stats and price of a catalog tower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TowerProfile {
    pub damage: f64,
    pub range: f64,
    /// Base cooldown (seconds).
    pub rate: f64,
    pub cost: u32,
    pub projectile: ProjectileProfile,
    pub payload: Payload,
}

/// Get the catalog profile for a tower type.
pub fn tower_profile(tower: TowerType) -> TowerProfile {
    match tower {
        TowerType::Blaster => TowerProfile {
            damage: 10.0,
            range: 3.2,
            rate: 0.55,
            cost: 50,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Bolt,
                speed: 9.0,
                damage_type: DamageType::Kinetic,
            },
            payload: Payload::default(),
        },
        TowerType::Frost => TowerProfile {
            damage: 4.0,
            range: 2.8,
            rate: 0.9,
            cost: 70,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Frost,
                speed: 7.0,
                damage_type: DamageType::Cryo,
            },
            payload: Payload {
                slow: 0.35,
                ..Payload::default()
            },
        },
        TowerType::Cannon => TowerProfile {
            damage: 22.0,
            range: 3.0,
            rate: 1.4,
            cost: 110,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Shell,
                speed: 6.0,
                damage_type: DamageType::Explosive,
            },
            payload: Payload {
                aoe_radius: 1.1,
                ..Payload::default()
            },
        },
        TowerType::Flame => TowerProfile {
            damage: 3.0,
            range: 2.4,
            rate: 0.2,
            cost: 90,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Flame,
                speed: 8.0,
                damage_type: DamageType::Fire,
            },
            payload: Payload::default(),
        },
        TowerType::Tesla => TowerProfile {
            damage: 9.0,
            range: 3.4,
            rate: 0.8,
            cost: 130,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Arc,
                speed: 14.0,
                damage_type: DamageType::Electric,
            },
            payload: Payload {
                chain_count: 3,
                chain_range: 1.8,
                ..Payload::default()
            },
        },
        TowerType::Sniper => TowerProfile {
            damage: 45.0,
            range: 6.5,
            rate: 2.2,
            cost: 150,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Slug,
                speed: 22.0,
                damage_type: DamageType::Kinetic,
            },
            payload: Payload {
                pierce: 1,
                ..Payload::default()
            },
        },
    }
}

/// Contribution of a single custom-tower module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleProfile {
    pub damage_mult: f64,
    pub range_delta: f64,
    /// Added to the cooldown; negative fires faster.
    pub rate_delta: f64,
    pub cost: u32,
    /// Projectile used when this module dominates the composition.
    pub projectile: ProjectileProfile,
}

/// Get the profile for a module kind.
pub fn module_profile(module: ModuleKind) -> ModuleProfile {
    match module {
        ModuleKind::Kinetic => ModuleProfile {
            damage_mult: 1.15,
            range_delta: 0.3,
            rate_delta: -0.06,
            cost: 18,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Bolt,
                speed: CUSTOM_PROJECTILE_SPEED,
                damage_type: DamageType::Kinetic,
            },
        },
        ModuleKind::Cryo => ModuleProfile {
            damage_mult: 0.9,
            range_delta: 0.0,
            rate_delta: 0.04,
            cost: 22,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Frost,
                speed: CUSTOM_PROJECTILE_SPEED,
                damage_type: DamageType::Cryo,
            },
        },
        ModuleKind::Arc => ModuleProfile {
            damage_mult: 1.0,
            range_delta: 0.2,
            rate_delta: -0.02,
            cost: 26,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Arc,
                speed: CUSTOM_PROJECTILE_SPEED * 1.4,
                damage_type: DamageType::Electric,
            },
        },
        ModuleKind::Explosive => ModuleProfile {
            damage_mult: 1.3,
            range_delta: -0.2,
            rate_delta: 0.12,
            cost: 30,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Shell,
                speed: CUSTOM_PROJECTILE_SPEED * 0.7,
                damage_type: DamageType::Explosive,
            },
        },
        ModuleKind::Beam => ModuleProfile {
            damage_mult: 1.2,
            range_delta: 0.8,
            rate_delta: 0.05,
            cost: 28,
            projectile: ProjectileProfile {
                kind: ProjectileKind::Beam,
                speed: CUSTOM_PROJECTILE_SPEED * 2.0,
                damage_type: DamageType::Beam,
            },
        },
    }
}

/// Display name fragment of a module kind.
pub fn module_name(module: ModuleKind) -> &'static str {
    match module {
        ModuleKind::Kinetic => "Kinetic",
        ModuleKind::Cryo => "Cryo",
        ModuleKind::Arc => "Arc",
        ModuleKind::Explosive => "Blast",
        ModuleKind::Beam => "Beam",
    }
}

/// Cast parameters of an ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbilityProfile {
    /// Cooldown after a successful cast (seconds).
    pub cooldown: f64,
    /// Whether the storm ends after its first touch.
    pub consume_on_first_touch: bool,
}

/// Get the cast parameters for an ability.
pub fn ability_profile(ability: AbilityKind) -> AbilityProfile {
    match ability {
        AbilityKind::Freeze => AbilityProfile {
            cooldown: 20.0,
            consume_on_first_touch: false,
        },
        AbilityKind::Nuclear => AbilityProfile {
            cooldown: 60.0,
            consume_on_first_touch: false,
        },
        AbilityKind::Overclock => AbilityProfile {
            cooldown: 30.0,
            consume_on_first_touch: true,
        },
        AbilityKind::Poison => AbilityProfile {
            cooldown: 25.0,
            consume_on_first_touch: false,
        },
    }
}
