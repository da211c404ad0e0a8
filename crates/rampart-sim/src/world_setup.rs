//! Entity spawn factories.
//!
//! Creates enemy, tower, projectile, and storm entities with their component
//! bundles. Pooled visuals are acquired here and released by `combat` /
//! the systems when the entity is removed.

use glam::DVec2;
use hecs::{Entity, World};

use rampart_core::components::*;
use rampart_core::enums::{AbilityKind, VisualKind};
use rampart_core::types::{GridCell, TowerBuild, TowerId};

use crate::difficulty::{EnemyStats, SpawnOrder};
use crate::ordnance::{Projectile, Storm};
use crate::pools::EntityPools;

/// Spawn an enemy at the start of the path.
pub fn spawn_enemy(
    world: &mut World,
    pools: &mut EntityPools,
    order: SpawnOrder,
    stats: EnemyStats,
    world_id: u32,
    start: DVec2,
) -> Entity {
    let visual = pools.acquire(VisualKind::Enemy);
    world.spawn((
        Enemy {
            archetype: order.archetype,
            rank: order.rank,
            flying: stats.flying,
            size: stats.size,
            world: world_id,
        },
        Vitals {
            hp: stats.hp,
            max_hp: stats.hp,
            shield: stats.shield,
            max_shield: stats.shield,
            armor: stats.armor,
        },
        PathFollower {
            t: 0.0,
            speed: stats.speed,
            position: start,
        },
        StatusEffects::default(),
        visual,
    ))
}

/// Spawn a tower. Towers have no pooled visual; the frontend draws them from the snapshot.
pub fn spawn_tower(
    world: &mut World,
    id: TowerId,
    build: TowerBuild,
    cell: GridCell,
    placement_cost: u32,
    base: TowerStats,
    stats: TowerStats,
) -> Entity {
    world.spawn((Tower {
        id,
        build,
        cell,
        level: 1,
        cooldown: 0.0,
        placement_cost,
        base,
        stats,
    },))
}

/// Spawn a projectile leaving a tower.
pub fn spawn_projectile(
    world: &mut World,
    pools: &mut EntityPools,
    origin: DVec2,
    target: Entity,
    stats: &TowerStats,
) -> Entity {
    let mut visual = pools.acquire(VisualKind::Projectile);
    visual.intent.position = origin;
    world.spawn((
        Projectile {
            kind: stats.projectile.kind,
            damage_type: stats.projectile.damage_type,
            position: origin,
            target,
            speed: stats.projectile.speed,
            damage: stats.damage,
            payload: stats.payload,
        },
        visual,
    ))
}

/// Spawn an ability storm at the exit end of the path.
pub fn spawn_storm(
    world: &mut World,
    pools: &mut EntityPools,
    ability: AbilityKind,
    head: DVec2,
) -> Entity {
    let mut visual = pools.acquire(VisualKind::Storm);
    visual.intent.position = head;
    world.spawn((Storm::new(ability, head), visual))
}
