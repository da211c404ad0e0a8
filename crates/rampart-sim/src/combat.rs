//! Damage resolution, kills, and leaks.
//!
//! Every removal of an enemy goes through `remove_enemy`, which drops it from
//! the live roster, returns its visual to the pool, and despawns it in the
//! same call.

use glam::DVec2;
use hecs::Entity;
use rand::Rng;
use tracing::{debug, info};

use rampart_core::components::{Enemy, PathFollower, Payload, StatusEffects, Vitals};
use rampart_core::constants::*;
use rampart_core::enums::{DamageType, ProjectileKind};
use rampart_core::events::Notification;

use crate::ordnance::Projectile;
use crate::pools::Visual;
use crate::session::SimulationSession;

/// Apply raw damage. The shield absorbs first; only the excess beyond the
/// remaining shield reaches hp. Neither value ends below zero.
pub fn apply_damage(vitals: &mut Vitals, amount: f64) {
    let amount = amount.max(0.0);
    vitals.shield -= amount;
    if vitals.shield < 0.0 {
        // Overflow carries into hp.
        vitals.hp += vitals.shield;
        vitals.shield = 0.0;
    }
    vitals.hp = vitals.hp.max(0.0);
}

/// Multiplicative armor reduction.
pub fn mitigate(amount: f64, armor: f64) -> f64 {
    amount * (1.0 - armor.clamp(0.0, 1.0))
}

/// A single hit on one enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub amount: f64,
    pub damage_type: DamageType,
    pub pierce: u32,
    pub shock: bool,
    pub shatter: bool,
}

impl Hit {
    pub fn plain(amount: f64, damage_type: DamageType) -> Self {
        Self {
            amount,
            damage_type,
            pierce: 0,
            shock: false,
            shatter: false,
        }
    }

    fn from_payload(amount: f64, damage_type: DamageType, payload: &Payload) -> Self {
        Self {
            amount,
            damage_type,
            pierce: payload.pierce,
            shock: payload.shock,
            shatter: payload.shatter,
        }
    }
}

/// Damage an enemy, killing it if hp reaches zero. Returns whether it died.
/// Missing entities are ignored.
pub fn damage_enemy(session: &mut SimulationSession, enemy: Entity, hit: Hit) -> bool {
    let dead = {
        let Ok((vitals, status)) = session
            .world
            .query_one_mut::<(&mut Vitals, &StatusEffects)>(enemy)
        else {
            return false;
        };
        let mut amount = hit.amount;
        if hit.shatter && status.freeze > 0.0 {
            amount *= SHATTER_DAMAGE_FACTOR;
        }
        if hit.shock && vitals.shield > 0.0 {
            amount *= SHOCK_DAMAGE_FACTOR;
        }
        let armor = (vitals.armor - PIERCE_ARMOR_PER_STACK * hit.pierce as f64).max(0.0);
        apply_damage(vitals, mitigate(amount, armor));
        vitals.hp <= 0.0
    };
    if dead {
        kill_enemy(session, enemy);
    }
    dead
}

/// Pay the bounty for a dead enemy and remove it.
pub fn kill_enemy(session: &mut SimulationSession, enemy: Entity) {
    let Ok(info) = session.world.get::<&Enemy>(enemy).map(|e| *e) else {
        return;
    };
    let bounty = session.economy.award_kill(info.rank);
    debug!(archetype = ?info.archetype, rank = ?info.rank, bounty, "enemy_killed");
    session.notifications.push(Notification::EnemyKilled {
        archetype: info.archetype,
        rank: info.rank,
        bounty,
    });
    remove_enemy(session, enemy);
}

/// Charge lives for an enemy that reached the exit and remove it.
/// Running out of lives ends the session.
pub fn leak_enemy(session: &mut SimulationSession, enemy: Entity) {
    let Ok(info) = session.world.get::<&Enemy>(enemy).map(|e| *e) else {
        return;
    };
    let lives_lost = session.economy.record_leak(info.rank);
    debug!(archetype = ?info.archetype, rank = ?info.rank, lives_lost, "enemy_leaked");
    session.notifications.push(Notification::EnemyLeaked {
        archetype: info.archetype,
        rank: info.rank,
        lives_lost,
    });
    remove_enemy(session, enemy);

    if session.economy.is_defeated() && !session.game_over {
        let wave = session.phase.wave_number();
        session.game_over = true;
        info!(wave, level = session.level.global, "defeat");
        session.notifications.push(Notification::Defeat { wave });
    }
}

/// Drop an enemy from the roster, release its visual, and despawn it.
pub fn remove_enemy(session: &mut SimulationSession, enemy: Entity) {
    session.enemies.retain(|&e| e != enemy);
    if let Ok(visual) = session.world.remove_one::<Visual>(enemy) {
        session.pools.release(visual);
    }
    let _ = session.world.despawn(enemy);
}

/// Live enemy positions in roster order.
pub(crate) fn roster_positions(session: &SimulationSession) -> Vec<(Entity, DVec2)> {
    session
        .enemies
        .iter()
        .filter_map(|&e| {
            session
                .world
                .get::<&PathFollower>(e)
                .ok()
                .map(|f| (e, f.position))
        })
        .collect()
}

/// Resolve a projectile arriving at `impact`.
pub fn resolve_impact(session: &mut SimulationSession, projectile: &Projectile, impact: DVec2) {
    let payload = projectile.payload;
    let damage_type = projectile.damage_type;

    let victims: Vec<Entity> = if payload.aoe_radius > 0.0 {
        roster_positions(session)
            .into_iter()
            .filter(|(_, pos)| pos.distance(impact) <= payload.aoe_radius)
            .map(|(e, _)| e)
            .collect()
    } else {
        vec![projectile.target]
    };

    // Pulse and chain candidates are taken before the primary hits land.
    let splash: Vec<Entity> = if payload.pulse {
        roster_positions(session)
            .into_iter()
            .filter(|(e, pos)| !victims.contains(e) && pos.distance(impact) <= PULSE_RADIUS)
            .map(|(e, _)| e)
            .collect()
    } else {
        Vec::new()
    };

    let mut struck = victims.clone();
    for &victim in &victims {
        let hit = Hit::from_payload(projectile.damage, damage_type, &payload);
        strike(session, victim, hit, projectile.kind, &payload);
    }

    if payload.chain_count > 0 {
        let mut from = impact;
        let mut amount = projectile.damage;
        for _ in 0..payload.chain_count {
            amount *= CHAIN_DAMAGE_FALLOFF;
            let next = roster_positions(session)
                .into_iter()
                .find(|(e, pos)| !struck.contains(e) && pos.distance(from) <= payload.chain_range);
            let Some((hop, pos)) = next else {
                break;
            };
            struck.push(hop);
            from = pos;
            let hit = Hit::from_payload(amount, damage_type, &payload);
            strike(session, hop, hit, projectile.kind, &payload);
        }
    }

    for e in splash {
        if struck.contains(&e) {
            continue;
        }
        let hit = Hit::plain(projectile.damage * PULSE_DAMAGE_FACTOR, damage_type);
        damage_enemy(session, e, hit);
    }
}

/// Damage one enemy, then apply on-hit statuses if it survived.
fn strike(
    session: &mut SimulationSession,
    enemy: Entity,
    hit: Hit,
    kind: ProjectileKind,
    payload: &Payload,
) {
    if damage_enemy(session, enemy, hit) {
        return;
    }
    let freeze_roll = payload.freeze_chance > 0.0
        && session.rng.gen_bool(payload.freeze_chance.clamp(0.0, 1.0));
    let Ok(status) = session.world.query_one_mut::<&mut StatusEffects>(enemy) else {
        return;
    };
    if payload.slow > 0.0 {
        status.slow = status.slow.max(SLOW_DURATION_SECS);
        status.slow_factor = status.slow_factor.max(payload.slow);
    }
    if kind == ProjectileKind::Flame {
        status.burn_stacks += FLAME_BURN_STACKS;
        status.burn = status.burn.max(BURN_DURATION_SECS);
    }
    if freeze_roll {
        status.freeze = status.freeze.max(FREEZE_CHANCE_DURATION_SECS);
    }
}
