//! Snapshot system: reads the session and builds a complete `SessionSnapshot`.
//!
//! This system is read-only.

use std::collections::BTreeSet;

use rampart_core::components::{Enemy, PathFollower, StatusEffects, Tower, Vitals};
use rampart_core::enums::{AbilityKind, GamePhase};
use rampart_core::events::Notification;
use rampart_core::state::*;
use rampart_core::types::SimTime;

use crate::ordnance::{Projectile, Storm};
use crate::session::SimulationSession;

const ALL_ABILITIES: [AbilityKind; 4] = [
    AbilityKind::Freeze,
    AbilityKind::Poison,
    AbilityKind::Overclock,
    AbilityKind::Nuclear,
];

/// Engine-level state that goes into every snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFrame<'a> {
    pub time: SimTime,
    pub paused: bool,
    pub speed: u8,
    pub upgrade_points: u32,
    pub unlocked_abilities: &'a BTreeSet<AbilityKind>,
    pub notifications: Vec<Notification>,
}

/// Build a snapshot. Without a session only the engine-level fields are set.
pub fn build_snapshot(session: Option<&SimulationSession>, frame: SnapshotFrame<'_>) -> SessionSnapshot {
    let abilities = ALL_ABILITIES
        .iter()
        .map(|&ability| AbilityView {
            ability,
            unlocked: frame.unlocked_abilities.contains(&ability),
            cooldown: session.map_or(0.0, |s| s.abilities.remaining(ability)),
        })
        .collect();

    let mut snapshot = SessionSnapshot {
        time: frame.time,
        paused: frame.paused,
        speed: frame.speed,
        upgrade_points: frame.upgrade_points,
        abilities,
        notifications: frame.notifications,
        ..SessionSnapshot::default()
    };

    let Some(session) = session else {
        snapshot.phase = GamePhase::Build;
        return snapshot;
    };

    snapshot.phase = session.phase.phase();
    snapshot.game_over = session.game_over;
    snapshot.wave = session.phase.wave().clone();
    snapshot.economy = session.economy.state().clone();
    snapshot.overclock_remaining = session.overclock_remaining;
    snapshot.level = Some(LevelView {
        level: session.level,
        mode: session.mode,
        columns: session.map.columns,
        rows: session.map.rows,
        path: session.map.path.clone(),
    });
    snapshot.enemies = build_enemies(session);
    snapshot.towers = build_towers(session);
    snapshot.projectiles = session
        .world
        .query::<&Projectile>()
        .iter()
        .map(|(_, p)| ProjectileView {
            kind: p.kind,
            damage_type: p.damage_type,
            position: p.position,
        })
        .collect();
    snapshot.storms = session
        .world
        .query::<&Storm>()
        .iter()
        .map(|(_, s)| StormView {
            ability: s.ability,
            head: s.head,
            progress: s.progress,
            touched: s.touched.len() as u32,
        })
        .collect();
    snapshot
}

/// Enemies in roster (spawn) order.
fn build_enemies(session: &SimulationSession) -> Vec<EnemyView> {
    session
        .enemies
        .iter()
        .filter_map(|&entity| {
            let mut query = session
                .world
                .query_one::<(&Enemy, &Vitals, &PathFollower, &StatusEffects)>(entity)
                .ok()?;
            let (enemy, vitals, follower, status) = query.get()?;
            Some(EnemyView {
                id: entity.to_bits().get(),
                archetype: enemy.archetype,
                rank: enemy.rank,
                flying: enemy.flying,
                position: follower.position,
                t: follower.t,
                hp: vitals.hp,
                max_hp: vitals.max_hp,
                shield: vitals.shield,
                max_shield: vitals.max_shield,
                frozen: status.freeze > 0.0,
                poisoned: status.poison > 0.0,
                burning: status.burn > 0.0,
                slowed: status.slow > 0.0,
            })
        })
        .collect()
}

/// Towers ordered by cell.
fn build_towers(session: &SimulationSession) -> Vec<TowerView> {
    session
        .towers
        .values()
        .filter_map(|&entity| {
            let tower = session.world.get::<&Tower>(entity).ok()?;
            Some(TowerView {
                id: tower.id,
                build: tower.build,
                cell: tower.cell,
                level: tower.level,
                cooldown: tower.cooldown,
                stats: tower.stats,
            })
        })
        .collect()
}
