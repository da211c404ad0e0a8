//! Tests for the session systems, combat resolution, storms, and the engine.

use std::sync::{Arc, Mutex};

use hecs::Entity;

use rampart_campaign::ProgressionGate;
use rampart_core::commands::{CommandOutcome, PlayerCommand};
use rampart_core::components::{PathFollower, Payload, StatusEffects, TowerStats, Vitals};
use rampart_core::config::CampaignConfig;
use rampart_core::constants::*;
use rampart_core::enums::*;
use rampart_core::error::Rejection;
use rampart_core::events::Notification;
use rampart_core::profiles::tower_profile;
use rampart_core::types::{GridCell, TowerBuild};

use crate::combat::{self, Hit};
use crate::difficulty::{EnemyStats, SpawnOrder, WaveDirector};
use crate::engine::{SimConfig, SimulationEngine};
use crate::ordnance::{Projectile, Storm};
use crate::path::{LevelMap, StaticMaps};
use crate::pools::{EntityPools, HeadlessVisuals, VisualHandle, VisualProvider};
use crate::session::{SessionSetup, SimulationSession};
use crate::systems::{enemies, projectiles, storms, towers};
use crate::world_setup;

// ---- Fixtures ----

const OPEN_CELL: GridCell = GridCell::new(5, 2);

fn session_with(min_towers: u32, lives: u32) -> SimulationSession {
    let config = CampaignConfig::default();
    let level = config.resolve(1, 1).unwrap();
    let director = WaveDirector::new(&config, level, GameMode::Campaign).unwrap();
    SimulationSession::new(
        SessionSetup {
            level,
            mode: GameMode::Campaign,
            map: LevelMap::serpentine(12, 8),
            director,
            min_towers,
            money: 250,
            lives,
            meta_damage_level: 0,
            seed: 9,
        },
        EntityPools::headless(),
    )
}

fn session() -> SimulationSession {
    session_with(1, 20)
}

/// Spawn a runner at path progress `t` with the given vitals and no armor.
fn spawn_at(session: &mut SimulationSession, t: f64, hp: f64, shield: f64) -> Entity {
    let order = SpawnOrder {
        archetype: EnemyArchetype::Runner,
        rank: EnemyRank::Normal,
        delay: 0.0,
    };
    let stats = EnemyStats {
        hp,
        shield,
        speed: 1.0,
        armor: 0.0,
        size: 0.3,
        flying: false,
    };
    let position = session.track.sample(t);
    let entity = world_setup::spawn_enemy(
        &mut session.world,
        &mut session.pools,
        order,
        stats,
        1,
        position,
    );
    session.world.get::<&mut PathFollower>(entity).unwrap().t = t;
    session.enemies.push(entity);
    entity
}

fn vitals(session: &SimulationSession, entity: Entity) -> Vitals {
    *session.world.get::<&Vitals>(entity).unwrap()
}

fn blaster() -> TowerStats {
    let p = tower_profile(TowerType::Blaster);
    TowerStats {
        damage: p.damage,
        range: p.range,
        rate: p.rate,
        projectile: p.projectile,
        payload: p.payload,
    }
}

fn projectile_count(session: &SimulationSession) -> usize {
    session.world.query::<&Projectile>().iter().count()
}

fn storm_count(session: &SimulationSession) -> usize {
    session.world.query::<&Storm>().iter().count()
}

/// t at which the serpentine path passes the center of cell (5, 1).
const T_NEAR_OPEN_CELL: f64 = 5.0 / 37.0;

// ---- Damage scenarios ----

#[test]
fn lethal_hit_removes_enemy_and_pays_bounty() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.2, 50.0, 0.0);

    let died = combat::damage_enemy(&mut s, enemy, Hit::plain(60.0, DamageType::Kinetic));

    assert!(died);
    assert_eq!(s.enemy_count(), 0);
    assert!(!s.world.contains(enemy));
    assert_eq!(s.economy().money, 250 + 12);
    assert_eq!(s.pools().stats(VisualKind::Enemy).outstanding, 0);
    assert_eq!(s.pools().stats(VisualKind::Enemy).available, 1);
    assert!(s.drain_notifications().contains(&Notification::EnemyKilled {
        archetype: EnemyArchetype::Runner,
        rank: EnemyRank::Normal,
        bounty: 12,
    }));
}

#[test]
fn shield_overflow_reaches_hp() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.2, 50.0, 20.0);

    let died = combat::damage_enemy(&mut s, enemy, Hit::plain(35.0, DamageType::Kinetic));

    assert!(!died);
    let v = vitals(&s, enemy);
    assert_eq!(v.shield, 0.0);
    assert_eq!(v.hp, 35.0);
    assert_eq!(s.economy().money, 250);
}

#[test]
fn boss_kill_grants_upgrade_point() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.2, 10.0, 0.0);
    s.world.get::<&mut rampart_core::components::Enemy>(enemy).unwrap().rank = EnemyRank::Boss;

    combat::damage_enemy(&mut s, enemy, Hit::plain(10.0, DamageType::Kinetic));

    assert_eq!(s.economy().money, 250 + 70);
    assert_eq!(s.take_upgrade_points(), 1);
}

#[test]
fn shatter_and_pierce_modify_damage() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.2, 100.0, 0.0);
    {
        let mut v = s.world.get::<&mut Vitals>(enemy).unwrap();
        v.armor = 0.3;
    }
    s.world.get::<&mut StatusEffects>(enemy).unwrap().freeze = 1.0;

    let hit = Hit {
        amount: 10.0,
        damage_type: DamageType::Kinetic,
        pierce: 1,
        shock: false,
        shatter: true,
    };
    combat::damage_enemy(&mut s, enemy, hit);

    // 10 * 1.35 shatter, armor 0.3 - 0.15 pierce
    let expected = 100.0 - 10.0 * 1.35 * (1.0 - 0.15);
    assert!((vitals(&s, enemy).hp - expected).abs() < 1e-9);
}

// ---- Projectiles ----

fn fire_at(session: &mut SimulationSession, target: Entity, payload: Payload) -> Entity {
    let origin = session.world.get::<&PathFollower>(target).unwrap().position;
    let mut stats = blaster();
    stats.payload = payload;
    world_setup::spawn_projectile(
        &mut session.world,
        &mut session.pools,
        origin,
        target,
        &stats,
    )
}

#[test]
fn projectile_with_removed_target_is_discarded() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 50.0, 0.0);
    let bystander = spawn_at(&mut s, 0.2, 50.0, 0.0);
    fire_at(
        &mut s,
        target,
        Payload {
            aoe_radius: 2.0,
            ..Payload::default()
        },
    );

    combat::remove_enemy(&mut s, target);
    projectiles::run(&mut s, DT);

    assert_eq!(projectile_count(&s), 0);
    assert_eq!(vitals(&s, bystander).hp, 50.0);
    assert_eq!(s.pools().stats(VisualKind::Projectile).outstanding, 0);
}

#[test]
fn projectile_hits_on_arrival() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 50.0, 0.0);
    fire_at(&mut s, target, Payload::default());

    projectiles::run(&mut s, DT);

    assert_eq!(projectile_count(&s), 0);
    assert_eq!(vitals(&s, target).hp, 40.0);
}

#[test]
fn projectile_homes_on_live_position() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 50.0, 0.0);
    let start = s.world.get::<&PathFollower>(target).unwrap().position;
    let mut stats = blaster();
    stats.projectile.speed = 1.0;
    let origin = start + glam::DVec2::new(0.0, 3.0);
    let shot = world_setup::spawn_projectile(&mut s.world, &mut s.pools, origin, target, &stats);

    projectiles::run(&mut s, 0.5);

    let position = s.world.get::<&Projectile>(shot).unwrap().position;
    assert!((position - (origin + glam::DVec2::new(0.0, -0.5))).length() < 1e-9);
    assert_eq!(vitals(&s, target).hp, 50.0);
}

#[test]
fn chain_hops_with_falloff() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 100.0, 0.0);
    let near = spawn_at(&mut s, 0.2 + 1.0 / 37.0, 100.0, 0.0);
    let far = spawn_at(&mut s, 0.6, 100.0, 0.0);
    fire_at(
        &mut s,
        target,
        Payload {
            chain_count: 2,
            chain_range: 1.8,
            ..Payload::default()
        },
    );

    projectiles::run(&mut s, DT);

    assert_eq!(vitals(&s, target).hp, 90.0);
    assert!((vitals(&s, near).hp - 93.0).abs() < 1e-9);
    assert_eq!(vitals(&s, far).hp, 100.0);
}

#[test]
fn flame_hits_stack_burn() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 100.0, 0.0);
    let origin = s.world.get::<&PathFollower>(target).unwrap().position;
    let p = tower_profile(TowerType::Flame);
    let stats = TowerStats {
        damage: p.damage,
        range: p.range,
        rate: p.rate,
        projectile: p.projectile,
        payload: p.payload,
    };
    world_setup::spawn_projectile(&mut s.world, &mut s.pools, origin, target, &stats);
    world_setup::spawn_projectile(&mut s.world, &mut s.pools, origin, target, &stats);

    projectiles::run(&mut s, DT);

    let status = *s.world.get::<&StatusEffects>(target).unwrap();
    assert!((status.burn_stacks - 2.8).abs() < 1e-9);
    assert_eq!(status.burn, BURN_DURATION_SECS);
}

#[test]
fn aoe_hits_everything_inside_the_radius() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 100.0, 0.0);
    let inside = spawn_at(&mut s, 0.2 + 1.0 / 37.0, 100.0, 0.0);
    let outside = spawn_at(&mut s, 0.2 + 2.5 / 37.0, 100.0, 0.0);
    fire_at(
        &mut s,
        target,
        Payload {
            aoe_radius: 1.5,
            ..Payload::default()
        },
    );

    projectiles::run(&mut s, DT);

    assert_eq!(vitals(&s, target).hp, 90.0);
    assert_eq!(vitals(&s, inside).hp, 90.0);
    assert_eq!(vitals(&s, outside).hp, 100.0);
}

#[test]
fn pulse_splashes_neighbours_at_reduced_damage() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 100.0, 0.0);
    let near = spawn_at(&mut s, 0.2 + 0.8 / 37.0, 100.0, 0.0);
    let far = spawn_at(&mut s, 0.2 + 1.5 / 37.0, 100.0, 0.0);
    fire_at(
        &mut s,
        target,
        Payload {
            pulse: true,
            ..Payload::default()
        },
    );

    projectiles::run(&mut s, DT);

    assert_eq!(vitals(&s, target).hp, 90.0);
    assert!((vitals(&s, near).hp - (100.0 - 10.0 * PULSE_DAMAGE_FACTOR)).abs() < 1e-9);
    assert_eq!(vitals(&s, far).hp, 100.0);
}

#[test]
fn shock_bonus_applies_only_against_shields() {
    let mut s = session();
    let shielded = spawn_at(&mut s, 0.2, 50.0, 20.0);
    let bare = spawn_at(&mut s, 0.4, 50.0, 0.0);
    let hit = Hit {
        shock: true,
        ..Hit::plain(10.0, DamageType::Electric)
    };

    combat::damage_enemy(&mut s, shielded, hit);
    combat::damage_enemy(&mut s, bare, hit);

    assert!((vitals(&s, shielded).shield - (20.0 - 10.0 * SHOCK_DAMAGE_FACTOR)).abs() < 1e-9);
    assert_eq!(vitals(&s, shielded).hp, 50.0);
    assert_eq!(vitals(&s, bare).hp, 40.0);
}

#[test]
fn slowed_enemies_move_at_reduced_speed() {
    let mut s = session();
    let target = spawn_at(&mut s, 0.2, 100.0, 0.0);
    fire_at(
        &mut s,
        target,
        Payload {
            slow: 0.5,
            ..Payload::default()
        },
    );

    projectiles::run(&mut s, DT);
    let status = *s.world.get::<&StatusEffects>(target).unwrap();
    assert_eq!(status.slow, SLOW_DURATION_SECS);
    assert_eq!(status.slow_factor, 0.5);

    enemies::run(&mut s, 0.5);
    let t = s.world.get::<&PathFollower>(target).unwrap().t;
    assert!((t - (0.2 + 0.5 * 0.5 / 37.0)).abs() < 1e-9);
}

// ---- Towers ----

#[test]
fn towers_fire_only_while_spawning() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    spawn_at(&mut s, T_NEAR_OPEN_CELL, 50.0, 0.0);

    towers::run(&mut s, DT);
    assert_eq!(projectile_count(&s), 0);

    s.start_wave().unwrap();
    towers::run(&mut s, DT);
    assert_eq!(projectile_count(&s), 1);
    let tower = s.tower_at(OPEN_CELL).unwrap();
    assert_eq!(tower.cooldown, 0.55);
}

#[test]
fn overclock_shortens_cooldown() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    spawn_at(&mut s, T_NEAR_OPEN_CELL, 50.0, 0.0);
    s.start_wave().unwrap();
    s.overclock_remaining = OVERCLOCK_SECS;

    towers::run(&mut s, DT);

    let tower = s.tower_at(OPEN_CELL).unwrap();
    assert!((tower.cooldown - 0.55 * OVERCLOCK_COOLDOWN_FACTOR).abs() < 1e-12);
}

#[test]
fn placement_rules() {
    let mut s = session();
    let place = |s: &mut SimulationSession, cell| {
        s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, cell)
    };

    let on_path = GridCell::new(0, 1);
    assert_eq!(
        place(&mut s, on_path),
        Err(Rejection::InvalidPlacement {
            cell: on_path,
            reason: PlacementError::OnPath
        })
    );
    let rock = GridCell::new(2, 0);
    assert!(matches!(
        place(&mut s, rock),
        Err(Rejection::InvalidPlacement {
            reason: PlacementError::Obstacle,
            ..
        })
    ));
    assert!(matches!(
        place(&mut s, GridCell::new(-1, 0)),
        Err(Rejection::InvalidPlacement {
            reason: PlacementError::OutOfBounds,
            ..
        })
    ));
    place(&mut s, OPEN_CELL).unwrap();
    assert!(matches!(
        place(&mut s, OPEN_CELL),
        Err(Rejection::InvalidPlacement {
            reason: PlacementError::Occupied,
            ..
        })
    ));
    assert_eq!(s.economy().money, 200);
}

#[test]
fn insufficient_funds_leave_money_untouched() {
    let mut s = session();
    let result = s.place_tower(
        TowerBuild::Standard(TowerType::Blaster),
        blaster(),
        400,
        OPEN_CELL,
    );
    assert_eq!(
        result,
        Err(Rejection::InsufficientFunds {
            needed: 400,
            available: 250
        })
    );
    assert_eq!(s.economy().money, 250);
    assert_eq!(s.tower_count(), 0);
}

#[test]
fn upgrade_and_sell() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();

    assert_eq!(s.upgrade_tower(OPEN_CELL), Ok((2, 45)));
    let tower = s.tower_at(OPEN_CELL).unwrap();
    assert_eq!(tower.stats.damage, 20.0);
    assert!((tower.stats.range - 3.65).abs() < 1e-9);
    assert_eq!(s.economy().money, 250 - 50 - 45);

    // Refund is based on the placement cost only.
    assert_eq!(s.sell_tower(OPEN_CELL), Ok(32));
    assert_eq!(s.tower_count(), 0);
    assert_eq!(s.sell_tower(OPEN_CELL), Err(Rejection::NoTower { cell: OPEN_CELL }));
}

#[test]
fn cleared_obstacle_becomes_buildable() {
    let mut s = session();
    let rock = GridCell::new(2, 0);
    assert_eq!(s.clear_obstacle(rock), Ok(OBSTACLE_CLEAR_COST));
    assert_eq!(
        s.clear_obstacle(rock),
        Err(Rejection::NotAnObstacle { cell: rock })
    );
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, rock)
        .unwrap();
}

// ---- Waves ----

#[test]
fn start_wave_needs_minimum_towers() {
    let mut s = session();
    assert_eq!(
        s.start_wave(),
        Err(Rejection::WaveRequirementUnmet {
            required: 1,
            placed: 0
        })
    );
    assert_eq!(s.phase(), GamePhase::Build);
    assert_eq!(s.wave_number(), 0);
}

#[test]
fn spawned_enemies_follow_the_path() {
    let mut s = session_with(0, 20);
    s.start_wave().unwrap();
    s.step(DT);
    assert_eq!(s.enemy_count(), 1);
    let first = s.enemies[0];
    let t0 = s.world.get::<&PathFollower>(first).unwrap().t;
    for _ in 0..10 {
        s.step(DT);
    }
    let t1 = s.world.get::<&PathFollower>(first).unwrap().t;
    assert!(t1 > t0);
    assert_eq!(s.pools().stats(VisualKind::Enemy).outstanding, s.enemy_count());
}

#[test]
fn frozen_enemies_stand_still() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.3, 50.0, 0.0);
    s.world.get::<&mut StatusEffects>(enemy).unwrap().freeze = 1.0;
    s.step(0.5);
    assert_eq!(s.world.get::<&PathFollower>(enemy).unwrap().t, 0.3);
    assert!((s.world.get::<&StatusEffects>(enemy).unwrap().freeze - 0.5).abs() < 1e-12);
}

#[test]
fn poison_ticks_through_shield() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.3, 50.0, 20.0);
    s.world.get::<&mut StatusEffects>(enemy).unwrap().poison = 5.0;
    s.step(0.5);
    let v = vitals(&s, enemy);
    assert_eq!(v.shield, 20.0);
    assert!((v.hp - (50.0 - 6.5 * 0.5)).abs() < 1e-9);
}

#[test]
fn burn_scales_with_stacks_until_it_expires() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.3, 100.0, 0.0);
    {
        let mut status = s.world.get::<&mut StatusEffects>(enemy).unwrap();
        status.burn = 0.6;
        status.burn_stacks = 2.8;
    }

    enemies::run(&mut s, 0.5);
    let after_first = 100.0 - BURN_DPS_PER_STACK * 2.8 * 0.5;
    assert!((vitals(&s, enemy).hp - after_first).abs() < 1e-9);

    // Only the last 0.1 s of burn remains.
    enemies::run(&mut s, 0.5);
    let after_second = after_first - BURN_DPS_PER_STACK * 2.8 * 0.1;
    assert!((vitals(&s, enemy).hp - after_second).abs() < 1e-9);
    assert_eq!(s.world.get::<&StatusEffects>(enemy).unwrap().burn_stacks, 0.0);
}

#[test]
fn damage_over_time_ignores_armor_and_shield() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.3, 100.0, 20.0);
    s.world.get::<&mut Vitals>(enemy).unwrap().armor = 0.5;
    {
        let mut status = s.world.get::<&mut StatusEffects>(enemy).unwrap();
        status.poison = 5.0;
        status.burn = 3.0;
        status.burn_stacks = 1.4;
    }

    enemies::run(&mut s, 0.5);

    let v = vitals(&s, enemy);
    let expected = 100.0 - POISON_DPS * 0.5 - BURN_DPS_PER_STACK * 1.4 * 0.5;
    assert!((v.hp - expected).abs() < 1e-9);
    assert_eq!(v.shield, 20.0);
}

#[test]
fn running_out_of_lives_ends_the_session() {
    let mut s = session_with(1, 1);
    spawn_at(&mut s, 0.9999, 50.0, 0.0);

    s.step(DT);

    assert!(s.is_game_over());
    assert_eq!(s.enemy_count(), 0);
    assert_eq!(s.economy().lives, 0);
    let notes = s.drain_notifications();
    assert!(notes.contains(&Notification::Defeat { wave: 0 }));
    assert_eq!(
        s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL),
        Err(Rejection::SessionOver)
    );

    // Nothing moves after defeat.
    let late = spawn_at(&mut s, 0.5, 50.0, 0.0);
    s.step(DT);
    assert_eq!(s.world.get::<&PathFollower>(late).unwrap().t, 0.5);
}

#[test]
fn boss_leak_costs_four_lives() {
    let mut s = session();
    let enemy = spawn_at(&mut s, 0.9999, 50.0, 0.0);
    s.world.get::<&mut rampart_core::components::Enemy>(enemy).unwrap().rank = EnemyRank::Boss;
    s.step(DT);
    assert_eq!(s.economy().lives, 16);
    assert!(!s.is_game_over());
}

// ---- Storms ----

#[test]
fn abilities_need_a_running_wave() {
    let mut s = session();
    assert_eq!(
        storms::cast(&mut s, AbilityKind::Freeze),
        Err(Rejection::BuildPhaseActive)
    );
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    s.start_wave().unwrap();
    storms::cast(&mut s, AbilityKind::Freeze).unwrap();
    assert!(matches!(
        storms::cast(&mut s, AbilityKind::Freeze),
        Err(Rejection::AbilityOnCooldown { .. })
    ));
    assert_eq!(storm_count(&s), 1);
}

#[test]
fn freeze_storm_touches_each_enemy_once() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    s.start_wave().unwrap();
    let enemy = spawn_at(&mut s, 0.97, 50.0, 0.0);
    storms::cast(&mut s, AbilityKind::Freeze).unwrap();

    storms::run(&mut s, 0.1);
    assert_eq!(
        s.world.get::<&StatusEffects>(enemy).unwrap().freeze,
        FREEZE_STORM_SECS
    );

    // The head is still near the enemy; a second touch must not refresh it.
    s.world.get::<&mut StatusEffects>(enemy).unwrap().freeze = 0.1;
    storms::run(&mut s, 0.01);
    assert_eq!(s.world.get::<&StatusEffects>(enemy).unwrap().freeze, 0.1);

    for _ in 0..10 {
        storms::run(&mut s, 0.1);
    }
    assert_eq!(storm_count(&s), 0);
    assert_eq!(s.pools().stats(VisualKind::Storm).outstanding, 0);
}

#[test]
fn nuclear_storm_hits_hard() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    s.start_wave().unwrap();
    spawn_at(&mut s, 0.5, 300.0, 0.0);
    storms::cast(&mut s, AbilityKind::Nuclear).unwrap();
    for _ in 0..9 {
        storms::run(&mut s, 0.1);
    }
    // Only the test enemy is live; the wave has not spawned anything yet.
    assert_eq!(s.enemy_count(), 0);
    assert_eq!(s.economy().money, 200 + 12);
}

#[test]
fn overclock_storm_is_consumed_by_first_touch() {
    let mut s = session();
    s.place_tower(TowerBuild::Standard(TowerType::Blaster), blaster(), 50, OPEN_CELL)
        .unwrap();
    s.start_wave().unwrap();
    spawn_at(&mut s, 0.99, 50.0, 0.0);
    spawn_at(&mut s, 0.98, 50.0, 0.0);
    storms::cast(&mut s, AbilityKind::Overclock).unwrap();

    storms::run(&mut s, 0.05);

    assert_eq!(s.overclock_remaining(), OVERCLOCK_SECS);
    assert_eq!(storm_count(&s), 0);
}

// ---- Engine ----

fn engine() -> SimulationEngine {
    SimulationEngine::headless(SimConfig::default()).unwrap()
}

fn select(world: u32, level: u32) -> PlayerCommand {
    PlayerCommand::SelectLevel {
        world,
        level,
        mode: GameMode::Campaign,
    }
}

fn place_blaster(cell: GridCell) -> PlayerCommand {
    PlayerCommand::PlaceTower {
        build: TowerBuild::Standard(TowerType::Blaster),
        cell,
    }
}

#[test]
fn determinism_same_seed() {
    let script = [
        select(1, 1),
        place_blaster(OPEN_CELL),
        place_blaster(GridCell::new(3, 4)),
        PlayerCommand::StartWave,
    ];
    let mut a = SimulationEngine::headless(SimConfig {
        seed: 777,
        ..Default::default()
    })
    .unwrap();
    let mut b = SimulationEngine::headless(SimConfig {
        seed: 777,
        ..Default::default()
    })
    .unwrap();
    a.queue_commands(script.clone());
    b.queue_commands(script);

    for _ in 0..900 {
        let snap_a = serde_json::to_string(&a.tick(DT)).unwrap();
        let snap_b = serde_json::to_string(&b.tick(DT)).unwrap();
        assert_eq!(snap_a, snap_b, "snapshots diverged with the same seed");
    }
}

#[test]
fn commands_without_level_are_rejected() {
    let mut e = engine();
    assert_eq!(
        e.execute(PlayerCommand::StartWave),
        Err(Rejection::NoActiveLevel)
    );
    assert_eq!(
        e.drain_notifications(),
        vec![Notification::ActionRejected {
            reason: Rejection::NoActiveLevel
        }]
    );
}

#[test]
fn pause_freezes_time() {
    let mut e = engine();
    e.execute(select(1, 1)).unwrap();
    e.execute(place_blaster(OPEN_CELL)).unwrap();
    e.execute(PlayerCommand::StartWave).unwrap();
    e.tick(DT);
    e.execute(PlayerCommand::Pause).unwrap();
    let before = e.snapshot();
    for _ in 0..30 {
        e.tick(DT);
    }
    let after = e.snapshot();
    assert_eq!(before.time.tick, after.time.tick);
    assert_eq!(
        serde_json::to_string(&before.enemies).unwrap(),
        serde_json::to_string(&after.enemies).unwrap()
    );
    e.execute(PlayerCommand::Resume).unwrap();
    e.tick(DT);
    assert_eq!(e.time().tick, before.time.tick + 1);
}

#[test]
fn frame_delta_is_clamped_then_scaled() {
    let mut e = engine();
    e.execute(select(1, 1)).unwrap();
    assert_eq!(
        e.execute(PlayerCommand::SetSpeed { multiplier: 5 }),
        Err(Rejection::InvalidSpeed(5))
    );
    e.execute(PlayerCommand::SetSpeed { multiplier: 2 }).unwrap();
    e.tick(1.0);
    assert!((e.time().elapsed_secs - 0.1).abs() < 1e-12);
}

#[test]
fn locked_content_is_rejected() {
    let mut e = engine();
    assert_eq!(
        e.execute(select(1, 2)),
        Err(Rejection::LevelLocked { world: 1, level: 2 })
    );
    assert_eq!(
        e.execute(select(9, 1)),
        Err(Rejection::UnknownLevel { world: 9, level: 1 })
    );
    assert_eq!(
        e.execute(PlayerCommand::SelectLevel {
            world: 1,
            level: 1,
            mode: GameMode::Endless
        }),
        Err(Rejection::ModeLocked(GameMode::Endless))
    );
    e.execute(select(1, 1)).unwrap();
    assert_eq!(
        e.execute(PlayerCommand::PlaceTower {
            build: TowerBuild::Standard(TowerType::Sniper),
            cell: OPEN_CELL
        }),
        Err(Rejection::TowerLocked(TowerType::Sniper))
    );
    assert_eq!(
        e.execute(PlayerCommand::UseAbility {
            ability: AbilityKind::Poison
        }),
        Err(Rejection::AbilityLocked(AbilityKind::Poison))
    );
    assert_eq!(
        e.execute(PlayerCommand::SaveCustomBuild {
            modules: vec![ModuleKind::Kinetic, ModuleKind::Kinetic]
        }),
        Err(Rejection::CustomBuildsLocked)
    );
    assert!(matches!(
        e.execute(PlayerCommand::PurchaseMetaUpgrade {
            track: MetaTrack::Damage
        }),
        Err(Rejection::InsufficientUpgradePoints { .. })
    ));
}

#[test]
fn missing_map_is_a_config_failure() {
    let mut e = SimulationEngine::new(
        SimConfig::default(),
        Box::new(StaticMaps::new()),
        Box::new(rampart_campaign::MemoryStore::new()),
    )
    .unwrap();
    assert_eq!(
        e.execute(select(1, 1)),
        Err(Rejection::LevelUnavailable { world: 1, level: 1 })
    );
    assert!(e.session().is_none());
}

#[test]
fn completing_a_level_unlocks_progress() {
    let mut campaign = CampaignConfig::default();
    campaign.worlds.truncate(1);
    campaign.worlds[0].levels = 2;
    campaign.worlds[0].waves_per_level = 1;
    let mut e = SimulationEngine::headless(SimConfig { seed: 5, campaign }).unwrap();

    e.execute(select(1, 1)).unwrap();
    e.execute(place_blaster(OPEN_CELL)).unwrap();
    e.execute(PlayerCommand::StartWave).unwrap();
    e.execute(PlayerCommand::SetSpeed { multiplier: 4 }).unwrap();

    let mut notes = Vec::new();
    for _ in 0..2000 {
        let snapshot = e.tick(DT);
        notes.extend(snapshot.notifications);
        if snapshot.phase == GamePhase::LevelComplete {
            break;
        }
        let session = e.session_mut_for_test().unwrap();
        for enemy in session.enemies.clone() {
            combat::kill_enemy(session, enemy);
        }
    }

    assert_eq!(e.session().unwrap().phase(), GamePhase::LevelComplete);
    assert!(notes.contains(&Notification::WaveCleared { wave: 1 }));
    assert!(notes.contains(&Notification::TowerUnlocked {
        tower: TowerType::Frost
    }));
    let level_complete = notes
        .iter()
        .find_map(|n| match n {
            Notification::LevelComplete { reward, .. } => Some(reward.clone()),
            _ => None,
        })
        .unwrap();
    assert!(level_complete.first_completion);
    assert_eq!(level_complete.credits, LEVEL_REWARD_CREDITS);
    assert_eq!(e.progression().upgrade_points(), LEVEL_REWARD_POINTS);
    assert!(e.progression().is_level_unlocked(2));

    assert_eq!(e.progression().banked_credits(), LEVEL_REWARD_CREDITS);

    // The finished session refuses further play; a new level can be selected.
    assert_eq!(
        e.execute(PlayerCommand::StartWave),
        Err(Rejection::SessionOver)
    );
    assert!(matches!(
        e.execute(select(1, 2)),
        Ok(CommandOutcome::LevelSelected { .. })
    ));
    // The completion reward is spendable in the next level, once.
    assert_eq!(
        e.session().unwrap().economy().money,
        STARTING_MONEY + LEVEL_REWARD_CREDITS
    );
    assert_eq!(e.progression().banked_credits(), 0);
    assert!(matches!(
        e.execute(PlayerCommand::SelectLevel {
            world: 1,
            level: 1,
            mode: GameMode::Endless
        }),
        Ok(_)
    ));
    assert_eq!(e.session().unwrap().economy().money, STARTING_MONEY);
}

/// Engine whose saved progress has level 1 completed, backed by `maps`.
fn engine_after_level_one(maps: StaticMaps) -> SimulationEngine {
    let config = SimConfig::default();
    let mut store = rampart_campaign::MemoryStore::new();
    let mut gate = ProgressionGate::new(config.campaign.final_level());
    gate.complete_level(1);
    gate.save(&mut store).unwrap();
    SimulationEngine::new(config, Box::new(maps), Box::new(store)).unwrap()
}

#[test]
fn refused_selection_keeps_banked_credits() {
    let mut e = engine_after_level_one(StaticMaps::new());
    assert_eq!(e.progression().banked_credits(), LEVEL_REWARD_CREDITS);

    assert_eq!(
        e.execute(select(1, 2)),
        Err(Rejection::LevelUnavailable { world: 1, level: 2 })
    );
    assert_eq!(e.progression().banked_credits(), LEVEL_REWARD_CREDITS);
}

#[test]
fn cleared_obstacles_persist_across_sessions() {
    let mut e = engine();
    e.execute(select(1, 1)).unwrap();
    let rock = GridCell::new(2, 0);
    e.execute(PlayerCommand::ClearObstacle { cell: rock }).unwrap();
    assert!(e.progression().cleared_obstacles(1).contains(&rock));

    e.execute(select(1, 1)).unwrap();
    assert_eq!(e.session().unwrap().economy().money, STARTING_MONEY);
    assert!(matches!(
        e.execute(place_blaster(rock)),
        Ok(CommandOutcome::TowerPlaced { cost: 50, .. })
    ));
}

#[test]
fn restarting_a_level_recycles_visuals() {
    let mut e = engine();
    e.execute(select(1, 1)).unwrap();
    e.execute(place_blaster(OPEN_CELL)).unwrap();
    e.execute(PlayerCommand::StartWave).unwrap();
    for _ in 0..60 {
        e.tick(DT);
    }
    assert!(e.session().unwrap().enemy_count() > 0);

    e.execute(select(1, 1)).unwrap();
    let pools = e.session().unwrap().pools();
    assert_eq!(pools.stats(VisualKind::Enemy).outstanding, 0);
    assert!(pools.stats(VisualKind::Enemy).available > 0);
}

#[derive(Clone, Default)]
struct SharedVisuals(Arc<Mutex<HeadlessVisuals>>);

impl SharedVisuals {
    fn live(&self) -> usize {
        self.0.lock().unwrap().live()
    }
}

impl VisualProvider for SharedVisuals {
    fn acquire(&mut self, kind: VisualKind) -> VisualHandle {
        self.0.lock().unwrap().acquire(kind)
    }

    fn release(&mut self, handle: VisualHandle) {
        self.0.lock().unwrap().release(handle);
    }
}

fn run_first_wave(e: &mut SimulationEngine) {
    e.execute(select(1, 1)).unwrap();
    e.execute(place_blaster(OPEN_CELL)).unwrap();
    e.execute(PlayerCommand::StartWave).unwrap();
    for _ in 0..60 {
        e.tick(DT);
    }
}

#[test]
fn dropping_the_engine_returns_every_visual() {
    let visuals = SharedVisuals::default();
    let mut e = engine();
    e.set_visual_provider(Box::new(visuals.clone()));
    run_first_wave(&mut e);
    assert!(visuals.live() > 0);

    // Restarting keeps the handles pooled rather than released.
    e.execute(select(1, 1)).unwrap();
    assert!(visuals.live() > 0);

    drop(e);
    assert_eq!(visuals.live(), 0);
}

#[test]
fn provider_swapped_mid_level_takes_over_on_restart() {
    let first = SharedVisuals::default();
    let second = SharedVisuals::default();
    let mut e = engine();
    e.set_visual_provider(Box::new(first.clone()));
    run_first_wave(&mut e);
    assert!(first.live() > 0);

    e.set_visual_provider(Box::new(second.clone()));
    run_first_wave(&mut e);

    assert_eq!(first.live(), 0);
    assert!(second.live() > 0);
}

#[test]
fn replacing_an_idle_provider_releases_its_handles() {
    let first = SharedVisuals::default();
    let mut maps = StaticMaps::new();
    maps.insert(1, LevelMap::serpentine(12, 8));
    let mut e = engine_after_level_one(maps);
    e.set_visual_provider(Box::new(first.clone()));
    run_first_wave(&mut e);
    // A level without a map ends the session and parks its pools.
    assert!(e.execute(select(1, 2)).is_err());
    assert!(e.session().is_none());
    assert!(first.live() > 0);

    e.set_visual_provider(Box::new(SharedVisuals::default()));
    assert_eq!(first.live(), 0);
}

#[test]
fn ability_readiness_follows_unlocks_and_cooldown() {
    let mut e = engine();
    assert!(!e.is_ability_ready(AbilityKind::Freeze));

    e.execute(select(1, 1)).unwrap();
    assert!(e.is_ability_ready(AbilityKind::Freeze));
    assert!(!e.is_ability_ready(AbilityKind::Nuclear));

    e.execute(place_blaster(OPEN_CELL)).unwrap();
    e.execute(PlayerCommand::StartWave).unwrap();
    e.execute(PlayerCommand::UseAbility {
        ability: AbilityKind::Freeze,
    })
    .unwrap();
    assert!(!e.is_ability_ready(AbilityKind::Freeze));
}
