//! Tower stat derivation, targeting, and firing.

use glam::DVec2;
use hecs::Entity;

use rampart_core::components::{Tower, TowerStats};
use rampart_core::constants::*;
use rampart_core::enums::GamePhase;

use crate::combat::roster_positions;
use crate::session::SimulationSession;
use crate::world_setup;

/// Stats of a tower at `level`, with the damage meta upgrade applied.
pub fn derive_stats(base: &TowerStats, level: u32, meta_damage_level: u32) -> TowerStats {
    let level = level.max(1);
    let steps = (level - 1) as f64;
    TowerStats {
        damage: base.damage * level as f64 * (1.0 + META_DAMAGE_PER_LEVEL * meta_damage_level as f64),
        range: base.range + steps * TOWER_RANGE_PER_LEVEL,
        rate: base.rate - steps * TOWER_RATE_PER_LEVEL,
        ..*base
    }
}

/// Cooldown after a shot. Overclock shortens it.
pub fn cooldown_after_shot(rate: f64, overclocked: bool) -> f64 {
    let buff = if overclocked {
        OVERCLOCK_COOLDOWN_FACTOR
    } else {
        1.0
    };
    (rate * buff).max(MIN_TOWER_COOLDOWN)
}

/// First enemy in roster order within `range` of `origin`.
pub fn acquire_target(origin: DVec2, range: f64, enemies: &[(Entity, DVec2)]) -> Option<Entity> {
    enemies
        .iter()
        .find(|(_, pos)| pos.distance(origin) <= range)
        .map(|(e, _)| *e)
}

/// Tick tower cooldowns and fire at targets while a wave is spawning.
pub fn run(session: &mut SimulationSession, dt: f64) {
    let spawning = session.phase.phase() == GamePhase::Spawning;
    let overclocked = session.overclock_remaining > 0.0;
    let targets = roster_positions(session);
    let mut shots: Vec<(DVec2, Entity, TowerStats)> = Vec::new();

    for &entity in session.towers.values() {
        let Ok(tower) = session.world.query_one_mut::<&mut Tower>(entity) else {
            continue;
        };
        tower.cooldown = (tower.cooldown - dt).max(0.0);
        if !spawning || tower.cooldown > 0.0 {
            continue;
        }
        let origin = tower.cell.center();
        let Some(target) = acquire_target(origin, tower.stats.range, &targets) else {
            continue;
        };
        tower.cooldown = cooldown_after_shot(tower.stats.rate, overclocked);
        shots.push((origin, target, tower.stats));
    }

    for (origin, target, stats) in shots {
        world_setup::spawn_projectile(
            &mut session.world,
            &mut session.pools,
            origin,
            target,
            &stats,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::enums::TowerType;
    use rampart_core::profiles::tower_profile;

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

    #[test]
    fn level_and_meta_scale_stats() {
        let base = blaster();
        let l1 = derive_stats(&base, 1, 0);
        assert_eq!(l1, base);

        let l3 = derive_stats(&base, 3, 2);
        assert!((l3.damage - 10.0 * 3.0 * 1.2).abs() < 1e-9);
        assert!((l3.range - (3.2 + 0.9)).abs() < 1e-9);
        assert!((l3.rate - (0.55 - 0.14)).abs() < 1e-9);
    }

    #[test]
    fn cooldown_has_floor_and_overclock() {
        assert!((cooldown_after_shot(1.0, true) - 0.62).abs() < 1e-12);
        assert_eq!(cooldown_after_shot(1.0, false), 1.0);
        assert_eq!(cooldown_after_shot(0.1, false), MIN_TOWER_COOLDOWN);
    }

    #[test]
    fn targeting_takes_first_in_range_not_nearest() {
        let mut world = hecs::World::new();
        let far = world.spawn(());
        let near = world.spawn(());
        let out = world.spawn(());
        let enemies = vec![
            (out, DVec2::new(10.0, 0.0)),
            (far, DVec2::new(2.5, 0.0)),
            (near, DVec2::new(0.5, 0.0)),
        ];
        assert_eq!(acquire_target(DVec2::ZERO, 3.0, &enemies), Some(far));
        assert_eq!(acquire_target(DVec2::ZERO, 0.1, &enemies), None);
    }
}
