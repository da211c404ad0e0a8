//! Wave composition and the difficulty ramp.

use rand::Rng;

use rampart_core::config::{CampaignConfig, WorldConfig};
use rampart_core::constants::*;
use rampart_core::enums::{EnemyArchetype, EnemyRank, GameMode};
use rampart_core::profiles::{enemy_profile, mode_scale};
use rampart_core::types::LevelRef;

/// Count and hp multipliers for a level/wave pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub count: f64,
    pub hp: f64,
}

/// Enemies in a wave before ramp and boost.
pub fn base_count(wave: u32) -> f64 {
    WAVE_BASE_COUNT as f64 + (wave as f64 * WAVE_COUNT_SLOPE).floor()
}

/// Difficulty ramp. The wave term counts the wave twice (once uncapped, once
/// capped at ten) before the overall cap.
pub fn ramp(global_level: u32, final_level: u32, wave: u32) -> Ramp {
    let level_progress = if final_level > 1 {
        (global_level.saturating_sub(1)) as f64 / (final_level - 1) as f64
    } else {
        0.0
    };
    let wave_progress = (wave as f64 / RAMP_WAVE_DIVISOR
        + wave.min(RAMP_WAVE_TERM_CAP) as f64 / RAMP_WAVE_DIVISOR)
        .min(RAMP_WAVE_PROGRESS_CAP);
    Ramp {
        count: RAMP_BASE
            * (1.0
                + level_progress * RAMP_COUNT_LEVEL_WEIGHT
                + wave_progress * RAMP_COUNT_WAVE_WEIGHT),
        hp: RAMP_BASE
            * (1.0 + level_progress * RAMP_HP_LEVEL_WEIGHT + wave_progress * RAMP_HP_WAVE_WEIGHT),
    }
}

/// One enemy to issue, `delay` seconds after the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOrder {
    pub archetype: EnemyArchetype,
    pub rank: EnemyRank,
    pub delay: f64,
}

/// Spawn list for a wave.
#[derive(Debug, Clone, PartialEq)]
pub struct WavePlan {
    pub wave: u32,
    pub spawns: Vec<SpawnOrder>,
}

/// Scaled stats for a freshly spawned enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub hp: f64,
    pub shield: f64,
    pub speed: f64,
    pub armor: f64,
    pub size: f64,
    pub flying: bool,
}

/// Plans waves for one level of one world.
#[derive(Debug, Clone)]
pub struct WaveDirector {
    level: LevelRef,
    final_level: u32,
    mode: GameMode,
    world: WorldConfig,
}

impl WaveDirector {
    /// `None` if the level does not exist in the table.
    pub fn new(config: &CampaignConfig, level: LevelRef, mode: GameMode) -> Option<Self> {
        let world = config.world(level.world)?.clone();
        Some(Self {
            level,
            final_level: config.final_level(),
            mode,
            world,
        })
    }

    pub fn level(&self) -> LevelRef {
        self.level
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    pub fn ramp(&self, wave: u32) -> Ramp {
        ramp(self.level.global, self.final_level, wave)
    }

    pub fn wave_size(&self, wave: u32) -> u32 {
        let size = base_count(wave) * self.ramp(wave).count * self.world.boost;
        size.ceil() as u32
    }

    /// Whether clearing `wave` completes the level. Endless never completes.
    pub fn is_final_wave(&self, wave: u32) -> bool {
        self.mode != GameMode::Endless && wave >= self.world.waves_per_level
    }

    /// Build the spawn list for a wave. Archetypes are drawn uniformly from
    /// the world's roster; every fifth wave ends with a boss.
    pub fn compose<R: Rng>(&self, wave: u32, rng: &mut R) -> WavePlan {
        let size = self.wave_size(wave);
        let boss_wave = wave > 0 && wave % BOSS_WAVE_PERIOD == 0;
        let final_boss = self.mode == GameMode::FinalBoss && self.is_final_wave(wave);

        let mut spawns = Vec::with_capacity(size as usize);
        for index in 0..size {
            let last = index + 1 == size;
            let (archetype, rank) = if last && final_boss {
                (EnemyArchetype::Tank, EnemyRank::FinalBoss)
            } else if last && boss_wave {
                (EnemyArchetype::Tank, EnemyRank::Boss)
            } else {
                (self.pick_archetype(rng), EnemyRank::Normal)
            };
            let delay = if index == 0 {
                0.0
            } else if rank.is_boss() {
                BOSS_SPAWN_INTERVAL_SECS
            } else {
                SPAWN_INTERVAL_SECS
            };
            spawns.push(SpawnOrder {
                archetype,
                rank,
                delay,
            });
        }
        WavePlan { wave, spawns }
    }

    fn pick_archetype<R: Rng>(&self, rng: &mut R) -> EnemyArchetype {
        match self.world.archetypes.len() {
            0 => EnemyArchetype::Runner,
            len => self.world.archetypes[rng.gen_range(0..len)],
        }
    }

    /// Stats for an enemy spawned during `wave`.
    pub fn enemy_stats(&self, archetype: EnemyArchetype, rank: EnemyRank, wave: u32) -> EnemyStats {
        let profile = enemy_profile(archetype, rank);
        let scale =
            self.world.hp_mult * mode_scale(self.mode) * self.ramp(wave).hp * self.world.boost;
        EnemyStats {
            hp: profile.hp * scale,
            shield: profile.shield * scale,
            speed: profile.speed + wave as f64 * WAVE_SPEED_GAIN + self.world.speed_bonus,
            armor: self.world.armor,
            size: profile.size,
            flying: profile.flying,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn director(world: u32, level: u32, mode: GameMode) -> WaveDirector {
        let config = CampaignConfig::default();
        let level = config.resolve(world, level).unwrap();
        WaveDirector::new(&config, level, mode).unwrap()
    }

    #[test]
    fn ramp_reproduces_overlapping_wave_terms() {
        let r = ramp(1, 20, 6);
        // 6/12 + 6/12 = 1.0
        assert!((r.count - 2.0 * (1.0 + 0.22)).abs() < 1e-12);
        assert!((r.hp - 2.0 * (1.0 + 0.28)).abs() < 1e-12);

        let capped = ramp(20, 20, 40);
        assert!((capped.count - 2.0 * (1.0 + 0.65 + 2.1 * 0.22)).abs() < 1e-12);
    }

    #[test]
    fn ramp_ignores_level_when_single_level() {
        assert_eq!(ramp(1, 1, 0), ramp(5, 1, 0));
    }

    #[test]
    fn first_wave_size() {
        let d = director(1, 1, GameMode::Campaign);
        // base 9, count 2 * (1 + 0.22 * (2/12)) = 2.0733.., boost 1.0
        assert_eq!(d.wave_size(1), 19);
    }

    #[test]
    fn boss_closes_every_fifth_wave() {
        let d = director(1, 1, GameMode::Campaign);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let plan = d.compose(5, &mut rng);
        let last = plan.spawns.last().unwrap();
        assert_eq!(last.rank, EnemyRank::Boss);
        assert_eq!(last.archetype, EnemyArchetype::Tank);
        assert_eq!(last.delay, BOSS_SPAWN_INTERVAL_SECS);
        assert_eq!(plan.spawns[0].delay, 0.0);
        assert!(plan.spawns[..plan.spawns.len() - 1]
            .iter()
            .all(|s| s.rank == EnemyRank::Normal && s.delay <= SPAWN_INTERVAL_SECS));

        let plan = d.compose(4, &mut rng);
        assert!(plan.spawns.iter().all(|s| s.rank == EnemyRank::Normal));
    }

    #[test]
    fn normal_spawns_come_from_world_roster() {
        let d = director(1, 2, GameMode::Campaign);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let plan = d.compose(3, &mut rng);
        assert!(plan
            .spawns
            .iter()
            .all(|s| matches!(s.archetype, EnemyArchetype::Runner | EnemyArchetype::Tank)));
    }

    #[test]
    fn final_boss_mode_ends_with_final_boss() {
        let d = director(4, 5, GameMode::FinalBoss);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let plan = d.compose(10, &mut rng);
        assert_eq!(plan.spawns.last().unwrap().rank, EnemyRank::FinalBoss);
    }

    #[test]
    fn endless_never_finishes() {
        let d = director(1, 1, GameMode::Endless);
        assert!(!d.is_final_wave(100));
        assert!(director(1, 1, GameMode::Campaign).is_final_wave(10));
    }

    #[test]
    fn enemy_stats_scale_with_world_and_mode() {
        let d = director(1, 1, GameMode::Campaign);
        let stats = d.enemy_stats(EnemyArchetype::Runner, EnemyRank::Normal, 0);
        assert!((stats.hp - 80.0).abs() < 1e-9);
        assert!((stats.speed - 1.7).abs() < 1e-9);

        let endless = director(1, 1, GameMode::Endless);
        let scaled = endless.enemy_stats(EnemyArchetype::Runner, EnemyRank::Normal, 0);
        assert!((scaled.hp - 88.0).abs() < 1e-9);
    }
}
