//! Simulation constants and tuning parameters.

use crate::enums::{AbilityKind, TowerType};

// --- Frame timing ---

/// Nominal driver tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per nominal tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Upper bound on a single frame delta before speed scaling (seconds).
pub const MAX_FRAME_DT: f64 = 0.05;

/// Slowest speed multiplier.
pub const MIN_SPEED_MULTIPLIER: u8 = 1;

/// Fastest speed multiplier.
pub const MAX_SPEED_MULTIPLIER: u8 = 4;

// --- Phases ---

/// Between-wave countdown that auto-starts the next wave (seconds).
pub const BUILD_COUNTDOWN_SECS: f64 = 5.0;

/// Towers that must be placed before an explicit wave start is accepted.
pub const DEFAULT_MIN_TOWERS_TO_START: u32 = 1;

// --- Waves ---

/// Spawn interval between ordinary enemies (seconds).
pub const SPAWN_INTERVAL_SECS: f64 = 0.45;

/// Spawn interval preceding a boss (seconds).
pub const BOSS_SPAWN_INTERVAL_SECS: f64 = 1.4;

/// Every Nth wave ends with a boss.
pub const BOSS_WAVE_PERIOD: u32 = 5;

/// Enemy count of wave zero before the ramp.
pub const WAVE_BASE_COUNT: u32 = 8;

/// Extra enemies per wave before the ramp.
pub const WAVE_COUNT_SLOPE: f64 = 1.6;

/// Divisor of both wave-progress terms.
pub const RAMP_WAVE_DIVISOR: f64 = 12.0;

/// Wave number at which the second wave-progress term stops growing.
pub const RAMP_WAVE_TERM_CAP: u32 = 10;

/// Ceiling on combined wave progress.
pub const RAMP_WAVE_PROGRESS_CAP: f64 = 2.1;

/// Overall ramp multiplier applied to both count and hp.
pub const RAMP_BASE: f64 = 2.0;

pub const RAMP_COUNT_LEVEL_WEIGHT: f64 = 0.65;
pub const RAMP_COUNT_WAVE_WEIGHT: f64 = 0.22;
pub const RAMP_HP_LEVEL_WEIGHT: f64 = 0.82;
pub const RAMP_HP_WAVE_WEIGHT: f64 = 0.28;

/// Speed gained by every enemy per wave number (units/s).
pub const WAVE_SPEED_GAIN: f64 = 0.012;

// --- Status effects ---

/// Poison damage per second, ignoring armor.
pub const POISON_DPS: f64 = 6.5;

/// Burn damage per second per stack, ignoring armor.
pub const BURN_DPS_PER_STACK: f64 = 2.2;

/// Burn stacks added by each flame hit.
pub const FLAME_BURN_STACKS: f64 = 1.4;

/// Burn duration refreshed by a flame hit (seconds).
pub const BURN_DURATION_SECS: f64 = 3.0;

/// Duration of a projectile slow (seconds).
pub const SLOW_DURATION_SECS: f64 = 1.5;

/// Freeze applied by a successful freeze-chance roll (seconds).
pub const FREEZE_CHANCE_DURATION_SECS: f64 = 0.8;

// --- Economy ---

/// Money awarded for an ordinary kill.
pub const KILL_REWARD: u32 = 12;

/// Money awarded for a boss kill.
pub const BOSS_KILL_REWARD: u32 = 70;

/// Upgrade points awarded for a boss kill.
pub const BOSS_UPGRADE_POINTS: u32 = 1;

/// Lives lost when an ordinary enemy leaks.
pub const LEAK_PENALTY: u32 = 1;

/// Lives lost when a boss leaks.
pub const BOSS_LEAK_PENALTY: u32 = 4;

/// Money at the start of a level before meta upgrades.
pub const STARTING_MONEY: u32 = 250;

/// Lives at the start of a level before meta upgrades.
pub const STARTING_LIVES: u32 = 20;

/// Starting money added per Economy meta level.
pub const ECONOMY_MONEY_PER_LEVEL: u32 = 20;

/// Starting lives added per Fortitude meta level.
pub const FORTITUDE_LIVES_PER_LEVEL: u32 = 2;

/// Score bonus per cleared wave, multiplied by the wave number.
pub const WAVE_CLEAR_SCORE: u64 = 25;

/// Money credited on level completion.
pub const LEVEL_REWARD_CREDITS: u32 = 150;

/// Upgrade points credited on level completion.
pub const LEVEL_REWARD_POINTS: u32 = 2;

/// Cost of clearing one obstacle cell.
pub const OBSTACLE_CLEAR_COST: u32 = 40;

/// Base of the meta-upgrade cost (`base + current level`).
pub const META_UPGRADE_BASE_COST: u32 = 2;

// --- Towers ---

/// Range gained per tower level above 1.
pub const TOWER_RANGE_PER_LEVEL: f64 = 0.45;

/// Cooldown removed per tower level above 1 (seconds).
pub const TOWER_RATE_PER_LEVEL: f64 = 0.07;

/// Floor on any tower cooldown (seconds).
pub const MIN_TOWER_COOLDOWN: f64 = 0.12;

/// Cooldown multiplier while overclock is active.
pub const OVERCLOCK_COOLDOWN_FACTOR: f64 = 0.62;

/// Damage bonus per Damage meta level.
pub const META_DAMAGE_PER_LEVEL: f64 = 0.1;

/// Upgrade cost per current tower level.
pub const UPGRADE_COST_PER_LEVEL: u32 = 45;

/// Fraction of the placement cost refunded on sale.
pub const SELL_REFUND_RATIO: f64 = 0.65;

/// Damage falloff per chain hop.
pub const CHAIN_DAMAGE_FALLOFF: f64 = 0.7;

/// Armor ignored per pierce stack.
pub const PIERCE_ARMOR_PER_STACK: f64 = 0.15;

/// Damage multiplier of shock hits against shielded enemies.
pub const SHOCK_DAMAGE_FACTOR: f64 = 1.25;

/// Damage multiplier of shatter hits against frozen enemies.
pub const SHATTER_DAMAGE_FACTOR: f64 = 1.35;

/// Pulse splash radius around the impact point.
pub const PULSE_RADIUS: f64 = 1.0;

/// Fraction of hit damage dealt by the pulse splash.
pub const PULSE_DAMAGE_FACTOR: f64 = 0.4;

/// Unlock order of catalog towers.
pub const TOWER_UNLOCK_ORDER: [TowerType; 6] = [
    TowerType::Blaster,
    TowerType::Frost,
    TowerType::Cannon,
    TowerType::Flame,
    TowerType::Tesla,
    TowerType::Sniper,
];

// --- Custom towers ---

pub const CUSTOM_BASE_DAMAGE: f64 = 12.0;
pub const CUSTOM_BASE_RANGE: f64 = 5.4;
pub const CUSTOM_BASE_RATE: f64 = 0.72;
pub const CUSTOM_PROJECTILE_SPEED: f64 = 10.0;

/// Fixed part of every custom tower's cost.
pub const CUSTOM_BASE_COST: f64 = 56.0;

/// Duplicate premium per module kind: `count² × this` for counts above 1.
pub const CUSTOM_DUPLICATE_PREMIUM: f64 = 7.0;

/// Synergy premium per granted effect, chain stack, and pierce stack.
pub const CUSTOM_SYNERGY_PREMIUM: f64 = 6.0;

/// Cost tier step per module beyond the second.
pub const CUSTOM_TIER_STEP: f64 = 0.14;

pub const MIN_MODULES: usize = 2;
pub const MAX_MODULES: usize = 5;

/// High-water mark required before custom builds may be saved or placed.
pub const CUSTOM_BUILDS_UNLOCK_LEVEL: u32 = 4;

// --- Abilities ---

/// Time for a storm to travel the whole path (seconds).
pub const STORM_TRAVEL_SECS: f64 = 0.8;

/// Touch radius of a storm head, added to the enemy size.
pub const STORM_TOUCH_RADIUS: f64 = 0.5;

/// Largest distance the storm head moves between touch samples (world units).
pub const STORM_SAMPLE_STEP: f64 = 0.25;

/// Freeze duration guaranteed by a freeze storm (seconds).
pub const FREEZE_STORM_SECS: f64 = 2.5;

/// Poison duration guaranteed by a poison storm (seconds).
pub const POISON_STORM_SECS: f64 = 5.0;

/// Explosive damage dealt by a nuclear storm.
pub const NUCLEAR_DAMAGE: f64 = 400.0;

/// Overclock buff window (seconds).
pub const OVERCLOCK_SECS: f64 = 8.0;

/// Abilities and the high-water mark that unlocks each.
pub const ABILITY_UNLOCKS: [(AbilityKind, u32); 4] = [
    (AbilityKind::Freeze, 1),
    (AbilityKind::Poison, 3),
    (AbilityKind::Overclock, 5),
    (AbilityKind::Nuclear, 8),
];

// --- Persistence keys ---

pub const META_PROGRESS_KEY: &str = "meta_progress";
pub const CAMPAIGN_PROGRESS_KEY: &str = "campaign_progress";
pub const FEATURE_UNLOCKS_KEY: &str = "feature_unlocks";
