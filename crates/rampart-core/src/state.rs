//! Session state records and the snapshot sent to the frontend each tick.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::components::TowerStats;
use crate::enums::*;
use crate::events::Notification;
use crate::types::{GridCell, LevelRef, SimTime, TowerBuild, TowerId};

/// Wave bookkeeping. Exactly one of `build_phase` / `in_wave` is set
/// while a level is running; neither is set once the level completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveState {
    /// Number of the current (or last) wave; 0 before the first wave.
    pub wave_number: u32,
    /// Spawns not yet issued in the current wave.
    pub remaining_spawns: u32,
    /// Seconds until the next spawn is issued.
    pub spawn_timer: f64,
    pub in_wave: bool,
    pub build_phase: bool,
    /// Seconds until the next wave auto-starts, if counting down.
    pub countdown: Option<f64>,
}

/// Per-session money, lives, and score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyState {
    pub money: u32,
    /// Game over at zero or below.
    pub lives: i32,
    pub score: u64,
    /// Upgrade points earned this session and not yet banked.
    pub upgrade_points: u32,
}

/// Complete session state broadcast after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub paused: bool,
    pub game_over: bool,
    pub speed: u8,
    pub level: Option<LevelView>,
    pub wave: WaveState,
    pub economy: EconomyState,
    /// Banked upgrade points available for meta purchases.
    pub upgrade_points: u32,
    pub overclock_remaining: f64,
    pub abilities: Vec<AbilityView>,
    pub enemies: Vec<EnemyView>,
    pub towers: Vec<TowerView>,
    pub projectiles: Vec<ProjectileView>,
    pub storms: Vec<StormView>,
    /// Notifications emitted since the previous snapshot.
    pub notifications: Vec<Notification>,
}

/// The level being played.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelView {
    pub level: LevelRef,
    pub mode: GameMode,
    pub columns: i32,
    pub rows: i32,
    pub path: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityView {
    pub ability: AbilityKind,
    pub unlocked: bool,
    /// Seconds until the ability can be cast again.
    pub cooldown: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyView {
    /// Stable handle for the frontend (entity bits).
    pub id: u64,
    pub archetype: EnemyArchetype,
    pub rank: EnemyRank,
    pub flying: bool,
    pub position: DVec2,
    pub t: f64,
    pub hp: f64,
    pub max_hp: f64,
    pub shield: f64,
    pub max_shield: f64,
    pub frozen: bool,
    pub poisoned: bool,
    pub burning: bool,
    pub slowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TowerView {
    pub id: TowerId,
    pub build: TowerBuild,
    pub cell: GridCell,
    pub level: u32,
    pub cooldown: f64,
    pub stats: TowerStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileView {
    pub kind: ProjectileKind,
    pub damage_type: DamageType,
    pub position: DVec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StormView {
    pub ability: AbilityKind,
    pub head: DVec2,
    /// Fraction of the path travelled, 0.0 at the exit end.
    pub progress: f64,
    pub touched: u32,
}
