//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Session phase state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Placement and upgrades; no enemies are spawning.
    #[default]
    Build,
    /// Enemies spawn and advance, towers fire.
    Spawning,
    /// Campaign wave count reached; the level is over.
    LevelComplete,
}

/// How a level is played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Fixed wave count per level, ends in `LevelComplete`.
    #[default]
    Campaign,
    /// Waves continue until defeat.
    Endless,
    /// Campaign rules with the final boss closing the last wave.
    FinalBoss,
}

/// Enemy archetypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyArchetype {
    /// Fast and fragile.
    #[default]
    Runner,
    /// Slow with a deep health pool. Bosses use this lineage.
    Tank,
    /// Carries a damage-absorbing shield.
    Shielded,
    /// Airborne.
    Flyer,
}

/// Boss tier of a spawned enemy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyRank {
    #[default]
    Normal,
    Boss,
    FinalBoss,
}

impl EnemyRank {
    /// Final bosses count as bosses for rewards and leak penalties.
    pub fn is_boss(self) -> bool {
        !matches!(self, EnemyRank::Normal)
    }
}

/// Catalog tower types, listed in unlock order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum TowerType {
    #[default]
    Blaster,
    Frost,
    Cannon,
    Flame,
    Tesla,
    Sniper,
}

/// Visual and behavioral kind of a projectile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    #[default]
    Bolt,
    Frost,
    Shell,
    /// Applies burn stacks on every hit.
    Flame,
    Arc,
    Slug,
    Beam,
}

/// Damage-type tag carried by projectiles and storms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Kinetic,
    Cryo,
    Explosive,
    Fire,
    Electric,
    Beam,
}

/// Player abilities delivered by storms.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AbilityKind {
    #[default]
    Freeze,
    Nuclear,
    Overclock,
    Poison,
}

/// Custom tower modules. The derived ordering is the canonical composition order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ModuleKind {
    #[default]
    Kinetic,
    Cryo,
    Arc,
    Explosive,
    Beam,
}

/// Secondary effects a module composition can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecondaryEffect {
    FreezeChance,
    Chain,
    Aoe,
    Pierce,
    Shock,
    Shatter,
    Pulse,
}

/// Permanent upgrade tracks bought with upgrade points.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MetaTrack {
    /// Scales all tower damage.
    #[default]
    Damage,
    /// Raises starting money.
    Economy,
    /// Raises starting lives.
    Fortitude,
}

/// Terrain classification of a grid cell as reported by the path provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Open,
    Path,
    Blocked,
    /// Removable for a fee via `ClearObstacle`.
    Obstacle,
}

/// Why a tower cannot be placed on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementError {
    OutOfBounds,
    OnPath,
    Blocked,
    Obstacle,
    Occupied,
}

/// Pooled visual handle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    Enemy,
    Projectile,
    Storm,
}
