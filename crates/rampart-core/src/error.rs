//! Error types shared by the simulation and campaign crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::*;
use crate::types::{BuildId, GridCell};

/// A command that was refused. The session state is left unchanged.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },
    #[error("insufficient upgrade points: need {needed}, have {available}")]
    InsufficientUpgradePoints { needed: u32, available: u32 },
    #[error("cannot build at ({}, {}): {reason:?}", cell.col, cell.row)]
    InvalidPlacement {
        cell: GridCell,
        reason: PlacementError,
    },
    #[error("no tower at ({}, {})", cell.col, cell.row)]
    NoTower { cell: GridCell },
    #[error("cell ({}, {}) holds no obstacle", cell.col, cell.row)]
    NotAnObstacle { cell: GridCell },
    #[error("{0:?} towers are locked")]
    TowerLocked(TowerType),
    #[error("custom builds are locked")]
    CustomBuildsLocked,
    #[error("unknown custom build {0:?}")]
    UnknownBuild(BuildId),
    #[error("custom builds take 2 to 5 modules, got {0}")]
    InvalidModuleCount(usize),
    #[error("level {world}-{level} is locked")]
    LevelLocked { world: u32, level: u32 },
    #[error("level {world}-{level} does not exist")]
    UnknownLevel { world: u32, level: u32 },
    #[error("level {world}-{level} cannot be played: its map is missing or malformed")]
    LevelUnavailable { world: u32, level: u32 },
    #[error("{0:?} mode is locked")]
    ModeLocked(GameMode),
    #[error("starting a wave needs {required} towers, {placed} placed")]
    WaveRequirementUnmet { required: u32, placed: u32 },
    #[error("a wave is already in progress")]
    WaveInProgress,
    #[error("{0:?} is locked")]
    AbilityLocked(AbilityKind),
    #[error("{ability:?} is cooling down for {remaining:.1}s")]
    AbilityOnCooldown { ability: AbilityKind, remaining: f64 },
    #[error("abilities cannot be used during the build phase")]
    BuildPhaseActive,
    #[error("no wave is in progress")]
    NoWaveInProgress,
    #[error("no level is active")]
    NoActiveLevel,
    #[error("the session is over")]
    SessionOver,
    #[error("speed multiplier must be between 1 and 4, got {0}")]
    InvalidSpeed(u8),
}

/// A malformed level or world table. Fatal to starting a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("malformed campaign table: {0}")]
    Malformed(String),
    #[error("campaign has no worlds")]
    NoWorlds,
    #[error("world {world} has no levels")]
    EmptyWorld { world: u32 },
    #[error("world {world} has no waves per level")]
    NoWaves { world: u32 },
    #[error("world {world} has no enemy archetypes")]
    NoArchetypes { world: u32 },
    #[error("world {world}: {field} must be positive, got {value}")]
    NonPositive {
        world: u32,
        field: &'static str,
        value: f64,
    },
    #[error("world {world}: speed bonus {value} is negative")]
    NegativeSpeedBonus { world: u32, value: f64 },
    #[error("world {world}: armor {armor} must lie in [0, 1)")]
    ArmorOutOfRange { world: u32, armor: f64 },
    #[error("world {world}: boost {boost} is below the previous world's {previous}")]
    BoostDecreases {
        world: u32,
        boost: f64,
        previous: f64,
    },
    #[error("no map for level {world}-{level}")]
    MissingMap { world: u32, level: u32 },
    #[error("level {world}-{level}: path needs at least two cells, got {len}")]
    PathTooShort { world: u32, level: u32, len: usize },
    #[error("level {world}-{level}: path cell ({}, {}) is out of bounds", cell.col, cell.row)]
    PathOutOfBounds {
        world: u32,
        level: u32,
        cell: GridCell,
    },
    #[error("level {world}-{level}: path cell ({}, {}) does not touch its predecessor", cell.col, cell.row)]
    PathDisjoint {
        world: u32,
        level: u32,
        cell: GridCell,
    },
    #[error("level {world}-{level}: path visits ({}, {}) twice", cell.col, cell.row)]
    PathRepeats {
        world: u32,
        level: u32,
        cell: GridCell,
    },
    #[error("level {world}-{level}: path cell ({}, {}) is obstructed", cell.col, cell.row)]
    PathObstructed {
        world: u32,
        level: u32,
        cell: GridCell,
    },
}
