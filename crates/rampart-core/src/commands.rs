//! Player commands sent from the frontend to the simulation.
//!
//! Commands are either queued for the next tick boundary or executed
//! immediately. Every command is validated; a refused command leaves the
//! session untouched and produces a notification.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{BuildId, GridCell, LevelRef, TowerBuild, TowerId};

/// All possible player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Construction ---
    /// Place a catalog tower or a saved custom build on an open cell.
    PlaceTower { build: TowerBuild, cell: GridCell },
    /// Sell the tower on a cell for a partial refund.
    SellTower { cell: GridCell },
    /// Raise the level of the tower on a cell.
    UpgradeTower { cell: GridCell },
    /// Pay to turn an obstacle cell into an open cell.
    ClearObstacle { cell: GridCell },
    /// Save a module composition for later placement.
    SaveCustomBuild { modules: Vec<ModuleKind> },

    // --- Waves and abilities ---
    /// Start the next wave ahead of the countdown.
    StartWave,
    /// Cast an ability storm.
    UseAbility { ability: AbilityKind },

    // --- Campaign ---
    /// Start (or restart) a level.
    SelectLevel {
        world: u32,
        level: u32,
        #[serde(default)]
        mode: GameMode,
    },
    /// Spend upgrade points on a permanent upgrade.
    PurchaseMetaUpgrade { track: MetaTrack },

    // --- Simulation control ---
    /// Set the speed multiplier (1-4).
    SetSpeed { multiplier: u8 },
    /// Pause the simulation.
    Pause,
    /// Resume the simulation.
    Resume,
}

/// What an accepted command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandOutcome {
    TowerPlaced { tower: TowerId, cost: u32 },
    TowerSold { refund: u32 },
    TowerUpgraded { level: u32, cost: u32 },
    ObstacleCleared { cost: u32 },
    BuildSaved { build: BuildId, cost: u32, name: String },
    WaveStarted { wave: u32 },
    AbilityCast { ability: AbilityKind },
    LevelSelected { level: LevelRef, mode: GameMode },
    MetaUpgraded { track: MetaTrack, level: u32, cost: u32 },
    SpeedSet { multiplier: u8 },
    Paused,
    Resumed,
}
