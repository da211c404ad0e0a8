//! Notifications emitted by the simulation for UI feedback.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::error::Rejection;
use crate::types::{GridCell, LevelRef};

/// Discrete events for the presentation layer. Presentation is external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    // --- Rejections ---
    InsufficientFunds { needed: u32, available: u32 },
    InvalidPlacement { cell: GridCell, reason: PlacementError },
    LevelLocked { world: u32, level: u32 },
    WaveRequirementUnmet { required: u32, placed: u32 },
    /// Any other refused command.
    ActionRejected { reason: Rejection },

    // --- Level flow ---
    WaveStarted { wave: u32, size: u32 },
    WaveCleared { wave: u32 },
    LevelComplete { level: LevelRef, reward: RewardSummary },
    /// Lives ran out. The session stays stopped until a level is selected.
    Defeat { wave: u32 },

    // --- Combat ---
    EnemyKilled {
        archetype: EnemyArchetype,
        rank: EnemyRank,
        bounty: u32,
    },
    EnemyLeaked {
        archetype: EnemyArchetype,
        rank: EnemyRank,
        lives_lost: u32,
    },
    AbilityCast { ability: AbilityKind },

    // --- Progression ---
    TowerUnlocked { tower: TowerType },
    AbilityUnlocked { ability: AbilityKind },
}

/// Rewards granted for completing a level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardSummary {
    /// Banked and added to the starting money of the next level played.
    pub credits: u32,
    pub upgrade_points: u32,
    /// Whether this was the first completion of the level.
    pub first_completion: bool,
    pub unlocked_tower: Option<TowerType>,
    pub unlocked_abilities: Vec<AbilityKind>,
    pub final_boss_unlocked: bool,
}

impl From<Rejection> for Notification {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::InsufficientFunds { needed, available } => {
                Notification::InsufficientFunds { needed, available }
            }
            Rejection::InvalidPlacement { cell, reason } => {
                Notification::InvalidPlacement { cell, reason }
            }
            Rejection::LevelLocked { world, level } => Notification::LevelLocked { world, level },
            Rejection::WaveRequirementUnmet { required, placed } => {
                Notification::WaveRequirementUnmet { required, placed }
            }
            reason => Notification::ActionRejected { reason },
        }
    }
}
