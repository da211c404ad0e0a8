//! Campaign configuration: the world and level tables.
//!
//! Tables are validated before any session starts. A table that fails
//! validation is a fatal configuration error, never a partial simulation.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MIN_TOWERS_TO_START, STARTING_LIVES, STARTING_MONEY};
use crate::enums::EnemyArchetype;
use crate::error::ConfigError;
use crate::types::LevelRef;

/// Difficulty parameters shared by every level of a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub name: String,
    pub levels: u32,
    pub waves_per_level: u32,
    /// Enemy health multiplier.
    pub hp_mult: f64,
    /// Flat speed added to every enemy (units/s).
    pub speed_bonus: f64,
    /// Armor fraction given to every enemy.
    pub armor: f64,
    /// Scales both wave size and enemy health.
    pub boost: f64,
    /// Archetypes ordinary spawns are drawn from.
    pub archetypes: Vec<EnemyArchetype>,
}

/// The full campaign table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub worlds: Vec<WorldConfig>,
    #[serde(default = "default_min_towers")]
    pub min_towers_to_start: u32,
    #[serde(default = "default_starting_money")]
    pub starting_money: u32,
    #[serde(default = "default_starting_lives")]
    pub starting_lives: u32,
}

fn default_min_towers() -> u32 {
    DEFAULT_MIN_TOWERS_TO_START
}

fn default_starting_money() -> u32 {
    STARTING_MONEY
}

fn default_starting_lives() -> u32 {
    STARTING_LIVES
}

impl Default for CampaignConfig {
    fn default() -> Self {
        use EnemyArchetype::*;

        let world = |name: &str,
                     hp_mult: f64,
                     speed_bonus: f64,
                     armor: f64,
                     boost: f64,
                     archetypes: &[EnemyArchetype]| WorldConfig {
            name: name.to_string(),
            levels: 5,
            waves_per_level: 10,
            hp_mult,
            speed_bonus,
            armor,
            boost,
            archetypes: archetypes.to_vec(),
        };

        Self {
            worlds: vec![
                world("Meadow", 1.0, 0.0, 0.0, 1.0, &[Runner, Tank]),
                world("Canyon", 1.15, 0.05, 0.05, 1.06, &[Runner, Tank, Shielded]),
                world("Tundra", 1.3, 0.1, 0.1, 1.12, &[Runner, Tank, Shielded, Flyer]),
                world("Citadel", 1.5, 0.15, 0.15, 1.2, &[Runner, Tank, Shielded, Flyer]),
            ],
            min_towers_to_start: DEFAULT_MIN_TOWERS_TO_START,
            starting_money: STARTING_MONEY,
            starting_lives: STARTING_LIVES,
        }
    }
}

impl CampaignConfig {
    /// Parse and validate a JSON campaign table.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CampaignConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every world against the table invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worlds.is_empty() {
            return Err(ConfigError::NoWorlds);
        }

        let mut previous_boost: Option<f64> = None;
        for (index, world) in self.worlds.iter().enumerate() {
            let id = index as u32 + 1;
            if world.levels == 0 {
                return Err(ConfigError::EmptyWorld { world: id });
            }
            if world.waves_per_level == 0 {
                return Err(ConfigError::NoWaves { world: id });
            }
            if world.archetypes.is_empty() {
                return Err(ConfigError::NoArchetypes { world: id });
            }
            for (field, value) in [("hp_mult", world.hp_mult), ("boost", world.boost)] {
                if !(value > 0.0) {
                    return Err(ConfigError::NonPositive {
                        world: id,
                        field,
                        value,
                    });
                }
            }
            if !(world.speed_bonus >= 0.0) {
                return Err(ConfigError::NegativeSpeedBonus {
                    world: id,
                    value: world.speed_bonus,
                });
            }
            if !(0.0..1.0).contains(&world.armor) {
                return Err(ConfigError::ArmorOutOfRange {
                    world: id,
                    armor: world.armor,
                });
            }
            // Wave size must never shrink when moving to a later level.
            if let Some(previous) = previous_boost {
                if world.boost < previous {
                    return Err(ConfigError::BoostDecreases {
                        world: id,
                        boost: world.boost,
                        previous,
                    });
                }
            }
            previous_boost = Some(world.boost);
        }
        Ok(())
    }

    /// Total number of levels across all worlds.
    pub fn final_level(&self) -> u32 {
        self.worlds.iter().map(|w| w.levels).sum()
    }

    /// World table for a 1-based world id.
    pub fn world(&self, world: u32) -> Option<&WorldConfig> {
        let index = world.checked_sub(1)?;
        self.worlds.get(index as usize)
    }

    /// Resolve world/level coordinates into a level reference.
    pub fn resolve(&self, world: u32, level: u32) -> Option<LevelRef> {
        let config = self.world(world)?;
        if level == 0 || level > config.levels {
            return None;
        }
        let before: u32 = self.worlds[..(world - 1) as usize]
            .iter()
            .map(|w| w.levels)
            .sum();
        Some(LevelRef {
            world,
            level,
            global: before + level,
        })
    }

    /// Resolve a global level index back into world/level coordinates.
    pub fn locate(&self, global: u32) -> Option<LevelRef> {
        let mut remaining = global;
        for (index, world) in self.worlds.iter().enumerate() {
            if remaining == 0 {
                return None;
            }
            if remaining <= world.levels {
                return Some(LevelRef {
                    world: index as u32 + 1,
                    level: remaining,
                    global,
                });
            }
            remaining -= world.levels;
        }
        None
    }
}
