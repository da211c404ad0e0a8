//! Fundamental grid and simulation types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::TowerType;

/// A cell on the level grid. Columns grow east, rows grow south.
/// Cell centers sit on integer world coordinates, one unit per cell.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCell {
    pub col: i32,
    pub row: i32,
}

impl GridCell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// World-space center of the cell.
    pub fn center(self) -> DVec2 {
        DVec2::new(self.col as f64, self.row as f64)
    }

    /// Whether `other` shares an edge with this cell.
    pub fn is_adjacent(self, other: GridCell) -> bool {
        (self.col - other.col).abs() + (self.row - other.row).abs() == 1
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Number of ticks that advanced the simulation (paused ticks excluded).
    pub tick: u64,
    /// Elapsed simulation time in seconds, after speed scaling.
    pub elapsed_secs: f64,
}

impl SimTime {
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Identifier for a placed tower, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(pub u32);

/// Identifier for a saved custom build in the feature-unlocks document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildId(pub u32);

/// What a tower is built from: a catalog type or a saved module composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerBuild {
    Standard(TowerType),
    Custom(BuildId),
}

/// A resolved level: its world/level coordinates and its 1-based global index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelRef {
    pub world: u32,
    pub level: u32,
    /// Position of this level across all worlds, starting at 1.
    pub global: u32,
}
