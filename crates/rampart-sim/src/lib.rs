//! RAMPART simulation engine.
//!
//! Headless, deterministic tower-defense simulation built on the hecs ECS.
//! The engine owns progression and the active session; a session owns one
//! level's ECS world and runs the systems in a fixed order each tick.

pub mod combat;
pub mod difficulty;
pub mod engine;
pub mod modules;
pub mod ordnance;
pub mod path;
pub mod phase;
pub mod pools;
pub mod session;
pub mod systems;
pub mod world_setup;

pub use engine::{LevelStartError, SimConfig, SimulationEngine};
pub use session::SimulationSession;

#[cfg(test)]
mod tests;
