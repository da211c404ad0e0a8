//! Per-tick systems.
//!
//! Systems are free functions over the `SimulationSession`. They own no
//! state; everything they touch lives in the session or its ECS world.
//! The session calls them in a fixed order each tick.

pub mod enemies;
pub mod projectiles;
pub mod snapshot;
pub mod storms;
pub mod towers;
pub mod visuals;
