//! Rampart headless application.
//!
//! Wires the simulation crates together behind a fixed-rate game-loop thread
//! that accepts player commands over a channel and publishes snapshots.

pub mod control;
pub mod game_loop;
pub mod settings;
pub mod state;

pub use rampart_core as core;
