//! Core types and definitions for the RAMPART tower-defense simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, notifications, state snapshots, stat profiles,
//! campaign configuration, and constants. It has no dependency on the ECS
//! or any runtime framework.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod profiles;
pub mod state;
pub mod types;
