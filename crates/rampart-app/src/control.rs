//! Control surface for a running simulation.
//!
//! These functions bridge callers to the game loop thread via the shared
//! [`AppState`].

use std::io;
use std::sync::PoisonError;

use rampart_core::commands::PlayerCommand;
use rampart_core::error::ConfigError;
use rampart_core::state::SessionSnapshot;

use crate::game_loop;
use crate::settings::AppSettings;
use crate::state::{AppState, GameLoopCommand};

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("simulation already running")]
    AlreadyRunning,
    #[error("simulation not started")]
    NotStarted,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn game loop: {0}")]
    Spawn(#[source] io::Error),
    #[error("game loop is no longer receiving commands")]
    Disconnected,
    #[error("shared simulation state is poisoned")]
    Poisoned,
    #[error("game loop thread panicked")]
    Panicked,
}

impl<T> From<PoisonError<T>> for ControlError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Start the simulation. Spawns the game loop thread if not already running.
///
/// The engine is built on the caller's thread, so a bad campaign table is
/// reported here and nothing is left running.
pub fn start_simulation(state: &AppState, settings: AppSettings) -> Result<(), ControlError> {
    let mut running = state.running.lock()?;

    if *running {
        return Err(ControlError::AlreadyRunning);
    }

    let engine = settings.build_engine()?;
    let (cmd_tx, handle) = game_loop::spawn_game_loop(engine, state.latest_snapshot.clone())
        .map_err(ControlError::Spawn)?;

    *state.command_tx.lock()? = Some(cmd_tx);
    *state.loop_thread.lock()? = Some(handle);
    *running = true;

    Ok(())
}

/// Send a player command to the simulation.
pub fn send_command(state: &AppState, command: PlayerCommand) -> Result<(), ControlError> {
    let tx_lock = state.command_tx.lock()?;

    match tx_lock.as_ref() {
        Some(tx) => tx
            .send(GameLoopCommand::PlayerCommand(command))
            .map_err(|_| ControlError::Disconnected),
        None => Err(ControlError::NotStarted),
    }
}

/// Latest published snapshot.
pub fn get_snapshot(state: &AppState) -> Result<Option<SessionSnapshot>, ControlError> {
    let lock = state.latest_snapshot.lock()?;
    Ok(lock.clone())
}

/// Stop the game loop and wait for its thread to exit.
pub fn stop_simulation(state: &AppState) -> Result<(), ControlError> {
    let mut running = state.running.lock()?;
    if !*running {
        return Err(ControlError::NotStarted);
    }

    if let Some(tx) = state.command_tx.lock()?.take() {
        // A disconnected channel means the loop already exited.
        let _ = tx.send(GameLoopCommand::Shutdown);
    }
    if let Some(handle) = state.loop_thread.lock()?.take() {
        handle.join().map_err(|_| ControlError::Panicked)?;
    }
    *running = false;

    Ok(())
}
