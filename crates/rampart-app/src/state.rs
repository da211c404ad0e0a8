//! Application state shared between the control surface and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use rampart_core::commands::PlayerCommand;
use rampart_core::state::SessionSnapshot;

/// Messages sent from the control surface to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to queue on the simulation engine.
    PlayerCommand(PlayerCommand),
    /// Stop the game loop thread.
    Shutdown,
}

/// Shared application state.
///
/// The sender sits behind a `Mutex` because `mpsc::Sender` is not `Sync`.
/// The latest snapshot is shared with the loop thread, which overwrites it
/// after every tick.
pub struct AppState {
    /// `None` until the simulation is started.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    pub latest_snapshot: Arc<Mutex<Option<SessionSnapshot>>>,
    pub loop_thread: Mutex<Option<JoinHandle<()>>>,
    pub running: Mutex<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            loop_thread: Mutex::new(None),
            running: Mutex::new(false),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest_snapshot.lock().unwrap().is_none());
        assert!(state.loop_thread.lock().unwrap().is_none());
        assert!(!*state.running.lock().unwrap());
    }
}
