//! Game loop thread: drives the simulation engine at 30Hz and publishes snapshots.
//!
//! The engine is built by the caller and moved into the thread, so a bad
//! configuration never reaches the loop. Commands arrive over an `mpsc` channel and are queued for the next tick.
//! Speed multipliers are applied by the engine itself, so the wall-clock
//! cadence stays fixed.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use rampart_core::constants::{DT, TICK_RATE};
use rampart_core::state::SessionSnapshot;
use rampart_sim::SimulationEngine;

use crate::state::GameLoopCommand;

/// Wall-clock duration of one tick.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// Spawn the game loop thread around a ready engine.
///
/// Returns the command sender and the thread handle.
pub fn spawn_game_loop(
    engine: SimulationEngine,
    latest_snapshot: Arc<Mutex<Option<SessionSnapshot>>>,
) -> io::Result<(mpsc::Sender<GameLoopCommand>, JoinHandle<()>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let handle = std::thread::Builder::new()
        .name("rampart-game-loop".into())
        .spawn(move || run_game_loop(engine, cmd_rx, &latest_snapshot))?;

    Ok((cmd_tx, handle))
}

/// Run until a Shutdown command arrives or the channel disconnects.
fn run_game_loop(
    mut engine: SimulationEngine,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &Mutex<Option<SessionSnapshot>>,
) {
    info!(tick_rate = TICK_RATE, "game_loop_started");
    let mut next_tick_time = Instant::now();

    loop {
        if !drain_commands(&mut engine, &cmd_rx) {
            break;
        }

        let snapshot = engine.tick(DT);
        for notification in &snapshot.notifications {
            debug!(?notification, "notification");
        }

        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Fell behind; skip the backlog instead of replaying it.
            next_tick_time = now;
        }
    }

    info!(ticks = engine.time().tick, "game_loop_stopped");
}

/// Queue every pending command. Returns false when the loop should stop.
fn drain_commands(
    engine: &mut SimulationEngine,
    cmd_rx: &mpsc::Receiver<GameLoopCommand>,
) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(GameLoopCommand::PlayerCommand(cmd)) => engine.queue_command(cmd),
            Ok(GameLoopCommand::Shutdown) => return false,
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        }
    }
}
