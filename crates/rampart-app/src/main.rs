use std::process::ExitCode;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rampart_app::control::{self, ControlError};
use rampart_app::settings::AppSettings;
use rampart_app::state::AppState;
use rampart_core::commands::PlayerCommand;
use rampart_core::enums::{GameMode, GamePhase, TowerType};
use rampart_core::state::SessionSnapshot;
use rampart_core::types::{GridCell, LevelRef, TowerBuild};

/// Wall-clock length of the scripted demo.
const DEMO_DURATION: Duration = Duration::from_secs(12);

/// End-of-demo report printed to stdout.
#[derive(Debug, Serialize)]
struct DemoSummary {
    level: Option<LevelRef>,
    phase: GamePhase,
    game_over: bool,
    wave: u32,
    money: u32,
    lives: i32,
    score: u64,
    towers: usize,
    enemies_alive: usize,
    ticks: u64,
    elapsed_secs: f64,
}

impl From<&SessionSnapshot> for DemoSummary {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            level: snapshot.level.as_ref().map(|l| l.level),
            phase: snapshot.phase,
            game_over: snapshot.game_over,
            wave: snapshot.wave.wave_number,
            money: snapshot.economy.money,
            lives: snapshot.economy.lives,
            score: snapshot.economy.score,
            towers: snapshot.towers.len(),
            enemies_alive: snapshot.enemies.len(),
            ticks: snapshot.time.tick,
            elapsed_secs: snapshot.time.elapsed_secs,
        }
    }
}

fn demo_script() -> Vec<PlayerCommand> {
    let blaster = TowerBuild::Standard(TowerType::Blaster);
    let mut script = vec![PlayerCommand::SelectLevel {
        world: 1,
        level: 1,
        mode: GameMode::Campaign,
    }];
    script.extend(
        [GridCell::new(3, 2), GridCell::new(7, 2), GridCell::new(5, 4), GridCell::new(9, 4)]
            .into_iter()
            .map(|cell| PlayerCommand::PlaceTower { build: blaster, cell }),
    );
    script.push(PlayerCommand::SetSpeed { multiplier: 4 });
    script.push(PlayerCommand::StartWave);
    script
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("no snapshot was published")]
    NoSnapshot,
}

fn run(settings: AppSettings) -> Result<DemoSummary, DemoError> {
    let state = AppState::new();
    control::start_simulation(&state, settings)?;
    for command in demo_script() {
        control::send_command(&state, command)?;
    }

    let started = Instant::now();
    while started.elapsed() < DEMO_DURATION {
        std::thread::sleep(Duration::from_millis(250));
        let finished = control::get_snapshot(&state)?
            .is_some_and(|s| s.game_over || s.phase == GamePhase::LevelComplete);
        if finished {
            break;
        }
    }

    control::stop_simulation(&state)?;
    let snapshot = control::get_snapshot(&state)?.ok_or(DemoError::NoSnapshot)?;
    Ok(DemoSummary::from(&snapshot))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "settings_invalid");
            return ExitCode::FAILURE;
        }
    };
    info!(seed = settings.sim.seed, save_dir = ?settings.save_dir, "demo_starting");

    let summary = match run(settings) {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "demo_failed");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "summary_serialization_failed");
            ExitCode::FAILURE
        }
    }
}
