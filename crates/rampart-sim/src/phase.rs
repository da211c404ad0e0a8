//! Build / spawning / level-complete state machine.

use std::collections::VecDeque;

use rand::Rng;
use tracing::info;

use rampart_core::constants::BUILD_COUNTDOWN_SECS;
use rampart_core::enums::GamePhase;
use rampart_core::error::Rejection;
use rampart_core::state::WaveState;

use crate::difficulty::{SpawnOrder, WaveDirector};

/// A phase transition that happened during a call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseEvent {
    WaveStarted { wave: u32, size: u32 },
    WaveCleared { wave: u32 },
    LevelComplete,
}

/// Output of one `advance` call.
#[derive(Debug, Default)]
pub struct PhaseStep {
    /// Enemies to spawn this tick, in order.
    pub spawns: Vec<SpawnOrder>,
    pub events: Vec<PhaseEvent>,
}

#[derive(Debug, Clone)]
pub struct PhaseController {
    phase: GamePhase,
    wave: WaveState,
    pending: VecDeque<SpawnOrder>,
    min_towers: u32,
}

impl PhaseController {
    /// Starts in the build phase. The first wave waits for an explicit start.
    pub fn new(min_towers: u32) -> Self {
        Self {
            phase: GamePhase::Build,
            wave: WaveState {
                build_phase: true,
                ..WaveState::default()
            },
            pending: VecDeque::new(),
            min_towers,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn wave(&self) -> &WaveState {
        &self.wave
    }

    pub fn wave_number(&self) -> u32 {
        self.wave.wave_number
    }

    pub fn min_towers(&self) -> u32 {
        self.min_towers
    }

    /// Explicit start request from the player.
    pub fn request_start<R: Rng>(
        &mut self,
        placed_towers: u32,
        director: &WaveDirector,
        rng: &mut R,
    ) -> Result<PhaseEvent, Rejection> {
        match self.phase {
            GamePhase::Spawning => return Err(Rejection::WaveInProgress),
            GamePhase::LevelComplete => return Err(Rejection::SessionOver),
            GamePhase::Build => {}
        }
        if placed_towers < self.min_towers {
            return Err(Rejection::WaveRequirementUnmet {
                required: self.min_towers,
                placed: placed_towers,
            });
        }
        Ok(self.begin_wave(director, rng))
    }

    /// Tick countdowns and spawn timers, then evaluate transitions once.
    pub fn advance<R: Rng>(
        &mut self,
        dt: f64,
        live_enemies: usize,
        director: &WaveDirector,
        rng: &mut R,
    ) -> PhaseStep {
        let mut step = PhaseStep::default();
        match self.phase {
            GamePhase::Build => {
                if let Some(countdown) = self.wave.countdown.as_mut() {
                    *countdown -= dt;
                    if *countdown <= 0.0 {
                        let event = self.begin_wave(director, rng);
                        step.events.push(event);
                    }
                }
            }
            GamePhase::Spawning => {
                if !self.pending.is_empty() {
                    self.wave.spawn_timer -= dt;
                    while self.wave.spawn_timer <= 0.0 {
                        let Some(order) = self.pending.pop_front() else {
                            break;
                        };
                        step.spawns.push(order);
                        match self.pending.front() {
                            Some(next) => self.wave.spawn_timer += next.delay,
                            None => self.wave.spawn_timer = 0.0,
                        }
                    }
                    self.wave.remaining_spawns = self.pending.len() as u32;
                } else if live_enemies == 0 {
                    step.events.extend(self.finish_wave(director));
                }
            }
            GamePhase::LevelComplete => {}
        }
        step
    }

    fn begin_wave<R: Rng>(&mut self, director: &WaveDirector, rng: &mut R) -> PhaseEvent {
        let wave = self.wave.wave_number + 1;
        let plan = director.compose(wave, rng);
        let size = plan.spawns.len() as u32;
        self.pending = plan.spawns.into();
        self.phase = GamePhase::Spawning;
        self.wave = WaveState {
            wave_number: wave,
            remaining_spawns: size,
            spawn_timer: 0.0,
            in_wave: true,
            build_phase: false,
            countdown: None,
        };
        info!(wave, size, "wave_started");
        PhaseEvent::WaveStarted { wave, size }
    }

    fn finish_wave(&mut self, director: &WaveDirector) -> Vec<PhaseEvent> {
        let wave = self.wave.wave_number;
        self.wave.in_wave = false;
        self.wave.remaining_spawns = 0;
        info!(wave, "wave_cleared");
        let mut events = vec![PhaseEvent::WaveCleared { wave }];
        if director.is_final_wave(wave) {
            self.phase = GamePhase::LevelComplete;
            self.wave.build_phase = false;
            self.wave.countdown = None;
            events.push(PhaseEvent::LevelComplete);
        } else {
            self.phase = GamePhase::Build;
            self.wave.build_phase = true;
            self.wave.countdown = Some(BUILD_COUNTDOWN_SECS);
        }
        events
    }
}
