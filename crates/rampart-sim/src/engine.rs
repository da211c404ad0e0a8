//! Simulation engine: the boundary between the frontend and the game.
//!
//! `SimulationEngine` owns the campaign configuration, the path provider, the
//! persistence store, cross-session progression and the active
//! `SimulationSession`. It processes player commands, advances the session,
//! and produces a `SessionSnapshot` every tick. Completely headless.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use rampart_campaign::economy::{starting_lives, starting_money};
use rampart_campaign::{KeyValueStore, MemoryStore, ProgressionGate};
use rampart_core::commands::{CommandOutcome, PlayerCommand};
use rampart_core::components::TowerStats;
use rampart_core::config::CampaignConfig;
use rampart_core::constants::*;
use rampart_core::enums::{AbilityKind, GameMode, MetaTrack};
use rampart_core::error::{ConfigError, Rejection};
use rampart_core::events::Notification;
use rampart_core::profiles::tower_profile;
use rampart_core::state::SessionSnapshot;
use rampart_core::types::{LevelRef, SimTime, TowerBuild};

use crate::difficulty::WaveDirector;
use crate::modules;
use crate::path::{PathProvider, StaticMaps};
use crate::pools::{EntityPools, VisualProvider};
use crate::session::{SessionSetup, SimulationSession};
use crate::systems;
use crate::systems::snapshot::SnapshotFrame;

/// Configuration for a new engine.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed and commands = same simulation.
    pub seed: u64,
    pub campaign: CampaignConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            campaign: CampaignConfig::default(),
        }
    }
}

/// Why a level could not be started.
#[derive(Debug, Error)]
pub enum LevelStartError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The simulation engine. Owns progression and the active session.
pub struct SimulationEngine {
    config: CampaignConfig,
    maps: Box<dyn PathProvider>,
    store: Box<dyn KeyValueStore>,
    progression: ProgressionGate,
    session: Option<SimulationSession>,
    /// Pools kept between sessions so handles are reused across levels.
    spare_pools: Option<EntityPools>,
    rng: ChaCha8Rng,
    time: SimTime,
    speed: u8,
    paused: bool,
    command_queue: VecDeque<PlayerCommand>,
    /// Notifications not yet delivered in a snapshot.
    notifications: Vec<Notification>,
}

impl SimulationEngine {
    /// Create an engine. Fails if the campaign table is malformed.
    pub fn new(
        config: SimConfig,
        maps: Box<dyn PathProvider>,
        store: Box<dyn KeyValueStore>,
    ) -> Result<Self, ConfigError> {
        config.campaign.validate()?;
        let final_level = config.campaign.final_level();
        let progression = ProgressionGate::load(store.as_ref(), final_level);
        info!(
            seed = config.seed,
            worlds = config.campaign.worlds.len(),
            final_level,
            unlocked_level = progression.campaign().unlocked_level,
            "engine_ready"
        );
        Ok(Self {
            config: config.campaign,
            maps,
            store,
            progression,
            session: None,
            spare_pools: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time: SimTime::default(),
            speed: MIN_SPEED_MULTIPLIER,
            paused: false,
            command_queue: VecDeque::new(),
            notifications: Vec::new(),
        })
    }

    /// Engine with serpentine maps and an in-memory store.
    pub fn headless(config: SimConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Box::new(StaticMaps::serpentine()),
            Box::new(MemoryStore::new()),
        )
    }

    /// Back the visual pools with a presentation-layer provider.
    /// Takes effect from the next level selection. Handles pooled by the
    /// previous provider are released back to it.
    pub fn set_visual_provider(&mut self, provider: Box<dyn VisualProvider>) {
        if let Some(mut old) = self.spare_pools.replace(EntityPools::new(provider)) {
            old.shutdown();
        }
    }

    // --- Commands ---

    /// Queue a command for the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Execute a command now. A rejection is also emitted as a notification.
    pub fn execute(&mut self, command: PlayerCommand) -> Result<CommandOutcome, Rejection> {
        let result = self.apply(&command);
        if let Err(rejection) = &result {
            debug!(command = ?command, reason = %rejection, "command_rejected");
            self.notifications.push(rejection.clone().into());
        }
        result
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            let _ = self.execute(command);
        }
    }

    fn apply(&mut self, command: &PlayerCommand) -> Result<CommandOutcome, Rejection> {
        match command {
            PlayerCommand::PlaceTower { build, cell } => {
                let (base, cost) = self.resolve_build(*build)?;
                let tower = self.session_mut()?.place_tower(*build, base, cost, *cell)?;
                Ok(CommandOutcome::TowerPlaced { tower, cost })
            }
            PlayerCommand::SellTower { cell } => {
                let refund = self.session_mut()?.sell_tower(*cell)?;
                Ok(CommandOutcome::TowerSold { refund })
            }
            PlayerCommand::UpgradeTower { cell } => {
                let (level, cost) = self.session_mut()?.upgrade_tower(*cell)?;
                Ok(CommandOutcome::TowerUpgraded { level, cost })
            }
            PlayerCommand::ClearObstacle { cell } => {
                let session = self.session_mut()?;
                let cost = session.clear_obstacle(*cell)?;
                let global = session.level().global;
                self.progression.record_cleared_obstacle(global, *cell);
                self.persist();
                Ok(CommandOutcome::ObstacleCleared { cost })
            }
            PlayerCommand::SaveCustomBuild { modules } => {
                if !self.progression.custom_builds_unlocked() {
                    return Err(Rejection::CustomBuildsLocked);
                }
                let composition = modules::compose(modules)?;
                let build = self.progression.save_build(composition.modules.clone());
                self.persist();
                info!(build = build.0, name = %composition.name, cost = composition.cost, "build_saved");
                Ok(CommandOutcome::BuildSaved {
                    build,
                    cost: composition.cost,
                    name: composition.name,
                })
            }
            PlayerCommand::StartWave => {
                let wave = self.session_mut()?.start_wave()?;
                Ok(CommandOutcome::WaveStarted { wave })
            }
            PlayerCommand::UseAbility { ability } => {
                if !self.progression.is_ability_unlocked(*ability) {
                    return Err(Rejection::AbilityLocked(*ability));
                }
                systems::storms::cast(self.session_mut()?, *ability)?;
                Ok(CommandOutcome::AbilityCast { ability: *ability })
            }
            PlayerCommand::SelectLevel { world, level, mode } => {
                match self.start_level(*world, *level, *mode) {
                    Ok(level) => Ok(CommandOutcome::LevelSelected { level, mode: *mode }),
                    Err(LevelStartError::Rejected(rejection)) => Err(rejection),
                    Err(LevelStartError::Config(config_error)) => {
                        error!(world, level, error = %config_error, "level_config_invalid");
                        Err(Rejection::LevelUnavailable {
                            world: *world,
                            level: *level,
                        })
                    }
                }
            }
            PlayerCommand::PurchaseMetaUpgrade { track } => {
                let (level, cost) = self.progression.purchase_meta(*track)?;
                self.persist();
                if *track == MetaTrack::Damage {
                    if let Some(session) = self.session.as_mut() {
                        session.refresh_meta(level);
                    }
                }
                info!(track = ?track, level, cost, "meta_upgraded");
                Ok(CommandOutcome::MetaUpgraded {
                    track: *track,
                    level,
                    cost,
                })
            }
            PlayerCommand::SetSpeed { multiplier } => {
                if !(MIN_SPEED_MULTIPLIER..=MAX_SPEED_MULTIPLIER).contains(multiplier) {
                    return Err(Rejection::InvalidSpeed(*multiplier));
                }
                self.speed = *multiplier;
                Ok(CommandOutcome::SpeedSet {
                    multiplier: *multiplier,
                })
            }
            PlayerCommand::Pause => {
                self.paused = true;
                Ok(CommandOutcome::Paused)
            }
            PlayerCommand::Resume => {
                self.paused = false;
                Ok(CommandOutcome::Resumed)
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut SimulationSession, Rejection> {
        self.session.as_mut().ok_or(Rejection::NoActiveLevel)
    }

    /// Level-1 stats and price of a tower build, after unlock checks.
    fn resolve_build(&self, build: TowerBuild) -> Result<(TowerStats, u32), Rejection> {
        match build {
            TowerBuild::Standard(tower) => {
                if !self.progression.is_tower_unlocked(tower) {
                    return Err(Rejection::TowerLocked(tower));
                }
                let profile = tower_profile(tower);
                let stats = TowerStats {
                    damage: profile.damage,
                    range: profile.range,
                    rate: profile.rate,
                    projectile: profile.projectile,
                    payload: profile.payload,
                };
                Ok((stats, profile.cost))
            }
            TowerBuild::Custom(id) => {
                if !self.progression.custom_builds_unlocked() {
                    return Err(Rejection::CustomBuildsLocked);
                }
                let modules = self
                    .progression
                    .build(id)
                    .ok_or(Rejection::UnknownBuild(id))?;
                let composition = modules::compose(modules)?;
                Ok((composition.stats, composition.cost))
            }
        }
    }

    /// Start (or restart) a level, replacing any running session.
    ///
    /// Lock checks leave the current session running. A malformed map tears
    /// the current session down and starts nothing.
    pub fn start_level(
        &mut self,
        world: u32,
        level: u32,
        mode: GameMode,
    ) -> Result<LevelRef, LevelStartError> {
        let level_ref = self
            .config
            .resolve(world, level)
            .ok_or(Rejection::UnknownLevel { world, level })?;
        if !self.progression.is_level_unlocked(level_ref.global) {
            return Err(Rejection::LevelLocked { world, level }.into());
        }
        match mode {
            GameMode::Campaign => {}
            GameMode::Endless => {
                if !self
                    .progression
                    .campaign()
                    .completed
                    .contains(&level_ref.global)
                {
                    return Err(Rejection::ModeLocked(mode).into());
                }
            }
            GameMode::FinalBoss => {
                if !self.progression.final_boss_unlocked() {
                    return Err(Rejection::ModeLocked(mode).into());
                }
            }
        }

        let map = self.load_map(level_ref);
        let map = match map {
            Ok(map) => map,
            Err(config_error) => {
                self.end_session();
                return Err(config_error.into());
            }
        };
        let director = WaveDirector::new(&self.config, level_ref, mode)
            .ok_or(Rejection::UnknownLevel { world, level })?;

        self.end_session();
        let pools = self.spare_pools.take().unwrap_or_else(EntityPools::headless);
        let banked = self.progression.take_banked_credits();
        let setup = SessionSetup {
            level: level_ref,
            mode,
            map,
            director,
            min_towers: self.config.min_towers_to_start,
            money: starting_money(
                self.config.starting_money,
                self.progression.meta_level(MetaTrack::Economy),
            ) + banked,
            lives: starting_lives(
                self.config.starting_lives,
                self.progression.meta_level(MetaTrack::Fortitude),
            ),
            meta_damage_level: self.progression.meta_level(MetaTrack::Damage),
            seed: self.rng.gen(),
        };
        info!(
            world,
            level,
            global = level_ref.global,
            mode = ?mode,
            money = setup.money,
            banked,
            lives = setup.lives,
            "level_started"
        );
        self.session = Some(SimulationSession::new(setup, pools));
        if banked > 0 {
            self.persist();
        }
        Ok(level_ref)
    }

    fn load_map(&self, level: LevelRef) -> Result<crate::path::LevelMap, ConfigError> {
        let mut map = self
            .maps
            .level_map(level)
            .ok_or(ConfigError::MissingMap {
                world: level.world,
                level: level.level,
            })?;
        for cell in self.progression.cleared_obstacles(level.global) {
            map.clear_obstacle(cell);
        }
        map.validate(level)?;
        Ok(map)
    }

    fn end_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let mut pools = session.teardown();
        if self.spare_pools.is_some() {
            // A provider installed mid-level takes over.
            pools.shutdown();
        } else {
            self.spare_pools = Some(pools);
        }
    }

    // --- Tick ---

    /// Process queued commands, advance the session by one frame, and return
    /// the resulting snapshot.
    ///
    /// `frame_dt` is clamped to 50 ms and scaled by the speed multiplier.
    /// While paused the effective delta is zero and nothing advances.
    pub fn tick(&mut self, frame_dt: f64) -> SessionSnapshot {
        self.process_commands();

        let dt = if self.paused {
            0.0
        } else {
            frame_dt.clamp(0.0, MAX_FRAME_DT) * self.speed as f64
        };

        let mut level_complete = false;
        if let Some(session) = self.session.as_mut() {
            if dt > 0.0 && !session.is_game_over() {
                level_complete = session.step(dt).level_complete;
                self.time.advance(dt);
            }
        }
        self.sync_session();
        if level_complete {
            self.finish_level();
        }

        let notifications = std::mem::take(&mut self.notifications);
        self.build_snapshot(notifications)
    }

    /// Bank boss upgrade points and collect session notifications.
    fn sync_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let points = session.take_upgrade_points();
        self.notifications.extend(session.drain_notifications());
        if points > 0 {
            self.progression.bank_upgrade_points(points);
            self.persist();
        }
    }

    fn finish_level(&mut self) {
        let Some(level) = self.session.as_ref().map(SimulationSession::level) else {
            return;
        };
        let reward = self.progression.complete_level(level.global);

        self.notifications.push(Notification::LevelComplete {
            level,
            reward: reward.clone(),
        });
        if let Some(tower) = reward.unlocked_tower {
            self.notifications.push(Notification::TowerUnlocked { tower });
        }
        for ability in reward.unlocked_abilities {
            self.notifications
                .push(Notification::AbilityUnlocked { ability });
        }
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(error) = self.progression.save(self.store.as_mut()) {
            warn!(error = %error, "progress_save_failed");
        }
    }

    fn build_snapshot(&self, notifications: Vec<Notification>) -> SessionSnapshot {
        systems::snapshot::build_snapshot(
            self.session.as_ref(),
            SnapshotFrame {
                time: self.time,
                paused: self.paused,
                speed: self.speed,
                upgrade_points: self.progression.upgrade_points(),
                unlocked_abilities: &self.progression.unlocks().abilities,
                notifications,
            },
        )
    }

    // --- Accessors ---

    /// Current state without advancing time or consuming notifications.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.build_snapshot(Vec::new())
    }

    /// Take notifications emitted since the last tick.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn session(&self) -> Option<&SimulationSession> {
        self.session.as_ref()
    }

    pub fn progression(&self) -> &ProgressionGate {
        &self.progression
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_ability_ready(&self, ability: AbilityKind) -> bool {
        self.progression.is_ability_unlocked(ability)
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.abilities.remaining(ability) == 0.0)
    }

    /// Mutable session access for tests.
    #[cfg(test)]
    pub(crate) fn session_mut_for_test(&mut self) -> Option<&mut SimulationSession> {
        self.session.as_mut()
    }
}

impl Drop for SimulationEngine {
    /// Hand every pooled visual back to the provider.
    fn drop(&mut self) {
        self.end_session();
        if let Some(pools) = self.spare_pools.as_mut() {
            pools.shutdown();
        }
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("time", &self.time)
            .field("speed", &self.speed)
            .field("paused", &self.paused)
            .field("session", &self.session)
            .finish()
    }
}
