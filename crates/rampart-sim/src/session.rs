//! One running level: its ECS world, wave state, economy and live rosters.
//!
//! `SimulationSession` is the explicit state passed by reference to every
//! system. It is created by the engine when a level is selected and torn down
//! when the level is replaced.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use rampart_campaign::economy::{sell_refund, tower_upgrade_cost};
use rampart_campaign::EconomyLedger;
use rampart_core::components::{Tower, TowerStats};
use rampart_core::constants::OBSTACLE_CLEAR_COST;
use rampart_core::enums::{CellKind, GameMode, GamePhase, PlacementError};
use rampart_core::error::Rejection;
use rampart_core::events::Notification;
use rampart_core::state::EconomyState;
use rampart_core::types::{GridCell, LevelRef, TowerBuild, TowerId};

use crate::difficulty::WaveDirector;
use crate::ordnance::AbilityBook;
use crate::path::{LevelMap, PathTrack};
use crate::phase::{PhaseController, PhaseEvent};
use crate::pools::{EntityPools, Visual};
use crate::systems;
use crate::systems::towers::derive_stats;
use crate::world_setup;

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct SessionSetup {
    pub level: LevelRef,
    pub mode: GameMode,
    pub map: LevelMap,
    pub director: WaveDirector,
    pub min_towers: u32,
    pub money: u32,
    pub lives: u32,
    pub meta_damage_level: u32,
    pub seed: u64,
}

/// What a step did that the engine must act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub level_complete: bool,
}

pub struct SimulationSession {
    pub(crate) world: World,
    pub(crate) level: LevelRef,
    pub(crate) mode: GameMode,
    pub(crate) map: LevelMap,
    pub(crate) track: PathTrack,
    pub(crate) director: WaveDirector,
    pub(crate) phase: PhaseController,
    pub(crate) economy: EconomyLedger,
    pub(crate) pools: EntityPools,
    pub(crate) rng: ChaCha8Rng,
    /// Live enemies in spawn order. Targeting and sweeps iterate this.
    pub(crate) enemies: Vec<Entity>,
    pub(crate) towers: BTreeMap<GridCell, Entity>,
    pub(crate) next_tower_id: u32,
    pub(crate) abilities: AbilityBook,
    /// Seconds of tower overclock left.
    pub(crate) overclock_remaining: f64,
    pub(crate) meta_damage_level: u32,
    pub(crate) game_over: bool,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) despawn_buffer: Vec<Entity>,
}

impl SimulationSession {
    pub fn new(setup: SessionSetup, pools: EntityPools) -> Self {
        let track = PathTrack::new(&setup.map.path);
        Self {
            world: World::new(),
            level: setup.level,
            mode: setup.mode,
            map: setup.map,
            track,
            director: setup.director,
            phase: PhaseController::new(setup.min_towers),
            economy: EconomyLedger::new(setup.money, setup.lives),
            pools,
            rng: ChaCha8Rng::seed_from_u64(setup.seed),
            enemies: Vec::new(),
            towers: BTreeMap::new(),
            next_tower_id: 0,
            abilities: AbilityBook::default(),
            overclock_remaining: 0.0,
            meta_damage_level: setup.meta_damage_level,
            game_over: false,
            notifications: Vec::new(),
            despawn_buffer: Vec::new(),
        }
    }

    // --- Accessors ---

    pub fn level(&self) -> LevelRef {
        self.level
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn map(&self) -> &LevelMap {
        &self.map
    }

    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    pub fn wave_number(&self) -> u32 {
        self.phase.wave_number()
    }

    pub fn economy(&self) -> &EconomyState {
        self.economy.state()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    pub fn tower_at(&self, cell: GridCell) -> Option<Tower> {
        let entity = self.towers.get(&cell)?;
        self.world.get::<&Tower>(*entity).ok().map(|t| (*t).clone())
    }

    pub fn overclock_remaining(&self) -> f64 {
        self.overclock_remaining
    }

    pub fn pools(&self) -> &EntityPools {
        &self.pools
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Hand over upgrade points earned by boss kills.
    pub fn take_upgrade_points(&mut self) -> u32 {
        self.economy.take_upgrade_points()
    }

    // --- Commands ---

    /// Commands are refused once lives run out or the level is finished.
    pub fn ensure_active(&self) -> Result<(), Rejection> {
        if self.game_over || self.phase.phase() == GamePhase::LevelComplete {
            return Err(Rejection::SessionOver);
        }
        Ok(())
    }

    fn placement_error(&self, cell: GridCell) -> Option<PlacementError> {
        match self.map.cell_kind(cell) {
            None => Some(PlacementError::OutOfBounds),
            Some(CellKind::Path) => Some(PlacementError::OnPath),
            Some(CellKind::Blocked) => Some(PlacementError::Blocked),
            Some(CellKind::Obstacle) => Some(PlacementError::Obstacle),
            Some(CellKind::Open) if self.towers.contains_key(&cell) => {
                Some(PlacementError::Occupied)
            }
            Some(CellKind::Open) => None,
        }
    }

    /// Place a tower with already-resolved level-1 stats.
    pub fn place_tower(
        &mut self,
        build: TowerBuild,
        base: TowerStats,
        cost: u32,
        cell: GridCell,
    ) -> Result<TowerId, Rejection> {
        self.ensure_active()?;
        if let Some(reason) = self.placement_error(cell) {
            return Err(Rejection::InvalidPlacement { cell, reason });
        }
        self.economy.spend(cost)?;

        self.next_tower_id += 1;
        let id = TowerId(self.next_tower_id);
        let stats = derive_stats(&base, 1, self.meta_damage_level);
        let entity = world_setup::spawn_tower(&mut self.world, id, build, cell, cost, base, stats);
        self.towers.insert(cell, entity);
        debug!(tower = id.0, col = cell.col, row = cell.row, cost, "tower_placed");
        Ok(id)
    }

    /// Sell a tower for part of its placement cost.
    pub fn sell_tower(&mut self, cell: GridCell) -> Result<u32, Rejection> {
        self.ensure_active()?;
        let entity = *self.towers.get(&cell).ok_or(Rejection::NoTower { cell })?;
        let cost = self
            .world
            .get::<&Tower>(entity)
            .map(|t| t.placement_cost)
            .map_err(|_| Rejection::NoTower { cell })?;
        let refund = sell_refund(cost);
        self.towers.remove(&cell);
        let _ = self.world.despawn(entity);
        self.economy.credit(refund);
        debug!(col = cell.col, row = cell.row, refund, "tower_sold");
        Ok(refund)
    }

    /// Raise a tower's level. Returns the new level and the price paid.
    pub fn upgrade_tower(&mut self, cell: GridCell) -> Result<(u32, u32), Rejection> {
        self.ensure_active()?;
        let entity = *self.towers.get(&cell).ok_or(Rejection::NoTower { cell })?;
        let level = self
            .world
            .get::<&Tower>(entity)
            .map(|t| t.level)
            .map_err(|_| Rejection::NoTower { cell })?;
        let cost = tower_upgrade_cost(level);
        self.economy.spend(cost)?;

        let meta = self.meta_damage_level;
        let tower = self
            .world
            .query_one_mut::<&mut Tower>(entity)
            .map_err(|_| Rejection::NoTower { cell })?;
        tower.level += 1;
        tower.stats = derive_stats(&tower.base, tower.level, meta);
        debug!(col = cell.col, row = cell.row, level = tower.level, cost, "tower_upgraded");
        Ok((tower.level, cost))
    }

    /// Pay to clear an obstacle cell.
    pub fn clear_obstacle(&mut self, cell: GridCell) -> Result<u32, Rejection> {
        self.ensure_active()?;
        if self.map.cell_kind(cell) != Some(CellKind::Obstacle) {
            return Err(Rejection::NotAnObstacle { cell });
        }
        self.economy.spend(OBSTACLE_CLEAR_COST)?;
        self.map.clear_obstacle(cell);
        debug!(col = cell.col, row = cell.row, "obstacle_cleared");
        Ok(OBSTACLE_CLEAR_COST)
    }

    /// Explicit wave start. Returns the new wave number.
    pub fn start_wave(&mut self) -> Result<u32, Rejection> {
        if self.game_over {
            return Err(Rejection::SessionOver);
        }
        let placed = self.towers.len() as u32;
        let event = self
            .phase
            .request_start(placed, &self.director, &mut self.rng)?;
        self.on_phase_event(event, &mut StepReport::default());
        Ok(self.phase.wave_number())
    }

    /// Apply a new damage upgrade level to every tower.
    pub fn refresh_meta(&mut self, meta_damage_level: u32) {
        self.meta_damage_level = meta_damage_level;
        for (_, tower) in self.world.query_mut::<&mut Tower>() {
            tower.stats = derive_stats(&tower.base, tower.level, meta_damage_level);
        }
    }

    // --- Tick ---

    /// Advance the session by `dt` seconds in the fixed system order.
    pub fn step(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        if self.game_over {
            return report;
        }

        self.abilities.decay(dt);
        self.overclock_remaining = (self.overclock_remaining - dt).max(0.0);

        let phase_step = self
            .phase
            .advance(dt, self.enemies.len(), &self.director, &mut self.rng);
        let wave = self.phase.wave_number();
        let start = self.track.sample(0.0);
        for order in phase_step.spawns {
            let stats = self.director.enemy_stats(order.archetype, order.rank, wave);
            let entity = world_setup::spawn_enemy(
                &mut self.world,
                &mut self.pools,
                order,
                stats,
                self.level.world,
                start,
            );
            self.enemies.push(entity);
        }
        for event in phase_step.events {
            self.on_phase_event(event, &mut report);
        }

        systems::enemies::run(self, dt);
        if !self.game_over {
            systems::towers::run(self, dt);
            systems::projectiles::run(self, dt);
            systems::storms::run(self, dt);
        }
        systems::visuals::run(self);
        report
    }

    fn on_phase_event(&mut self, event: PhaseEvent, report: &mut StepReport) {
        match event {
            PhaseEvent::WaveStarted { wave, size } => {
                self.notifications
                    .push(Notification::WaveStarted { wave, size });
            }
            PhaseEvent::WaveCleared { wave } => {
                self.economy.record_wave_cleared(wave);
                self.notifications.push(Notification::WaveCleared { wave });
            }
            PhaseEvent::LevelComplete => {
                info!(level = self.level.global, mode = ?self.mode, "level_finished");
                report.level_complete = true;
            }
        }
    }

    /// Release every outstanding visual and give the pools back.
    pub fn teardown(mut self) -> EntityPools {
        self.despawn_buffer.clear();
        self.despawn_buffer
            .extend(self.world.query::<&Visual>().iter().map(|(e, _)| e));
        for entity in self.despawn_buffer.drain(..) {
            if let Ok(visual) = self.world.remove_one::<Visual>(entity) {
                self.pools.release(visual);
            }
        }
        self.pools
    }
}

impl std::fmt::Debug for SimulationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationSession")
            .field("level", &self.level)
            .field("mode", &self.mode)
            .field("phase", &self.phase.phase())
            .field("enemies", &self.enemies.len())
            .field("towers", &self.towers.len())
            .field("game_over", &self.game_over)
            .finish()
    }
}
