//! Ability casting and storm sweeps.
//!
//! A storm runs from the exit back to the spawn over a fixed travel time.
//! Its head is sampled in short sub-steps so that a fast tick cannot carry
//! it past an enemy. Each enemy is touched at most once per cast.

use glam::DVec2;
use hecs::Entity;
use tracing::info;

use rampart_core::components::{Enemy, PathFollower, StatusEffects};
use rampart_core::constants::*;
use rampart_core::enums::{AbilityKind, DamageType, GamePhase};
use rampart_core::error::Rejection;
use rampart_core::events::Notification;

use crate::combat::{self, Hit};
use crate::ordnance::Storm;
use crate::path::PathTrack;
use crate::pools::Visual;
use crate::session::SimulationSession;
use crate::world_setup;

/// Cast an ability. Unlock checks are the caller's job.
pub fn cast(session: &mut SimulationSession, ability: AbilityKind) -> Result<(), Rejection> {
    if session.game_over {
        return Err(Rejection::SessionOver);
    }
    session.abilities.ensure_ready(ability)?;
    match session.phase.phase() {
        GamePhase::Build => return Err(Rejection::BuildPhaseActive),
        GamePhase::LevelComplete => return Err(Rejection::NoWaveInProgress),
        GamePhase::Spawning => {}
    }

    let head = session.track.sample(1.0);
    world_setup::spawn_storm(&mut session.world, &mut session.pools, ability, head);
    session.abilities.trigger(ability);
    session
        .notifications
        .push(Notification::AbilityCast { ability });
    info!(ability = ?ability, wave = session.phase.wave_number(), "ability_cast");
    Ok(())
}

/// Head positions between two progress values, at most one sample step apart.
/// Progress 0.0 is the exit end of the path.
pub fn sample_heads(track: &PathTrack, from: f64, to: f64) -> Vec<DVec2> {
    let span = (to - from).max(0.0);
    let steps = ((span * track.length()) / STORM_SAMPLE_STEP).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let progress = from + span * i as f64 / steps as f64;
            track.sample(1.0 - progress)
        })
        .collect()
}

/// Touch every candidate within reach of any head, in head order then roster
/// order. Returns the enemies touched for the first time by this storm.
pub fn sweep(storm: &mut Storm, heads: &[DVec2], candidates: &[(Entity, DVec2, f64)]) -> Vec<Entity> {
    let mut touched = Vec::new();
    for head in heads {
        for &(entity, position, size) in candidates {
            if storm.consumed {
                return touched;
            }
            if storm.touched.contains(&entity) {
                continue;
            }
            if position.distance(*head) <= STORM_TOUCH_RADIUS + size {
                storm.touched.insert(entity);
                touched.push(entity);
                if storm.consume_on_first_touch {
                    storm.consumed = true;
                }
            }
        }
    }
    touched
}

/// Advance storms and apply their effects.
pub fn run(session: &mut SimulationSession, dt: f64) {
    let storms: Vec<Entity> = session
        .world
        .query::<&Storm>()
        .iter()
        .map(|(entity, _)| entity)
        .collect();

    for entity in storms {
        let candidates: Vec<(Entity, DVec2, f64)> = session
            .enemies
            .iter()
            .filter_map(|&e| {
                let position = session.world.get::<&PathFollower>(e).ok()?.position;
                let size = session.world.get::<&Enemy>(e).ok()?.size;
                Some((e, position, size))
            })
            .collect();

        let (ability, touched, finished) = {
            let Ok(storm) = session.world.query_one_mut::<&mut Storm>(entity) else {
                continue;
            };
            let from = storm.progress;
            storm.elapsed += dt;
            storm.progress = (storm.elapsed / STORM_TRAVEL_SECS).min(1.0);
            let heads = sample_heads(&session.track, from, storm.progress);
            let touched = sweep(storm, &heads, &candidates);
            if let Some(&last) = heads.last() {
                storm.head = last;
            }
            let finished = storm.consumed || storm.elapsed >= STORM_TRAVEL_SECS;
            (storm.ability, touched, finished)
        };

        for enemy in touched {
            apply_effect(session, ability, enemy);
        }

        if finished {
            if let Ok(visual) = session.world.remove_one::<Visual>(entity) {
                session.pools.release(visual);
            }
            let _ = session.world.despawn(entity);
        }
    }
}

fn apply_effect(session: &mut SimulationSession, ability: AbilityKind, enemy: Entity) {
    match ability {
        AbilityKind::Freeze => {
            if let Ok(status) = session.world.query_one_mut::<&mut StatusEffects>(enemy) {
                status.freeze = status.freeze.max(FREEZE_STORM_SECS);
            }
        }
        AbilityKind::Poison => {
            if let Ok(status) = session.world.query_one_mut::<&mut StatusEffects>(enemy) {
                status.poison = status.poison.max(POISON_STORM_SECS);
            }
        }
        AbilityKind::Nuclear => {
            combat::damage_enemy(
                session,
                enemy,
                Hit::plain(NUCLEAR_DAMAGE, DamageType::Explosive),
            );
        }
        AbilityKind::Overclock => {
            session.overclock_remaining = OVERCLOCK_SECS;
        }
    }
}
