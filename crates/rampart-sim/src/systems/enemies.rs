//! Enemy movement, damage-over-time, and status decay.

use hecs::Entity;

use rampart_core::components::{PathFollower, StatusEffects, Vitals};
use rampart_core::constants::{BURN_DPS_PER_STACK, POISON_DPS};

use crate::combat;
use crate::session::SimulationSession;

/// Advance every live enemy along the path.
///
/// Poison and burn are applied for the part of `dt` they were still active,
/// straight to hp (armor and shield do not apply), then every status decays.
/// Deaths are resolved before leaks.
pub fn run(session: &mut SimulationSession, dt: f64) {
    let length = session.track.length();
    let mut dead: Vec<Entity> = Vec::new();
    let mut leaked: Vec<Entity> = Vec::new();

    for &entity in &session.enemies {
        let Ok((vitals, status, follower)) = session
            .world
            .query_one_mut::<(&mut Vitals, &mut StatusEffects, &mut PathFollower)>(entity)
        else {
            continue;
        };
        if vitals.hp <= 0.0 {
            dead.push(entity);
            continue;
        }

        let speed = if status.freeze > 0.0 {
            0.0
        } else if status.slow > 0.0 {
            follower.speed * (1.0 - status.slow_factor)
        } else {
            follower.speed
        };
        if length > 0.0 {
            follower.t = (follower.t + dt * speed / length).min(1.0);
        } else {
            follower.t = 1.0;
        }
        follower.position = session.track.sample(follower.t);

        if status.poison > 0.0 {
            vitals.hp -= POISON_DPS * status.poison.min(dt);
        }
        if status.burn > 0.0 {
            vitals.hp -= BURN_DPS_PER_STACK * status.burn_stacks * status.burn.min(dt);
        }
        vitals.hp = vitals.hp.max(0.0);

        decay(status, dt);

        if vitals.hp <= 0.0 {
            dead.push(entity);
        } else if follower.t >= 1.0 {
            leaked.push(entity);
        }
    }

    for entity in dead {
        combat::kill_enemy(session, entity);
    }
    for entity in leaked {
        combat::leak_enemy(session, entity);
    }
}

/// Tick statuses toward zero. Stacks and slow strength go with their timers.
pub fn decay(status: &mut StatusEffects, dt: f64) {
    status.freeze = (status.freeze - dt).max(0.0);
    status.poison = (status.poison - dt).max(0.0);
    status.burn = (status.burn - dt).max(0.0);
    status.slow = (status.slow - dt).max(0.0);
    if status.burn == 0.0 {
        status.burn_stacks = 0.0;
    }
    if status.slow == 0.0 {
        status.slow_factor = 0.0;
    }
}
