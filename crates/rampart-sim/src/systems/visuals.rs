//! Writes render intents onto pooled visuals. Never draws.

use rampart_core::components::{Enemy, PathFollower, StatusEffects, Vitals};

use crate::ordnance::{Projectile, Storm};
use crate::pools::Visual;
use crate::session::SimulationSession;

pub fn run(session: &mut SimulationSession) {
    for (_, (visual, follower, vitals, status, enemy)) in session.world.query_mut::<(
        &mut Visual,
        &PathFollower,
        &Vitals,
        &StatusEffects,
        &Enemy,
    )>() {
        let intent = &mut visual.intent;
        intent.position = follower.position;
        intent.scale = enemy.size;
        intent.fill = if vitals.max_hp > 0.0 {
            (vitals.hp / vitals.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        };
        intent.frozen = status.freeze > 0.0;
        intent.poisoned = status.poison > 0.0;
        intent.burning = status.burn > 0.0;
        intent.boss = enemy.rank.is_boss();
    }

    for (_, (visual, projectile)) in session.world.query_mut::<(&mut Visual, &Projectile)>() {
        visual.intent.position = projectile.position;
    }

    for (_, (visual, storm)) in session.world.query_mut::<(&mut Visual, &Storm)>() {
        visual.intent.position = storm.head;
        visual.intent.fill = storm.progress;
    }
}
