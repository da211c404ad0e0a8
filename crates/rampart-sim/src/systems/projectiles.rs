//! Homing projectile flight and impact.

use rampart_core::components::PathFollower;

use crate::combat;
use crate::ordnance::Projectile;
use crate::pools::Visual;
use crate::session::SimulationSession;

/// Move projectiles toward their targets' live positions.
///
/// A projectile arrives when the remaining distance is within one tick of
/// travel. If its target is gone, it is discarded without dealing damage.
pub fn run(session: &mut SimulationSession, dt: f64) {
    session.despawn_buffer.clear();
    session.despawn_buffer.extend(
        session
            .world
            .query::<&Projectile>()
            .iter()
            .map(|(entity, _)| entity),
    );
    let in_flight = std::mem::take(&mut session.despawn_buffer);

    for &entity in &in_flight {
        let Ok(projectile) = session.world.get::<&Projectile>(entity).map(|p| *p) else {
            continue;
        };
        let target_pos = session
            .world
            .get::<&PathFollower>(projectile.target)
            .map(|f| f.position)
            .ok()
            .filter(|_| session.enemies.contains(&projectile.target));

        let Some(target_pos) = target_pos else {
            remove(session, entity);
            continue;
        };

        let travel = projectile.speed * dt;
        let offset = target_pos - projectile.position;
        let distance = offset.length();
        if distance <= travel {
            remove(session, entity);
            combat::resolve_impact(session, &projectile, target_pos);
        } else if let Ok(p) = session.world.query_one_mut::<&mut Projectile>(entity) {
            p.position += offset / distance * travel;
        }
    }

    session.despawn_buffer = in_flight;
    session.despawn_buffer.clear();
}

fn remove(session: &mut SimulationSession, entity: hecs::Entity) {
    if let Ok(visual) = session.world.remove_one::<Visual>(entity) {
        session.pools.release(visual);
    }
    let _ = session.world.despawn(entity);
}
