//! Destruction of terminal records.
//!
//! [`cleanup_terminal_tweens`] is the last phase of a tick. Records that
//! became terminal this tick have already had their OnKill dispatched and
//! are despawned here, releasing their target. A record that was marked
//! terminal by a callback (after its own dispatch) still has a pending
//! OnKill and survives until the next tick's dispatch.

use bevy_ecs::prelude::*;

use crate::components::callbacks::TweenCallbackFlags;
use crate::components::tween::{TweenStatus, TweenTarget};
use crate::resources::tweencounters::TweenCounters;

/// Despawn a record and drop its reference on its target.
///
/// Returns false if the entity was already gone.
pub(crate) fn destroy_record(world: &mut World, entity: Entity) -> bool {
    if let Some(target) = world.get::<TweenTarget>(entity).copied() {
        (target.release)(world, target.handle);
    }
    if !world.despawn(entity) {
        return false;
    }
    world.resource_mut::<TweenCounters>().destroyed += 1;
    true
}

/// Despawn every terminal record with nothing left to dispatch.
pub fn cleanup_terminal_tweens(world: &mut World) {
    let doomed: Vec<Entity> = {
        let mut records = world.query::<(Entity, &TweenStatus, &TweenCallbackFlags)>();
        records
            .iter(world)
            .filter(|(_, status, flags)| status.is_terminal() && !flags.has_pending())
            .map(|(entity, _, _)| entity)
            .collect()
    };
    for entity in doomed {
        log::debug!("destroying terminal tween {:?}", entity);
        destroy_record(world, entity);
    }
}
