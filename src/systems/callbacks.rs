//! Lifecycle callback dispatch.
//!
//! [`dispatch_tween_callbacks`] runs once per tick, after every value of the
//! tick has been computed and applied. It is an exclusive system: callbacks
//! receive `&mut World` and may drive the authoring API.
//!
//! Records are dispatched in creation order. Within a record, pending events
//! fire in [`DISPATCH_ORDER`]. A panicking callback is caught, reported as a
//! [`TweenDiagnostic::CallbackFailure`] and dispatch moves on to the next
//! callback, so one bad callback never hides OnComplete/OnKill.

use bevy_ecs::prelude::*;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::components::callbacks::{DISPATCH_ORDER, TweenCallbackActions, TweenCallbackFlags};
use crate::components::tween::TweenRecord;
use crate::events::diagnostic::TweenDiagnostic;
use crate::resources::callbackdispatcher::CallbackDispatcher;
use crate::resources::diagnostics::TweenDiagnostics;

/// Invoke the pending callbacks of every record.
pub fn dispatch_tween_callbacks(world: &mut World) {
    let mut queue = std::mem::take(&mut world.resource_mut::<CallbackDispatcher>().queue);
    queue.clear();
    {
        let mut records = world.query::<(Entity, &TweenRecord, &TweenCallbackFlags)>();
        queue.extend(
            records
                .iter(world)
                .filter(|(_, _, flags)| flags.has_pending())
                .map(|(entity, record, _)| (record.serial, entity)),
        );
    }
    queue.sort_unstable();

    world.resource_mut::<CallbackDispatcher>().executing = true;
    let mut invoked = 0;
    for &(_, entity) in &queue {
        invoked += dispatch_record(world, entity);
    }

    let mut dispatcher = world.resource_mut::<CallbackDispatcher>();
    dispatcher.executing = false;
    dispatcher.dispatched += invoked;
    dispatcher.queue = queue;
}

/// Run the pending callbacks of one record. Returns how many were invoked.
fn dispatch_record(world: &mut World, entity: Entity) -> u64 {
    let pending = match world.get_mut::<TweenCallbackFlags>(entity) {
        Some(mut flags) => flags.take_pending(),
        None => return 0,
    };
    // Callbacks are moved out while they run so they can borrow the world.
    let mut actions = match world.get_mut::<TweenCallbackActions>(entity) {
        Some(mut actions) => std::mem::take(&mut *actions),
        None => return 0,
    };

    let mut invoked = 0;
    for event in DISPATCH_ORDER {
        if !pending.contains(event.flag()) {
            continue;
        }
        for callback in actions.callbacks_mut(event) {
            invoked += 1;
            let result = catch_unwind(AssertUnwindSafe(|| callback(entity, world)));
            if let Err(payload) = result {
                world
                    .resource::<TweenDiagnostics>()
                    .report(TweenDiagnostic::CallbackFailure {
                        tween: entity,
                        event,
                        message: panic_message(payload.as_ref()),
                    });
            }
        }
    }

    // Put the callbacks back, keeping any registered while they were out.
    if let Some(mut slot) = world.get_mut::<TweenCallbackActions>(entity) {
        let added = std::mem::replace(&mut *slot, actions);
        slot.merge(added);
        let registered = slot.registered();
        if let Some(mut flags) = world.get_mut::<TweenCallbackFlags>(entity) {
            flags.registered = registered;
        }
    }
    invoked
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
