//! Callback dispatcher state.
//!
//! `executing` is the re-entrancy guard: it is set for the whole time user
//! callbacks of the current tick are running, and the authoring API rejects
//! structural changes (create/destroy) while it is set.
use bevy_ecs::prelude::*;

#[derive(Resource, Debug, Default)]
pub struct CallbackDispatcher {
    /// Callbacks of the current tick are running.
    pub executing: bool,
    /// Reusable (serial, record) buffer, sorted before every dispatch.
    pub(crate) queue: Vec<(u64, Entity)>,
    /// Callbacks invoked since the dispatcher was created.
    pub dispatched: u64,
}

impl CallbackDispatcher {
    pub fn with_capacity(capacity: usize) -> Self {
        CallbackDispatcher {
            executing: false,
            queue: Vec::with_capacity(capacity),
            dispatched: 0,
        }
    }
}
