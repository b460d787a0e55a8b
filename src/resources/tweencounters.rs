//! Record bookkeeping.
use bevy_ecs::prelude::Resource;
use serde::Serialize;

/// Creation serials and lifetime totals.
#[derive(Resource, Debug, Clone, Copy, Default, Serialize)]
pub struct TweenCounters {
    /// Serial handed to the next created record.
    pub next_serial: u64,
    pub created: u64,
    pub destroyed: u64,
}

impl TweenCounters {
    /// Take the next creation serial.
    pub fn next(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.created += 1;
        serial
    }

    /// Records currently alive.
    pub fn live(&self) -> u64 {
        self.created - self.destroyed
    }
}
