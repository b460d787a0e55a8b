//! Tween clock.
//!
//! Host frames feed an unscaled delta through
//! [`update_world_time`](crate::systems::time::update_world_time); tween
//! systems only ever read the scaled `delta`.
use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Scaled seconds since the engine was created.
    pub elapsed: f32,
    /// Scaled seconds advanced by the current tick.
    pub delta: f32,
    /// Multiplier applied to every incoming delta.
    pub time_scale: f32,
    /// Number of ticks run so far.
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }
}
