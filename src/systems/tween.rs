//! Tween progress and evaluation systems.
//!
//! - [`advance_tweens_system`] – advances time of every playing record and
//!   raises lifecycle flags (start, update, step complete, complete, kill)
//! - [`evaluate_tweens_system`] – computes `TweenValue<V>` for two-point records
//! - [`settle_tweens_system`] – clears per-tick markers once values are applied
//!
//! Progress is value-type agnostic: it runs once per record and stores the
//! eased parameter in [`TweenProgress::eased`], which the per-type evaluate
//! systems (and [`crate::systems::path`]) consume. The systems read delta time
//! from [`WorldTime`](crate::resources::worldtime::WorldTime).

use crate::components::callbacks::{CallbackFlags, TweenCallbackFlags};
use crate::components::path::TweenPath;
use crate::components::tween::{
    Easing, LoopMode, TerminalReason, TweenEndValue, TweenProgress, TweenStartValue, TweenState,
    TweenStatus, TweenValue,
};
use crate::resources::worldtime::WorldTime;
use crate::value::TweenValueType;
use bevy_ecs::prelude::*;
use std::f32::consts::PI;

const BACK_C1: f32 = 1.70158;
const BACK_C3: f32 = BACK_C1 + 1.0;

/// Apply an easing function to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0] and transformed according to the
/// easing curve. Back easings leave [0.0, 1.0] in between the endpoints.
pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
        Easing::SineIn => 1.0 - (t * PI * 0.5).cos(),
        Easing::SineOut => (t * PI * 0.5).sin(),
        Easing::SineInOut => -((PI * t).cos() - 1.0) * 0.5,
        Easing::BackIn => BACK_C3 * t * t * t - BACK_C1 * t * t,
        Easing::BackOut => {
            let p = t - 1.0;
            1.0 + BACK_C3 * p * p * p + BACK_C1 * p * p
        }
    }
}

/// Result of advancing a record's time by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Still inside the current loop.
    Running,
    /// Crossed a loop boundary; more loops follow.
    LoopEnded,
    /// Crossed the final boundary.
    Finished,
}

/// Advance tween time and handle looping/completion.
pub(crate) fn advance(progress: &mut TweenProgress, dt: f32) -> Step {
    let duration = progress.duration;
    let dir = if progress.forward { 1.0 } else { -1.0 };
    progress.time += dt * dir;

    let finished_forward = progress.forward && progress.time >= duration;
    let finished_backward = !progress.forward && progress.time <= 0.0;

    if !(finished_forward || finished_backward) {
        return Step::Running;
    }

    progress.completed_loops += 1;
    let last_loop = match progress.loop_mode {
        LoopMode::Once => true,
        LoopMode::Loop | LoopMode::PingPong => progress
            .loops
            .is_some_and(|n| progress.completed_loops >= n),
    };
    if last_loop {
        progress.time = progress.time.clamp(0.0, duration);
        return Step::Finished;
    }

    if progress.loop_mode == LoopMode::PingPong {
        progress.forward = !progress.forward;
        progress.time = progress.time.clamp(0.0, duration);
    } else {
        progress.time = if finished_forward { 0.0 } else { duration };
    }
    Step::LoopEnded
}

/// Events raised when a record finishes its last loop.
pub(crate) fn finish(status: &mut TweenStatus) -> CallbackFlags {
    status.state = TweenState::Completed;
    if status.auto_kill && status.terminal.is_none() {
        status.terminal = Some(TerminalReason::Completed);
        return CallbackFlags::ON_COMPLETE | CallbackFlags::ON_KILL;
    }
    CallbackFlags::ON_COMPLETE
}

/// Advance every playing record and raise its lifecycle flags.
///
/// Records that faulted while sampling their start value this tick are
/// skipped entirely.
pub fn advance_tweens_system(
    world_time: Res<WorldTime>,
    mut query: Query<(
        &mut TweenProgress,
        &mut TweenStatus,
        &mut TweenCallbackFlags,
    )>,
) {
    let dt = world_time.delta.max(0.0);
    for (mut progress, mut status, mut flags) in query.iter_mut() {
        if !status.is_active() {
            continue;
        }
        let mut events = CallbackFlags::ON_UPDATE;
        if !status.started {
            status.started = true;
            events |= CallbackFlags::ON_START | CallbackFlags::ON_PLAY;
        }
        match advance(&mut progress, dt) {
            Step::Running => {}
            Step::LoopEnded => events |= CallbackFlags::ON_STEP_COMPLETE,
            Step::Finished => events |= CallbackFlags::ON_STEP_COMPLETE | finish(&mut status),
        }
        progress.eased = ease(progress.easing, progress.normalized());
        progress.dirty = true;
        flags.raise(events);
    }
}

/// Compute the current value of two-point records holding values of type `V`.
pub fn evaluate_tweens_system<V: TweenValueType>(
    mut query: Query<
        (
            &TweenProgress,
            &TweenStatus,
            &TweenStartValue<V>,
            &TweenEndValue<V>,
            &mut TweenValue<V>,
        ),
        Without<TweenPath>,
    >,
) {
    for (progress, status, start, end, mut value) in query.iter_mut() {
        if !progress.dirty || status.faulted {
            continue;
        }
        value.0 = V::lerp(start.value, end.0, progress.eased);
    }
}

/// Clear per-tick markers after values were applied.
///
/// Runs before callbacks are dispatched, so authoring calls made from a
/// callback (rewind, complete) keep their markers for the next tick.
pub fn settle_tweens_system(mut query: Query<(&mut TweenProgress, &mut TweenStatus)>) {
    for (mut progress, mut status) in query.iter_mut() {
        progress.dirty = false;
        status.faulted = false;
    }
}
