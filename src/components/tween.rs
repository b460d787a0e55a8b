//! Tween record components.
//!
//! A tween record is an entity carrying:
//! - [`TweenRecord`] – creation serial used to order callback dispatch
//! - [`TweenStartValue`], [`TweenEndValue`], [`TweenValue`] – the values of type `V`
//! - [`TweenProgress`] – time, duration, [`Easing`] and [`LoopMode`]
//! - [`TweenStatus`] – play state and terminal reason
//! - [`TweenTranslationMode`] and [`TweenAccessorFlags`] – how the record
//!   talks to its target
//! - [`TweenTarget`] – handle into a [`TargetRegistry`](crate::resources::targetregistry::TargetRegistry),
//!   absent for virtual tweens
//!
//! plus, optionally, a translator component, callback components from
//! [`super::callbacks`] and a [`TweenPath`](super::path::TweenPath).
//! See [`crate::systems::tween`] for the update systems.

use bevy_ecs::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::resources::targetregistry::TargetHandle;
use crate::value::TweenValueType;

/// Determines how a tween behaves when it reaches the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    /// Play once and stop.
    Once,
    /// Restart from the beginning when finished.
    Loop,
    /// Reverse direction when reaching either end.
    PingPong,
}

/// Easing functions for smooth interpolation.
///
/// These functions transform a linear `t` value (0.0 to 1.0) to create
/// different acceleration/deceleration curves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    /// Constant speed (no easing).
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    /// Starts slow, accelerates (cubic).
    CubicIn,
    /// Starts fast, decelerates (cubic).
    CubicOut,
    /// Slow start and end (cubic).
    CubicInOut,
    /// Starts slow, accelerates (sine).
    SineIn,
    /// Starts fast, decelerates (sine).
    SineOut,
    /// Slow start and end (sine).
    SineInOut,
    /// Pulls back below 0 before accelerating.
    BackIn,
    /// Overshoots past 1 before settling.
    BackOut,
}

/// Where the record's start value comes from.
#[derive(Component, Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TweenTranslationMode {
    /// Start value is read from the target on the first played tick.
    #[default]
    To,
    /// Start value is fixed at creation; the end value is read from the
    /// target at creation when the record may read it.
    From,
    /// Both ends are given explicitly.
    FromTo,
}

bitflags! {
    /// Permissions a record has on its external target.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessorFlags: u8 {
        /// May read the target to sample a start value.
        const GETTER = 1 << 0;
        /// May write the current value to the target.
        const SETTER = 1 << 1;
    }
}

/// Accessor permissions of a record.
#[derive(Component, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TweenAccessorFlags(pub AccessorFlags);

impl TweenAccessorFlags {
    #[inline]
    pub fn getter(&self) -> bool {
        self.0.contains(AccessorFlags::GETTER)
    }
    #[inline]
    pub fn setter(&self) -> bool {
        self.0.contains(AccessorFlags::SETTER)
    }
    /// Neither flag set: the record never touches an external object.
    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.0.is_empty()
    }
}

/// Creation serial. Lower serials are dispatched first.
#[derive(Component, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TweenRecord {
    pub serial: u64,
}

/// Value the interpolation starts from.
#[derive(Component, Copy, Clone, Debug)]
pub struct TweenStartValue<V: TweenValueType> {
    pub value: V,
    /// Set once the value has been read from the target (or was fixed at creation).
    pub sampled: bool,
}

/// Value the interpolation ends at.
#[derive(Component, Copy, Clone, Debug)]
pub struct TweenEndValue<V: TweenValueType>(pub V);

/// Current value. The only value ever written to the target.
#[derive(Component, Copy, Clone, Debug)]
pub struct TweenValue<V: TweenValueType>(pub V);

/// Handle to the external object a record reads from / writes to.
#[derive(Component, Copy, Clone, Debug)]
pub struct TweenTarget {
    pub handle: TargetHandle,
    /// Drops the record's reference in the registry of its object kind.
    pub(crate) release: fn(&mut World, TargetHandle),
}

/// Time and easing state of a record.
#[derive(Component, Clone, Debug)]
pub struct TweenProgress {
    /// Duration of one loop in seconds.
    pub duration: f32,
    /// Easing function to use.
    pub easing: Easing,
    /// Behavior when a loop ends.
    pub loop_mode: LoopMode,
    /// Number of loops to play for `Loop`/`PingPong`; `None` plays forever.
    pub loops: Option<u32>,
    /// Loops finished so far.
    pub completed_loops: u32,
    /// Current time within the loop.
    pub time: f32,
    /// Direction of playback (true = forward).
    pub forward: bool,
    /// Eased, normalized parameter of the current tick.
    pub eased: f32,
    /// The value must be re-evaluated (and written) this tick.
    pub dirty: bool,
}

impl TweenProgress {
    pub fn new(duration: f32) -> Self {
        TweenProgress {
            duration: duration.max(0.0),
            easing: Easing::Linear,
            loop_mode: LoopMode::Once,
            loops: None,
            completed_loops: 0,
            time: 0.0,
            forward: true,
            eased: 0.0,
            dirty: false,
        }
    }
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }
    pub fn with_loops(mut self, loops: Option<u32>) -> Self {
        self.loops = loops;
        self
    }

    /// Normalized position within the current loop.
    pub fn normalized(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.time / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Play state of a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TweenState {
    Playing,
    Paused,
    Completed,
}

/// Why a record left the schedule.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalReason {
    /// Finished its last loop with auto-kill enabled.
    Completed,
    /// Killed through the authoring API.
    Killed,
    /// Its target handle stopped resolving.
    TargetInvalidated,
}

/// Lifecycle status of a record.
#[derive(Component, Copy, Clone, Debug)]
pub struct TweenStatus {
    pub state: TweenState,
    /// OnStart has fired.
    pub started: bool,
    /// Destroy the record once it completes.
    pub auto_kill: bool,
    /// A get/apply failure aborted this record for the rest of the tick.
    pub faulted: bool,
    /// Set once the record is scheduled for destruction.
    pub terminal: Option<TerminalReason>,
}

impl TweenStatus {
    pub fn new(autoplay: bool, auto_kill: bool) -> Self {
        TweenStatus {
            state: if autoplay {
                TweenState::Playing
            } else {
                TweenState::Paused
            },
            started: false,
            auto_kill,
            faulted: false,
            terminal: None,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Playing, not terminal and not faulted this tick.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TweenState::Playing && !self.faulted && self.terminal.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_progress_new() {
        let p = TweenProgress::new(2.0);
        assert_eq!(p.duration, 2.0);
        assert!(matches!(p.easing, Easing::Linear));
        assert!(matches!(p.loop_mode, LoopMode::Once));
        assert_eq!(p.loops, None);
        assert_eq!(p.time, 0.0);
        assert!(p.forward);
        assert!(!p.dirty);
    }

    #[test]
    fn test_tween_progress_builder_chaining() {
        let p = TweenProgress::new(1.0)
            .with_easing(Easing::CubicOut)
            .with_loop_mode(LoopMode::PingPong)
            .with_loops(Some(3));
        assert!(matches!(p.easing, Easing::CubicOut));
        assert!(matches!(p.loop_mode, LoopMode::PingPong));
        assert_eq!(p.loops, Some(3));
    }

    #[test]
    fn test_tween_progress_negative_duration_clamped() {
        let p = TweenProgress::new(-1.0);
        assert_eq!(p.duration, 0.0);
        assert_eq!(p.normalized(), 1.0);
    }

    #[test]
    fn test_accessor_flags() {
        let both = TweenAccessorFlags(AccessorFlags::GETTER | AccessorFlags::SETTER);
        assert!(both.getter() && both.setter() && !both.is_virtual());
        let none = TweenAccessorFlags::default();
        assert!(none.is_virtual());
    }

    #[test]
    fn test_status_active() {
        let mut s = TweenStatus::new(true, true);
        assert!(s.is_active());
        s.faulted = true;
        assert!(!s.is_active());
        let paused = TweenStatus::new(false, true);
        assert!(!paused.is_active());
    }
}
