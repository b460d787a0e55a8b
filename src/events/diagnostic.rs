//! Diagnostics for failures contained inside a tick.
//!
//! Whenever a record's translator, target handle or callback fails, the
//! failure is isolated to that record and a [`TweenDiagnostic`] is handed to
//! [`TweenDiagnostics`](crate::resources::diagnostics::TweenDiagnostics),
//! which logs it and forwards it to an optional channel.
//!
//! # Example
//!
//! ```ignore
//! let rx = engine.diagnostics_receiver(64);
//! engine.tick(1.0 / 60.0);
//! for diag in rx.try_iter() {
//!     eprintln!("{diag}");
//! }
//! ```

use bevy_ecs::prelude::Entity;
use std::fmt;

use crate::components::callbacks::TweenEvent;
use crate::resources::targetregistry::TargetId;

/// Scheduler phase in which a translator was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorPhase {
    /// Sampling the start value from the target.
    Get,
    /// Writing the current value to the target.
    Apply,
}

/// A failure that was contained to a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum TweenDiagnostic {
    /// The record's target handle did not resolve to a live registry slot.
    TargetUnavailable {
        tween: Entity,
        target: TargetId,
        reason: String,
    },
    /// The translator returned an error.
    TranslatorFailure {
        tween: Entity,
        phase: TranslatorPhase,
        message: String,
    },
    /// A user callback panicked.
    CallbackFailure {
        tween: Entity,
        event: TweenEvent,
        message: String,
    },
}

impl TweenDiagnostic {
    pub fn tween(&self) -> Entity {
        match self {
            TweenDiagnostic::TargetUnavailable { tween, .. }
            | TweenDiagnostic::TranslatorFailure { tween, .. }
            | TweenDiagnostic::CallbackFailure { tween, .. } => *tween,
        }
    }
}

impl fmt::Display for TweenDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TweenDiagnostic::TargetUnavailable {
                tween,
                target,
                reason,
            } => write!(f, "tween {tween:?}: target {target:?} unavailable: {reason}"),
            TweenDiagnostic::TranslatorFailure {
                tween,
                phase,
                message,
            } => write!(f, "tween {tween:?}: translator {phase:?} failed: {message}"),
            TweenDiagnostic::CallbackFailure {
                tween,
                event,
                message,
            } => write!(f, "tween {tween:?}: {event:?} callback panicked: {message}"),
        }
    }
}
