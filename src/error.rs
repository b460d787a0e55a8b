//! Error types for the tween core.
//!
//! Only configuration-time failures ever reach a caller as an `Err`. Failures
//! raised while a tick is running (translator errors, dead targets, panicking
//! callbacks) are contained per record and reported through
//! [`TweenDiagnostics`](crate::resources::diagnostics::TweenDiagnostics).

use bevy_ecs::prelude::Entity;
use thiserror::Error;

use crate::resources::targetregistry::TargetId;

/// Failure raised by a [`Translator`](crate::translator::Translator) while
/// reading from or writing to an external object.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TranslatorError {
    pub message: String,
}

impl TranslatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced to the authoring API and to registry lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TweenError {
    /// No live registry slot exists for the id.
    #[error("target {0:?} is not registered")]
    NotRegistered(TargetId),

    /// The id is registered again, but not by the registration the handle was issued for.
    #[error("handle for target {0:?} refers to a previous registration")]
    StaleHandle(TargetId),

    /// Reading the target through its translator failed at creation time.
    #[error("translator failure: {0}")]
    TranslatorFailure(#[from] TranslatorError),

    /// A path record needs at least two control points.
    #[error("path needs at least 2 control points, got {count}")]
    InvalidPathConfiguration { count: usize },

    /// Getter or Setter requested without a target to read or write.
    #[error("accessor flags {flags} require a target")]
    MissingTarget { flags: String },

    /// Create/destroy attempted while callbacks for the current tick are running.
    #[error("structural change rejected: callbacks are being dispatched")]
    ReentrantMutation,

    /// The entity is not (or no longer) a tween record.
    #[error("unknown tween {0:?}")]
    UnknownTween(Entity),

    /// Path points were replaced on a record that was not created with a path.
    #[error("tween {0:?} has no path")]
    NoPath(Entity),

    /// The record does not hold a value of the requested type.
    #[error("tween {entity:?} does not hold a value of type {expected}")]
    ValueTypeMismatch {
        entity: Entity,
        expected: &'static str,
    },
}
