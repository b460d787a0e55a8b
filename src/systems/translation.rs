//! Per-translator batch systems.
//!
//! Every [`Translator`] type gets its own pair of systems, so each run is a
//! homogeneous batch (one value type, one object kind):
//!
//! 1. [`sample_start_values_system`] – reads the target's current value as
//!    the start value of `To` records that may read their target
//! 2. [`apply_values_system`] – writes the freshly evaluated value of records
//!    that may write their target
//!
//! Failures never leave the record they happened on. A translator error or
//! panic aborts that record for the rest of the tick; a handle that no longer
//! resolves additionally marks the record terminal
//! ([`TerminalReason::TargetInvalidated`]) so it is killed at the end of the tick.

use bevy_ecs::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::components::callbacks::{CallbackFlags, TweenCallbackFlags};
use crate::components::tween::{
    TerminalReason, TweenAccessorFlags, TweenProgress, TweenStartValue, TweenStatus, TweenTarget,
    TweenTranslationMode, TweenValue,
};
use crate::error::{TranslatorError, TweenError};
use crate::events::diagnostic::{TranslatorPhase, TweenDiagnostic};
use crate::resources::diagnostics::TweenDiagnostics;
use crate::resources::targetregistry::TargetRegistry;
use crate::systems::callbacks::panic_message;
use crate::translator::Translator;

/// Run one translator call, turning a panic into a [`TranslatorError`].
pub(crate) fn guarded<T>(
    call: impl FnOnce() -> Result<T, TranslatorError>,
) -> Result<T, TranslatorError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(TranslatorError::new(format!(
            "translator panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

/// Mark a record whose target can no longer be reached.
fn invalidate_target(
    entity: Entity,
    target: &TweenTarget,
    error: TweenError,
    status: &mut TweenStatus,
    flags: &mut TweenCallbackFlags,
    diagnostics: &TweenDiagnostics,
) {
    diagnostics.report(TweenDiagnostic::TargetUnavailable {
        tween: entity,
        target: target.handle.id,
        reason: error.to_string(),
    });
    status.faulted = true;
    if status.terminal.is_none() {
        status.terminal = Some(TerminalReason::TargetInvalidated);
        flags.raise(CallbackFlags::ON_KILL);
    }
}

/// Sample start values of `To` records from their targets.
///
/// Runs before progress is advanced, so the first played tick already
/// interpolates from the sampled value.
pub fn sample_start_values_system<Tr: Translator>(
    registry: Res<TargetRegistry<Tr::Object>>,
    diagnostics: Res<TweenDiagnostics>,
    mut query: Query<(
        Entity,
        &Tr,
        &TweenTarget,
        &TweenTranslationMode,
        &TweenAccessorFlags,
        &TweenProgress,
        &mut TweenStatus,
        &mut TweenCallbackFlags,
        &mut TweenStartValue<Tr::Value>,
    )>,
) {
    for (entity, translator, target, mode, accessors, progress, mut status, mut flags, mut start) in
        query.iter_mut()
    {
        if *mode != TweenTranslationMode::To || !accessors.getter() || start.sampled {
            continue;
        }
        if status.faulted || !(status.is_active() || progress.dirty) {
            continue;
        }
        let object = match registry.get(target.handle) {
            Ok(object) => object,
            Err(e) => {
                invalidate_target(entity, target, e, &mut status, &mut flags, &diagnostics);
                continue;
            }
        };
        match guarded(|| translator.get(object)) {
            Ok(value) => {
                start.value = value;
                start.sampled = true;
            }
            Err(e) => {
                diagnostics.report(TweenDiagnostic::TranslatorFailure {
                    tween: entity,
                    phase: TranslatorPhase::Get,
                    message: e.message,
                });
                status.faulted = true;
            }
        }
    }
}

/// Write evaluated values to the targets of records with the Setter flag.
pub fn apply_values_system<Tr: Translator>(
    mut registry: ResMut<TargetRegistry<Tr::Object>>,
    diagnostics: Res<TweenDiagnostics>,
    mut query: Query<(
        Entity,
        &Tr,
        &TweenTarget,
        &TweenAccessorFlags,
        &TweenProgress,
        &TweenValue<Tr::Value>,
        &mut TweenStatus,
        &mut TweenCallbackFlags,
    )>,
) {
    for (entity, translator, target, accessors, progress, value, mut status, mut flags) in
        query.iter_mut()
    {
        if !accessors.setter() || !progress.dirty || status.faulted {
            continue;
        }
        let object = match registry.get_mut(target.handle) {
            Ok(object) => object,
            Err(e) => {
                invalidate_target(entity, target, e, &mut status, &mut flags, &diagnostics);
                continue;
            }
        };
        if let Err(e) = guarded(|| translator.apply(object, value.0)) {
            diagnostics.report(TweenDiagnostic::TranslatorFailure {
                tween: entity,
                phase: TranslatorPhase::Apply,
                message: e.message,
            });
            status.faulted = true;
        }
    }
}
