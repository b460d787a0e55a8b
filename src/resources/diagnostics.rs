//! Diagnostics sink resource.
//!
//! Shared by every batch, so counters are atomics and the resource is only
//! ever borrowed immutably by systems.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::diagnostic::TweenDiagnostic;

/// Logs contained failures and forwards them to an optional channel.
#[derive(Resource, Default)]
pub struct TweenDiagnostics {
    /// Emit a `log::warn!` line per failure.
    pub log_failures: bool,
    sender: Option<Sender<TweenDiagnostic>>,
    target_failures: AtomicU64,
    translator_failures: AtomicU64,
    callback_failures: AtomicU64,
}

/// Snapshot of the failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiagnosticCounts {
    pub target_failures: u64,
    pub translator_failures: u64,
    pub callback_failures: u64,
}

impl TweenDiagnostics {
    pub fn new(log_failures: bool) -> Self {
        TweenDiagnostics {
            log_failures,
            ..Default::default()
        }
    }

    /// Open a bounded channel receiving every subsequent diagnostic.
    ///
    /// Replaces any previously attached channel. When the channel is full,
    /// further diagnostics are only logged and counted. A capacity of zero
    /// is raised to one: a rendezvous channel would drop every diagnostic.
    pub fn attach_channel(&mut self, capacity: usize) -> Receiver<TweenDiagnostic> {
        let (tx, rx) = bounded(capacity.max(1));
        self.sender = Some(tx);
        rx
    }

    pub fn report(&self, diagnostic: TweenDiagnostic) {
        let counter = match &diagnostic {
            TweenDiagnostic::TargetUnavailable { .. } => &self.target_failures,
            TweenDiagnostic::TranslatorFailure { .. } => &self.translator_failures,
            TweenDiagnostic::CallbackFailure { .. } => &self.callback_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if self.log_failures {
            log::warn!("{}", diagnostic);
        }
        if let Some(tx) = &self.sender {
            // Full or disconnected channel: the failure is already counted and logged
            let _ = tx.try_send(diagnostic);
        }
    }

    pub fn counts(&self) -> DiagnosticCounts {
        DiagnosticCounts {
            target_failures: self.target_failures.load(Ordering::Relaxed),
            translator_failures: self.translator_failures.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::diagnostic::TranslatorPhase;
    use crate::resources::targetregistry::TargetId;

    #[test]
    fn test_report_counts_and_forwards() {
        let mut diags = TweenDiagnostics::new(false);
        let rx = diags.attach_channel(4);
        let tween = Entity::PLACEHOLDER;

        diags.report(TweenDiagnostic::TranslatorFailure {
            tween,
            phase: TranslatorPhase::Apply,
            message: "boom".into(),
        });
        diags.report(TweenDiagnostic::TargetUnavailable {
            tween,
            target: TargetId(1),
            reason: "gone".into(),
        });

        let counts = diags.counts();
        assert_eq!(counts.translator_failures, 1);
        assert_eq!(counts.target_failures, 1);
        assert_eq!(counts.callback_failures, 0);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_report_with_full_channel_still_counts() {
        let mut diags = TweenDiagnostics::new(false);
        let _rx = diags.attach_channel(1);
        let tween = Entity::PLACEHOLDER;
        for _ in 0..3 {
            diags.report(TweenDiagnostic::TranslatorFailure {
                tween,
                phase: TranslatorPhase::Get,
                message: String::new(),
            });
        }
        assert_eq!(diags.counts().translator_failures, 3);
    }

    #[test]
    fn test_zero_capacity_channel_still_forwards() {
        let mut diags = TweenDiagnostics::new(false);
        let rx = diags.attach_channel(0);
        diags.report(TweenDiagnostic::CallbackFailure {
            tween: Entity::PLACEHOLDER,
            event: crate::components::callbacks::TweenEvent::Update,
            message: "boom".into(),
        });
        assert_eq!(rx.try_iter().count(), 1);
    }
}
