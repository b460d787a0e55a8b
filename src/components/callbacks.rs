//! Lifecycle callback components.
//!
//! A record owns two pieces of callback state:
//! - [`TweenCallbackActions`] – the user closures, grouped per [`TweenEvent`]
//! - [`TweenCallbackFlags`] – which events have a registered closure, and
//!   which of those fired since the record was last dispatched
//!
//! Flags are raised by the scheduler and by authoring operations, and cleared
//! by [`dispatch_tween_callbacks`](crate::systems::callbacks::dispatch_tween_callbacks)
//! after the matching closures have run.

use bevy_ecs::prelude::*;
use bitflags::bitflags;
use smallvec::SmallVec;

bitflags! {
    /// Set of lifecycle events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallbackFlags: u8 {
        const ON_START = 1 << 0;
        const ON_PLAY = 1 << 1;
        const ON_PAUSE = 1 << 2;
        const ON_UPDATE = 1 << 3;
        const ON_REWIND = 1 << 4;
        const ON_STEP_COMPLETE = 1 << 5;
        const ON_COMPLETE = 1 << 6;
        const ON_KILL = 1 << 7;
    }
}

/// A single lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenEvent {
    Start,
    Play,
    Pause,
    Update,
    Rewind,
    StepComplete,
    Complete,
    Kill,
}

/// Dispatch order: a record's callbacks always run in this order within a tick.
pub const DISPATCH_ORDER: [TweenEvent; 8] = [
    TweenEvent::Start,
    TweenEvent::Play,
    TweenEvent::Pause,
    TweenEvent::Update,
    TweenEvent::Rewind,
    TweenEvent::StepComplete,
    TweenEvent::Complete,
    TweenEvent::Kill,
];

impl TweenEvent {
    pub fn flag(self) -> CallbackFlags {
        match self {
            TweenEvent::Start => CallbackFlags::ON_START,
            TweenEvent::Play => CallbackFlags::ON_PLAY,
            TweenEvent::Pause => CallbackFlags::ON_PAUSE,
            TweenEvent::Update => CallbackFlags::ON_UPDATE,
            TweenEvent::Rewind => CallbackFlags::ON_REWIND,
            TweenEvent::StepComplete => CallbackFlags::ON_STEP_COMPLETE,
            TweenEvent::Complete => CallbackFlags::ON_COMPLETE,
            TweenEvent::Kill => CallbackFlags::ON_KILL,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// User callback. Receives the record's id and the world, so it can read the
/// record's current value or drive the authoring API.
pub type TweenCallback = Box<dyn FnMut(Entity, &mut World) + Send + Sync>;

/// Registered callbacks of one record, one list per event.
#[derive(Component, Default)]
pub struct TweenCallbackActions {
    slots: [SmallVec<[TweenCallback; 1]>; 8],
}

impl TweenCallbackActions {
    pub fn push(&mut self, event: TweenEvent, callback: TweenCallback) {
        self.slots[event.slot()].push(callback);
    }

    pub fn callbacks_mut(&mut self, event: TweenEvent) -> &mut [TweenCallback] {
        &mut self.slots[event.slot()]
    }

    /// Events with at least one callback.
    pub fn registered(&self) -> CallbackFlags {
        DISPATCH_ORDER
            .iter()
            .filter(|e| !self.slots[e.slot()].is_empty())
            .fold(CallbackFlags::empty(), |acc, e| acc | e.flag())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_empty())
    }

    /// Append every callback of `other`, keeping per-event order.
    pub fn merge(&mut self, other: TweenCallbackActions) {
        for (dst, src) in self.slots.iter_mut().zip(other.slots) {
            dst.extend(src);
        }
    }
}

/// Which events a record listens to and which of them are waiting for dispatch.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TweenCallbackFlags {
    /// Events raised since the last dispatch of this record.
    pub pending: CallbackFlags,
    /// Events with at least one registered callback.
    pub registered: CallbackFlags,
}

impl TweenCallbackFlags {
    pub fn new(registered: CallbackFlags) -> Self {
        TweenCallbackFlags {
            pending: CallbackFlags::empty(),
            registered,
        }
    }

    /// Mark `events` as fired. Events without a callback are dropped here, so
    /// records nobody listens to never reach the dispatcher.
    #[inline]
    pub fn raise(&mut self, events: CallbackFlags) {
        self.pending |= events & self.registered;
    }

    /// Take the pending set, leaving it empty.
    #[inline]
    pub fn take_pending(&mut self) -> CallbackFlags {
        std::mem::take(&mut self.pending)
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
