//! Tween record store: creation, lookup and authoring operations.
//!
//! Every function here takes the [`World`] holding the records. The world
//! must have been prepared with [`init_tween_world`] (the
//! [`TweenEngine`](crate::engine::TweenEngine) does this).
//!
//! Structural changes (create, destroy) are rejected with
//! [`TweenError::ReentrantMutation`] while callbacks are being dispatched.
//! State transitions (kill, complete, rewind, pause, play) are allowed from
//! callbacks: they only set markers and raise callback flags, and the
//! actual removal happens in the cleanup phase.
//!
//! # Example
//!
//! ```ignore
//! let config = TweenConfig::new(0.0_f32, 5.0, 1.0)
//!     .with_easing(Easing::QuadOut)
//!     .on(TweenEvent::Complete, |id, _world| log::info!("{id:?} done"));
//! let id = create_tween(&mut world, config)?;
//! ```

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::components::callbacks::{
    CallbackFlags, TweenCallback, TweenCallbackActions, TweenCallbackFlags, TweenEvent,
};
use crate::components::path::{PathOptions, TweenPath};
use crate::components::tween::{
    AccessorFlags, Easing, LoopMode, TerminalReason, TweenAccessorFlags, TweenEndValue,
    TweenProgress, TweenRecord, TweenStartValue, TweenState, TweenStatus, TweenTarget,
    TweenTranslationMode, TweenValue,
};
use crate::error::TweenError;
use crate::resources::callbackdispatcher::CallbackDispatcher;
use crate::resources::diagnostics::TweenDiagnostics;
use crate::resources::targetregistry::{TargetHandle, TargetRegistry};
use crate::resources::tweencounters::TweenCounters;
use crate::resources::tweensettings::TweenSettings;
use crate::resources::worldtime::WorldTime;
use crate::systems::cleanup::destroy_record;
use crate::systems::translation::guarded;
use crate::systems::tween::ease;
use crate::translator::Translator;
use crate::value::TweenValueType;

/// Everything needed to create one record.
pub struct TweenConfig<V: TweenValueType> {
    pub from: V,
    pub to: V,
    pub duration: f32,
    pub easing: Easing,
    pub loop_mode: LoopMode,
    pub loops: Option<u32>,
    pub mode: TweenTranslationMode,
    pub accessors: AccessorFlags,
    /// Start playing on the next tick.
    pub autoplay: bool,
    /// Destroy the record once it completes.
    pub auto_kill: bool,
    path: Option<(Vec<Vec3>, PathOptions)>,
    callbacks: TweenCallbackActions,
}

impl<V: TweenValueType> TweenConfig<V> {
    /// Two-point tween from `from` to `to` over `duration` seconds.
    pub fn new(from: V, to: V, duration: f32) -> Self {
        TweenConfig {
            from,
            to,
            duration,
            easing: Easing::Linear,
            loop_mode: LoopMode::Once,
            loops: None,
            mode: TweenTranslationMode::FromTo,
            accessors: AccessorFlags::empty(),
            autoplay: true,
            auto_kill: true,
            path: None,
            callbacks: TweenCallbackActions::default(),
        }
    }

    /// Tween from the target's current value to `to`.
    ///
    /// Reads and writes the target, so it needs one.
    pub fn to(to: V, duration: f32) -> Self {
        Self::new(V::default(), to, duration)
            .with_mode(TweenTranslationMode::To)
            .with_accessors(AccessorFlags::GETTER | AccessorFlags::SETTER)
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Loop mode and number of loops (`None` loops forever).
    pub fn with_loops(mut self, loop_mode: LoopMode, loops: Option<u32>) -> Self {
        self.loop_mode = loop_mode;
        self.loops = loops;
        self
    }

    pub fn with_mode(mut self, mode: TweenTranslationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accessors(mut self, accessors: AccessorFlags) -> Self {
        self.accessors = accessors;
        self
    }

    /// Create the record paused; it starts on [`play_tween`].
    pub fn paused(mut self) -> Self {
        self.autoplay = false;
        self
    }

    pub fn with_auto_kill(mut self, auto_kill: bool) -> Self {
        self.auto_kill = auto_kill;
        self
    }

    /// Register a callback for `event`.
    pub fn on(
        mut self,
        event: TweenEvent,
        callback: impl FnMut(Entity, &mut World) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.push(event, Box::new(callback));
        self
    }
}

impl TweenConfig<Vec3> {
    /// Derive the value from control points instead of `from`/`to`.
    ///
    /// With [`PathOptions::relative`] the points are offsets from the start value.
    pub fn with_path(mut self, points: impl Into<Vec<Vec3>>, options: PathOptions) -> Self {
        self.path = Some((points.into(), options));
        self
    }
}

/// Read-only summary of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenInfo {
    pub serial: u64,
    pub state: TweenState,
    pub started: bool,
    pub terminal: Option<TerminalReason>,
    pub time: f32,
    pub duration: f32,
    pub completed_loops: u32,
    pub target: Option<TargetHandle>,
}

/// Insert every resource the store and the scheduler rely on.
pub fn init_tween_world(world: &mut World, settings: &TweenSettings) {
    world.insert_resource(settings.clone());
    world.insert_resource(WorldTime::default());
    world.insert_resource(TweenCounters::default());
    world.insert_resource(CallbackDispatcher::with_capacity(settings.dispatch_capacity));
    world.insert_resource(TweenDiagnostics::new(settings.log_failures));
}

/// Callbacks of the current tick are running.
pub fn is_dispatching(world: &World) -> bool {
    world
        .get_resource::<CallbackDispatcher>()
        .is_some_and(|d| d.executing)
}

fn ensure_not_dispatching(world: &World) -> Result<(), TweenError> {
    if is_dispatching(world) {
        return Err(TweenError::ReentrantMutation);
    }
    Ok(())
}

fn ensure_record(world: &World, entity: Entity) -> Result<(), TweenError> {
    if world.get::<TweenRecord>(entity).is_none() {
        return Err(TweenError::UnknownTween(entity));
    }
    Ok(())
}

/// Spawn the components shared by every record.
fn spawn_record<V: TweenValueType>(
    world: &mut World,
    config: TweenConfig<V>,
    path: Option<TweenPath>,
) -> EntityWorldMut<'_> {
    let serial = world.resource_mut::<TweenCounters>().next();
    let accessors = TweenAccessorFlags(config.accessors);
    let sampled = config.mode != TweenTranslationMode::To || !accessors.getter();
    let flags = TweenCallbackFlags::new(config.callbacks.registered());
    let progress = TweenProgress::new(config.duration)
        .with_easing(config.easing)
        .with_loop_mode(config.loop_mode)
        .with_loops(config.loops);

    let mut entity = world.spawn((
        TweenRecord { serial },
        TweenStartValue {
            value: config.from,
            sampled,
        },
        TweenEndValue(config.to),
        TweenValue(config.from),
        config.mode,
        accessors,
        flags,
        config.callbacks,
        progress,
        TweenStatus::new(config.autoplay, config.auto_kill),
    ));
    if let Some(path) = path {
        entity.insert(path);
    }
    entity
}

fn build_path<V: TweenValueType>(config: &mut TweenConfig<V>) -> Result<Option<TweenPath>, TweenError> {
    config
        .path
        .take()
        .map(|(points, options)| TweenPath::new(points, options))
        .transpose()
}

/// Create a virtual record: it computes values but never touches an object.
///
/// Fails with [`TweenError::MissingTarget`] if the config asks for accessors.
pub fn create_tween<V: TweenValueType>(
    world: &mut World,
    mut config: TweenConfig<V>,
) -> Result<Entity, TweenError> {
    ensure_not_dispatching(world)?;
    if !config.accessors.is_empty() {
        return Err(TweenError::MissingTarget {
            flags: format!("{:?}", config.accessors),
        });
    }
    let path = build_path(&mut config)?;
    let id = spawn_record(world, config, path).id();
    log::debug!("created virtual tween {:?}", id);
    Ok(id)
}

/// Drop one record reference from the registry of `O`.
fn release_target<O: Send + Sync + 'static>(world: &mut World, handle: TargetHandle) {
    if let Some(mut registry) = world.get_resource_mut::<TargetRegistry<O>>() {
        if registry.release(handle) {
            log::trace!("target {:?} has no tweens left", handle.id);
        }
    }
}

/// Create a record that tweens `target` through `translator`.
///
/// In `From` mode with the Getter flag, the end value is read from the
/// target now; a read failure is returned as [`TweenError::TranslatorFailure`].
pub fn create_tween_on<Tr: Translator>(
    world: &mut World,
    mut config: TweenConfig<Tr::Value>,
    target: TargetHandle,
    translator: Tr,
) -> Result<Entity, TweenError> {
    ensure_not_dispatching(world)?;
    let path = build_path(&mut config)?;
    {
        let registry = world
            .get_resource::<TargetRegistry<Tr::Object>>()
            .ok_or(TweenError::NotRegistered(target.id))?;
        let object = registry.get(target)?;
        if config.mode == TweenTranslationMode::From && config.accessors.contains(AccessorFlags::GETTER)
        {
            config.to = guarded(|| translator.get(object))?;
        }
    }
    world
        .resource_mut::<TargetRegistry<Tr::Object>>()
        .retain(target)?;

    let mut entity = spawn_record(world, config, path);
    entity.insert((
        TweenTarget {
            handle: target,
            release: release_target::<Tr::Object>,
        },
        translator,
    ));
    let id = entity.id();
    log::debug!("created tween {:?} on target {:?}", id, target.id);
    Ok(id)
}

/// Current value of a record.
pub fn tween_value<V: TweenValueType>(world: &World, entity: Entity) -> Result<V, TweenError> {
    ensure_record(world, entity)?;
    world
        .get::<TweenValue<V>>(entity)
        .map(|v| v.0)
        .ok_or(TweenError::ValueTypeMismatch {
            entity,
            expected: std::any::type_name::<V>(),
        })
}

/// Overwrite the current value.
///
/// The next evaluation of a playing record replaces it again.
pub fn set_tween_value<V: TweenValueType>(
    world: &mut World,
    entity: Entity,
    value: V,
) -> Result<(), TweenError> {
    ensure_record(world, entity)?;
    let mut current = world
        .get_mut::<TweenValue<V>>(entity)
        .ok_or(TweenError::ValueTypeMismatch {
            entity,
            expected: std::any::type_name::<V>(),
        })?;
    current.0 = value;
    Ok(())
}

pub fn tween_info(world: &World, entity: Entity) -> Result<TweenInfo, TweenError> {
    let record = world
        .get::<TweenRecord>(entity)
        .ok_or(TweenError::UnknownTween(entity))?;
    let status = world
        .get::<TweenStatus>(entity)
        .ok_or(TweenError::UnknownTween(entity))?;
    let progress = world
        .get::<TweenProgress>(entity)
        .ok_or(TweenError::UnknownTween(entity))?;
    Ok(TweenInfo {
        serial: record.serial,
        state: status.state,
        started: status.started,
        terminal: status.terminal,
        time: progress.time,
        duration: progress.duration,
        completed_loops: progress.completed_loops,
        target: world.get::<TweenTarget>(entity).map(|t| t.handle),
    })
}

/// Borrow the mutable state every transition touches.
fn with_record<R>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut TweenProgress, &mut TweenStatus, &mut TweenCallbackFlags) -> R,
) -> Result<R, TweenError> {
    let mut records =
        world.query::<(&mut TweenProgress, &mut TweenStatus, &mut TweenCallbackFlags)>();
    let (mut progress, mut status, mut flags) = records
        .get_mut(world, entity)
        .map_err(|_| TweenError::UnknownTween(entity))?;
    Ok(f(&mut progress, &mut status, &mut flags))
}

/// Schedule a record for destruction and raise OnKill.
///
/// The record stays visible until the cleanup phase after OnKill was
/// dispatched. A record that is already terminal is left untouched.
pub fn mark_tween_terminal(
    world: &mut World,
    entity: Entity,
    reason: TerminalReason,
) -> Result<(), TweenError> {
    with_record(world, entity, |progress, status, flags| {
        if status.is_terminal() {
            return;
        }
        status.terminal = Some(reason);
        progress.dirty = false;
        flags.raise(CallbackFlags::ON_KILL);
    })
}

pub fn kill_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    mark_tween_terminal(world, entity, TerminalReason::Killed)
}

/// Despawn a record immediately, without dispatching OnKill.
pub fn destroy_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    ensure_not_dispatching(world)?;
    ensure_record(world, entity)?;
    destroy_record(world, entity);
    Ok(())
}

/// Jump to the end of the last loop and raise OnComplete.
///
/// The end value is written on the next tick. With auto-kill the record is
/// also marked terminal.
pub fn complete_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    with_record(world, entity, |progress, status, flags| {
        if status.is_terminal() || status.state == TweenState::Completed {
            return;
        }
        let ends_at_start = progress.loop_mode == LoopMode::PingPong
            && progress.loops.is_some_and(|n| n % 2 == 0);
        progress.time = if ends_at_start { 0.0 } else { progress.duration };
        progress.forward = !ends_at_start;
        progress.completed_loops = match progress.loop_mode {
            LoopMode::Once => 1,
            LoopMode::Loop | LoopMode::PingPong => {
                progress.loops.unwrap_or(progress.completed_loops + 1)
            }
        };
        progress.eased = ease(progress.easing, progress.normalized());
        progress.dirty = true;
        status.state = TweenState::Completed;
        status.started = true;

        let mut events = CallbackFlags::ON_COMPLETE;
        if status.auto_kill {
            status.terminal = Some(TerminalReason::Completed);
            events |= CallbackFlags::ON_KILL;
        }
        flags.raise(events);
    })
}

/// Move back to the start, pause and raise OnRewind.
pub fn rewind_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    with_record(world, entity, |progress, status, flags| {
        if status.is_terminal() {
            return;
        }
        progress.time = 0.0;
        progress.forward = true;
        progress.completed_loops = 0;
        progress.eased = ease(progress.easing, 0.0);
        progress.dirty = true;
        status.state = TweenState::Paused;
        flags.raise(CallbackFlags::ON_REWIND);
    })
}

pub fn pause_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    with_record(world, entity, |_, status, flags| {
        if status.is_terminal() || status.state != TweenState::Playing {
            return;
        }
        status.state = TweenState::Paused;
        flags.raise(CallbackFlags::ON_PAUSE);
    })
}

/// Resume a paused record. OnPlay fires here for a record that already
/// started; a fresh record raises it on its first tick together with OnStart.
pub fn play_tween(world: &mut World, entity: Entity) -> Result<(), TweenError> {
    with_record(world, entity, |_, status, flags| {
        if status.is_terminal() || status.state != TweenState::Paused {
            return;
        }
        status.state = TweenState::Playing;
        if status.started {
            flags.raise(CallbackFlags::ON_PLAY);
        }
    })
}

/// Register another callback on a live record.
pub fn on_tween_event(
    world: &mut World,
    entity: Entity,
    event: TweenEvent,
    callback: TweenCallback,
) -> Result<(), TweenError> {
    ensure_record(world, entity)?;
    let mut actions = world
        .get_mut::<TweenCallbackActions>(entity)
        .ok_or(TweenError::UnknownTween(entity))?;
    actions.push(event, callback);
    let mut flags = world
        .get_mut::<TweenCallbackFlags>(entity)
        .ok_or(TweenError::UnknownTween(entity))?;
    flags.registered |= event.flag();
    Ok(())
}

/// Replace the whole control-point sequence of a path record.
pub fn replace_tween_path(
    world: &mut World,
    entity: Entity,
    points: impl Into<Vec<Vec3>>,
) -> Result<(), TweenError> {
    ensure_record(world, entity)?;
    let mut path = world
        .get_mut::<TweenPath>(entity)
        .ok_or(TweenError::NoPath(entity))?;
    path.replace_points(points)?;
    if let Some(mut progress) = world.get_mut::<TweenProgress>(entity) {
        progress.dirty = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::{PositionTranslator, Transform};
    use crate::resources::targetregistry::TargetId;

    fn setup_world() -> World {
        let mut world = World::new();
        init_tween_world(&mut world, &TweenSettings::new());
        world.insert_resource(TargetRegistry::<Transform>::new());
        world
    }

    #[test]
    fn test_create_virtual_tween() {
        let mut world = setup_world();
        let id = create_tween(&mut world, TweenConfig::new(1.0_f32, 2.0, 1.0)).unwrap();
        assert_eq!(tween_value::<f32>(&world, id).unwrap(), 1.0);
        let info = tween_info(&world, id).unwrap();
        assert_eq!(info.serial, 0);
        assert_eq!(info.state, TweenState::Playing);
        assert!(info.target.is_none());
    }

    #[test]
    fn test_virtual_tween_rejects_accessors() {
        let mut world = setup_world();
        let config = TweenConfig::new(0.0_f32, 1.0, 1.0).with_accessors(AccessorFlags::SETTER);
        assert!(matches!(
            create_tween(&mut world, config),
            Err(TweenError::MissingTarget { .. })
        ));
    }

    #[test]
    fn test_path_needs_two_points() {
        let mut world = setup_world();
        let config = TweenConfig::new(Vec3::ZERO, Vec3::ZERO, 1.0)
            .with_path(vec![Vec3::X], PathOptions::default());
        assert_eq!(
            create_tween(&mut world, config).unwrap_err(),
            TweenError::InvalidPathConfiguration { count: 1 }
        );
        assert_eq!(world.resource::<TweenCounters>().created, 0);
    }

    #[test]
    fn test_value_type_mismatch() {
        let mut world = setup_world();
        let id = create_tween(&mut world, TweenConfig::new(0.0_f32, 1.0, 1.0)).unwrap();
        assert!(matches!(
            tween_value::<Vec3>(&world, id),
            Err(TweenError::ValueTypeMismatch { .. })
        ));
        set_tween_value(&mut world, id, 0.5_f32).unwrap();
        assert_eq!(tween_value::<f32>(&world, id).unwrap(), 0.5);
    }

    #[test]
    fn test_create_on_unregistered_target_fails() {
        let mut world = setup_world();
        let handle = world
            .resource_mut::<TargetRegistry<Transform>>()
            .register(Transform::default(), TargetId(1));
        world
            .resource_mut::<TargetRegistry<Transform>>()
            .unregister(TargetId(1));
        let result = create_tween_on(
            &mut world,
            TweenConfig::to(Vec3::ONE, 1.0),
            handle,
            PositionTranslator,
        );
        assert_eq!(result.unwrap_err(), TweenError::NotRegistered(TargetId(1)));
    }

    #[test]
    fn test_from_mode_reads_end_value_at_creation() {
        let mut world = setup_world();
        let handle = world
            .resource_mut::<TargetRegistry<Transform>>()
            .register(Transform::from_position(Vec3::new(4.0, 0.0, 0.0)), TargetId(1));
        let config = TweenConfig::new(Vec3::ZERO, Vec3::ZERO, 1.0)
            .with_mode(TweenTranslationMode::From)
            .with_accessors(AccessorFlags::GETTER | AccessorFlags::SETTER);
        let id = create_tween_on(&mut world, config, handle, PositionTranslator).unwrap();
        assert_eq!(
            world.get::<TweenEndValue<Vec3>>(id).unwrap().0,
            Vec3::new(4.0, 0.0, 0.0)
        );
        assert_eq!(
            world
                .resource::<TargetRegistry<Transform>>()
                .ref_count(handle)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_destroy_releases_target() {
        let mut world = setup_world();
        let handle = world
            .resource_mut::<TargetRegistry<Transform>>()
            .register(Transform::default(), TargetId(7));
        let id = create_tween_on(
            &mut world,
            TweenConfig::to(Vec3::ONE, 1.0),
            handle,
            PositionTranslator,
        )
        .unwrap();
        destroy_tween(&mut world, id).unwrap();
        let registry = world.resource::<TargetRegistry<Transform>>();
        assert!(registry.contains(TargetId(7)));
        assert_eq!(registry.ref_count(handle), Ok(0));
        assert_eq!(destroy_tween(&mut world, id), Err(TweenError::UnknownTween(id)));
    }

    #[test]
    fn test_structural_changes_rejected_while_dispatching() {
        let mut world = setup_world();
        let id = create_tween(&mut world, TweenConfig::new(0.0_f32, 1.0, 1.0)).unwrap();
        world.resource_mut::<CallbackDispatcher>().executing = true;
        assert_eq!(
            create_tween(&mut world, TweenConfig::new(0.0_f32, 1.0, 1.0)).unwrap_err(),
            TweenError::ReentrantMutation
        );
        assert_eq!(destroy_tween(&mut world, id), Err(TweenError::ReentrantMutation));
        // transitions are still allowed
        assert!(kill_tween(&mut world, id).is_ok());
    }

    #[test]
    fn test_kill_is_idempotent() {
        let mut world = setup_world();
        let config = TweenConfig::new(0.0_f32, 1.0, 1.0).on(TweenEvent::Kill, |_, _| {});
        let id = create_tween(&mut world, config).unwrap();
        kill_tween(&mut world, id).unwrap();
        world.get_mut::<TweenCallbackFlags>(id).unwrap().take_pending();
        kill_tween(&mut world, id).unwrap();
        assert!(!world.get::<TweenCallbackFlags>(id).unwrap().has_pending());
        assert_eq!(tween_info(&world, id).unwrap().terminal, Some(TerminalReason::Killed));
    }

    #[test]
    fn test_complete_pingpong_even_loops_ends_at_start() {
        let mut world = setup_world();
        let config = TweenConfig::new(0.0_f32, 1.0, 2.0)
            .with_loops(LoopMode::PingPong, Some(2))
            .with_auto_kill(false);
        let id = create_tween(&mut world, config).unwrap();
        complete_tween(&mut world, id).unwrap();
        let info = tween_info(&world, id).unwrap();
        assert_eq!(info.time, 0.0);
        assert_eq!(info.completed_loops, 2);
        assert_eq!(info.state, TweenState::Completed);
        assert!(info.terminal.is_none());
    }

    #[test]
    fn test_pause_play_rewind_transitions() {
        let mut world = setup_world();
        let config = TweenConfig::new(0.0_f32, 1.0, 1.0)
            .on(TweenEvent::Pause, |_, _| {})
            .on(TweenEvent::Play, |_, _| {})
            .on(TweenEvent::Rewind, |_, _| {});
        let id = create_tween(&mut world, config).unwrap();

        pause_tween(&mut world, id).unwrap();
        assert_eq!(tween_info(&world, id).unwrap().state, TweenState::Paused);
        // not started yet: OnPlay waits for the first tick
        play_tween(&mut world, id).unwrap();
        let pending = world.get::<TweenCallbackFlags>(id).unwrap().pending;
        assert_eq!(pending, CallbackFlags::ON_PAUSE);

        rewind_tween(&mut world, id).unwrap();
        let info = tween_info(&world, id).unwrap();
        assert_eq!(info.state, TweenState::Paused);
        assert_eq!(info.time, 0.0);
        assert!(world
            .get::<TweenCallbackFlags>(id)
            .unwrap()
            .pending
            .contains(CallbackFlags::ON_REWIND));
    }

    #[test]
    fn test_replace_path_on_two_point_record() {
        let mut world = setup_world();
        let id = create_tween(&mut world, TweenConfig::new(Vec3::ZERO, Vec3::X, 1.0)).unwrap();
        assert_eq!(
            replace_tween_path(&mut world, id, vec![Vec3::ZERO, Vec3::Y]),
            Err(TweenError::NoPath(id))
        );
    }
}
