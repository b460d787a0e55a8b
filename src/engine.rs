//! Tween engine facade.
//!
//! [`TweenEngine`] owns the ECS world holding every record, the target
//! registries and the schedule that runs one tick. A host creates one engine
//! per session, registers its external objects, creates tweens and calls
//! [`TweenEngine::tick`] once per frame.
//!
//! # Tick
//!
//! The schedule runs the [`TweenSet`] phases in order:
//!
//! 1. `Sample` – read start values of `To` records from their targets
//! 2. `Advance` – move time forward and raise lifecycle flags
//! 3. `Evaluate` – compute current values (two-point or path)
//! 4. `Apply` – write current values to targets
//! 5. `Settle` – clear per-tick markers
//! 6. `Dispatch` – run callbacks (single-threaded, exclusive)
//! 7. `Cleanup` – despawn terminal records, release their targets
//!
//! Sample and Apply run one system per translator type, Evaluate one per
//! value type. Systems in the same phase touch disjoint data and may run in
//! parallel when the schedule is multi-threaded.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = TweenEngine::new(TweenSettings::default()).with_transform_targets();
//! let target = engine.register_target(Transform::default(), TargetId(1));
//! engine.create_tween_on(TweenConfig::to(Vec3::ONE, 0.5), target, PositionTranslator)?;
//! engine.tick(1.0 / 60.0);
//! ```

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use crossbeam_channel::Receiver;
use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use std::any::TypeId;

use crate::components::callbacks::{TweenCallback, TweenEvent};
use crate::components::tween::{TerminalReason, TweenRecord};
use crate::error::TweenError;
use crate::events::diagnostic::TweenDiagnostic;
use crate::resources::callbackdispatcher::CallbackDispatcher;
use crate::resources::diagnostics::{DiagnosticCounts, TweenDiagnostics};
use crate::resources::targetregistry::{TargetHandle, TargetId, TargetRegistry};
use crate::resources::tweencounters::TweenCounters;
use crate::resources::tweensettings::TweenSettings;
use crate::resources::worldtime::WorldTime;
use crate::store::{self, TweenConfig, TweenInfo};
use crate::systems::callbacks::dispatch_tween_callbacks;
use crate::systems::cleanup::cleanup_terminal_tweens;
use crate::systems::path::evaluate_path_tweens_system;
use crate::systems::time::update_world_time;
use crate::systems::translation::{apply_values_system, sample_start_values_system};
use crate::systems::tween::{advance_tweens_system, evaluate_tweens_system, settle_tweens_system};
use crate::translator::{
    AngleTranslator, PositionTranslator, RotationTranslator, ScaleTranslator, Transform, Translator,
};
use crate::value::TweenValueType;

/// Phases of one tick, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenSet {
    Sample,
    Advance,
    Evaluate,
    Apply,
    Settle,
    Dispatch,
    Cleanup,
}

fn clear_registry<O: Send + Sync + 'static>(world: &mut World) {
    if let Some(mut registry) = world.get_resource_mut::<TargetRegistry<O>>() {
        registry.clear();
    }
}

pub struct TweenEngine {
    world: World,
    schedule: Schedule,
    value_types: FxHashSet<TypeId>,
    translators: FxHashSet<TypeId>,
    /// Teardown hook per registered object kind.
    object_kinds: FxHashMap<TypeId, fn(&mut World)>,
}

impl Default for TweenEngine {
    fn default() -> Self {
        Self::new(TweenSettings::default())
    }
}

impl TweenEngine {
    pub fn new(settings: TweenSettings) -> Self {
        let mut world = World::new();
        store::init_tween_world(&mut world, &settings);

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(if settings.multi_threaded {
            ExecutorKind::MultiThreaded
        } else {
            ExecutorKind::SingleThreaded
        });
        schedule.configure_sets(
            (
                TweenSet::Sample,
                TweenSet::Advance,
                TweenSet::Evaluate,
                TweenSet::Apply,
                TweenSet::Settle,
                TweenSet::Dispatch,
                TweenSet::Cleanup,
            )
                .chain(),
        );
        schedule.add_systems(advance_tweens_system.in_set(TweenSet::Advance));
        schedule.add_systems(evaluate_path_tweens_system.in_set(TweenSet::Evaluate));
        schedule.add_systems(settle_tweens_system.in_set(TweenSet::Settle));
        schedule.add_systems(dispatch_tween_callbacks.in_set(TweenSet::Dispatch));
        schedule.add_systems(cleanup_terminal_tweens.in_set(TweenSet::Cleanup));

        log::info!(
            "tween engine created ({} executor)",
            if settings.multi_threaded {
                "multi-threaded"
            } else {
                "single-threaded"
            }
        );

        let mut engine = TweenEngine {
            world,
            schedule,
            value_types: FxHashSet::default(),
            translators: FxHashSet::default(),
            object_kinds: FxHashMap::default(),
        };
        // Path records always hold Vec3 values.
        engine.add_value_type::<Vec3>();
        engine
    }

    /// Schedule evaluation of two-point records holding `V`.
    pub fn add_value_type<V: TweenValueType>(&mut self) -> &mut Self {
        if self.value_types.insert(TypeId::of::<V>()) {
            self.schedule
                .add_systems(evaluate_tweens_system::<V>.in_set(TweenSet::Evaluate));
        }
        self
    }

    /// Make `O` registrable as a target kind.
    pub fn add_object_kind<O: Send + Sync + 'static>(&mut self) -> &mut Self {
        if let std::collections::hash_map::Entry::Vacant(slot) =
            self.object_kinds.entry(TypeId::of::<O>())
        {
            let capacity = self.world.resource::<TweenSettings>().registry_capacity;
            self.world
                .insert_resource(TargetRegistry::<O>::with_capacity(capacity));
            slot.insert(clear_registry::<O>);
        }
        self
    }

    /// Schedule the sample/apply batch of `Tr`.
    pub fn add_translator<Tr: Translator>(&mut self) -> &mut Self {
        if self.translators.insert(TypeId::of::<Tr>()) {
            self.add_value_type::<Tr::Value>();
            self.add_object_kind::<Tr::Object>();
            self.schedule
                .add_systems(sample_start_values_system::<Tr>.in_set(TweenSet::Sample));
            self.schedule
                .add_systems(apply_values_system::<Tr>.in_set(TweenSet::Apply));
            log::debug!("translator {} added", std::any::type_name::<Tr>());
        }
        self
    }

    /// Add every built-in [`Transform`] translator.
    pub fn with_transform_targets(mut self) -> Self {
        self.add_translator::<PositionTranslator>()
            .add_translator::<ScaleTranslator>()
            .add_translator::<RotationTranslator>()
            .add_translator::<AngleTranslator>()
            .add_value_type::<f32>();
        self
    }

    /// Run one tick. `dt` is the unscaled frame delta in seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
    }

    /// Callbacks are being dispatched.
    ///
    /// Always `false` between ticks. Callbacks receive the `World`, not the
    /// engine; they check the same state with
    /// [`store::is_dispatching`](crate::store::is_dispatching).
    pub fn is_executing(&self) -> bool {
        store::is_dispatching(&self.world)
    }

    // ==================== TARGETS ====================

    /// Register an external object under `id`. Returns the existing handle
    /// if `id` is already registered.
    pub fn register_target<O: Send + Sync + 'static>(
        &mut self,
        object: O,
        id: TargetId,
    ) -> TargetHandle {
        self.add_object_kind::<O>();
        self.world
            .resource_mut::<TargetRegistry<O>>()
            .register(object, id)
    }

    /// Remove the object registered under `id`. Records still pointing at
    /// it are killed on their next access.
    pub fn unregister_target<O: Send + Sync + 'static>(&mut self, id: TargetId) -> Option<O> {
        self.world
            .get_resource_mut::<TargetRegistry<O>>()
            .and_then(|mut registry| registry.unregister(id))
    }

    pub fn registry<O: Send + Sync + 'static>(&self) -> Option<&TargetRegistry<O>> {
        self.world.get_resource::<TargetRegistry<O>>()
    }

    pub fn registry_mut<O: Send + Sync + 'static>(
        &mut self,
    ) -> Option<Mut<'_, TargetRegistry<O>>> {
        self.world.get_resource_mut::<TargetRegistry<O>>()
    }

    // ==================== RECORDS ====================

    pub fn create_tween<V: TweenValueType>(
        &mut self,
        config: TweenConfig<V>,
    ) -> Result<Entity, TweenError> {
        self.add_value_type::<V>();
        store::create_tween(&mut self.world, config)
    }

    pub fn create_tween_on<Tr: Translator>(
        &mut self,
        config: TweenConfig<Tr::Value>,
        target: TargetHandle,
        translator: Tr,
    ) -> Result<Entity, TweenError> {
        self.add_translator::<Tr>();
        store::create_tween_on(&mut self.world, config, target, translator)
    }

    pub fn value<V: TweenValueType>(&self, id: Entity) -> Result<V, TweenError> {
        store::tween_value(&self.world, id)
    }

    pub fn set_value<V: TweenValueType>(&mut self, id: Entity, value: V) -> Result<(), TweenError> {
        store::set_tween_value(&mut self.world, id, value)
    }

    pub fn info(&self, id: Entity) -> Result<TweenInfo, TweenError> {
        store::tween_info(&self.world, id)
    }

    pub fn contains(&self, id: Entity) -> bool {
        self.world.get::<TweenRecord>(id).is_some()
    }

    pub fn mark_terminal(&mut self, id: Entity, reason: TerminalReason) -> Result<(), TweenError> {
        store::mark_tween_terminal(&mut self.world, id, reason)
    }

    pub fn destroy(&mut self, id: Entity) -> Result<(), TweenError> {
        store::destroy_tween(&mut self.world, id)
    }

    pub fn kill(&mut self, id: Entity) -> Result<(), TweenError> {
        store::kill_tween(&mut self.world, id)
    }

    pub fn complete(&mut self, id: Entity) -> Result<(), TweenError> {
        store::complete_tween(&mut self.world, id)
    }

    pub fn rewind(&mut self, id: Entity) -> Result<(), TweenError> {
        store::rewind_tween(&mut self.world, id)
    }

    pub fn pause(&mut self, id: Entity) -> Result<(), TweenError> {
        store::pause_tween(&mut self.world, id)
    }

    pub fn play(&mut self, id: Entity) -> Result<(), TweenError> {
        store::play_tween(&mut self.world, id)
    }

    pub fn on(
        &mut self,
        id: Entity,
        event: TweenEvent,
        callback: impl FnMut(Entity, &mut World) + Send + Sync + 'static,
    ) -> Result<(), TweenError> {
        let callback: TweenCallback = Box::new(callback);
        store::on_tween_event(&mut self.world, id, event, callback)
    }

    pub fn replace_path_points(
        &mut self,
        id: Entity,
        points: impl Into<Vec<Vec3>>,
    ) -> Result<(), TweenError> {
        store::replace_tween_path(&mut self.world, id, points)
    }

    /// Number of live records.
    pub fn tween_count(&mut self) -> usize {
        self.world
            .query::<&TweenRecord>()
            .iter(&self.world)
            .count()
    }

    // ==================== DIAGNOSTICS ====================

    /// Receive every contained failure from now on.
    pub fn diagnostics_receiver(&mut self) -> Receiver<TweenDiagnostic> {
        let capacity = self.world.resource::<TweenSettings>().channel_capacity;
        self.world
            .resource_mut::<TweenDiagnostics>()
            .attach_channel(capacity)
    }

    pub fn diagnostic_counts(&self) -> DiagnosticCounts {
        self.world.resource::<TweenDiagnostics>().counts()
    }

    /// Callbacks invoked since the engine was created.
    pub fn dispatched_callbacks(&self) -> u64 {
        self.world.resource::<CallbackDispatcher>().dispatched
    }

    pub fn counters(&self) -> TweenCounters {
        *self.world.resource::<TweenCounters>()
    }

    pub fn time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }

    pub fn settings(&self) -> &TweenSettings {
        self.world.resource::<TweenSettings>()
    }

    // ==================== SESSION ====================

    /// Drop every record and every registered target without running callbacks.
    pub fn clear(&mut self) {
        let records: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<TweenRecord>>()
            .iter(&self.world)
            .collect();
        let count = records.len() as u64;
        for entity in records {
            self.world.despawn(entity);
        }
        self.world.resource_mut::<TweenCounters>().destroyed += count;
        for clear in self.object_kinds.values() {
            clear(&mut self.world);
        }
        log::info!("tween engine cleared ({} records dropped)", count);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access, for running store functions or custom systems.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
