//! Schedule integration tests.
//!
//! Wire the tween systems into a raw `World` + `Schedule` the way a host
//! embedding the core in its own ECS would, without the `TweenEngine`
//! facade.
//!
//! # Test Categories
//!
//! 1. **Phase order** - get, compute, set and dispatch happen in that order
//! 2. **Partial schedules** - systems usable on their own
//! 3. **Executors** - single and multi-threaded schedules agree

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use std::sync::{Arc, Mutex};

use tweencore::components::callbacks::TweenEvent;
use tweencore::engine::TweenSet;
use tweencore::error::TranslatorError;
use tweencore::resources::targetregistry::{TargetId, TargetRegistry};
use tweencore::resources::tweensettings::TweenSettings;
use tweencore::store::{self, TweenConfig};
use tweencore::systems::callbacks::dispatch_tween_callbacks;
use tweencore::systems::cleanup::cleanup_terminal_tweens;
use tweencore::systems::time::update_world_time;
use tweencore::systems::translation::{apply_values_system, sample_start_values_system};
use tweencore::systems::tween::{advance_tweens_system, evaluate_tweens_system, settle_tweens_system};
use tweencore::translator::Translator;

// =============================================================================
// Test doubles
// =============================================================================

type Journal = Arc<Mutex<Vec<&'static str>>>;

#[derive(Debug, Default)]
struct Gauge {
    level: f32,
}

/// Translator that journals every call it receives.
#[derive(Component, Clone)]
struct JournalTranslator {
    journal: Journal,
}

impl Translator for JournalTranslator {
    type Value = f32;
    type Object = Gauge;

    fn get(&self, object: &Gauge) -> Result<f32, TranslatorError> {
        self.journal.lock().unwrap().push("get");
        Ok(object.level)
    }

    fn apply(&self, object: &mut Gauge, value: f32) -> Result<(), TranslatorError> {
        self.journal.lock().unwrap().push("apply");
        object.level = value;
        Ok(())
    }
}

fn make_world() -> World {
    let mut settings = TweenSettings::new();
    settings.log_failures = false;
    let mut world = World::new();
    store::init_tween_world(&mut world, &settings);
    world.insert_resource(TargetRegistry::<Gauge>::new());
    world
}

fn full_schedule(kind: ExecutorKind) -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(kind);
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
    schedule.add_systems(sample_start_values_system::<JournalTranslator>.in_set(TweenSet::Sample));
    schedule.add_systems(advance_tweens_system.in_set(TweenSet::Advance));
    schedule.add_systems(evaluate_tweens_system::<f32>.in_set(TweenSet::Evaluate));
    schedule.add_systems(apply_values_system::<JournalTranslator>.in_set(TweenSet::Apply));
    schedule.add_systems(settle_tweens_system.in_set(TweenSet::Settle));
    schedule.add_systems(dispatch_tween_callbacks.in_set(TweenSet::Dispatch));
    schedule.add_systems(cleanup_terminal_tweens.in_set(TweenSet::Cleanup));
    schedule
}

fn tick(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
}

// =============================================================================
// CATEGORY 1: Phase order
// =============================================================================

#[test]
fn get_compute_set_then_dispatch() {
    let mut world = make_world();
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let handle = world
        .resource_mut::<TargetRegistry<Gauge>>()
        .register(Gauge { level: 2.0 }, TargetId(1));
    let j = journal.clone();
    let config = TweenConfig::to(4.0_f32, 1.0).on(TweenEvent::Update, move |id, world| {
        // the applied value is already visible on the target
        let level = world
            .resource::<TargetRegistry<Gauge>>()
            .objects()
            .first()
            .map(|g| g.level);
        assert_eq!(level, store::tween_value::<f32>(world, id).ok());
        j.lock().unwrap().push("update");
    });
    store::create_tween_on(
        &mut world,
        config,
        handle,
        JournalTranslator {
            journal: journal.clone(),
        },
    )
    .unwrap();

    let mut schedule = full_schedule(ExecutorKind::SingleThreaded);
    tick(&mut world, &mut schedule, 0.5);
    tick(&mut world, &mut schedule, 0.25);

    assert_eq!(
        *journal.lock().unwrap(),
        vec!["get", "apply", "update", "apply", "update"]
    );
    let level = world
        .resource::<TargetRegistry<Gauge>>()
        .objects()[0]
        .level;
    assert!((level - 3.5).abs() < 1e-5);
}

// =============================================================================
// CATEGORY 2: Partial schedules
// =============================================================================

#[test]
fn advance_and_evaluate_without_targets() {
    let mut world = make_world();
    let id = store::create_tween(&mut world, TweenConfig::new(10.0_f32, 20.0, 2.0)).unwrap();

    let mut schedule = Schedule::default();
    schedule.add_systems((advance_tweens_system, evaluate_tweens_system::<f32>).chain());
    tick(&mut world, &mut schedule, 1.0);

    assert_eq!(store::tween_value::<f32>(&world, id).unwrap(), 15.0);
}

#[test]
fn dispatch_runs_as_exclusive_system() {
    let mut world = make_world();
    let hits = Arc::new(Mutex::new(0));
    let h = hits.clone();
    let config = TweenConfig::new(0.0_f32, 1.0, 1.0).on(TweenEvent::Start, move |_, _| {
        *h.lock().unwrap() += 1;
    });
    store::create_tween(&mut world, config).unwrap();

    let mut schedule = Schedule::default();
    schedule.add_systems((advance_tweens_system, dispatch_tween_callbacks).chain());
    tick(&mut world, &mut schedule, 0.1);
    tick(&mut world, &mut schedule, 0.1);

    assert_eq!(*hits.lock().unwrap(), 1);
}

// =============================================================================
// CATEGORY 3: Executors
// =============================================================================

#[test]
fn single_and_multi_threaded_schedules_agree() {
    let mut levels = Vec::new();
    for kind in [ExecutorKind::SingleThreaded, ExecutorKind::MultiThreaded] {
        let mut world = make_world();
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        for i in 0..16 {
            let handle = world
                .resource_mut::<TargetRegistry<Gauge>>()
                .register(Gauge { level: i as f32 }, TargetId(i));
            let config = TweenConfig::to(100.0_f32, 1.0);
            store::create_tween_on(
                &mut world,
                config,
                handle,
                JournalTranslator {
                    journal: journal.clone(),
                },
            )
            .unwrap();
        }
        let mut schedule = full_schedule(kind);
        for _ in 0..3 {
            tick(&mut world, &mut schedule, 0.25);
        }
        levels.push(
            world
                .resource::<TargetRegistry<Gauge>>()
                .objects()
                .iter()
                .map(|g| g.level)
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(levels[0], levels[1]);
}
