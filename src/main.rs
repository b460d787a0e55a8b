//! tweencore demo entry point.
//!
//! Headless stress run of the tween core: registers a population of
//! [`Transform`] targets, keeps a population of mixed tweens alive on them
//! (`To` position tweens, ping-pong angle tweens, paths, virtual tweens),
//! randomly unregisters targets under running tweens and prints a report.
//! Exits with status 1 if the registry or the record totals disagree with
//! the world.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --tweens 5000 --frames 600 --churn 0.05 --json
//! ```

use bevy_ecs::prelude::{Entity, World};
use clap::Parser;
use glam::Vec3;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tweencore::components::callbacks::TweenEvent;
use tweencore::components::path::{PathOptions, PathType};
use tweencore::components::tween::{AccessorFlags, Easing, LoopMode};
use tweencore::engine::TweenEngine;
use tweencore::resources::diagnostics::DiagnosticCounts;
use tweencore::resources::targetregistry::{TargetHandle, TargetId};
use tweencore::resources::tweensettings::TweenSettings;
use tweencore::store::TweenConfig;
use tweencore::translator::{AngleTranslator, PositionTranslator, ScaleTranslator, Transform};

const EASINGS: [Easing; 6] = [
    Easing::Linear,
    Easing::QuadOut,
    Easing::CubicInOut,
    Easing::SineIn,
    Easing::BackOut,
    Easing::QuadInOut,
];

/// Headless tween core stress run
#[derive(Parser)]
#[command(version, about = "Runs a population of tweens against churning targets and reports the outcome.")]
struct Cli {
    /// Settings file (INI). Missing file means defaults.
    #[arg(long, value_name = "PATH", default_value = "./tweencore.ini")]
    config: PathBuf,

    /// Number of tweens kept alive.
    #[arg(long, default_value_t = 1000)]
    tweens: usize,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Probability per tick that a target is unregistered under its tweens.
    #[arg(long, default_value_t = 0.02)]
    churn: f64,

    /// Random seed (random when omitted).
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    seed: u64,
    frames: u32,
    elapsed: f32,
    created: u64,
    destroyed: u64,
    live_tweens: u64,
    registered_targets: usize,
    targets_churned: u64,
    completions: u64,
    kills: u64,
    callbacks_dispatched: u64,
    diagnostics: DiagnosticCounts,
    diagnostics_received: usize,
    registry_consistent: bool,
    counters_consistent: bool,
}

struct Demo {
    engine: TweenEngine,
    rng: fastrand::Rng,
    next_target: u64,
    completions: Arc<AtomicU64>,
    kills: Arc<AtomicU64>,
}

impl Demo {
    fn register_target(&mut self) -> TargetHandle {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        let position = Vec3::new(
            self.rng.f32() * 100.0,
            self.rng.f32() * 100.0,
            0.0,
        );
        self.engine
            .register_target(Transform::from_position(position), id)
    }

    /// Handle of a random live target, registering one if none is left.
    fn pick_target(&mut self) -> TargetHandle {
        let picked = self.engine.registry::<Transform>().and_then(|registry| {
            if registry.is_empty() {
                return None;
            }
            let slot = self.rng.usize(..registry.count());
            let id = registry.id_at(slot)?;
            registry.handle_of(id).ok()
        });
        match picked {
            Some(handle) => handle,
            None => self.register_target(),
        }
    }

    fn spawn_tween(&mut self) {
        let duration = 0.25 + self.rng.f32() * 2.0;
        let easing = EASINGS[self.rng.usize(..EASINGS.len())];
        let completions = self.completions.clone();
        let kills = self.kills.clone();
        let on_complete = move |_: Entity, _: &mut World| {
            completions.fetch_add(1, Ordering::Relaxed);
        };
        let on_kill = move |_: Entity, _: &mut World| {
            kills.fetch_add(1, Ordering::Relaxed);
        };

        let result = match self.rng.u8(..4) {
            0 => {
                let target = self.pick_target();
                let to = Vec3::new(self.rng.f32() * 100.0, self.rng.f32() * 100.0, 0.0);
                let config = TweenConfig::to(to, duration)
                    .with_easing(easing)
                    .on(TweenEvent::Complete, on_complete)
                    .on(TweenEvent::Kill, on_kill);
                self.engine.create_tween_on(config, target, PositionTranslator)
            }
            1 => {
                let target = self.pick_target();
                let config = TweenConfig::to(360.0_f32, duration)
                    .with_easing(easing)
                    .with_loops(LoopMode::PingPong, Some(2))
                    .on(TweenEvent::Complete, on_complete)
                    .on(TweenEvent::Kill, on_kill);
                self.engine.create_tween_on(config, target, AngleTranslator)
            }
            2 => {
                let target = self.pick_target();
                let points: Vec<Vec3> = (0..4)
                    .map(|_| Vec3::new(self.rng.f32() * 10.0, self.rng.f32() * 10.0, 0.0))
                    .collect();
                let options = PathOptions {
                    path_type: PathType::CatmullRom,
                    closed: self.rng.bool(),
                    relative: true,
                };
                let config = TweenConfig::to(Vec3::ZERO, duration)
                    .with_path(points, options)
                    .on(TweenEvent::Complete, on_complete)
                    .on(TweenEvent::Kill, on_kill);
                self.engine.create_tween_on(config, target, PositionTranslator)
            }
            _ => {
                let config = TweenConfig::new(1.0_f32, self.rng.f32() * 2.0, duration)
                    .with_easing(easing)
                    .on(TweenEvent::Complete, on_complete)
                    .on(TweenEvent::Kill, on_kill);
                self.engine.create_tween(config)
            }
        };
        if let Err(e) = result {
            log::warn!("could not create tween: {}", e);
        }
    }

    /// Give some targets a scale pulse that never touches their position.
    fn spawn_scale_pulse(&mut self) {
        let target = self.pick_target();
        let config = TweenConfig::new(Vec3::ONE, Vec3::splat(1.5), 0.5)
            .with_accessors(AccessorFlags::SETTER)
            .with_loops(LoopMode::PingPong, Some(4));
        if let Err(e) = self.engine.create_tween_on(config, target, ScaleTranslator) {
            log::warn!("could not create scale pulse: {}", e);
        }
    }

    /// Unregister a random target while tweens still point at it.
    fn churn_target(&mut self) -> bool {
        let victim = self.engine.registry::<Transform>().and_then(|registry| {
            if registry.is_empty() {
                return None;
            }
            registry.id_at(self.rng.usize(..registry.count()))
        });
        match victim {
            Some(id) => {
                self.engine.unregister_target::<Transform>(id);
                log::debug!("churned target {:?}", id);
                true
            }
            None => false,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = TweenSettings::load_or_default(&cli.config);
    let seed = cli.seed.unwrap_or_else(|| fastrand::u64(..));
    log::info!("seed {}", seed);

    let mut demo = Demo {
        engine: TweenEngine::new(settings).with_transform_targets(),
        rng: fastrand::Rng::with_seed(seed),
        next_target: 0,
        completions: Arc::new(AtomicU64::new(0)),
        kills: Arc::new(AtomicU64::new(0)),
    };
    let diagnostics = demo.engine.diagnostics_receiver();
    let mut diagnostics_received = 0;
    let mut targets_churned = 0;

    for _ in 0..(cli.tweens / 4).max(1) {
        demo.register_target();
    }

    for frame in 0..cli.frames {
        let live = demo.engine.tween_count();
        for _ in live..cli.tweens {
            demo.spawn_tween();
        }
        if frame % 60 == 0 {
            demo.spawn_scale_pulse();
        }
        if demo.rng.f64() < cli.churn && demo.churn_target() {
            targets_churned += 1;
        }

        demo.engine.tick(cli.dt);
        diagnostics_received += diagnostics.try_iter().count();
    }

    let registry_consistent = demo
        .engine
        .registry::<Transform>()
        .is_none_or(|registry| registry.check_consistency().is_ok());
    let counters = demo.engine.counters();
    let counters_consistent = counters.live() == demo.engine.tween_count() as u64;
    let report = Report {
        seed,
        frames: cli.frames,
        elapsed: demo.engine.time().elapsed,
        created: counters.created,
        destroyed: counters.destroyed,
        live_tweens: counters.live(),
        registered_targets: demo
            .engine
            .registry::<Transform>()
            .map_or(0, |registry| registry.count()),
        targets_churned,
        completions: demo.completions.load(Ordering::Relaxed),
        kills: demo.kills.load(Ordering::Relaxed),
        callbacks_dispatched: demo.engine.dispatched_callbacks(),
        diagnostics: demo.engine.diagnostic_counts(),
        diagnostics_received,
        registry_consistent,
        counters_consistent,
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("seed:                 {}", report.seed);
        println!("frames:               {} ({:.2}s)", report.frames, report.elapsed);
        println!(
            "tweens:               {} created, {} destroyed, {} live",
            report.created, report.destroyed, report.live_tweens
        );
        println!(
            "targets:              {} registered, {} churned",
            report.registered_targets, report.targets_churned
        );
        println!(
            "callbacks:            {} dispatched ({} complete, {} kill)",
            report.callbacks_dispatched, report.completions, report.kills
        );
        println!(
            "contained failures:   {} target, {} translator, {} callback",
            report.diagnostics.target_failures,
            report.diagnostics.translator_failures,
            report.diagnostics.callback_failures
        );
        println!("registry consistent:  {}", report.registry_consistent);
        println!("counters consistent:  {}", report.counters_consistent);
    }

    demo.engine.clear();
    if !(registry_consistent && counters_consistent) {
        std::process::exit(1);
    }
}
