//! Tween execution core.
//!
//! Advances many independently configured tweens once per frame tick,
//! reads and writes their external targets through typed translators and
//! fires lifecycle callbacks in a fixed order, containing every per-record
//! failure.
//!
//! - [`components`] – ECS components making up a tween record
//! - [`engine`] – [`TweenEngine`](engine::TweenEngine) facade and tick phases
//! - [`error`] – error taxonomy
//! - [`events`] – diagnostics emitted for contained failures
//! - [`resources`] – target registry, dispatcher state, settings, time
//! - [`store`] – record creation and authoring operations
//! - [`systems`] – systems run by each tick
//! - [`translator`] – the translator capability and the built-in [`Transform`](translator::Transform) target
//! - [`value`] – interpolable value types

pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod resources;
pub mod store;
pub mod systems;
pub mod translator;
pub mod value;
