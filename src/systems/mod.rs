//! Tween systems.
//!
//! This module groups the ECS systems run by each tick, see
//! [`TweenSet`](crate::engine::TweenSet) for their order.
//!
//! Submodules overview
//! - [`callbacks`] – dispatch pending lifecycle callbacks
//! - [`cleanup`] – despawn terminal records and release their targets
//! - [`path`] – sample control-point paths and evaluate path records
//! - [`time`] – update the tween clock
//! - [`translation`] – per-translator get/set batches against external objects
//! - [`tween`] – easing, progress and two-point evaluation

pub mod callbacks;
pub mod cleanup;
pub mod path;
pub mod time;
pub mod translation;
pub mod tween;
