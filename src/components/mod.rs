//! ECS components making up a tween record.
//!
//! Submodules overview:
//! - [`callbacks`] – lifecycle event flags and registered user callbacks
//! - [`path`] – control points for records that follow a path
//! - [`tween`] – values, progress, status and accessor state of a record

pub mod callbacks;
pub mod path;
pub mod tween;
