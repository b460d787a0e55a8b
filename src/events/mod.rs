//! Event types emitted by the tween core.
//!
//! Submodules:
//! - [`diagnostic`] – failures contained to a single record during a tick
pub mod diagnostic;
