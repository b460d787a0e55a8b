//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the tween world and
//! shared by every batch. Each submodule documents the semantics and
//! intended usage of its resource(s).
//!
//! Overview
//! - `callbackdispatcher` – re-entrancy guard and reusable dispatch queue
//! - `diagnostics` – log/count/forward sink for contained failures
//! - `targetregistry` – stable id to dense slot mapping of external objects
//! - `tweencounters` – creation serials and lifetime totals
//! - `tweensettings` – engine settings loaded from INI
//! - `worldtime` – tween clock and delta
pub mod callbackdispatcher;
pub mod diagnostics;
pub mod targetregistry;
pub mod tweencounters;
pub mod tweensettings;
pub mod worldtime;
