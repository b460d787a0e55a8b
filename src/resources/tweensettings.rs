//! Engine settings resource.
//!
//! Holds the tunables of a [`TweenEngine`](crate::engine::TweenEngine),
//! loaded from an INI file. Defaults are safe to run with when the file is
//! missing.
//!
//! # Configuration File Format
//!
//! ```ini
//! [registry]
//! initial_capacity = 32
//!
//! [dispatcher]
//! initial_capacity = 256
//!
//! [schedule]
//! multi_threaded = false
//!
//! [diagnostics]
//! log_failures = true
//! channel_capacity = 256
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_REGISTRY_CAPACITY: usize = 32;
const DEFAULT_DISPATCH_CAPACITY: usize = 256;
const DEFAULT_MULTI_THREADED: bool = false;
const DEFAULT_LOG_FAILURES: bool = true;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_CONFIG_PATH: &str = "./tweencore.ini";

/// Engine settings resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TweenSettings {
    /// Slots preallocated by every target registry.
    pub registry_capacity: usize,
    /// Records the dispatcher's queue holds before it reallocates.
    pub dispatch_capacity: usize,
    /// Run independent batches on the multi-threaded executor.
    pub multi_threaded: bool,
    /// Log every contained failure.
    pub log_failures: bool,
    /// Capacity of the diagnostics channel.
    pub channel_capacity: usize,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for TweenSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl TweenSettings {
    /// Create settings with safe default values.
    pub fn new() -> Self {
        Self {
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
            multi_threaded: DEFAULT_MULTI_THREADED,
            log_failures: DEFAULT_LOG_FAILURES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create settings backed by a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load settings from the INI file.
    ///
    /// Missing values retain their current values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        if let Some(capacity) = config.getuint("registry", "initial_capacity").ok().flatten() {
            self.registry_capacity = capacity as usize;
        }
        if let Some(capacity) = config.getuint("dispatcher", "initial_capacity").ok().flatten() {
            self.dispatch_capacity = capacity as usize;
        }
        if let Some(multi) = config.getbool("schedule", "multi_threaded").ok().flatten() {
            self.multi_threaded = multi;
        }
        if let Some(log_failures) = config.getbool("diagnostics", "log_failures").ok().flatten() {
            self.log_failures = log_failures;
        }
        if let Some(capacity) = config.getuint("diagnostics", "channel_capacity").ok().flatten() {
            self.channel_capacity = (capacity as usize).max(1);
        }

        info!(
            "Loaded settings: registry={}, dispatcher={}, multi_threaded={}, log_failures={}, channel={}",
            self.registry_capacity,
            self.dispatch_capacity,
            self.multi_threaded,
            self.log_failures,
            self.channel_capacity
        );

        Ok(())
    }

    /// Save settings to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set(
            "registry",
            "initial_capacity",
            Some(self.registry_capacity.to_string()),
        );
        config.set(
            "dispatcher",
            "initial_capacity",
            Some(self.dispatch_capacity.to_string()),
        );
        config.set("schedule", "multi_threaded", Some(self.multi_threaded.to_string()));
        config.set("diagnostics", "log_failures", Some(self.log_failures.to_string()));
        config.set(
            "diagnostics",
            "channel_capacity",
            Some(self.channel_capacity.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved settings to {:?}", self.config_path);

        Ok(())
    }

    /// Load from `path`, falling back to defaults when the file is missing or invalid.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Self {
        let mut settings = Self::with_path(path);
        if let Err(e) = settings.load_from_file() {
            info!("Using default settings: {}", e);
        }
        settings
    }
}
