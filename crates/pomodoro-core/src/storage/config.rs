//! TOML-based application configuration.
//!
//! A flat document of `[category]` tables plus a `version` tag:
//! - `[timer]` durations (seconds), long break interval, idle grace
//! - `[ui]` countdown display, message/dialog/sound toggles, toggle key
//!
//! Files are searched system-wide first, then in the user directory
//! (`~/.config/pomodoro/config.toml`); each file present overrides the
//! options it defines. Broken files are logged and skipped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{data_dir, system_config_path};
use crate::error::ConfigError;
use crate::timer::{
    TimerConfig, DEFAULT_IDLE_GRACE_SECONDS, DEFAULT_LONG_BREAK_DURATION,
    DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_SHORT_BREAK_DURATION, DEFAULT_WORK_DURATION,
};

pub const CONFIG_VERSION: &str = "0.2";

/// Timer durations, all in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerOptions {
    #[serde(default = "default_pomodoro_duration")]
    pub pomodoro_duration: u64,
    #[serde(default = "default_short_pause_duration")]
    pub short_pause_duration: u64,
    #[serde(default = "default_long_pause_duration")]
    pub long_pause_duration: u64,
    #[serde(default = "default_long_pause_interval")]
    pub long_pause_interval: u32,
    #[serde(default = "default_idle_grace")]
    pub idle_grace: u64,
}

/// UI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_countdown_timer: bool,
    #[serde(default = "default_true")]
    pub show_messages: bool,
    #[serde(default = "default_true")]
    pub show_dialog_messages: bool,
    #[serde(default = "default_true")]
    pub play_sound: bool,
    /// Desktop shortcut for start/stop. Round-tripped for desktop
    /// frontends; the terminal frontends bind no global keys.
    #[serde(default = "default_key_toggle_timer")]
    pub key_toggle_timer: String,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub timer: TimerOptions,
    #[serde(default)]
    pub ui: UiConfig,
}

// Default functions
fn default_pomodoro_duration() -> u64 {
    DEFAULT_WORK_DURATION
}
fn default_short_pause_duration() -> u64 {
    DEFAULT_SHORT_BREAK_DURATION
}
fn default_long_pause_duration() -> u64 {
    DEFAULT_LONG_BREAK_DURATION
}
fn default_long_pause_interval() -> u32 {
    DEFAULT_LONG_BREAK_INTERVAL
}
fn default_idle_grace() -> u64 {
    DEFAULT_IDLE_GRACE_SECONDS
}
fn default_true() -> bool {
    true
}
fn default_key_toggle_timer() -> String {
    "<Ctrl><Alt>P".into()
}
fn default_version() -> String {
    CONFIG_VERSION.into()
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            pomodoro_duration: default_pomodoro_duration(),
            short_pause_duration: default_short_pause_duration(),
            long_pause_duration: default_long_pause_duration(),
            long_pause_interval: default_long_pause_interval(),
            idle_grace: default_idle_grace(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_countdown_timer: true,
            show_messages: true,
            show_dialog_messages: true,
            play_sound: true,
            key_toggle_timer: default_key_toggle_timer(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            timer: TimerOptions::default(),
            ui: UiConfig::default(),
        }
    }
}

impl From<&TimerOptions> for TimerConfig {
    fn from(opts: &TimerOptions) -> Self {
        TimerConfig {
            work_duration: opts.pomodoro_duration,
            short_break_duration: opts.short_pause_duration,
            long_break_duration: opts.long_pause_duration,
            long_break_interval: opts.long_pause_interval,
            idle_grace_seconds: opts.idle_grace,
        }
    }
}

impl From<TimerConfig> for TimerOptions {
    fn from(cfg: TimerConfig) -> Self {
        TimerOptions {
            pomodoro_duration: cfg.work_duration,
            short_pause_duration: cfg.short_break_duration,
            long_pause_duration: cfg.long_break_duration,
            long_pause_interval: cfg.long_break_interval,
            idle_grace: cfg.idle_grace_seconds,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}' as bool")))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| {
                            ConfigError::invalid(key, format!("cannot parse '{value}' as a non-negative integer"))
                        })?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(ConfigError::invalid(key, "not a single option"));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// User config file path.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be created.
    pub fn path() -> crate::error::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Files consulted by [`Config::load`], lowest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(system) = system_config_path() {
            paths.push(system);
        }
        match Self::path() {
            Ok(user) => paths.push(user),
            Err(e) => warn!("no user config directory: {e}"),
        }
        paths
    }

    /// Load from the standard search paths. Never fails: anything that
    /// cannot be read falls back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::search_paths())
    }

    /// Overlay every readable file in `paths`, in order, onto the defaults.
    pub fn load_from(paths: &[PathBuf]) -> Self {
        let mut merged = toml::Table::new();
        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::read_layer(path) {
                Ok(layer) => {
                    debug!(path = %path.display(), "using config file");
                    overlay(&mut merged, layer);
                }
                Err(e) => warn!(path = %path.display(), "skipping config file: {e}"),
            }
        }

        let mut cfg: Config = match toml::Value::Table(merged).try_into() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("merged configuration unusable, using defaults: {e}");
                Config::default()
            }
        };
        cfg.version = CONFIG_VERSION.to_string();

        if let Err(e) = cfg.timer_config().validate() {
            warn!("invalid timer settings, using defaults: {e}");
            cfg.timer = TimerOptions::default();
        }
        cfg
    }

    /// Parse one file, requiring a version tag and well-typed options.
    fn read_layer(path: &Path) -> Result<toml::Table, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        if !table.contains_key("version") {
            return Err(ConfigError::MissingVersion);
        }
        // Type-check the layer on its own so one bad file cannot poison the rest.
        toml::Value::Table(table.clone())
            .try_into::<Config>()
            .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(table)
    }

    /// Persist to the user config file.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::path()?)?;
        Ok(())
    }

    /// Write through a sibling temp file and rename into place.
    ///
    /// # Errors
    /// Returns `ConfigError::SaveFailed` on any serialization or IO failure.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let mut doc = self.clone();
        doc.version = CONFIG_VERSION.to_string();
        let content = toml::to_string_pretty(&doc).map_err(|e| failed(e.to_string()))?;

        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| failed(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| failed(e.to_string()))?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is not a valid timer configuration. On error `self`
    /// is unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        if key == "version" {
            return Err(ConfigError::invalid(key, "read-only"));
        }
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.timer_config().validate()?;
        *self = updated;
        Ok(())
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig::from(&self.timer)
    }
}

/// Merge `layer` into `base`, table by table, later values winning.
fn overlay(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                overlay(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
