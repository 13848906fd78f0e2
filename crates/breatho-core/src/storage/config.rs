//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Sound and haptic toggles
//! - Session length and default pattern
//! - Phase tick interval
//! - User-defined breathing patterns
//!
//! Configuration is stored at `~/.config/breatho/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::data_dir;
use crate::error::{ConfigError, CoreError, ValidationError};
use crate::pattern::{BreathingPattern, PatternCatalog};

pub const SESSION_MINUTES_RANGE: (u32, u32) = (1, 30);
pub const TICK_MS_RANGE: (u64, u64) = (10, 1000);

/// Feedback toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub haptics_enabled: bool,
}

/// Session preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session length in minutes.
    #[serde(default = "default_duration_min")]
    pub duration_min: u32,
    #[serde(default = "default_pattern_id")]
    pub default_pattern: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breatho/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub custom_patterns: Vec<BreathingPattern>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_duration_min() -> u32 {
    5
}
fn default_pattern_id() -> String {
    "4-7-8".into()
}
fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            haptics_enabled: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_min: default_duration_min(),
            default_pattern: default_pattern_id(),
            tick_interval_ms: default_tick_interval_ms(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// A file that parses but fails `validate()` is rejected with
    /// `ConfigError::InvalidValue` naming the offending key.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate().map_err(|e| ConfigError::InvalidValue {
                    key: offending_key(&e).to_string(),
                    message: e.to_string(),
                })?;
                debug!(path = %path.display(), "config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// The new value must have the same type as the old one and the
    /// resulting config must validate; otherwise `self` is unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Check ranges, custom patterns and the default pattern reference.
    pub fn validate(&self) -> Result<(), CoreError> {
        let (min, max) = SESSION_MINUTES_RANGE;
        if !(min..=max).contains(&self.session.duration_min) {
            return Err(ValidationError::OutOfRange {
                field: "session.duration_min".into(),
                value: self.session.duration_min.into(),
                min: min.into(),
                max: max.into(),
            }
            .into());
        }
        let (min, max) = TICK_MS_RANGE;
        if !(min..=max).contains(&self.session.tick_interval_ms) {
            return Err(ValidationError::OutOfRange {
                field: "session.tick_interval_ms".into(),
                value: self.session.tick_interval_ms,
                min,
                max,
            }
            .into());
        }
        self.default_pattern().map(|_| ())
    }

    /// Presets plus this config's custom patterns.
    pub fn catalog(&self) -> Result<PatternCatalog, ValidationError> {
        PatternCatalog::with_custom(&self.custom_patterns)
    }

    /// The pattern named by `session.default_pattern`.
    pub fn default_pattern(&self) -> Result<BreathingPattern, CoreError> {
        let catalog = self.catalog()?;
        catalog
            .get(&self.session.default_pattern)
            .cloned()
            .ok_or_else(|| CoreError::UnknownPattern(self.session.default_pattern.clone()))
    }

    pub fn session_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.session.duration_min) * 60)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.session.tick_interval_ms)
    }
}

/// Config key a validation failure refers to.
fn offending_key(err: &CoreError) -> &str {
    match err {
        CoreError::Validation(ValidationError::OutOfRange { field, .. }) => field,
        CoreError::UnknownPattern(_) => "session.default_pattern",
        _ => "custom_patterns",
    }
}
