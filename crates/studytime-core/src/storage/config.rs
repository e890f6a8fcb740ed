//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reminder thresholds (gentle, strong, forced rest)
//! - Rest and snooze durations
//! - Periodic check cadence
//! - Daily study limit and deck size
//!
//! Configuration is stored at `~/.config/studytime/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::timer::TrackerSettings;

/// Upper bound for rest, snooze and check-interval durations (one day).
pub const MAX_DURATION_MINUTES: u64 = 24 * 60;

/// Session-length thresholds in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_gentle_minutes")]
    pub gentle_minutes: u64,
    #[serde(default = "default_strong_minutes")]
    pub strong_minutes: u64,
    #[serde(default = "default_force_minutes")]
    pub force_minutes: u64,
    /// Seconds between periodic checks.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    #[serde(default = "default_rest_minutes")]
    pub rest_minutes: u64,
    /// Delay before the extra check when a strong reminder is declined.
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_daily_limit_minutes")]
    pub daily_limit_minutes: u64,
    /// Number of cards in the deck, used for the progress percentage.
    #[serde(default = "default_total_cards")]
    pub total_cards: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studytime/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

fn default_gentle_minutes() -> u64 {
    15
}
fn default_strong_minutes() -> u64 {
    20
}
fn default_force_minutes() -> u64 {
    30
}
fn default_check_interval_secs() -> u64 {
    60
}
fn default_rest_minutes() -> u64 {
    5
}
fn default_snooze_minutes() -> u64 {
    5
}
fn default_daily_limit_minutes() -> u64 {
    20
}
fn default_total_cards() -> u64 {
    10
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            gentle_minutes: default_gentle_minutes(),
            strong_minutes: default_strong_minutes(),
            force_minutes: default_force_minutes(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            rest_minutes: default_rest_minutes(),
            snooze_minutes: default_snooze_minutes(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            daily_limit_minutes: default_daily_limit_minutes(),
            total_cards: default_total_cards(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminders: RemindersConfig::default(),
            rest: RestConfig::default(),
            progress: ProgressConfig::default(),
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
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((parents, leaf)) => (Some(parents), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;
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
                return Err(invalid("not a leaf key".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// `~/.config/studytime/config.toml`.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// parsed values fail validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, writing defaults");
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reminder thresholds must escalate and every duration must be positive.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.reminders;
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if r.gentle_minutes == 0 {
            return Err(invalid("reminders.gentle_minutes", "must be greater than zero"));
        }
        if r.strong_minutes < r.gentle_minutes {
            return Err(invalid(
                "reminders.strong_minutes",
                "must not be less than reminders.gentle_minutes",
            ));
        }
        if r.force_minutes < r.strong_minutes {
            return Err(invalid(
                "reminders.force_minutes",
                "must not be less than reminders.strong_minutes",
            ));
        }
        let within_a_day = |key: &str, value: u64, max: u64| {
            if value == 0 {
                Err(invalid(key, "must be greater than zero"))
            } else if value > max {
                Err(invalid(key, &format!("must not exceed {max}")))
            } else {
                Ok(())
            }
        };
        within_a_day(
            "reminders.check_interval_secs",
            r.check_interval_secs,
            MAX_DURATION_MINUTES * 60,
        )?;
        within_a_day("rest.rest_minutes", self.rest.rest_minutes, MAX_DURATION_MINUTES)?;
        within_a_day("rest.snooze_minutes", self.rest.snooze_minutes, MAX_DURATION_MINUTES)?;
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

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// The change is rejected if the key is unknown, the value does not
    /// parse, or the resulting config fails validation.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the rejection.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)
            .map_err(|e| CoreError::Config(ConfigError::ParseFailed(e.to_string())))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Settings handed to the tracker.
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            gentle_minutes: self.reminders.gentle_minutes,
            strong_minutes: self.reminders.strong_minutes,
            force_minutes: self.reminders.force_minutes,
            check_interval_secs: self.reminders.check_interval_secs,
            rest_minutes: self.rest.rest_minutes,
            snooze_minutes: self.rest.snooze_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reminder_policy() {
        let cfg = Config::default();
        assert_eq!(cfg.reminders.gentle_minutes, 15);
        assert_eq!(cfg.reminders.strong_minutes, 20);
        assert_eq!(cfg.reminders.force_minutes, 30);
        assert_eq!(cfg.reminders.check_interval_secs, 60);
        assert_eq!(cfg.rest.rest_minutes, 5);
        assert_eq!(cfg.progress.daily_limit_minutes, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("[reminders]\nforce_minutes = 45\n").unwrap();
        assert_eq!(cfg.reminders.force_minutes, 45);
        assert_eq!(cfg.reminders.gentle_minutes, 15);
        assert_eq!(cfg.rest, RestConfig::default());
    }

    #[test]
    fn get_and_set_by_dotted_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("rest.rest_minutes").as_deref(), Some("5"));
        cfg.set("rest.rest_minutes", "10").unwrap();
        assert_eq!(cfg.rest.rest_minutes, 10);
        assert!(cfg.get("rest.nope").is_none());
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("reminders.volume", "3").is_err());
        assert!(cfg.set("reminders.gentle_minutes", "soon").is_err());
        assert!(cfg.set("reminders", "1").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_non_escalating_thresholds() {
        let mut cfg = Config::default();
        let err = cfg.set("reminders.strong_minutes", "40").unwrap_err();
        assert!(err.to_string().contains("reminders.force_minutes"));
        assert_eq!(cfg.reminders.strong_minutes, 20);
    }

    #[test]
    fn set_rejects_durations_longer_than_a_day() {
        let mut cfg = Config::default();
        assert!(cfg.set("rest.snooze_minutes", "9223372036854775807").is_err());
        assert!(cfg.set("rest.rest_minutes", "18446744073709551615").is_err());
        assert!(cfg.set("reminders.check_interval_secs", "86401").is_err());
        assert!(cfg.set("rest.rest_minutes", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn longest_rest_keeps_the_tracker_resting() {
        use crate::storage::MemoryStudyLog;
        use crate::timer::{ManualClock, StudyTimeTracker, TrackerState};
        use chrono::{DateTime, Duration, Utc};

        let mut cfg = Config::default();
        cfg.set("rest.rest_minutes", &MAX_DURATION_MINUTES.to_string()).unwrap();
        cfg.set("rest.snooze_minutes", &MAX_DURATION_MINUTES.to_string()).unwrap();

        let clock = ManualClock::new(DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
        let mut tracker =
            StudyTimeTracker::new(cfg.tracker_settings(), &clock, MemoryStudyLog::new());
        tracker.start();
        tracker.tick();
        assert!(tracker.snooze());

        tracker.begin_rest();
        clock.advance(Duration::hours(23));
        assert!(tracker.tick().is_empty());
        assert_eq!(tracker.state(), TrackerState::Resting);

        clock.advance(Duration::hours(1));
        tracker.tick();
        assert_eq!(tracker.state(), TrackerState::Studying);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("progress.total_cards", "24").unwrap();
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.progress.total_cards, 24);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reminders]\ngentle_minutes = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
