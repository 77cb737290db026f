//! Settings
//!
//! User settings are persisted with confy (TOML) under the `lull` app name.
//! Missing fields fall back to their defaults, and an unreadable file falls
//! back to `Settings::default()`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

pub const APP_NAME: &str = "lull";
const CONFIG_NAME: &str = "settings";

fn default_duration_secs() -> u64 {
    120
}

fn default_tick_period_ms() -> u64 {
    1000
}

fn default_tick_ceiling() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

/// Scheduler timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Auto-reset ceiling (0 = unlimited)
    #[serde(default = "default_tick_ceiling")]
    pub tick_ceiling: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            tick_ceiling: default_tick_ceiling(),
        }
    }
}

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Countdown length; one tick per second of countdown
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Tick count at the last save, restored on startup
    #[serde(default)]
    pub resume_ticks: u64,

    /// Ring the terminal bell when a countdown completes
    #[serde(default = "default_true")]
    pub bell: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            tick_period_ms: default_tick_period_ms(),
            resume_ticks: 0,
            bell: true,
        }
    }
}

impl Settings {
    /// Load stored settings, falling back to defaults on any error
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            warn!(error = %e, "Using default settings");
            Self::default()
        })
    }

    pub fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    /// Overwrite stored settings with defaults
    pub fn clear() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        defaults.save()?;
        Ok(defaults)
    }

    /// Scheduler parameters for a countdown of `duration_secs` ticks
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_period_ms: self.tick_period_ms,
            tick_ceiling: self.duration_secs,
        }
    }

    /// Tick count to resume from; stale counts beyond the duration are dropped
    pub fn resume_point(&self) -> u64 {
        if self.resume_ticks < self.duration_secs {
            self.resume_ticks
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.duration_secs, 120);
        assert_eq!(settings.tick_period_ms, 1000);
        assert_eq!(settings.resume_ticks, 0);
        assert!(settings.bell);

        let config = SchedulerConfig::default();
        assert_eq!(config.tick_period_ms, 1000);
        assert_eq!(config.tick_ceiling, 50);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: Settings = toml::from_str("duration_secs = 300\n").unwrap();
        assert_eq!(settings.duration_secs, 300);
        assert_eq!(settings.tick_period_ms, 1000);
        assert!(settings.bell);
    }

    #[test]
    fn round_trip_through_toml() {
        let settings = Settings {
            duration_secs: 1500,
            tick_period_ms: 500,
            resume_ticks: 42,
            bell: false,
        };
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn ceiling_follows_duration() {
        let settings = Settings {
            duration_secs: 90,
            tick_period_ms: 250,
            ..Default::default()
        };
        assert_eq!(
            settings.scheduler_config(),
            SchedulerConfig {
                tick_period_ms: 250,
                tick_ceiling: 90,
            }
        );
    }

    #[test]
    fn stale_resume_point_is_dropped() {
        let mut settings = Settings::default();
        settings.resume_ticks = 30;
        assert_eq!(settings.resume_point(), 30);

        settings.resume_ticks = 120;
        assert_eq!(settings.resume_point(), 0);
    }
}
