//! Configuration management for the progression engine.
//!
//! Configuration is TOML, organized into an `[engine]` section (store
//! location, reset timezone, scheduler cadence) and a `[logging]` section.
//! All values are validated on load, and every field carries a sensible
//! default so a minimal file works. The reset timezone is configuration,
//! never hardcoded: window resolution and the reset scheduler both take it
//! from here.

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Core engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory for the sled progression store.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Offset from UTC, in minutes, defining "local" for daily/weekly
    /// windows and reset boundaries.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Seconds between reset-boundary checks when running the reset loop.
    #[serde(default = "default_reset_check_seconds")]
    pub reset_check_seconds: u64,
}

fn default_data_dir() -> String {
    "data/progression".to_string()
}

fn default_reset_check_seconds() -> u64 {
    60
}

impl EngineConfig {
    /// The configured timezone as a chrono offset.
    pub fn timezone(&self) -> FixedOffset {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(tz) => tz,
            // Out-of-range offsets are rejected by validate(); fall back to
            // UTC rather than panic if one sneaks past.
            None => Utc.fix(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            utc_offset_minutes: 0,
            reset_check_seconds: default_reset_check_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("cannot read config file {}: {}", path, e))?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| anyhow!("invalid config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file, refusing to clobber an existing
    /// one.
    pub async fn create_default(path: &str) -> Result<()> {
        if fs::try_exists(path).await.unwrap_or(false) {
            return Err(anyhow!("config file {} already exists", path));
        }
        let contents = toml::to_string_pretty(&Config::default())?;
        fs::write(path, contents).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        // FixedOffset's own bound: strictly less than a day either way.
        if self.engine.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(anyhow!(
                "utc_offset_minutes out of range: {}",
                self.engine.utc_offset_minutes
            ));
        }
        if self.engine.data_dir.trim().is_empty() {
            return Err(anyhow!("data_dir must not be empty"));
        }
        if self.engine.reset_check_seconds == 0 {
            return Err(anyhow!("reset_check_seconds must be at least 1"));
        }
        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            other => Err(anyhow!("unknown log level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.timezone().local_minus_utc(), 0);
    }

    #[test]
    fn offset_maps_to_timezone() {
        let config = Config {
            engine: EngineConfig {
                utc_offset_minutes: -180,
                ..EngineConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.timezone().local_minus_utc(), -180 * 60);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let config = Config {
            engine: EngineConfig {
                utc_offset_minutes: 24 * 60,
                ..EngineConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let config = Config {
            logging: LoggingConfig {
                level: "loud".to_string(),
                file: None,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn load_round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().expect("utf8 path");

        Config::create_default(path_str).await.expect("create");
        let config = Config::load(path_str).await.expect("load");
        assert_eq!(config.engine.utc_offset_minutes, 0);
        assert_eq!(config.logging.level, "info");

        // A second create must not clobber the file.
        assert!(Config::create_default(path_str).await.is_err());
    }

    #[tokio::test]
    async fn minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[engine]\nutc_offset_minutes = 120\n")
            .await
            .expect("write");

        let config = Config::load(path.to_str().expect("utf8 path"))
            .await
            .expect("load");
        assert_eq!(config.engine.utc_offset_minutes, 120);
        assert_eq!(config.engine.reset_check_seconds, 60);
        assert_eq!(config.logging.level, "info");
    }
}
