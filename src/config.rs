use crate::feed::refresh::DEFAULT_REFRESH_INTERVAL;
use crate::feed::{DEFAULT_MAX_RESULTS, FeedMapping, LevelThresholds, SensorThresholds};
use crate::state::{DEFAULT_LAST_CLEANED_DAYS_AGO, DEFAULT_SCHEDULE_CACHE_TTL};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub feed: Option<FeedSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub cleaning: Option<CleaningSection>,
    #[serde(default)]
    pub thresholds: Option<ThresholdsSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSection {
    /// Feed document on disk, re-read every refresh
    pub path: Option<PathBuf>,
    /// Refresh interval in seconds (default: 15)
    pub refresh_interval_secs: Option<u64>,
    /// Number of most recent entries kept (default: 30)
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleaningSection {
    /// Days since the last cleaning at startup (default: 4)
    pub last_cleaned_days_ago: Option<u32>,
    /// How long a computed forecast is reused, in seconds (default: 300)
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ThresholdsSection {
    pub temperature: Option<LevelThresholds>,
    pub humidity: Option<LevelThresholds>,
    pub dust: Option<LevelThresholds>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = self.sensor_thresholds();
        for (name, levels) in [
            ("temperature", thresholds.temperature),
            ("humidity", thresholds.humidity),
            ("dust", thresholds.dust),
        ] {
            if levels.warning > levels.danger {
                return Err(ConfigError::Invalid(format!(
                    "thresholds.{name}: warning ({}) above danger ({})",
                    levels.warning, levels.danger
                )));
            }
        }
        if self.max_results() == 0 {
            return Err(ConfigError::Invalid(
                "feed.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the configured log level, falling back to INFO when unparseable.
    pub fn log_level(&self) -> Level {
        self.logging.level.trim().parse().unwrap_or(Level::INFO)
    }

    pub fn feed_path(&self) -> Option<&Path> {
        let path = self.feed.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the feed refresh interval (default: 15 seconds)
    pub fn refresh_interval(&self) -> Duration {
        self.feed
            .as_ref()
            .and_then(|f| f.refresh_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL)
    }

    pub fn max_results(&self) -> usize {
        self.feed
            .as_ref()
            .and_then(|f| f.max_results)
            .unwrap_or(DEFAULT_MAX_RESULTS)
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    pub fn last_cleaned_days_ago(&self) -> u32 {
        self.cleaning
            .as_ref()
            .and_then(|c| c.last_cleaned_days_ago)
            .unwrap_or(DEFAULT_LAST_CLEANED_DAYS_AGO)
    }

    pub fn schedule_cache_ttl(&self) -> Duration {
        self.cleaning
            .as_ref()
            .and_then(|c| c.cache_ttl_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SCHEDULE_CACHE_TTL)
    }

    /// Status thresholds, with unset sensors keeping their defaults.
    pub fn sensor_thresholds(&self) -> SensorThresholds {
        let defaults = SensorThresholds::default();
        let Some(section) = self.thresholds.as_ref() else {
            return defaults;
        };
        SensorThresholds {
            temperature: section.temperature.unwrap_or(defaults.temperature),
            humidity: section.humidity.unwrap_or(defaults.humidity),
            dust: section.dust.unwrap_or(defaults.dust),
        }
    }

    pub fn feed_mapping(&self) -> FeedMapping {
        FeedMapping {
            thresholds: self.sensor_thresholds(),
            max_results: self.max_results(),
        }
    }
}
