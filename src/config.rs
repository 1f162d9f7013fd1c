//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backup::MergeStrategy;
use crate::series::{CalendarRules, SeriesResult};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub merge: MergeConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Day boundary configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarConfig {
    /// Offset from UTC, in minutes, used to assign responses to days
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Backup merge configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub strategy: MergeStrategy,
}

/// Chart memo configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    30
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Standard config file locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("goalpost").join("config.toml")),
            Some(PathBuf::from("/etc/goalpost/config.toml")),
            Some(PathBuf::from("./goalpost.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment
    ///
    /// Files that exist but fail to load are skipped and handed back so the
    /// caller can report them once logging is set up.
    pub fn load_default() -> (Self, Vec<ConfigError>) {
        Self::load_first(&Self::default_paths())
    }

    fn load_first(paths: &[PathBuf]) -> (Self, Vec<ConfigError>) {
        let mut errors = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => return (config, errors),
                Err(e) => errors.push(e),
            }
        }

        (Self::from_env(), errors)
    }

    /// Day boundary rules built from `[calendar]`
    pub fn calendar_rules(&self) -> SeriesResult<CalendarRules> {
        CalendarRules::from_offset_minutes(self.calendar.utc_offset_minutes)
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.merge.strategy
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Calendar overrides
        if let Some(offset) = lookup("GOALPOST_UTC_OFFSET_MINUTES") {
            match offset.trim().parse() {
                Ok(minutes) => self.calendar.utc_offset_minutes = minutes,
                Err(_) => tracing::warn!("Ignoring GOALPOST_UTC_OFFSET_MINUTES={}", offset),
            }
        }

        // Merge overrides
        if let Some(strategy) = lookup("GOALPOST_MERGE_STRATEGY") {
            match MergeStrategy::parse(&strategy) {
                Some(s) => self.merge.strategy = s,
                None => tracing::warn!("Ignoring GOALPOST_MERGE_STRATEGY={}", strategy),
            }
        }

        // Logging overrides
        if let Some(level) = lookup("GOALPOST_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("GOALPOST_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# goalpost Configuration
#
# Environment variables override these settings:
# - GOALPOST_UTC_OFFSET_MINUTES
# - GOALPOST_MERGE_STRATEGY
# - GOALPOST_LOG_LEVEL
# - GOALPOST_LOG_FORMAT

[calendar]
# Offset from UTC in minutes used to decide which day a response belongs to
# (e.g. -300 for UTC-5, 60 for UTC+1)
utc_offset_minutes = 0

[merge]
# What to do when two backups disagree:
# stop_on_conflict (return a conflict report) or skip_conflicting
strategy = "stop_on_conflict"

[cache]
# How long a computed chart stays valid (seconds)
ttl_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/goalpost/goalpost.log"
"#
    .to_string()
}
