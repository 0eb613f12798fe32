/// Service configuration.
///
/// Loaded from `wwmon.toml`; every field carries a default so a missing or
/// partial file still yields a runnable configuration. Secrets (database
/// URL, relay credentials) never live here, they come from the environment.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    Io(String),
    /// The config file is not valid TOML for this schema.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    /// Seconds to suppress repeat alerts per device; 0 re-alerts on every
    /// violating update.
    pub cooldown_secs: u64,
    /// Snapshots older than this are flagged stale (device likely offline).
    pub stale_after_minutes: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        MonitorSection {
            cooldown_secs: 0,
            stale_after_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSection {
    pub base_url: String,
    pub poll_interval_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        FeedSection {
            base_url: "http://localhost:9090".to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl FeedSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PushSection {
    pub endpoint: String,
}

impl Default for PushSection {
    fn default() -> Self {
        PushSection {
            endpoint: "http://localhost:9091/push".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EmailSection {
    pub endpoint: String,
    pub from: String,
}

impl Default for EmailSection {
    fn default() -> Self {
        EmailSection {
            endpoint: "http://localhost:9092/mail".to_string(),
            from: "alerts@wwmon.local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub monitor: MonitorSection,
    pub feed: FeedSection,
    pub push: PushSection,
    pub email: EmailSection,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a file; a missing file yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Config::from_toml(&text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
