//! Configuration for the Workflow Sensor Agent.

use crate::engine::EngineConfig;
use crate::probe::{ProbeConfig, HARDWARE_ID_FILE};
use crate::tracker::{TrackerConfig, DEFAULT_SESSION_CONTEXT, MIN_DWELL};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "workflow-sensor-agent";

/// Main configuration for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How often the foreground window is probed
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,

    /// How often a health sample is taken
    #[serde(with = "duration_serde")]
    pub health_interval: Duration,

    /// Upper bound on each external utility call made by a probe
    #[serde(with = "duration_serde")]
    pub probe_timeout: Duration,

    /// Shortest dwell that produces an activity record
    #[serde(with = "duration_serde")]
    pub min_dwell: Duration,

    /// Context label attached to new sessions
    pub session_context: String,

    /// IANA timezone used for hour and weekday bucketing
    pub timezone: String,

    /// Path for the hardware id cache and transparency stats
    pub data_path: PathBuf,

    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(5),
            health_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(2),
            min_dwell: MIN_DWELL,
            session_context: DEFAULT_SESSION_CONTEXT.to_string(),
            timezone: "UTC".to_string(),
            data_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.is_zero() {
            return Err(ConfigError::Invalid("sample_interval must be positive".into()));
        }
        if self.health_interval.is_zero() {
            return Err(ConfigError::Invalid("health_interval must be positive".into()));
        }
        self.tz()?;
        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown timezone: {}", self.timezone)))
    }

    pub fn hardware_id_path(&self) -> PathBuf {
        self.data_path.join(HARDWARE_ID_FILE)
    }

    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            timeout: self.probe_timeout,
            hardware_id_path: self.hardware_id_path(),
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            sample_interval: self.sample_interval,
            health_interval: self.health_interval,
            min_dwell: self.min_dwell,
            session_context: self.session_context.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole seconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
