use crate::error::AquaError;
use crate::rules::alias::CANONICAL_METRICS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings for a [`crate::session::PollingSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between polls of the selected device.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Upper bound for a single fetch; a timeout counts as a failed poll.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Metrics that feed the device status, in display order.
    #[serde(default = "default_tracked_metrics")]
    pub tracked_metrics: Vec<String>,
    /// Key under which the last selected device is persisted.
    #[serde(default = "default_last_device_key")]
    pub last_device_key: String,
    /// Buffer size of the status event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    8
}

fn default_tracked_metrics() -> Vec<String> {
    CANONICAL_METRICS.iter().map(|m| m.to_string()).collect()
}

fn default_last_device_key() -> String {
    "lastSelectedDevice".to_string()
}

fn default_event_capacity() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            tracked_metrics: default_tracked_metrics(),
            last_device_key: default_last_device_key(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SessionConfig {
    /// Load and validate a config from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, AquaError> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)
            .map_err(|e| AquaError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AquaError> {
        if self.poll_interval_secs == 0 {
            return Err(AquaError::Config(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(AquaError::Config(
                "fetch_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.tracked_metrics.is_empty() {
            return Err(AquaError::Config("tracked_metrics must not be empty".into()));
        }
        if self.last_device_key.is_empty() {
            return Err(AquaError::Config("last_device_key must not be empty".into()));
        }
        if self.event_capacity == 0 {
            return Err(AquaError::Config("event_capacity must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
