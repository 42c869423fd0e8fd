use crate::errors::{RouteError, RouteResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the depth tracker and its background refresh loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthTrackerConfig {
    /// Interval between background refresh cycles in seconds
    pub refresh_interval_secs: u64,
    /// Per-source fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// Substitute synthetic depth for unreachable or empty sources
    pub synthetic_fallback: bool,
    /// Buffer size for the refresh report channel
    pub report_buffer_size: usize,
}

impl Default for DepthTrackerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            fetch_timeout_ms: 10_000,
            synthetic_fallback: true,
            report_buffer_size: 16,
        }
    }
}

impl DepthTrackerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Ok(interval_str) = std::env::var("DEPTH_REFRESH_INTERVAL_SECS") {
            config.refresh_interval_secs = interval_str
                .parse()
                .map_err(|e| eyre::eyre!("Invalid DEPTH_REFRESH_INTERVAL_SECS: {}", e))?;
        }

        if let Ok(timeout_str) = std::env::var("DEPTH_FETCH_TIMEOUT_MS") {
            config.fetch_timeout_ms = timeout_str
                .parse()
                .map_err(|e| eyre::eyre!("Invalid DEPTH_FETCH_TIMEOUT_MS: {}", e))?;
        }

        if let Ok(fallback_str) = std::env::var("DEPTH_SYNTHETIC_FALLBACK") {
            config.synthetic_fallback = fallback_str
                .parse()
                .map_err(|e| eyre::eyre!("Invalid DEPTH_SYNTHETIC_FALLBACK: {}", e))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RouteResult<()> {
        if self.refresh_interval_secs == 0 {
            return Err(RouteError::invalid_config("tracker.refresh_interval_secs must be positive"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(RouteError::invalid_config("tracker.fetch_timeout_ms must be positive"));
        }
        if self.report_buffer_size == 0 {
            return Err(RouteError::invalid_config("tracker.report_buffer_size must be positive"));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
