use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{PoolStatsError, Result};

/// Configuration for one pool statistics endpoint pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatsConfig {
    /// Hostname or IP of the ckstats API server
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port of the ckstats API server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interval between refresh cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Per-request timeout
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl Default for PoolStatsConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl PoolStatsConfig {
    /// Base URL the relative API paths are appended to
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Reject values the API client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PoolStatsError::InvalidConfiguration(
                "host must not be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(PoolStatsError::InvalidConfiguration(
                "port must be non-zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolStatsError::InvalidConfiguration(
                "poll interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_poll_interval() -> Duration {
    Duration::from_secs(300)
}
fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}
