//! Metrics exporter configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::observability::MetricsConfig;

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSection {
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,
    /// Address of the `/metrics` listener.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_listen_addr(),
        }
    }
}

impl MetricsSection {
    /// Exporter configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `listen_addr` is not a socket address.
    pub fn exporter_config(&self) -> Result<MetricsConfig, ConfigError> {
        let addr: SocketAddr = self.listen_addr.parse().map_err(|_| {
            ConfigError::ValidationError(format!(
                "metrics.listen_addr '{}' is not a socket address",
                self.listen_addr
            ))
        })?;
        Ok(MetricsConfig::with_addr(addr))
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:9090".to_string()
}
