//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Rollup provider the SDK talks to.
    pub server: ServerConfig,

    /// Wallet node providing account and network.
    pub provider: ProviderConfig,

    /// Network reconciliation settings.
    pub network: NetworkConfig,

    /// Remote status lookup settings.
    pub remote: RemoteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Rollup provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the rollup provider.
    pub url: String,

    /// Wipe local SDK data on startup.
    pub clear_db: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081".to_string(),
            clear_db: false,
        }
    }
}

/// Account/network provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// JSON-RPC endpoint (e.g., "http://localhost:8545").
    pub rpc_url: String,

    /// How often to re-read chain id and accounts, in milliseconds.
    pub poll_interval_ms: u64,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            poll_interval_ms: 1000,
            request_timeout_secs: 10,
        }
    }
}

/// Network reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Re-check interval while waiting for the user to switch networks.
    /// The wait itself has no deadline.
    pub wait_poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wait_poll_interval_ms: 500,
        }
    }
}

/// Remote status lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Path of the status document relative to the server URL.
    pub status_path: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            status_path: "/status".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.network.wait_poll_interval_ms, 500);
        assert_eq!(config.remote.status_path, "/status");
        assert!(!config.server.clear_db);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            url = "https://api.aztec.network/falafel"

            [network]
            wait_poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.server.url, "https://api.aztec.network/falafel");
        assert_eq!(config.network.wait_poll_interval_ms, 250);
        assert_eq!(config.provider.poll_interval_ms, 1000);
    }
}
