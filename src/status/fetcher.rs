//! Rollup provider status fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::RemoteConfig;
use crate::provider::ChainId;

/// Static status published by the rollup provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStatus {
    /// Chain the service settles on; clients must be on the same chain.
    pub chain_id: ChainId,
    /// Network name or node host the service is connected to.
    #[serde(default)]
    pub network_or_host: Option<String>,
    /// Address of the rollup contract.
    #[serde(default)]
    pub rollup_contract_address: Option<String>,
}

/// Errors that can occur while fetching remote status.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The service could not be reached at all.
    #[error("Rollup provider unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a non-success status code.
    #[error("Rollup provider returned HTTP {0}")]
    Http(u16),

    /// The response body was not a valid status document.
    #[error("Malformed status response: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for status fetches.
pub type StatusResult<T> = Result<T, StatusError>;

/// One-shot lookup of a rollup provider's status.
#[async_trait]
pub trait RemoteStatusFetcher: Send + Sync {
    async fn fetch_status(&self, server_url: &Url) -> StatusResult<RemoteStatus>;
}

/// Fetches status over HTTP from `{server_url}{status_path}`.
#[derive(Clone, Debug)]
pub struct HttpStatusFetcher {
    client: Client,
    status_path: String,
}

impl HttpStatusFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &RemoteConfig) -> StatusResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StatusError::Client(e.to_string()))?;

        Ok(Self {
            client,
            status_path: config.status_path.clone(),
        })
    }

    /// Endpoint queried for `server_url`. Appends to the base path rather than replacing it.
    pub fn status_url(&self, server_url: &Url) -> String {
        format!(
            "{}/{}",
            server_url.as_str().trim_end_matches('/'),
            self.status_path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl RemoteStatusFetcher for HttpStatusFetcher {
    async fn fetch_status(&self, server_url: &Url) -> StatusResult<RemoteStatus> {
        let endpoint = self.status_url(server_url);
        tracing::debug!(endpoint = %endpoint, "Fetching rollup provider status");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| StatusError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %endpoint, status = %status, "Status request rejected");
            return Err(StatusError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StatusError::Unreachable(e.to_string()))?;
        let remote: RemoteStatus =
            serde_json::from_str(&body).map_err(|e| StatusError::Decode(e.to_string()))?;

        tracing::info!(
            chain_id = %remote.chain_id,
            network_or_host = ?remote.network_or_host,
            "Rollup provider status received"
        );
        Ok(remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpStatusFetcher {
        HttpStatusFetcher::new(&RemoteConfig::default()).unwrap()
    }

    #[test]
    fn test_status_url_appends_to_base_path() {
        let f = fetcher();
        let base = Url::parse("https://api.example.com/falafel").unwrap();
        assert_eq!(f.status_url(&base), "https://api.example.com/falafel/status");

        let root = Url::parse("http://127.0.0.1:8081/").unwrap();
        assert_eq!(f.status_url(&root), "http://127.0.0.1:8081/status");
    }

    #[test]
    fn test_decode_status_document() {
        let json = r#"{
            "chainId": 3,
            "networkOrHost": "ropsten",
            "rollupContractAddress": "0x1234",
            "dataSize": 64
        }"#;
        let status: RemoteStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.chain_id, ChainId(3));
        assert_eq!(status.network_or_host.as_deref(), Some("ropsten"));
        assert_eq!(status.rollup_contract_address.as_deref(), Some("0x1234"));
    }

    #[test]
    fn test_chain_id_is_required() {
        let result: Result<RemoteStatus, _> = serde_json::from_str(r#"{"networkOrHost":"x"}"#);
        assert!(result.is_err());
    }
}
