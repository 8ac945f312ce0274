//! Provider-facing types and error definitions.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notifications emitted by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The selected account changed. `None` means access was withdrawn.
    UpdatedAccount(Option<Address>),
    /// The selected network changed.
    UpdatedNetwork,
}

/// Errors that can occur while talking to a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The configured endpoint is not a valid URL.
    #[error("Invalid provider URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
        assert_eq!(chain_id.to_string(), "1");
    }

    #[test]
    fn test_chain_id_is_a_plain_number_on_the_wire() {
        let chain_id: ChainId = serde_json::from_str("1337").unwrap();
        assert_eq!(chain_id, ChainId(1337));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
    }
}
