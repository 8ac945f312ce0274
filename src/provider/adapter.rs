//! The provider contract consumed by the coordinator.

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::provider::types::{ChainId, ProviderEvent, ProviderResult};

/// An external capability exposing the user's selected account and network.
///
/// Notifications may fire at any time, including while `init` is pending.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Suspend until the provider is ready to answer queries.
    async fn init(&self) -> ProviderResult<()>;

    /// Current chain id, or `None` before the provider is ready.
    fn chain_id(&self) -> Option<ChainId>;

    /// Currently selected account, if access has been granted.
    fn account(&self) -> Option<Address>;

    /// Stream of change notifications published after this call.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent>;

    /// Stop producing notifications and close all streams. Idempotent.
    fn destroy(&self);
}
