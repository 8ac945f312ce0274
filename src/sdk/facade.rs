//! The facade contract consumed by the coordinator.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use url::Url;

use crate::provider::ProviderAdapter;
use crate::sdk::types::{LocalStatus, SdkEvent, SdkOptions, SdkResult, User};

/// Listener invoked synchronously, in emission order, for every facade event.
pub type SdkListener = Arc<dyn Fn(&SdkEvent) + Send + Sync>;

/// The underlying transactional system.
#[async_trait]
pub trait SdkFacade: Send + Sync {
    /// Bring the facade up. Progress is reported through `UpdatedInitState` events.
    async fn init(&self) -> SdkResult<()>;

    /// Tear the facade down.
    async fn destroy(&self) -> SdkResult<()>;

    /// Registered user for `account`, if any.
    fn get_user(&self, account: &Address) -> Option<User>;

    /// Register `account`, suspending until registration completes.
    async fn add_user(&self, account: Address) -> SdkResult<User>;

    /// Locally cached status snapshot.
    fn get_local_status(&self) -> LocalStatus;

    /// Attach a listener for all subsequent events.
    fn on_event(&self, listener: SdkListener);
}

/// Constructs facades bound to a server and provider.
#[async_trait]
pub trait SdkFactory: Send + Sync {
    async fn create(
        &self,
        server_url: &Url,
        provider: Arc<dyn ProviderAdapter>,
        options: SdkOptions,
    ) -> SdkResult<Arc<dyn SdkFacade>>;
}
