//! In-process facade.
//!
//! Keeps registered users in a map shared across sessions created by the same
//! factory, so a relink after teardown finds previously registered accounts
//! unless `clear_db` is requested.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use dashmap::DashMap;
use url::Url;

use crate::provider::{ChainId, ProviderAdapter};
use crate::sdk::facade::{SdkFacade, SdkFactory, SdkListener};
use crate::sdk::types::{
    LocalStatus, SdkError, SdkEvent, SdkInitState, SdkOptions, SdkResult, User,
};
use crate::status::RemoteStatusFetcher;

type UserStore = Arc<DashMap<Address, User>>;

/// Facade backed by process memory.
pub struct MemorySdk {
    chain_id: ChainId,
    rollup_contract_address: Option<String>,
    provider: Arc<dyn ProviderAdapter>,
    users: UserStore,
    cleared: bool,
    add_user_delay: Duration,
    init_state: Mutex<SdkInitState>,
    sync_height: AtomicU64,
    listeners: Mutex<Vec<SdkListener>>,
}

impl MemorySdk {
    fn state(&self) -> SdkInitState {
        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SdkInitState) {
        *self.init_state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn emit(&self, event: SdkEvent) {
        // Listeners run outside the lock so they may attach further listeners.
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(&event);
        }
    }

    fn progress(&self, message: &str) {
        tracing::debug!(message, "SDK init progress");
        self.emit(SdkEvent::UpdatedInitState {
            state: SdkInitState::Initializing,
            message: Some(message.to_string()),
        });
    }
}

#[async_trait]
impl SdkFacade for MemorySdk {
    async fn init(&self) -> SdkResult<()> {
        match self.state() {
            SdkInitState::Destroyed => return Err(SdkError::Destroyed),
            SdkInitState::Initialized => return Ok(()),
            _ => {}
        }

        self.set_state(SdkInitState::Initializing);
        if self.cleared {
            self.emit(SdkEvent::ClearData);
        }
        self.progress("Connecting to rollup provider...");
        if self.provider.chain_id() != Some(self.chain_id) {
            tracing::warn!(
                sdk_chain_id = %self.chain_id,
                provider_chain_id = ?self.provider.chain_id(),
                "Provider is not on the rollup provider's chain"
            );
        }
        self.progress("Loading user accounts...");
        let height = self.sync_height.load(Ordering::SeqCst);
        self.emit(SdkEvent::UpdatedWorldState {
            sync_height: height,
            latest_height: height,
        });

        if self.state() == SdkInitState::Destroyed {
            return Err(SdkError::Destroyed);
        }
        self.set_state(SdkInitState::Initialized);
        self.emit(SdkEvent::UpdatedInitState {
            state: SdkInitState::Initialized,
            message: None,
        });
        tracing::info!(
            chain_id = %self.chain_id,
            users = self.users.len(),
            "SDK initialized"
        );
        Ok(())
    }

    async fn destroy(&self) -> SdkResult<()> {
        if self.state() == SdkInitState::Destroyed {
            return Ok(());
        }
        self.set_state(SdkInitState::Destroyed);
        self.emit(SdkEvent::UpdatedInitState {
            state: SdkInitState::Destroyed,
            message: None,
        });
        self.emit(SdkEvent::Destroyed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::debug!("SDK destroyed");
        Ok(())
    }

    fn get_user(&self, account: &Address) -> Option<User> {
        self.users.get(account).map(|entry| entry.value().clone())
    }

    async fn add_user(&self, account: Address) -> SdkResult<User> {
        if self.state() != SdkInitState::Initialized {
            return Err(SdkError::NotInitialized);
        }
        if self.users.contains_key(&account) {
            return Err(SdkError::UserExists(account));
        }

        if !self.add_user_delay.is_zero() {
            tokio::time::sleep(self.add_user_delay).await;
        }
        if self.state() == SdkInitState::Destroyed {
            return Err(SdkError::Destroyed);
        }

        let user = User {
            id: account,
            synced_height: self.sync_height.load(Ordering::SeqCst),
        };
        self.users.insert(account, user.clone());
        tracing::info!(account = %account, "User registered");
        self.emit(SdkEvent::UpdatedUsers);
        self.emit(SdkEvent::UpdatedUserState(account));
        Ok(user)
    }

    fn get_local_status(&self) -> LocalStatus {
        LocalStatus {
            chain_id: self.chain_id,
            rollup_contract_address: self.rollup_contract_address.clone(),
            sync_height: self.sync_height.load(Ordering::SeqCst),
            init_state: self.state(),
        }
    }

    fn on_event(&self, listener: SdkListener) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

/// Creates [`MemorySdk`] instances that share one user store.
pub struct MemorySdkFactory {
    status_fetcher: Arc<dyn RemoteStatusFetcher>,
    users: UserStore,
    add_user_delay: Duration,
}

impl MemorySdkFactory {
    pub fn new(status_fetcher: Arc<dyn RemoteStatusFetcher>) -> Self {
        Self {
            status_fetcher,
            users: Arc::new(DashMap::new()),
            add_user_delay: Duration::ZERO,
        }
    }

    /// Simulated registration latency for `add_user`.
    pub fn with_add_user_delay(mut self, delay: Duration) -> Self {
        self.add_user_delay = delay;
        self
    }

    /// Pre-register `account`, as if linked in an earlier session.
    pub fn register(&self, account: Address) {
        self.users.insert(
            account,
            User {
                id: account,
                synced_height: 0,
            },
        );
    }

    pub fn registered_users(&self) -> usize {
        self.users.len()
    }
}

#[async_trait]
impl SdkFactory for MemorySdkFactory {
    async fn create(
        &self,
        server_url: &Url,
        provider: Arc<dyn ProviderAdapter>,
        options: SdkOptions,
    ) -> SdkResult<Arc<dyn SdkFacade>> {
        let remote = self.status_fetcher.fetch_status(server_url).await?;

        if options.clear_db {
            tracing::info!(users = self.users.len(), "Clearing local SDK data");
            self.users.clear();
        }

        Ok(Arc::new(MemorySdk {
            chain_id: remote.chain_id,
            rollup_contract_address: remote.rollup_contract_address,
            provider,
            users: self.users.clone(),
            cleared: options.clear_db,
            add_user_delay: self.add_user_delay,
            init_state: Mutex::new(SdkInitState::Uninitialized),
            sync_height: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }))
    }
}
