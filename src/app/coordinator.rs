//! Bridges an account/network provider with the SDK facade.
//!
//! # Responsibilities
//! - Sequence provider setup, network reconciliation, SDK startup and
//!   account linking
//! - React to provider account and network notifications for the rest of
//!   the session
//! - Keep "linked account" and "linked network" consistent, tearing the
//!   session down when they cannot be
//!
//! # Concurrency
//! Provider notifications, facade events and caller `init`/`destroy` calls
//! interleave freely. Status writes are serialized by the transition lock;
//! suspended steps re-check the session generation on resume so a concurrent
//! `destroy()` is never undone. Handles produced after a teardown (a facade
//! from a pending create, a provider whose init was pending) are destroyed by
//! the step that produced them. Teardowns themselves never overlap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use arc_swap::ArcSwap;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::app::error::AppError;
use crate::app::events::{relay, AppEvent};
use crate::app::status::{InitAction, InitState, InitStatus};
use crate::config::NetworkConfig;
use crate::events::EventBus;
use crate::observability::metrics;
use crate::provider::{chain_id_to_network, ChainId, ProviderAdapter, ProviderEvent};
use crate::sdk::{SdkEvent, SdkFacade, SdkFactory, SdkInitState, SdkOptions, User};
use crate::status::RemoteStatusFetcher;

/// Why a session was torn down. Logged and counted, never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TeardownReason {
    Requested,
    InitFailed,
    AccountWithdrawn,
    AccountLinkFailed,
    NetworkMismatch,
}

impl TeardownReason {
    fn as_str(&self) -> &'static str {
        match self {
            TeardownReason::Requested => "requested",
            TeardownReason::InitFailed => "init_failed",
            TeardownReason::AccountWithdrawn => "account_withdrawn",
            TeardownReason::AccountLinkFailed => "account_link_failed",
            TeardownReason::NetworkMismatch => "network_mismatch",
        }
    }
}

struct Inner {
    provider: Arc<dyn ProviderAdapter>,
    sdk_factory: Arc<dyn SdkFactory>,
    status_fetcher: Arc<dyn RemoteStatusFetcher>,
    network_poll_interval: Duration,

    /// Provider handle for the current session; `None` until provider setup and after teardown.
    linked_provider: Mutex<Option<Arc<dyn ProviderAdapter>>>,
    sdk: Mutex<Option<Arc<dyn SdkFacade>>>,

    /// Working copy of the status. Only the transition functions publish it.
    draft: Mutex<InitStatus>,
    /// Last published snapshot.
    status: ArcSwap<InitStatus>,
    events: EventBus<AppEvent>,
    /// Bumped by every teardown.
    generation: watch::Sender<u64>,
    /// Held for the whole of a teardown.
    teardown: tokio::sync::Mutex<()>,
}

/// Initialization coordinator.
///
/// Cloning is cheap and every clone drives the same session.
#[derive(Clone)]
pub struct WebSdk {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WebSdk {
    /// Create a coordinator. Nothing happens until [`WebSdk::init`].
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        sdk_factory: Arc<dyn SdkFactory>,
        status_fetcher: Arc<dyn RemoteStatusFetcher>,
        network: &NetworkConfig,
    ) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                provider,
                sdk_factory,
                status_fetcher,
                network_poll_interval: Duration::from_millis(network.wait_poll_interval_ms),
                linked_provider: Mutex::new(None),
                sdk: Mutex::new(None),
                draft: Mutex::new(InitStatus::default()),
                status: ArcSwap::from_pointee(InitStatus::default()),
                events: EventBus::new(),
                generation,
                teardown: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Subscribe to status updates and relayed facade events.
    ///
    /// Subscribing before `init` guarantees no event of the session is missed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<AppEvent> {
        self.inner.events.subscribe()
    }

    /// Bring the session up and link the provider's current account.
    ///
    /// If the provider is on a different chain than the rollup provider
    /// expects, this waits, without a deadline, for the user to switch
    /// networks. Any failure tears the session down before being returned.
    pub async fn init(&self, server_url: &str, clear_db: bool) -> Result<(), AppError> {
        let session_id = Uuid::new_v4();
        let span = tracing::info_span!("init", session = %session_id, server_url = %server_url);
        self.init_session(server_url, clear_db).instrument(span).await
    }

    async fn init_session(&self, server_url: &str, clear_db: bool) -> Result<(), AppError> {
        tracing::info!("Initializing web sdk");

        let began = self.transition_if(
            |status| status.state == InitState::Uninitialized,
            |draft| {
                draft.state = InitState::Initializing;
                draft.action = Some(InitAction::LinkProviderAccount);
                draft.message = None;
            },
        );
        if began.is_none() {
            tracing::warn!("init called while a session is active");
            return Err(AppError::SessionActive);
        }
        let generation = self.generation();

        match self.link(server_url, clear_db, generation).await {
            Ok(()) => {
                tracing::info!("Initialization complete");
                Ok(())
            }
            Err(err) if self.ensure_live(generation).is_err() => {
                // A concurrent destroy() already tore the session down.
                tracing::info!(error = %err, "Initialization aborted by destroy");
                Err(AppError::Destroyed)
            }
            Err(err) => {
                tracing::error!(error = %err, "Initialization failed");
                metrics::record_init_failure(err.failure_reason().as_str());
                self.teardown(TeardownReason::InitFailed).await;
                Err(err)
            }
        }
    }

    async fn link(&self, server_url: &str, clear_db: bool, generation: u64) -> Result<(), AppError> {
        let provider = self.inner.provider.clone();
        *lock(&self.inner.linked_provider) = Some(provider.clone());
        provider.init().await?;
        if self.ensure_live(generation).is_err() {
            // Teardown ran while init was pending and may have destroyed the
            // provider before init restarted it.
            self.release_orphaned_provider(provider.as_ref());
            return Err(AppError::Destroyed);
        }

        let server_url = Url::parse(server_url).map_err(|e| AppError::InvalidServerUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        let remote = self.inner.status_fetcher.fetch_status(&server_url).await?;
        self.ensure_live(generation)?;

        let expected = remote.chain_id;
        let network = chain_id_to_network(expected).map(str::to_string);
        self.stage(|draft| draft.network = network);

        if provider.chain_id() != Some(expected) {
            self.update_init_status(InitState::Initializing, Some(InitAction::ChangeNetwork), None);
            self.wait_for_network(provider.as_ref(), expected, generation).await?;
        }

        let sdk = self
            .inner
            .sdk_factory
            .create(&server_url, provider.clone(), SdkOptions { clear_db })
            .await?;
        if !self.install_sdk(&sdk, generation) {
            if let Err(e) = sdk.destroy().await {
                tracing::warn!(error = %e, "Failed to destroy facade created after teardown");
            }
            return Err(AppError::Destroyed);
        }

        // Listeners go on before init so no early facade event is lost.
        self.attach_sdk_listeners(sdk.as_ref(), generation);

        sdk.init().await?;
        self.ensure_live(generation)?;

        self.account_changed(provider.account()).await?;

        // The network may have changed while we were linking; check once now,
        // then on every notification. A mismatch from here on is fatal.
        let notifications = provider.subscribe();
        self.spawn_provider_listener(notifications, generation);
        self.network_changed().await;

        Ok(())
    }

    /// Store `sdk` as the session's facade unless the session has been torn down.
    ///
    /// Teardown bumps the generation before emptying the slot, so checking
    /// liveness under the slot lock means a live store is always seen by it.
    fn install_sdk(&self, sdk: &Arc<dyn SdkFacade>, generation: u64) -> bool {
        let mut slot = lock(&self.inner.sdk);
        if self.ensure_live(generation).is_err() {
            return false;
        }
        *slot = Some(sdk.clone());
        true
    }

    /// Destroy `provider` if no session holds it any more.
    fn release_orphaned_provider(&self, provider: &dyn ProviderAdapter) {
        let slot = lock(&self.inner.linked_provider);
        if slot.is_none() {
            tracing::debug!("Provider came up after teardown, destroying it");
            provider.destroy();
        }
    }

    /// Suspend until the provider reports `expected`, or the session is destroyed.
    async fn wait_for_network(
        &self,
        provider: &dyn ProviderAdapter,
        expected: ChainId,
        generation: u64,
    ) -> Result<(), AppError> {
        tracing::info!(
            expected_chain_id = %expected,
            provider_chain_id = ?provider.chain_id(),
            "Waiting for provider to switch network"
        );
        let started = Instant::now();
        let mut liveness = self.inner.generation.subscribe();
        let mut ticker = time::interval(self.inner.network_poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.ensure_live(generation)?;
            if provider.chain_id() == Some(expected) {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = liveness.changed() => {}
            }
        }

        metrics::record_network_wait(started.elapsed());
        tracing::info!(chain_id = %expected, "Provider is on the expected network");
        Ok(())
    }

    fn attach_sdk_listeners(&self, sdk: &dyn SdkFacade, generation: u64) {
        let relay_target = Arc::downgrade(&self.inner);
        sdk.on_event(Arc::new(move |event: &SdkEvent| {
            if let Some(inner) = relay_target.upgrade() {
                tracing::trace!(event = event.kind().as_str(), "Relaying sdk event");
                inner.events.publish(relay(event));
            }
        }));

        let handler_target = Arc::downgrade(&self.inner);
        sdk.on_event(Arc::new(move |event: &SdkEvent| {
            let SdkEvent::UpdatedInitState {
                state: SdkInitState::Initializing,
                message,
            } = event
            else {
                return;
            };
            if let Some(inner) = handler_target.upgrade() {
                let coordinator = WebSdk { inner };
                if coordinator.ensure_live(generation).is_ok() {
                    coordinator.surface_init_message(message.clone());
                }
            }
        }));
    }

    fn spawn_provider_listener(
        &self,
        mut notifications: mpsc::UnboundedReceiver<ProviderEvent>,
        generation: u64,
    ) {
        let this = self.clone();
        let mut liveness = self.inner.generation.subscribe();

        let listener = async move {
            loop {
                let event = tokio::select! {
                    event = notifications.recv() => event,
                    _ = liveness.changed() => None,
                };
                let Some(event) = event else { break };
                if this.ensure_live(generation).is_err() {
                    break;
                }

                match event {
                    ProviderEvent::UpdatedAccount(account) => {
                        let Err(err) = this.account_changed(account).await else {
                            continue;
                        };
                        if this.ensure_live(generation).is_err() {
                            break;
                        }
                        let reason = match err {
                            AppError::AccountAccessWithdrawn => TeardownReason::AccountWithdrawn,
                            _ => TeardownReason::AccountLinkFailed,
                        };
                        tracing::warn!(error = %err, "Account change failed, tearing down");
                        this.teardown(reason).await;
                        break;
                    }
                    ProviderEvent::UpdatedNetwork => this.network_changed().await,
                }
            }
            tracing::debug!("Provider listener stopped");
        };
        tokio::spawn(listener.instrument(tracing::Span::current()));
    }

    /// Link `account`, registering it with the SDK first if needed.
    ///
    /// `None` means the provider withdrew access and always fails with
    /// [`AppError::AccountAccessWithdrawn`]. Relinking to an account that is
    /// already registered goes straight to `Initialized`.
    pub async fn account_changed(&self, account: Option<Address>) -> Result<(), AppError> {
        let generation = self.generation();
        let Some(account) = account else {
            tracing::warn!("Provider withdrew account access");
            self.stage(|draft| draft.account = None);
            return Err(AppError::AccountAccessWithdrawn);
        };
        let sdk = self.get_sdk().ok_or(AppError::NotInitialized)?;
        self.stage(|draft| draft.account = Some(account));

        if sdk.get_user(&account).is_none() {
            tracing::info!(account = %account, "Registering account with sdk");
            self.update_init_status(InitState::Initializing, Some(InitAction::LinkAztecAccount), None);
            sdk.add_user(account).await?;
            self.ensure_live(generation)?;
        }

        self.update_init_status(InitState::Initialized, None, None);
        tracing::info!(account = %account, "Account linked");
        Ok(())
    }

    /// Tear the session down if the provider left the SDK's chain.
    pub async fn network_changed(&self) {
        let Some(sdk) = self.get_sdk() else {
            return;
        };
        if self.is_correct_network() {
            return;
        }
        tracing::warn!(
            sdk_chain_id = %sdk.get_local_status().chain_id,
            provider_chain_id = ?self.inner.provider.chain_id(),
            "Provider switched network after linking"
        );
        self.teardown(TeardownReason::NetworkMismatch).await;
    }

    /// Destroy the SDK and provider and return to `Uninitialized`.
    ///
    /// Safe to call at any time, any number of times, including while `init`
    /// is suspended.
    pub async fn destroy(&self) {
        self.teardown(TeardownReason::Requested).await;
    }

    async fn teardown(&self, reason: TeardownReason) {
        // Overlapping teardowns run one after the other, so a late one can
        // never touch a session started after an earlier one finished.
        let _serial = self.inner.teardown.lock().await;
        tracing::info!(reason = reason.as_str(), "Destroying web sdk");
        metrics::record_teardown(reason.as_str());
        self.inner.generation.send_modify(|generation| *generation += 1);

        let sdk = lock(&self.inner.sdk).take();
        if let Some(sdk) = sdk {
            if let Err(e) = sdk.destroy().await {
                tracing::warn!(error = %e, "SDK teardown failed");
            }
        }

        let provider = lock(&self.inner.linked_provider).take();
        if let Some(provider) = provider {
            provider.destroy();
        }

        self.transition(|draft| *draft = InitStatus::default());
    }

    /// The SDK of the current session, if one has been created.
    pub fn get_sdk(&self) -> Option<Arc<dyn SdkFacade>> {
        lock(&self.inner.sdk).clone()
    }

    /// SDK user for the linked account.
    pub fn get_user(&self) -> Result<User, AppError> {
        let account = self.get_init_status().account.ok_or(AppError::NoAccountLinked)?;
        let sdk = self.get_sdk().ok_or(AppError::NotInitialized)?;
        sdk.get_user(&account).ok_or(AppError::UserNotFound(account))
    }

    pub fn is_initialized(&self) -> bool {
        self.get_init_status().is_initialized()
    }

    /// Whether the provider and the SDK agree on the chain.
    pub fn is_correct_network(&self) -> bool {
        let provider = lock(&self.inner.linked_provider).clone();
        match (provider, self.get_sdk()) {
            (Some(provider), Some(sdk)) => provider.chain_id() == Some(sdk.get_local_status().chain_id),
            _ => false,
        }
    }

    /// Latest published status snapshot.
    pub fn get_init_status(&self) -> Arc<InitStatus> {
        self.inner.status.load_full()
    }

    fn generation(&self) -> u64 {
        *self.inner.generation.borrow()
    }

    fn ensure_live(&self, generation: u64) -> Result<(), AppError> {
        if self.generation() == generation {
            Ok(())
        } else {
            Err(AppError::Destroyed)
        }
    }

    // --- Transition functions ---
    //
    // The only writers of the status. Each publication stores and emits a new
    // snapshot while the draft lock is held, so observers see transitions in
    // exactly the order they happened.

    fn update_init_status(
        &self,
        state: InitState,
        action: Option<InitAction>,
        message: Option<String>,
    ) -> Arc<InitStatus> {
        self.transition(|draft| {
            draft.state = state;
            draft.action = action;
            draft.message = message;
        })
    }

    fn surface_init_message(&self, message: Option<String>) {
        self.transition_if(
            |status| status.state == InitState::Initializing,
            |draft| {
                draft.action = None;
                draft.message = message;
            },
        );
    }

    fn transition(&self, apply: impl FnOnce(&mut InitStatus)) -> Arc<InitStatus> {
        let mut draft = lock(&self.inner.draft);
        apply(&mut *draft);
        self.publish(&draft)
    }

    fn transition_if(
        &self,
        precondition: impl FnOnce(&InitStatus) -> bool,
        apply: impl FnOnce(&mut InitStatus),
    ) -> Option<Arc<InitStatus>> {
        let mut draft = lock(&self.inner.draft);
        if !precondition(&*draft) {
            return None;
        }
        apply(&mut *draft);
        Some(self.publish(&draft))
    }

    /// Record a field without emitting. It becomes visible with the next publication.
    fn stage(&self, apply: impl FnOnce(&mut InitStatus)) {
        apply(&mut *lock(&self.inner.draft));
    }

    fn publish(&self, draft: &InitStatus) -> Arc<InitStatus> {
        let snapshot = Arc::new(draft.clone());
        self.inner.status.store(snapshot.clone());
        tracing::debug!(
            state = snapshot.state.as_str(),
            action = ?snapshot.action,
            account = ?snapshot.account,
            message = ?snapshot.message,
            "Init status updated"
        );
        metrics::record_status_transition(snapshot.state.as_str(), snapshot.is_initialized());
        self.inner.events.publish(AppEvent::StatusUpdated(snapshot.clone()));
        snapshot
    }
}

impl std::fmt::Debug for WebSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSdk")
            .field("status", &self.get_init_status())
            .field("generation", &self.generation())
            .finish()
    }
}
