//! JSON-RPC backed provider with change polling.
//!
//! # Responsibilities
//! - Read the node's chain id and selected account
//! - Periodically re-read both and publish a notification on change
//! - Stop polling and close notification streams on destroy

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, timeout, MissedTickBehavior};

use crate::config::ProviderConfig;
use crate::events::EventBus;
use crate::provider::adapter::ProviderAdapter;
use crate::provider::types::{ChainId, ProviderError, ProviderEvent, ProviderResult};

/// Last observed provider state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Observed {
    chain_id: Option<ChainId>,
    account: Option<Address>,
}

struct Shared {
    rpc: Arc<dyn Provider + Send + Sync>,
    observed: Mutex<Observed>,
    events: EventBus<ProviderEvent>,
    timeout_duration: Duration,
}

/// Provider adapter over an Ethereum JSON-RPC endpoint.
pub struct RpcProvider {
    shared: Arc<Shared>,
    rpc_url: String,
    poll_interval: Duration,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl RpcProvider {
    /// Create a provider for the configured endpoint. No I/O happens until `init`.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ProviderError::InvalidUrl {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            })?;
        let rpc = Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        Ok(Self {
            shared: Arc::new(Shared {
                rpc,
                observed: Mutex::new(Observed::default()),
                events: EventBus::new(),
                timeout_duration: Duration::from_secs(config.request_timeout_secs),
            }),
            rpc_url: config.rpc_url.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            shutdown: Mutex::new(None),
        })
    }

    fn stop_polling(&self) {
        let previous = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = previous {
            let _ = tx.send(true);
        }
    }
}

impl Shared {
    fn observed(&self) -> Observed {
        *self.observed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn query(&self) -> ProviderResult<Observed> {
        let secs = self.timeout_duration.as_secs();

        let chain_id = match timeout(self.timeout_duration, self.rpc.get_chain_id()).await {
            Ok(Ok(id)) => ChainId(id),
            Ok(Err(e)) => return Err(ProviderError::Rpc(e.to_string())),
            Err(_) => return Err(ProviderError::Timeout(secs)),
        };
        let accounts = match timeout(self.timeout_duration, self.rpc.get_accounts()).await {
            Ok(Ok(accounts)) => accounts,
            Ok(Err(e)) => return Err(ProviderError::Rpc(e.to_string())),
            Err(_) => return Err(ProviderError::Timeout(secs)),
        };

        Ok(Observed {
            chain_id: Some(chain_id),
            account: accounts.first().copied(),
        })
    }

    /// Store `next` and publish a notification for every field that changed.
    fn apply(&self, next: Observed) {
        let previous = {
            let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *observed, next)
        };

        if previous.account != next.account {
            tracing::info!(account = ?next.account, "Provider account changed");
            self.events.publish(ProviderEvent::UpdatedAccount(next.account));
        }
        if previous.chain_id != next.chain_id {
            tracing::info!(chain_id = ?next.chain_id, "Provider network changed");
            self.events.publish(ProviderEvent::UpdatedNetwork);
        }
    }

    async fn poll(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; init already took a reading.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.query().await {
                        Ok(next) => self.apply(next),
                        Err(e) => tracing::warn!(error = %e, "Provider poll failed"),
                    }
                }
                _ = shutdown.changed() => {
                    tracing::debug!("Provider poller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl ProviderAdapter for RpcProvider {
    async fn init(&self) -> ProviderResult<()> {
        let observed = self.shared.query().await?;
        *self
            .shared
            .observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = observed;

        tracing::info!(
            rpc_url = %self.rpc_url,
            chain_id = ?observed.chain_id,
            account = ?observed.account,
            "Provider initialized"
        );

        self.stop_polling();
        let (tx, rx) = watch::channel(false);
        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        tokio::spawn(self.shared.clone().poll(self.poll_interval, rx));

        Ok(())
    }

    fn chain_id(&self) -> Option<ChainId> {
        self.shared.observed().chain_id
    }

    fn account(&self) -> Option<Address> {
        self.shared.observed().account
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        self.shared.events.subscribe()
    }

    fn destroy(&self) {
        self.stop_polling();
        self.shared.events.close();
        tracing::debug!(rpc_url = %self.rpc_url, "Provider destroyed");
    }
}

impl std::fmt::Debug for RpcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcProvider")
            .field("rpc_url", &self.rpc_url)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
