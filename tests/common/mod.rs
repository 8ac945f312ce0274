//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use url::Url;

use web_sdk::config::NetworkConfig;
use web_sdk::events::EventBus;
use web_sdk::provider::{ChainId, ProviderAdapter, ProviderError, ProviderEvent, ProviderResult};
use web_sdk::sdk::{
    LocalStatus, MemorySdkFactory, SdkFacade, SdkFactory, SdkListener, SdkOptions, SdkResult, User,
};
use web_sdk::status::{RemoteStatus, RemoteStatusFetcher, StatusError, StatusResult};
use web_sdk::{AppEvent, InitStatus, WebSdk};

pub const SERVER_URL: &str = "http://127.0.0.1:8081";

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

// --- Provider ---

/// Scriptable provider: tests set chain id and account and fire notifications.
pub struct MockProvider {
    chain_id: Mutex<ChainId>,
    account: Mutex<Option<Address>>,
    events: EventBus<ProviderEvent>,
    fail_init: AtomicBool,
    init_delay: Mutex<Duration>,
    active: AtomicBool,
    init_calls: AtomicUsize,
    destroy_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(chain_id: u64, account: Option<Address>) -> Arc<Self> {
        Arc::new(Self {
            chain_id: Mutex::new(ChainId(chain_id)),
            account: Mutex::new(account),
            events: EventBus::new(),
            fail_init: AtomicBool::new(false),
            init_delay: Mutex::new(Duration::ZERO),
            active: AtomicBool::new(false),
            init_calls: AtomicUsize::new(0),
            destroy_calls: AtomicUsize::new(0),
        })
    }

    /// Change the chain id without notifying, as a poller would see it.
    pub fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = ChainId(chain_id);
    }

    /// Change the chain id and notify subscribers.
    pub fn switch_network(&self, chain_id: u64) {
        self.set_chain_id(chain_id);
        self.events.publish(ProviderEvent::UpdatedNetwork);
    }

    /// Change the account and notify subscribers.
    pub fn switch_account(&self, account: Option<Address>) {
        *self.account.lock().unwrap() = account;
        self.events.publish(ProviderEvent::UpdatedAccount(account));
    }

    pub fn fail_next_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }

    /// Make `init` take `delay` before the provider comes up.
    pub fn set_init_delay(&self, delay: Duration) {
        *self.init_delay.lock().unwrap() = delay;
    }

    /// Whether the provider has been initialized and not destroyed since.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn init_count(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn destroy_count(&self) -> usize {
        self.destroy_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn init(&self) -> ProviderResult<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Rpc("connection refused".to_string()));
        }
        let delay = *self.init_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn chain_id(&self) -> Option<ChainId> {
        Some(*self.chain_id.lock().unwrap())
    }

    fn account(&self) -> Option<Address> {
        *self.account.lock().unwrap()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn destroy(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// --- Remote status ---

pub struct MockStatusFetcher {
    chain_id: u64,
    fail: bool,
    delay: Duration,
}

impl MockStatusFetcher {
    pub fn on_chain(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            fail: false,
            delay: Duration::ZERO,
        })
    }

    /// Answers with `chain_id` after `delay`.
    pub fn slow(chain_id: u64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            fail: false,
            delay,
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            chain_id: 0,
            fail: true,
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl RemoteStatusFetcher for MockStatusFetcher {
    async fn fetch_status(&self, _server_url: &Url) -> StatusResult<RemoteStatus> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(StatusError::Unreachable("connection refused".to_string()));
        }
        Ok(RemoteStatus {
            chain_id: ChainId(self.chain_id),
            network_or_host: None,
            rollup_contract_address: None,
        })
    }
}

// --- SDK ---

/// Forwards to an in-memory facade and counts `destroy` calls.
pub struct CountingSdk {
    inner: Arc<dyn SdkFacade>,
    destroys: Arc<AtomicUsize>,
    destroy_delay: Duration,
}

#[async_trait]
impl SdkFacade for CountingSdk {
    async fn init(&self) -> SdkResult<()> {
        self.inner.init().await
    }

    async fn destroy(&self) -> SdkResult<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if !self.destroy_delay.is_zero() {
            tokio::time::sleep(self.destroy_delay).await;
        }
        self.inner.destroy().await
    }

    fn get_user(&self, account: &Address) -> Option<User> {
        self.inner.get_user(account)
    }

    async fn add_user(&self, account: Address) -> SdkResult<User> {
        self.inner.add_user(account).await
    }

    fn get_local_status(&self) -> LocalStatus {
        self.inner.get_local_status()
    }

    fn on_event(&self, listener: SdkListener) {
        self.inner.on_event(listener)
    }
}

pub struct CountingSdkFactory {
    pub memory: MemorySdkFactory,
    destroys: Arc<AtomicUsize>,
    created: AtomicUsize,
    destroy_delay: Mutex<Duration>,
}

impl CountingSdkFactory {
    pub fn new(memory: MemorySdkFactory) -> Arc<Self> {
        Arc::new(Self {
            memory,
            destroys: Arc::new(AtomicUsize::new(0)),
            created: AtomicUsize::new(0),
            destroy_delay: Mutex::new(Duration::ZERO),
        })
    }

    /// Facades created from now on take `delay` to destroy.
    pub fn set_destroy_delay(&self, delay: Duration) {
        *self.destroy_delay.lock().unwrap() = delay;
    }

    pub fn destroy_count(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkFactory for CountingSdkFactory {
    async fn create(
        &self,
        server_url: &Url,
        provider: Arc<dyn ProviderAdapter>,
        options: SdkOptions,
    ) -> SdkResult<Arc<dyn SdkFacade>> {
        let inner = self.memory.create(server_url, provider, options).await?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CountingSdk {
            inner,
            destroys: self.destroys.clone(),
            destroy_delay: *self.destroy_delay.lock().unwrap(),
        }))
    }
}

// --- Harness ---

pub struct Harness {
    pub app: WebSdk,
    pub provider: Arc<MockProvider>,
    pub factory: Arc<CountingSdkFactory>,
    pub events: mpsc::UnboundedReceiver<AppEvent>,
}

pub fn network_config() -> NetworkConfig {
    NetworkConfig {
        wait_poll_interval_ms: 10,
    }
}

pub fn harness_with(
    provider: Arc<MockProvider>,
    fetcher: Arc<dyn RemoteStatusFetcher>,
    memory: MemorySdkFactory,
) -> Harness {
    let factory = CountingSdkFactory::new(memory);
    let app = WebSdk::new(provider.clone(), factory.clone(), fetcher, &network_config());
    let events = app.subscribe();
    Harness {
        app,
        provider,
        factory,
        events,
    }
}

/// Provider on `provider_chain`, rollup provider expecting `remote_chain`.
pub fn harness(provider_chain: u64, remote_chain: u64, account: Option<Address>) -> Harness {
    let fetcher = MockStatusFetcher::on_chain(remote_chain);
    let memory = MemorySdkFactory::new(fetcher.clone());
    harness_with(MockProvider::new(provider_chain, account), fetcher, memory)
}

/// Wait for the next status update, skipping relayed SDK events.
pub async fn next_status(events: &mut mpsc::UnboundedReceiver<AppEvent>) -> Arc<InitStatus> {
    let wait = async {
        loop {
            match events.recv().await {
                Some(AppEvent::StatusUpdated(status)) => return status,
                Some(AppEvent::Sdk(_)) => continue,
                None => panic!("event stream closed"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("timed out waiting for a status update")
}

/// Every event already delivered.
pub fn drain(events: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Every status update already delivered.
pub fn drain_statuses(events: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<Arc<InitStatus>> {
    drain(events)
        .into_iter()
        .filter_map(|event| event.status().cloned())
        .collect()
}

// --- HTTP ---

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
