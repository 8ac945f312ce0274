//! Account/network provider subsystem.
//!
//! # Data Flow
//! ```text
//! JSON-RPC endpoint (wallet node)
//!     → rpc.rs (eth_chainId / eth_accounts, change polling)
//!     → adapter.rs (ProviderAdapter contract)
//!     → coordinator (chain id checks, account linking)
//! ```
//!
//! # Design Decisions
//! - The coordinator only sees the `ProviderAdapter` trait; the wire protocol
//!   stays behind it
//! - Change notifications are delivered as a stream, never as callbacks into
//!   the coordinator's state

pub mod adapter;
pub mod network;
pub mod rpc;
pub mod types;

pub use adapter::ProviderAdapter;
pub use network::chain_id_to_network;
pub use rpc::RpcProvider;
pub use types::{ChainId, ProviderError, ProviderEvent, ProviderResult};
