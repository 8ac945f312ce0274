//! Initialization coordinator.
//!
//! # State Machine
//! ```text
//! UNINITIALIZED → INITIALIZING        init() starts
//! INITIALIZING  → INITIALIZED         account linked
//! INITIALIZED   → INITIALIZING        relink to an unregistered account
//! any           → UNINITIALIZED       destroy(), init failure, withdrawal,
//!                                     post-link network mismatch
//! ```
//!
//! # Data Flow
//! ```text
//! init(server_url, clear_db)
//!     → ProviderAdapter::init
//!     → RemoteStatusFetcher (expected chain id)
//!     → network wait (until provider chain id matches)
//!     → SdkFactory::create + relay/message listeners
//!     → SdkFacade::init
//!     → account_changed(provider account)
//!     → provider listener task (account + network notifications)
//! ```
//!
//! # Design Decisions
//! - One transition function is the only writer of the status snapshot; it
//!   publishes a fresh `Arc<InitStatus>` and emits it under the same lock
//! - Facade events reach observers through a closed relay table
//! - `destroy()` bumps a session generation that every suspended step checks
//!   on resume

pub mod coordinator;
pub mod error;
pub mod events;
pub mod status;

pub use coordinator::WebSdk;
pub use error::{AppError, FailureReason};
pub use events::AppEvent;
pub use status::{InitAction, InitState, InitStatus};
