//! Wallet-linked SDK initialization coordinator.
//!
//! Bridges an external account/network provider (a wallet node) with a
//! transactional SDK facade, keeping the linked account and linked network
//! consistent for the lifetime of a session.

pub mod app;
pub mod config;
pub mod events;
pub mod observability;
pub mod provider;
pub mod sdk;
pub mod status;

pub use app::{AppError, AppEvent, InitAction, InitState, InitStatus, WebSdk};
pub use config::AppConfig;
