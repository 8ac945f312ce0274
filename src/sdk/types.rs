//! Facade-facing types, events and errors.

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

use crate::provider::ChainId;
use crate::status::StatusError;

/// The facade's own initialization sub-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SdkInitState {
    Uninitialized,
    Initializing,
    Initialized,
    Destroyed,
}

/// Every event the facade can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SdkEvent {
    /// Initialization progress. `message` is a human-readable step description.
    UpdatedInitState {
        state: SdkInitState,
        message: Option<String>,
    },
    /// The set of registered users changed.
    UpdatedUsers,
    /// A registered user's state changed.
    UpdatedUserState(Address),
    /// Local world state advanced.
    UpdatedWorldState { sync_height: u64, latest_height: u64 },
    /// A user-facing action changed state.
    UpdatedActionState(String),
    /// Local data was wiped.
    ClearData,
    /// The facade was destroyed.
    Destroyed,
    /// Free-form diagnostic output.
    Log(String),
}

/// Discriminant of [`SdkEvent`], used for relay tables and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkEventKind {
    UpdatedInitState,
    UpdatedUsers,
    UpdatedUserState,
    UpdatedWorldState,
    UpdatedActionState,
    ClearData,
    Destroyed,
    Log,
}

impl SdkEventKind {
    /// Wire-style event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkEventKind::UpdatedInitState => "SDKEVENT_UPDATED_INIT_STATE",
            SdkEventKind::UpdatedUsers => "SDKEVENT_UPDATED_USERS",
            SdkEventKind::UpdatedUserState => "SDKEVENT_UPDATED_USER_STATE",
            SdkEventKind::UpdatedWorldState => "SDKEVENT_UPDATED_WORLD_STATE",
            SdkEventKind::UpdatedActionState => "SDKEVENT_UPDATED_ACTION_STATE",
            SdkEventKind::ClearData => "SDKEVENT_CLEAR_DATA",
            SdkEventKind::Destroyed => "SDKEVENT_DESTROYED",
            SdkEventKind::Log => "SDKEVENT_LOG",
        }
    }
}

impl SdkEvent {
    pub fn kind(&self) -> SdkEventKind {
        match self {
            SdkEvent::UpdatedInitState { .. } => SdkEventKind::UpdatedInitState,
            SdkEvent::UpdatedUsers => SdkEventKind::UpdatedUsers,
            SdkEvent::UpdatedUserState(_) => SdkEventKind::UpdatedUserState,
            SdkEvent::UpdatedWorldState { .. } => SdkEventKind::UpdatedWorldState,
            SdkEvent::UpdatedActionState(_) => SdkEventKind::UpdatedActionState,
            SdkEvent::ClearData => SdkEventKind::ClearData,
            SdkEvent::Destroyed => SdkEventKind::Destroyed,
            SdkEvent::Log(_) => SdkEventKind::Log,
        }
    }
}

/// A user registered with the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Address,
    /// Height the user's local state is synced to.
    pub synced_height: u64,
}

/// Locally cached facade status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalStatus {
    /// Chain the facade was created against.
    pub chain_id: ChainId,
    pub rollup_contract_address: Option<String>,
    pub sync_height: u64,
    pub init_state: SdkInitState,
}

/// Options passed when constructing a facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdkOptions {
    /// Wipe persisted local data before starting.
    pub clear_db: bool,
}

/// Errors raised by the facade.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Failed to resolve rollup provider status: {0}")]
    RemoteStatus(#[from] StatusError),

    #[error("SDK not initialized")]
    NotInitialized,

    #[error("SDK has been destroyed")]
    Destroyed,

    #[error("User {0} is already registered")]
    UserExists(Address),
}

/// Result type for facade operations.
pub type SdkResult<T> = Result<T, SdkError>;
