//! Coordinator status snapshot.

use alloy::primitives::Address;
use serde::Serialize;

/// Coarse coordinator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitState {
    #[default]
    Uninitialized,
    Initializing,
    Initialized,
}

impl InitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitState::Uninitialized => "UNINITIALIZED",
            InitState::Initializing => "INITIALIZING",
            InitState::Initialized => "INITIALIZED",
        }
    }
}

/// What the coordinator is waiting on while `Initializing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InitAction {
    /// Waiting for the provider to expose an account.
    LinkProviderAccount,
    /// Registering the provider account with the SDK.
    LinkAztecAccount,
    /// Waiting for the user to switch the provider to the expected network.
    ChangeNetwork,
}

/// Immutable snapshot of the coordinator's status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitStatus {
    pub state: InitState,
    /// Only meaningful while `state` is `Initializing`.
    pub action: Option<InitAction>,
    pub account: Option<Address>,
    /// Name of the network the rollup provider expects.
    pub network: Option<String>,
    /// Latest progress message reported by the SDK.
    pub message: Option<String>,
}

impl InitStatus {
    pub fn is_initialized(&self) -> bool {
        self.state == InitState::Initialized
    }
}
