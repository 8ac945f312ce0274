//! Coordinator errors.

use alloy::primitives::Address;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::sdk::SdkError;
use crate::status::StatusError;

/// Errors surfaced by the coordinator.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Remote status error: {0}")]
    RemoteStatus(#[from] StatusError),

    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("Account access withdrawn")]
    AccountAccessWithdrawn,

    #[error("No account linked")]
    NoAccountLinked,

    #[error("No SDK user registered for {0}")]
    UserNotFound(Address),

    #[error("Not initialized")]
    NotInitialized,

    #[error("A session is already active; destroy it first")]
    SessionActive,

    #[error("Session destroyed")]
    Destroyed,
}

/// Why an `init` call failed, coarse enough to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The rollup provider could not be reached or answered badly.
    ServerUnreachable,
    /// The wallet provider is missing, misconfigured or unresponsive.
    ProviderUnavailable,
    AccountAccessWithdrawn,
    Sdk,
    /// The session was torn down or a second `init` raced the first.
    Aborted,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::ServerUnreachable => "server_unreachable",
            FailureReason::ProviderUnavailable => "provider_unavailable",
            FailureReason::AccountAccessWithdrawn => "account_access_withdrawn",
            FailureReason::Sdk => "sdk",
            FailureReason::Aborted => "aborted",
        }
    }
}

impl AppError {
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            AppError::RemoteStatus(_)
            | AppError::InvalidServerUrl { .. }
            | AppError::Sdk(SdkError::RemoteStatus(_)) => FailureReason::ServerUnreachable,
            AppError::Provider(_) => FailureReason::ProviderUnavailable,
            AppError::AccountAccessWithdrawn => FailureReason::AccountAccessWithdrawn,
            AppError::Sdk(_)
            | AppError::NoAccountLinked
            | AppError::UserNotFound(_)
            | AppError::NotInitialized => FailureReason::Sdk,
            AppError::SessionActive | AppError::Destroyed => FailureReason::Aborted,
        }
    }
}
