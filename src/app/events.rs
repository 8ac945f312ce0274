//! Coordinator event surface and facade relay table.

use std::sync::Arc;

use crate::app::status::InitStatus;
use crate::sdk::{SdkEvent, SdkEventKind};

/// Everything an observer of the coordinator can receive.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The coordinator's status changed. Each snapshot is a distinct allocation.
    StatusUpdated(Arc<InitStatus>),
    /// A facade event, forwarded unchanged.
    Sdk(SdkEvent),
}

impl AppEvent {
    /// Status snapshot carried by this event, if any.
    pub fn status(&self) -> Option<&Arc<InitStatus>> {
        match self {
            AppEvent::StatusUpdated(status) => Some(status),
            AppEvent::Sdk(_) => None,
        }
    }

    /// Event name as seen by observers.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::StatusUpdated(_) => "APPEVENT_UPDATED_INIT_STATE",
            AppEvent::Sdk(event) => event.kind().as_str(),
        }
    }
}

/// Map a facade event to the event forwarded to coordinator observers.
///
/// Every kind is listed explicitly: adding a kind to [`SdkEvent`] fails to
/// compile here until it is given a relay action.
pub fn relay(event: &SdkEvent) -> AppEvent {
    match event.kind() {
        SdkEventKind::UpdatedInitState
        | SdkEventKind::UpdatedUsers
        | SdkEventKind::UpdatedUserState
        | SdkEventKind::UpdatedWorldState
        | SdkEventKind::UpdatedActionState
        | SdkEventKind::ClearData
        | SdkEventKind::Destroyed
        | SdkEventKind::Log => AppEvent::Sdk(event.clone()),
    }
}
