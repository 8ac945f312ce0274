//! Transactional SDK facade.
//!
//! # Data Flow
//! ```text
//! coordinator
//!     → facade.rs (SdkFactory::create, SdkFacade lifecycle and user registry)
//!     → memory.rs (in-process facade used by the binary and tests)
//!
//! SdkFacade event listeners
//!     → coordinator relay (verbatim) + init-message handler
//! ```
//!
//! # Design Decisions
//! - Proof generation, rollup scheduling and world-state storage live behind
//!   the facade and are not modelled here
//! - Event kinds form a closed enum so relaying them is auditable

pub mod facade;
pub mod memory;
pub mod types;

pub use facade::{SdkFacade, SdkFactory, SdkListener};
pub use memory::{MemorySdk, MemorySdkFactory};
pub use types::{
    LocalStatus, SdkError, SdkEvent, SdkEventKind, SdkInitState, SdkOptions, SdkResult, User,
};
