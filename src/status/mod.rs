//! Remote rollup provider status.
//!
//! # Responsibilities
//! - Resolve the chain id the remote service expects its clients to be on
//! - Carry the rest of the service's static status alongside it
//!
//! # Design Decisions
//! - Stateless: one call per `init`, no caching
//! - Transport, HTTP status and decoding failures are distinct errors so a
//!   caller can tell "service down" apart from "service misbehaving"

pub mod fetcher;

pub use fetcher::{HttpStatusFetcher, RemoteStatus, RemoteStatusFetcher, StatusError, StatusResult};
