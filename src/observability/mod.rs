//! Logging and metrics.
//!
//! # Data Flow
//! ```text
//! coordinator, provider, status fetcher, sdk
//!     → logging.rs (tracing subscriber: pretty or JSON on stdout)
//!     → metrics.rs (status transitions, teardowns, network waits)
//!
//! metrics.rs → optional Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Every `init` runs in a span tagged with a fresh session ID
//! - Metrics macros are no-ops until an exporter is installed, so recording
//!   is unconditional

pub mod logging;
pub mod metrics;
