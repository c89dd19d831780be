//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router setup and dispatch produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (dispatch outcomes, context pool occupancy)
//!
//! Consumers:
//!     → stdout (fmt layer, filter from config or RUST_LOG)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; the host binary installs subscribers
//! - Metric updates are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
