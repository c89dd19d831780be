//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber for the host binary
//! - Let `RUST_LOG` override the configured filter
//!
//! # Design Decisions
//! - Library code never installs a subscriber itself
//! - Re-initialization is reported, not fatal (tests may race to install)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither config nor environment sets one.
pub const DEFAULT_FILTER: &str = "waymark=debug,tower_http=debug";

/// Install the global subscriber: `RUST_LOG` if set, else `filter`.
pub fn init_logging(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if let Err(e) = result {
        tracing::warn!(error = %e, "Logging already initialized");
    }
}
