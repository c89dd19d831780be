//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → RouterConfig → Router::from_config (custom methods, context pool)
//!     → listener / timeouts / observability → host binary
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes themselves are code, not config
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, ContextPoolConfig, ListenerConfig, ObservabilityConfig, RouterConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
