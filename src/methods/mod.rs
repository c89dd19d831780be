//! HTTP method registry.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     standard verbs (seeded) + custom methods (config / register())
//!     → registry.rs (name → bit position)
//!
//! Router freeze:
//!     registry.snapshot() → Arc<MethodTable> captured by the frozen router
//!
//! Request:
//!     request method → MethodTable::get → MethodId → endpoint lookup
//! ```
//!
//! # Design Decisions
//! - Append-only: bit positions never change once handed out
//! - Bit 63 is reserved for "any method"
//! - Reads are lock-free snapshots; registration swaps in a new table

pub mod registry;

pub use registry::{MethodId, MethodRegistry, MethodSet, MethodTable, STANDARD_METHODS};
