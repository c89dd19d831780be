//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (setup):
//!     "/users/{id}"
//!     → pattern.rs (segments: Static "/users/", Param "id")
//!     → tree.rs (insert, splitting shared literal prefixes)
//!
//! Request lookup (serving):
//!     (method, path)
//!     → pool.rs (context leased for the request)
//!     → tree.rs (static → regex → param → catch-all, backtracking)
//!     → context.rs (bound params, matched pattern, 405 bookkeeping)
//! ```
//!
//! # Design Decisions
//! - Tree is immutable once its router is frozen (no locks on lookup)
//! - Deterministic: same input always matches same route
//! - Parameter values never contain '/'; only the catch-all spans segments

pub mod context;
pub mod pattern;
pub mod pool;
pub mod tree;

pub use context::{RouteContext, RouteContextHandle, RouteParams};
pub use pattern::{Pattern, Segment, WILDCARD_KEY};
pub use pool::{ContextLease, ContextPool};
