//! Waymark: an embeddable HTTP request router.
//!
//! # Architecture Overview
//!
//! ```text
//!     setup (&mut, single owner)                serving (shared, immutable)
//!
//!   ┌──────────┐   parse   ┌──────────┐            ┌───────────────┐
//!   │  Router  │──────────▶│ Pattern  │            │ RouterService │◀── tower::Service
//!   │ Routable │           └────┬─────┘            │  (Arc<Mux>)   │    / Handler
//!   └────┬─────┘                │ insert           └──────┬────────┘
//!        │ with/group           ▼                         │ lease
//!   ┌────┴────────┐       ┌──────────┐  into_service ┌────▼────────┐
//!   │InlineRouter │──────▶│   Node   │──────────────▶│ ContextPool │
//!   └─────────────┘       │  (tree)  │               └────┬────────┘
//!        mount/route      └────┬─────┘                    │ RouteContext
//!   ┌─────────────┐  owned by  │                          ▼
//!   │ sub-Router  │◀───────────┘               interceptors → Dispatch
//!   └─────────────┘  stub node                 → endpoint | 404 | 405
//! ```
//!
//! # Quick Start
//!
//! ```
//! use waymark::http::{Request, RequestExt};
//! use waymark::{Routable, Router};
//!
//! # fn main() -> Result<(), waymark::RouterError> {
//! let mut router = Router::new();
//! router.use_interceptor(waymark::http::middleware::recover())?;
//! router.get("/users/{id}", |req: Request| async move {
//!     format!("user {}", req.url_param("id").unwrap_or_default())
//! })?;
//! let service = router.into_service();
//! # let _ = service;
//! # Ok(())
//! # }
//! ```

// Core
pub mod methods;
pub mod router;
pub mod routing;

// Request/response plumbing
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod observability;

pub use config::AppConfig;
pub use error::{PatternError, RouterError};
pub use methods::{MethodRegistry, MethodSet};
pub use router::{walk, InlineRouter, Routable, Route, Router, RouterService, Routes};
pub use routing::{RouteContext, RouteContextHandle};
