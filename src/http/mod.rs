//! HTTP-facing types.
//!
//! # Data Flow
//! ```text
//! Request (from the host transport)
//!     → chain.rs (router interceptors, outermost first)
//!     → handler.rs (matched endpoint)
//!     → response.rs (default 404 / 405 when nothing matched)
//!     → Response (back to the host transport)
//! ```

pub mod chain;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;

pub use chain::{chain, from_fn, Chain, ChainHandler, Interceptor, Next};
pub use handler::{BoxHandler, Handler, Request, Response};
pub use request::{url_param, RequestExt, RequestId, X_REQUEST_ID};
