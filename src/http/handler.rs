//! Request handler abstraction.
//!
//! # Responsibilities
//! - Define the `Handler` trait every route endpoint implements
//! - Type-erase handlers so the tree can store them uniformly
//!
//! # Design Decisions
//! - Any `Fn(Request) -> impl Future<Output = impl IntoResponse>` is a handler
//! - Handlers return `'static` futures so a frozen router never lends out
//!   borrows of its own state
//! - `BoxHandler` is cheap to clone (one `Arc`)

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

/// Incoming request type.
pub type Request = axum::http::Request<Body>;

/// Outgoing response type.
pub type Response = axum::response::Response;

/// Something that can answer a request.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, req: Request) -> BoxFuture<'static, Response>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        let fut = (self)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// A type-erased, shareable handler.
#[derive(Clone)]
pub struct BoxHandler(Arc<dyn Handler>);

impl BoxHandler {
    pub fn new(handler: impl Handler) -> Self {
        Self(Arc::new(handler))
    }

    pub(crate) fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self(handler)
    }

    /// True when both handles point at the same handler instance.
    pub fn ptr_eq(&self, other: &BoxHandler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Handler for BoxHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        self.0.call(req)
    }
}

impl fmt::Debug for BoxHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BoxHandler")
    }
}
