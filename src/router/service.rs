//! Frozen router.
//!
//! # Data Flow
//! ```text
//! RouterService::call
//!     → context lease from the pool (top level only)
//!     → interceptor chain
//!     → Dispatch (tree lookup under the context lock)
//!     → endpoint | 405 handler | 404 handler
//!     → lease returned to the pool
//! ```
//!
//! # Design Decisions
//! - Everything reachable from `Mux` is immutable; requests share it through
//!   one `Arc` without locking
//! - The context lock is held for the lookup only, never across an await
//! - A request that already carries a context came through a parent router
//!   and reuses it

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use percent_encoding::percent_decode_str;
use tracing::trace;

use crate::http::chain::{chain, Interceptor};
use crate::http::handler::{BoxHandler, Handler, Request, Response};
use crate::http::response;
use crate::methods::MethodTable;
use crate::observability::metrics::{self, DispatchOutcome};
use crate::router::mux::{find_in, Router};
use crate::router::walk::{Route, Routes};
use crate::routing::context::{RouteContext, RouteContextHandle};
use crate::routing::pool::{ContextLease, ContextPool};
use crate::routing::tree::Node;

/// Tree lookup and fallback selection; the innermost handler of a router.
pub(crate) struct Dispatch {
    tree: Node,
    methods: Arc<MethodTable>,
    not_found: BoxHandler,
    method_not_allowed: BoxHandler,
}

impl Dispatch {
    fn select(&self, req: &Request, handle: &RouteContextHandle) -> BoxHandler {
        let mut ctx = handle.lock();

        let path = match ctx.route_path() {
            Some(path) => path.to_string(),
            None if req.uri().path().is_empty() => "/".to_string(),
            None => routing_path(req.uri().path()),
        };
        if ctx.route_method().is_none() {
            ctx.set_route_method(req.method().as_str());
        }

        let Some(method) = ctx.route_method().and_then(|m| self.methods.get(m)) else {
            trace!(method = ?ctx.route_method(), "Method not registered");
            metrics::record_dispatch(DispatchOutcome::MethodNotAllowed);
            return self.method_not_allowed.clone();
        };

        let found = self
            .tree
            .find_route(&mut ctx, method, &path, &self.methods)
            .and_then(|node| node.endpoints.get(method));
        match found {
            Some(endpoint) => {
                trace!(path = %path, pattern = %endpoint.pattern, "Route matched");
                metrics::record_dispatch(DispatchOutcome::Matched);
                endpoint.handler.composed().clone()
            }
            None if ctx.method_not_allowed() => {
                trace!(path = %path, allowed = ?ctx.allowed_methods(), "Method not allowed");
                metrics::record_dispatch(DispatchOutcome::MethodNotAllowed);
                self.method_not_allowed.clone()
            }
            None => {
                trace!(path = %path, "No route");
                metrics::record_dispatch(DispatchOutcome::NotFound);
                self.not_found.clone()
            }
        }
    }
}

impl Handler for Dispatch {
    fn call(&self, mut req: Request) -> BoxFuture<'static, Response> {
        let handle = match req.extensions().get::<RouteContextHandle>() {
            Some(handle) => handle.clone(),
            None => {
                let handle = RouteContextHandle::default();
                req.extensions_mut().insert(handle.clone());
                handle
            }
        };
        let handler = self.select(&req, &handle);
        handler.call(req)
    }
}

/// The path a top-level lookup routes on: the percent-decoded request path.
///
/// An encoded `/` (`%2F`) must not become a segment break, so such paths, and
/// paths that do not decode to UTF-8, are routed on their raw form.
fn routing_path(raw: &str) -> String {
    if raw.contains("%2F") || raw.contains("%2f") {
        return raw.to_string();
    }
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Shared state of a frozen router.
pub(crate) struct Mux {
    handler: BoxHandler,
    dispatch: Arc<Dispatch>,
    interceptors: Vec<Interceptor>,
    pool: Arc<ContextPool>,
}

/// A frozen router, cheap to clone and safe to share across tasks.
///
/// Usable directly through [`RouterService::handle`], as a `tower::Service`
/// (e.g. an axum fallback service) or as a [`Handler`] mounted elsewhere.
#[derive(Clone)]
pub struct RouterService {
    inner: Arc<Mux>,
}

impl RouterService {
    pub(crate) fn freeze(router: Router) -> Self {
        let dispatch = Arc::new(Dispatch {
            tree: router.tree,
            methods: router.registry.snapshot(),
            not_found: router
                .not_found
                .map(|f| f.handler)
                .unwrap_or_else(|| BoxHandler::new(response::not_found)),
            method_not_allowed: router
                .method_not_allowed
                .map(|f| f.handler)
                .unwrap_or_else(|| BoxHandler::new(response::method_not_allowed)),
        });
        let handler = chain(
            &router.interceptors,
            BoxHandler::from_arc(Arc::clone(&dispatch) as Arc<dyn Handler>),
        );
        Self {
            inner: Arc::new(Mux {
                handler,
                dispatch,
                interceptors: router.interceptors,
                pool: router.pool,
            }),
        }
    }

    pub(crate) fn from_mux(inner: Arc<Mux>) -> Self {
        Self { inner }
    }

    /// Route and serve one request.
    pub async fn handle(&self, req: Request) -> Response {
        Handler::call(self, req).await
    }

    /// Contexts currently idle in this router's pool.
    pub fn idle_contexts(&self) -> usize {
        self.inner.pool.idle()
    }
}

impl Handler for RouterService {
    fn call(&self, mut req: Request) -> BoxFuture<'static, Response> {
        if req.extensions().get::<RouteContextHandle>().is_some() {
            return self.inner.handler.call(req);
        }

        let lease = self.inner.pool.acquire();
        let handle = lease.handle();
        handle.lock().set_router(&self.inner);
        req.extensions_mut().insert(handle);

        Box::pin(LeasedResponse {
            fut: self.inner.handler.call(req),
            _lease: lease,
        })
    }
}

/// Response future that returns its context lease when dropped.
///
/// Field order matters: the handler future, and with it the request's
/// reference to the context, is dropped before the lease.
struct LeasedResponse {
    fut: BoxFuture<'static, Response>,
    _lease: ContextLease,
}

impl Future for LeasedResponse {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Response> {
        self.fut.as_mut().poll(cx)
    }
}

impl tower::Service<Request> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let fut = Handler::call(&*self, req);
        Box::pin(async move { Ok(fut.await) })
    }
}

impl Routes for RouterService {
    fn routes(&self) -> Vec<Route<'_>> {
        let mut routes = Vec::new();
        self.inner
            .dispatch
            .tree
            .routes(&self.inner.dispatch.methods, &mut routes);
        routes
    }

    fn interceptors(&self) -> &[Interceptor] {
        &self.inner.interceptors
    }

    fn methods(&self) -> Arc<MethodTable> {
        Arc::clone(&self.inner.dispatch.methods)
    }

    fn find(&self, ctx: &mut RouteContext, method: &str, path: &str) -> bool {
        let dispatch = &self.inner.dispatch;
        find_in(&dispatch.tree, &dispatch.methods, ctx, method, path)
    }
}

impl std::fmt::Debug for RouterService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterService")
            .field("interceptors", &self.inner.interceptors.len())
            .field("idle_contexts", &self.inner.pool.idle())
            .finish()
    }
}
