//! Router façade.
//!
//! # Data Flow
//! ```text
//! Setup (single owner, &mut):
//!     Router::new()
//!     → use_interceptor(..)          router-wide, before any route
//!     → get/post/handle/method(..)   pattern parsed, inserted into the tree
//!     → with/group(..)               InlineRouter: extra interceptors, same tree
//!     → route/mount(..)              sub-router owned by a stub node
//!     → into_service()               freeze (recursively) into RouterService
//!
//! Serving (shared, immutable):
//!     RouterService ── tower::Service / Handler ──> see service.rs
//! ```
//!
//! # Design Decisions
//! - Registration returns `Result`; setup aborts with `?` on the first error
//! - Freezing consumes the builder, so routes cannot change while serving
//! - `Router` and `InlineRouter` share one registration surface (`Routable`)

pub mod inline;
pub mod mux;
pub mod service;
pub mod walk;

pub use inline::InlineRouter;
pub use mux::Router;
pub use service::RouterService;
pub use walk::{walk, Route, Routes};

use crate::error::RouterError;
use crate::http::chain::Interceptor;
use crate::http::handler::Handler;
use crate::methods::{MethodRegistry, MethodSet};

/// Route registration shared by `Router` and `InlineRouter`.
pub trait Routable {
    /// Registry used to resolve method names.
    fn registry(&self) -> &MethodRegistry;

    /// Register `handler` for every method in `methods`.
    fn add_route<H: Handler>(
        &mut self,
        methods: MethodSet,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouterError>;

    /// Append an interceptor to this router's stack.
    ///
    /// Fails with `InterceptorsFrozen` once a route, mount or inline router
    /// has been created through this router.
    fn use_interceptor(&mut self, interceptor: Interceptor) -> Result<(), RouterError>;

    /// An inline router adding `interceptors` to handlers registered
    /// through it.
    fn with_interceptors(&mut self, interceptors: Vec<Interceptor>) -> InlineRouter<'_>;

    /// Attach `router` under `pattern`. The sub-router sees the path with the
    /// prefix removed.
    fn mount(&mut self, pattern: &str, router: Router) -> Result<(), RouterError>;

    /// Attach a plain handler under `pattern`, answering every method and
    /// every path below it.
    fn mount_handler<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError>;

    fn not_found<H: Handler>(&mut self, handler: H);

    fn method_not_allowed<H: Handler>(&mut self, handler: H);

    /// Register `handler` for every method.
    fn handle<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.add_route(MethodSet::ANY, pattern, handler)
    }

    /// Register `handler` for the method called `method`.
    fn method<H: Handler>(
        &mut self,
        method: &str,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouterError> {
        let methods = self.registry().resolve(method)?;
        self.add_route(methods, pattern, handler)
    }

    fn connect<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("CONNECT", pattern, handler)
    }

    fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("DELETE", pattern, handler)
    }

    fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("GET", pattern, handler)
    }

    fn head<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("HEAD", pattern, handler)
    }

    fn options<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("OPTIONS", pattern, handler)
    }

    fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("PATCH", pattern, handler)
    }

    fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("POST", pattern, handler)
    }

    fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("PUT", pattern, handler)
    }

    fn trace<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.method("TRACE", pattern, handler)
    }

    /// An inline router adding `interceptor`.
    fn with(&mut self, interceptor: Interceptor) -> InlineRouter<'_> {
        self.with_interceptors(vec![interceptor])
    }

    /// Register routes through a fresh inline router.
    fn group<F>(&mut self, f: F) -> Result<(), RouterError>
    where
        F: FnOnce(&mut InlineRouter<'_>) -> Result<(), RouterError>,
    {
        let mut inline = self.with_interceptors(Vec::new());
        f(&mut inline)
    }

    /// Build a new router with `f` and mount it at `pattern`.
    fn route<F>(&mut self, pattern: &str, f: F) -> Result<(), RouterError>
    where
        F: FnOnce(&mut Router) -> Result<(), RouterError>,
    {
        let mut sub = Router::with_registry(self.registry().clone());
        f(&mut sub)?;
        self.mount(pattern, sub)
    }
}
