//! Setup-time router.
//!
//! # Responsibilities
//! - Register routes, interceptors, mounts and fallback handlers
//! - Detect mount conflicts and propagate fallbacks to sub-routers
//! - Freeze into a `RouterService`
//!
//! # Design Decisions
//! - The interceptor list is frozen by the first route registration, the
//!   first mount or the first inline router, whichever comes first
//! - A mounted router is owned by the node that mounts it and frozen with
//!   its parent
//! - Fallbacks inherited from a parent keep following the parent

use std::mem;
use std::sync::{Arc, OnceLock};

use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::http::chain::{Chain, ChainHandler, Interceptor};
use crate::http::handler::{BoxHandler, Handler, Request, Response};
use crate::http::request::RequestExt;
use crate::methods::{MethodRegistry, MethodSet, MethodTable};
use crate::router::inline::InlineRouter;
use crate::router::service::RouterService;
use crate::router::walk::{Route, Routes};
use crate::router::Routable;
use crate::routing::context::RouteContext;
use crate::routing::pattern::Pattern;
use crate::routing::pool::ContextPool;
use crate::routing::tree::{Endpoint, Node};

/// A not-found or method-not-allowed override.
#[derive(Debug, Clone)]
pub(crate) struct Fallback {
    pub(crate) handler: BoxHandler,
    /// Set when the handler was copied down from a parent router.
    inherited: bool,
}

impl Fallback {
    fn own(handler: BoxHandler) -> Self {
        Self {
            handler,
            inherited: false,
        }
    }

    fn inherited(handler: BoxHandler) -> Self {
        Self {
            handler,
            inherited: true,
        }
    }
}

/// What a mount delegates to.
pub(crate) enum MountTarget {
    Router(Router),
    Handler(BoxHandler),
}

/// Sub-router hanging off a mount node.
pub(crate) enum SubRoutes {
    Pending(Box<Router>),
    Serving(RouterService),
}

/// The sub-router owned by a mount node, plus the slot its stub handler
/// delegates through once the sub-router is frozen.
pub(crate) struct MountPoint {
    routes: SubRoutes,
    slot: Arc<OnceLock<BoxHandler>>,
}

impl MountPoint {
    pub(crate) fn routes(&self) -> &dyn Routes {
        match &self.routes {
            SubRoutes::Pending(router) => router.as_ref(),
            SubRoutes::Serving(service) => service,
        }
    }

    fn pending_mut(&mut self) -> Option<&mut Router> {
        match &mut self.routes {
            SubRoutes::Pending(router) => Some(router.as_mut()),
            SubRoutes::Serving(_) => None,
        }
    }

    fn freeze(&mut self) {
        if let SubRoutes::Pending(router) = &mut self.routes {
            let service = mem::take(router.as_mut()).into_service();
            let _ = self.slot.set(BoxHandler::new(service.clone()));
            self.routes = SubRoutes::Serving(service);
        }
    }
}

/// Stub endpoint installed by `mount`: shifts the route path past the mount
/// prefix and hands the request to the mounted handler.
struct MountHandler {
    target: Arc<OnceLock<BoxHandler>>,
}

impl Handler for MountHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        if let Some(handle) = req.route_context() {
            let mut ctx = handle.lock();
            let next = ctx.next_route_path();
            ctx.set_route_path(next);
        }
        match self.target.get() {
            Some(target) => target.call(req),
            None => {
                warn!(path = %req.uri().path(), "Mounted router was never frozen");
                Box::pin(async { StatusCode::NOT_FOUND.into_response() })
            }
        }
    }
}

/// Router under construction.
///
/// ```
/// use waymark::http::Request;
/// use waymark::{Routable, Router};
///
/// # fn main() -> Result<(), waymark::RouterError> {
/// let mut router = Router::new();
/// router.get("/", |_req: Request| async { "welcome" })?;
/// router.route("/users", |r| {
///     r.get("/{id}", |_req: Request| async { "user" })?;
///     Ok(())
/// })?;
/// let service = router.into_service();
/// # let _ = service;
/// # Ok(())
/// # }
/// ```
pub struct Router {
    pub(crate) tree: Node,
    pub(crate) interceptors: Vec<Interceptor>,
    pub(crate) not_found: Option<Fallback>,
    pub(crate) method_not_allowed: Option<Fallback>,
    pub(crate) registry: MethodRegistry,
    pub(crate) pool: Arc<ContextPool>,
    frozen: bool,
}

impl Router {
    /// A router resolving methods against the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(MethodRegistry::global().clone())
    }

    pub fn with_registry(registry: MethodRegistry) -> Self {
        Self {
            tree: Node::default(),
            interceptors: Vec::new(),
            not_found: None,
            method_not_allowed: None,
            registry,
            pool: Arc::new(ContextPool::default()),
            frozen: false,
        }
    }

    /// Build a router from configuration: registers the configured custom
    /// methods and sizes the context pool.
    pub fn from_config(config: &RouterConfig, registry: MethodRegistry) -> Result<Self, RouterError> {
        for name in &config.custom_methods {
            registry.ensure(name)?;
        }
        let pool = ContextPool::new(config.context_pool.max_idle);
        pool.prewarm(config.context_pool.prewarm);

        let mut router = Self::with_registry(registry);
        router.pool = Arc::new(pool);
        Ok(router)
    }

    /// Freeze this router, and every router mounted under it, into a
    /// shareable service.
    pub fn into_service(mut self) -> RouterService {
        self.tree.for_each_mount_mut(&mut MountPoint::freeze);
        RouterService::freeze(self)
    }

    pub(crate) fn insert_route(
        &mut self,
        methods: MethodSet,
        pattern: &str,
        handler: ChainHandler,
        stub: bool,
    ) -> Result<&mut Node, RouterError> {
        let parsed = Pattern::parse(pattern)?;
        self.frozen = true;

        debug!(pattern, methods = ?methods, "Route registered");
        let mut endpoint = Endpoint::new(&parsed, handler);
        if stub {
            endpoint = endpoint.stub();
        }
        let node = self.tree.insert(&parsed);
        node.set_endpoint(methods, endpoint);
        Ok(node)
    }

    pub(crate) fn mount_with(
        &mut self,
        pattern: &str,
        target: MountTarget,
        interceptors: &[Interceptor],
    ) -> Result<(), RouterError> {
        if self.is_mounted(pattern) {
            warn!(pattern, "Mount conflict");
            return Err(RouterError::MountConflict(pattern.to_string()));
        }

        let slot = Arc::new(OnceLock::new());
        let sub = match target {
            MountTarget::Router(mut router) => {
                if let Some(fallback) = &self.not_found {
                    router.inherit_not_found(&fallback.handler);
                }
                if let Some(fallback) = &self.method_not_allowed {
                    router.inherit_method_not_allowed(&fallback.handler);
                }
                Some(router)
            }
            MountTarget::Handler(handler) => {
                let _ = slot.set(handler);
                None
            }
        };

        let stub = ChainHandler::new(
            interceptors.to_vec(),
            BoxHandler::new(MountHandler {
                target: Arc::clone(&slot),
            }),
        );

        let mut prefix = pattern.to_string();
        if !prefix.ends_with('/') {
            self.insert_route(MethodSet::ANY, &prefix, stub.clone(), true)?;
            self.insert_route(MethodSet::ANY, &format!("{prefix}/"), stub.clone(), true)?;
            prefix.push('/');
        }

        let node = self.insert_route(MethodSet::ANY, &format!("{prefix}*"), stub, sub.is_some())?;
        if let Some(router) = sub {
            node.mount = Some(MountPoint {
                routes: SubRoutes::Pending(Box::new(router)),
                slot,
            });
        }
        debug!(pattern, "Mounted");
        Ok(())
    }

    /// True when a wildcard route already sits under `pattern`.
    fn is_mounted(&self, pattern: &str) -> bool {
        [format!("{pattern}*"), format!("{pattern}/*")]
            .iter()
            .filter_map(|candidate| Pattern::parse(candidate).ok())
            .any(|candidate| {
                self.tree
                    .find_pattern(&candidate)
                    .is_some_and(|node| !node.endpoints.is_empty())
            })
    }

    pub(crate) fn set_not_found(&mut self, handler: BoxHandler) {
        self.not_found = Some(Fallback::own(handler.clone()));
        self.propagate_not_found(&handler);
    }

    pub(crate) fn set_method_not_allowed(&mut self, handler: BoxHandler) {
        self.method_not_allowed = Some(Fallback::own(handler.clone()));
        self.propagate_method_not_allowed(&handler);
    }

    fn inherit_not_found(&mut self, handler: &BoxHandler) {
        if self.not_found.as_ref().is_some_and(|f| !f.inherited) {
            return;
        }
        self.not_found = Some(Fallback::inherited(handler.clone()));
        self.propagate_not_found(handler);
    }

    fn inherit_method_not_allowed(&mut self, handler: &BoxHandler) {
        if self.method_not_allowed.as_ref().is_some_and(|f| !f.inherited) {
            return;
        }
        self.method_not_allowed = Some(Fallback::inherited(handler.clone()));
        self.propagate_method_not_allowed(handler);
    }

    fn propagate_not_found(&mut self, handler: &BoxHandler) {
        self.tree.for_each_mount_mut(&mut |mount: &mut MountPoint| {
            if let Some(sub) = mount.pending_mut() {
                sub.inherit_not_found(handler);
            }
        });
    }

    fn propagate_method_not_allowed(&mut self, handler: &BoxHandler) {
        self.tree.for_each_mount_mut(&mut |mount: &mut MountPoint| {
            if let Some(sub) = mount.pending_mut() {
                sub.inherit_method_not_allowed(handler);
            }
        });
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("interceptors", &self.interceptors.len())
            .field("frozen", &self.frozen)
            .field("tree", &self.tree)
            .finish()
    }
}

impl Routable for Router {
    fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    fn add_route<H: Handler>(
        &mut self,
        methods: MethodSet,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouterError> {
        let handler = ChainHandler::new(Vec::new(), BoxHandler::new(handler));
        self.insert_route(methods, pattern, handler, false)?;
        Ok(())
    }

    fn use_interceptor(&mut self, interceptor: Interceptor) -> Result<(), RouterError> {
        if self.frozen {
            warn!("Interceptor registered after routes");
            return Err(RouterError::InterceptorsFrozen);
        }
        self.interceptors.push(interceptor);
        Ok(())
    }

    fn with_interceptors(&mut self, interceptors: Vec<Interceptor>) -> InlineRouter<'_> {
        self.frozen = true;
        InlineRouter::new(self, interceptors)
    }

    fn mount(&mut self, pattern: &str, router: Router) -> Result<(), RouterError> {
        self.mount_with(pattern, MountTarget::Router(router), &[])
    }

    fn mount_handler<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.mount_with(pattern, MountTarget::Handler(BoxHandler::new(handler)), &[])
    }

    fn not_found<H: Handler>(&mut self, handler: H) {
        self.set_not_found(BoxHandler::new(handler));
    }

    fn method_not_allowed<H: Handler>(&mut self, handler: H) {
        self.set_method_not_allowed(BoxHandler::new(handler));
    }
}

impl Routes for Router {
    fn routes(&self) -> Vec<Route<'_>> {
        let methods = self.registry.snapshot();
        let mut routes = Vec::new();
        self.tree.routes(&methods, &mut routes);
        routes
    }

    fn interceptors(&self) -> &[Interceptor] {
        &self.interceptors
    }

    fn methods(&self) -> Arc<MethodTable> {
        self.registry.snapshot()
    }

    fn find(&self, ctx: &mut RouteContext, method: &str, path: &str) -> bool {
        find_in(&self.tree, &self.registry.snapshot(), ctx, method, path)
    }
}

pub(crate) fn find_in(
    tree: &Node,
    methods: &MethodTable,
    ctx: &mut RouteContext,
    method: &str,
    path: &str,
) -> bool {
    let Some(id) = methods.get(method) else {
        return false;
    };
    let Some(node) = tree.find_route(ctx, id, path, methods) else {
        return false;
    };
    match &node.mount {
        Some(mount) => {
            let next = ctx.next_route_path();
            ctx.set_route_path(next.clone());
            mount.routes().find(ctx, method, &next)
        }
        None => true,
    }
}

/// Wrap `handler` with `interceptors` for use as a fallback.
pub(crate) fn fallback_chain(interceptors: &[Interceptor], handler: impl Handler) -> BoxHandler {
    if interceptors.is_empty() {
        return BoxHandler::new(handler);
    }
    BoxHandler::new(Chain::new(interceptors.iter().cloned()).handler(handler))
}
