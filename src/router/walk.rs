//! Route introspection.
//!
//! `Routes` is implemented by both the setup-time `Router` and the frozen
//! `RouterService`, so a route listing can be produced before or after
//! serving starts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::http::chain::{ChainHandler, Interceptor};
use crate::http::handler::BoxHandler;
use crate::methods::MethodTable;
use crate::routing::context::{collapse_wildcards, RouteContext};

/// Read access to a router's registered routes.
pub trait Routes: Send + Sync {
    /// Registered routes, in lookup order.
    fn routes(&self) -> Vec<Route<'_>>;

    /// Interceptors wrapped around this router's whole dispatch.
    fn interceptors(&self) -> &[Interceptor];

    /// Method table this router resolves methods against.
    fn methods(&self) -> Arc<MethodTable>;

    /// Route `method` + `path` without calling any handler, descending into
    /// mounted routers. `ctx` is updated as a real dispatch would update it.
    fn find(&self, ctx: &mut RouteContext, method: &str, path: &str) -> bool;
}

/// One registered pattern and the handlers stored under it.
pub struct Route<'a> {
    pub pattern: String,
    /// Method name to handler; the any-method handler is keyed `*`.
    pub handlers: BTreeMap<String, ChainHandler>,
    pub sub_routes: Option<&'a dyn Routes>,
}

impl<'a> Route<'a> {
    pub(crate) fn new(pattern: String, sub_routes: Option<&'a dyn Routes>) -> Self {
        Self {
            pattern,
            handlers: BTreeMap::new(),
            sub_routes,
        }
    }
}

impl fmt::Debug for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .field("mounted", &self.sub_routes.is_some())
            .finish()
    }
}

/// Visit every (method, full path, handler, interceptors) combination.
///
/// Mounted routers are walked recursively with their mount prefix; any-method
/// routes are expanded into every registered method that has no explicit
/// handler of its own. Interceptors are listed outermost first.
pub fn walk<E, F>(routes: &dyn Routes, mut visit: F) -> Result<(), E>
where
    F: FnMut(&str, &str, &BoxHandler, &[Interceptor]) -> Result<(), E>,
{
    walk_level(routes, &mut visit, "", &[])
}

fn walk_level<E, F>(
    routes: &dyn Routes,
    visit: &mut F,
    parent: &str,
    parent_interceptors: &[Interceptor],
) -> Result<(), E>
where
    F: FnMut(&str, &str, &BoxHandler, &[Interceptor]) -> Result<(), E>,
{
    let methods = routes.methods();
    let mut interceptors = parent_interceptors.to_vec();
    interceptors.extend_from_slice(routes.interceptors());

    for route in routes.routes() {
        let full = format!("{parent}{}", route.pattern);
        if let Some(sub) = route.sub_routes {
            walk_level(sub, visit, &full, &interceptors)?;
            continue;
        }

        let path = collapse_wildcards(&full);
        let mut resolved: BTreeMap<&str, &ChainHandler> = route
            .handlers
            .iter()
            .filter(|(method, _)| method.as_str() != "*")
            .map(|(method, handler)| (method.as_str(), handler))
            .collect();
        if let Some(any) = route.handlers.get("*") {
            for (_, name) in methods.iter() {
                resolved.entry(name).or_insert(any);
            }
        }

        for (method, handler) in resolved {
            let mut chain = interceptors.clone();
            chain.extend_from_slice(handler.interceptors());
            visit(method, &path, handler.endpoint(), &chain)?;
        }
    }
    Ok(())
}
