//! Inline routers created by `with` and `group`.

use crate::error::RouterError;
use crate::http::chain::{ChainHandler, Interceptor};
use crate::http::handler::{BoxHandler, Handler};
use crate::methods::{MethodRegistry, MethodSet};
use crate::router::mux::{fallback_chain, MountTarget, Router};
use crate::router::Routable;

/// A view onto a parent router that wraps every handler registered through
/// it with an extra interceptor prefix.
///
/// Routes land in the parent's tree; the parent's own dispatch chain is
/// untouched.
#[derive(Debug)]
pub struct InlineRouter<'a> {
    parent: &'a mut Router,
    interceptors: Vec<Interceptor>,
    frozen: bool,
}

impl<'a> InlineRouter<'a> {
    pub(crate) fn new(parent: &'a mut Router, interceptors: Vec<Interceptor>) -> Self {
        Self {
            parent,
            interceptors,
            frozen: false,
        }
    }

    /// Interceptors applied to routes registered through this router.
    pub fn interceptors(&self) -> &[Interceptor] {
        &self.interceptors
    }
}

impl Routable for InlineRouter<'_> {
    fn registry(&self) -> &MethodRegistry {
        &self.parent.registry
    }

    fn add_route<H: Handler>(
        &mut self,
        methods: MethodSet,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouterError> {
        self.frozen = true;
        let handler = ChainHandler::new(self.interceptors.clone(), BoxHandler::new(handler));
        self.parent.insert_route(methods, pattern, handler, false)?;
        Ok(())
    }

    fn use_interceptor(&mut self, interceptor: Interceptor) -> Result<(), RouterError> {
        if self.frozen {
            return Err(RouterError::InterceptorsFrozen);
        }
        self.interceptors.push(interceptor);
        Ok(())
    }

    fn with_interceptors(&mut self, interceptors: Vec<Interceptor>) -> InlineRouter<'_> {
        let mut combined = self.interceptors.clone();
        combined.extend(interceptors);
        InlineRouter::new(&mut *self.parent, combined)
    }

    fn mount(&mut self, pattern: &str, router: Router) -> Result<(), RouterError> {
        self.frozen = true;
        self.parent
            .mount_with(pattern, MountTarget::Router(router), &self.interceptors)
    }

    fn mount_handler<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), RouterError> {
        self.frozen = true;
        let target = MountTarget::Handler(BoxHandler::new(handler));
        self.parent.mount_with(pattern, target, &self.interceptors)
    }

    fn not_found<H: Handler>(&mut self, handler: H) {
        let handler = fallback_chain(&self.interceptors, handler);
        self.parent.set_not_found(handler);
    }

    fn method_not_allowed<H: Handler>(&mut self, handler: H) {
        let handler = fallback_chain(&self.interceptors, handler);
        self.parent.set_method_not_allowed(handler);
    }
}
