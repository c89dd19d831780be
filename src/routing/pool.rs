//! Route context pooling.
//!
//! # Responsibilities
//! - Hand out a reset `RouteContext` per top-level request
//! - Take it back when the request finishes, on every exit path
//!
//! # Design Decisions
//! - Contexts are reset on acquire and again on release
//! - A context still referenced elsewhere (e.g. a handler that cloned the
//!   handle into a spawned task) is dropped, never recycled
//! - The idle list is bounded; surplus contexts are simply dropped

use std::sync::Arc;

use parking_lot::Mutex;

use crate::observability::metrics;
use crate::routing::context::{RouteContext, RouteContextHandle};

/// Default number of idle contexts kept per router.
pub const DEFAULT_MAX_IDLE: usize = 1024;

#[derive(Debug)]
pub struct ContextPool {
    idle: Mutex<Vec<RouteContextHandle>>,
    max_idle: usize,
}

impl ContextPool {
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// Take a reset context out of the pool, allocating if it is empty.
    pub fn acquire(self: &Arc<Self>) -> ContextLease {
        let handle = self.idle.lock().pop().unwrap_or_default();
        handle.lock().reset();
        ContextLease {
            handle: Some(handle),
            pool: Arc::clone(self),
        }
    }

    /// Allocate `count` contexts up front.
    pub fn prewarm(&self, count: usize) {
        let mut idle = self.idle.lock();
        let target = count.min(self.max_idle);
        while idle.len() < target {
            idle.push(RouteContextHandle::new(RouteContext::new()));
        }
    }

    /// Number of contexts waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut handle: RouteContextHandle) {
        let Some(ctx) = Arc::get_mut(&mut handle.0) else {
            tracing::trace!("Route context still referenced, not recycling");
            return;
        };
        ctx.get_mut().reset();

        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(handle);
        }
        metrics::record_pool_idle(idle.len());
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

/// A context checked out of a `ContextPool`; returned to the pool on drop.
#[derive(Debug)]
pub struct ContextLease {
    handle: Option<RouteContextHandle>,
    pool: Arc<ContextPool>,
}

impl ContextLease {
    pub fn handle(&self) -> RouteContextHandle {
        self.handle.clone().unwrap_or_default()
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_recycles_context() {
        let pool = Arc::new(ContextPool::new(4));
        let lease = pool.acquire();
        drop(lease);
        assert_eq!(pool.idle(), 1);
        let _again = pool.acquire();
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_reused_context_carries_no_state() {
        let pool = Arc::new(ContextPool::new(4));
        {
            let lease = pool.acquire();
            let handle = lease.handle();
            let mut ctx = handle.lock();
            ctx.route_params.add("id", "secret");
            ctx.finish_match();
            ctx.set_route_path("/leftover");
            ctx.method_not_allowed = true;
        }
        assert_eq!(pool.idle(), 1);

        let lease = pool.acquire();
        let handle = lease.handle();
        let ctx = handle.lock();
        assert!(ctx.url_param("id").is_none());
        assert!(ctx.url_params().is_empty());
        assert!(ctx.route_path().is_none());
        assert!(!ctx.method_not_allowed());
    }

    #[test]
    fn test_context_still_referenced_is_not_recycled() {
        let pool = Arc::new(ContextPool::new(4));
        let lease = pool.acquire();
        let escaped = lease.handle();
        escaped.lock().route_params.add("id", "7");
        drop(lease);
        assert_eq!(pool.idle(), 0);

        let fresh = pool.acquire();
        assert!(fresh.handle().lock().route_params.is_empty());
        assert_eq!(escaped.lock().route_params.get("id"), Some("7"));
    }

    #[test]
    fn test_idle_list_is_bounded() {
        let pool = Arc::new(ContextPool::new(2));
        let leases: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        drop(leases);
        assert_eq!(pool.idle(), 2);
    }

    #[test]
    fn test_prewarm() {
        let pool = ContextPool::new(8);
        pool.prewarm(3);
        assert_eq!(pool.idle(), 3);
        pool.prewarm(100);
        assert_eq!(pool.idle(), 8);
    }
}
