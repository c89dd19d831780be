//! Request-side access to routing state.
//!
//! # Responsibilities
//! - Expose the route context stored in the request extensions
//! - Read URL parameters bound by the routers a request passed through
//! - Carry the request ID assigned by the `request_id` interceptor
//!
//! # Design Decisions
//! - Every accessor returns owned data; the context lock is never handed out
//!   to handler code across an await

use std::fmt;

use crate::http::handler::Request;
use crate::routing::context::RouteContextHandle;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Unique identifier attached to each request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Reuse an ID supplied by the client or an upstream proxy.
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > 128 {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routing accessors on incoming requests.
pub trait RequestExt {
    /// The route context shared by every router this request passes through.
    fn route_context(&self) -> Option<RouteContextHandle>;

    /// Value bound to `key`, the innermost binding winning.
    fn url_param(&self, key: &str) -> Option<String>;

    /// Full matched pattern across mount levels.
    fn route_pattern(&self) -> Option<String>;

    fn request_id(&self) -> Option<&RequestId>;
}

impl RequestExt for Request {
    fn route_context(&self) -> Option<RouteContextHandle> {
        self.extensions().get::<RouteContextHandle>().cloned()
    }

    fn url_param(&self, key: &str) -> Option<String> {
        self.extensions()
            .get::<RouteContextHandle>()
            .and_then(|handle| handle.url_param(key))
    }

    fn route_pattern(&self) -> Option<String> {
        self.extensions()
            .get::<RouteContextHandle>()
            .map(RouteContextHandle::route_pattern)
    }

    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }
}

/// Shorthand for [`RequestExt::url_param`], empty when unbound.
pub fn url_param(req: &Request, key: &str) -> String {
    req.url_param(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::RouteContext;
    use axum::body::Body;

    #[test]
    fn test_url_param_reads_context() {
        let mut ctx = RouteContext::new();
        ctx.route_params.add("id", "42");
        ctx.finish_match();

        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(RouteContextHandle::new(ctx));

        assert_eq!(req.url_param("id").as_deref(), Some("42"));
        assert_eq!(url_param(&req, "id"), "42");
        assert_eq!(url_param(&req, "missing"), "");
    }

    #[test]
    fn test_without_context() {
        let req = Request::new(Body::empty());
        assert!(req.route_context().is_none());
        assert!(req.url_param("id").is_none());
        assert!(req.route_pattern().is_none());
    }

    #[test]
    fn test_request_id_from_header() {
        assert_eq!(
            RequestId::from_header(" abc-123 ").map(|id| id.to_string()),
            Some("abc-123".to_string())
        );
        assert!(RequestId::from_header("").is_none());
        assert!(RequestId::from_header(&"x".repeat(200)).is_none());
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
