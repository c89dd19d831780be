//! Default responders for requests no route answers.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;

use crate::http::handler::{Request, Response};
use crate::http::request::RequestExt;

/// Body of the default 404 response.
pub const NOT_FOUND_BODY: &str = "404 page not found";

/// Plain-text 404.
pub async fn not_found(_req: Request) -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Empty 405 with an `Allow` header listing the methods the path accepts.
pub async fn method_not_allowed(req: Request) -> Response {
    let allowed = req
        .route_context()
        .map(|handle| {
            let ctx = handle.lock();
            ctx.allowed_methods().join(", ")
        })
        .unwrap_or_default();

    let mut res = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if !allowed.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&allowed) {
            res.headers_mut().insert(header::ALLOW, value);
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::{RouteContext, RouteContextHandle};
    use axum::body::Body;

    #[tokio::test]
    async fn test_not_found_body() {
        let res = not_found(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], NOT_FOUND_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_method_not_allowed_sets_allow() {
        let mut ctx = RouteContext::new();
        ctx.methods_allowed = vec!["GET".into(), "PUT".into()];
        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(RouteContextHandle::new(ctx));

        let res = method_not_allowed(req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, PUT");
    }

    #[tokio::test]
    async fn test_method_not_allowed_without_methods() {
        let res = method_not_allowed(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.headers().get(header::ALLOW).is_none());
    }
}
