//! Request ID propagation.

use axum::http::HeaderValue;

use crate::http::chain::{from_fn, Interceptor, Next};
use crate::http::handler::Request;
use crate::http::request::{RequestId, X_REQUEST_ID};

/// Tag every request with a `RequestId` extension and echo it in the
/// `X-Request-ID` response header.
///
/// An incoming `X-Request-ID` header is reused when present and sane.
pub fn request_id() -> Interceptor {
    from_fn(|mut req: Request, next: Next| async move {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::from_header)
            .unwrap_or_default();
        req.extensions_mut().insert(id.clone());

        let mut res = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(id.as_str()) {
            res.headers_mut().insert(X_REQUEST_ID, value);
        }
        res
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::chain::Chain;
    use crate::http::handler::Handler;
    use crate::http::request::RequestExt;
    use axum::body::Body;

    #[tokio::test]
    async fn test_generates_id() {
        let handler = Chain::new([request_id()]).handler(|req: Request| async move {
            req.request_id().map(|id| id.to_string()).unwrap_or_default()
        });
        let res = handler.call(Request::new(Body::empty())).await;
        let header = res.headers()[X_REQUEST_ID].to_str().unwrap().to_string();
        assert_eq!(header.len(), 36);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn test_reuses_incoming_id() {
        let handler = Chain::new([request_id()]).handler(|_req: Request| async { "ok" });
        let req = axum::http::Request::builder()
            .header(X_REQUEST_ID, "upstream-7")
            .body(Body::empty())
            .unwrap();
        let res = handler.call(req).await;
        assert_eq!(res.headers()[X_REQUEST_ID], "upstream-7");
    }
}
