//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use tokio::net::TcpListener;
use waymark::http::{Handler, Request, RequestExt};
use waymark::{MethodRegistry, Router, RouterService};

/// A router with its own method registry, so tests never share custom
/// methods through the global one.
pub fn router() -> Router {
    Router::with_registry(MethodRegistry::new())
}

pub fn request(method: &str, uri: &str) -> Request {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Buffered response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send_request(service: &RouterService, req: Request) -> Reply {
    let res = service.handle(req).await;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn send(service: &RouterService, method: &str, uri: &str) -> Reply {
    send_request(service, request(method, uri)).await
}

/// Handler answering with a fixed body.
pub fn text(body: &'static str) -> impl Handler {
    move |_req: Request| async move { body }
}

/// Handler answering with the value bound to `key`.
pub fn param(key: &'static str) -> impl Handler {
    move |req: Request| async move { req.url_param(key).unwrap_or_default() }
}

/// Handler answering with the full matched pattern.
pub fn pattern() -> impl Handler {
    |req: Request| async move { req.route_pattern().unwrap_or_default() }
}

/// Serve `service` on an ephemeral port behind axum.
pub async fn spawn_server(service: RouterService) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().fallback_service(service);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
