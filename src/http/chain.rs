//! Interceptor chains.
//!
//! # Responsibilities
//! - Represent an interceptor as a transform from "next handler" to
//!   "wrapping handler"
//! - Fold an ordered interceptor list around an endpoint
//!
//! # Design Decisions
//! - First registered interceptor is outermost (onion model)
//! - A chain is folded once and the result reused for every request
//! - `ChainHandler` keeps the bare endpoint and its interceptors so route
//!   walks can report them separately

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

use crate::http::handler::{BoxHandler, Handler, Request, Response};

/// Wraps a handler with behaviour that runs around it.
#[derive(Clone)]
pub struct Interceptor(Arc<dyn Fn(BoxHandler) -> BoxHandler + Send + Sync>);

impl Interceptor {
    pub fn new<F, H>(wrap: F) -> Self
    where
        F: Fn(BoxHandler) -> H + Send + Sync + 'static,
        H: Handler,
    {
        Self(Arc::new(move |next| BoxHandler::new(wrap(next))))
    }

    /// Wrap `next`, producing the handler that runs this interceptor first.
    pub fn wrap(&self, next: BoxHandler) -> BoxHandler {
        (self.0)(next)
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interceptor")
    }
}

/// The rest of the chain, handed to interceptors built with `from_fn`.
#[derive(Debug, Clone)]
pub struct Next {
    inner: BoxHandler,
}

impl Next {
    pub async fn run(self, req: Request) -> Response {
        self.inner.call(req).await
    }
}

/// Build an interceptor from an async function taking the request and the
/// rest of the chain.
///
/// ```
/// use waymark::http::{from_fn, Next, Request};
///
/// let tag = from_fn(|req: Request, next: Next| async move {
///     let mut res = next.run(req).await;
///     res.headers_mut().insert("x-tag", "1".parse().unwrap());
///     res
/// });
/// # let _ = tag;
/// ```
pub fn from_fn<F, Fut, R>(f: F) -> Interceptor
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    let f = Arc::new(f);
    Interceptor::new(move |next: BoxHandler| {
        let f = Arc::clone(&f);
        move |req: Request| f(req, Next { inner: next.clone() })
    })
}

/// Fold `interceptors` around `endpoint`, first interceptor outermost.
pub fn chain(interceptors: &[Interceptor], endpoint: BoxHandler) -> BoxHandler {
    interceptors
        .iter()
        .rev()
        .fold(endpoint, |next, interceptor| interceptor.wrap(next))
}

/// An ordered list of interceptors.
#[derive(Debug, Clone, Default)]
pub struct Chain(Vec<Interceptor>);

impl Chain {
    pub fn new(interceptors: impl IntoIterator<Item = Interceptor>) -> Self {
        Self(interceptors.into_iter().collect())
    }

    /// Compose the chain around `endpoint`.
    pub fn handler(&self, endpoint: impl Handler) -> ChainHandler {
        ChainHandler::new(self.0.clone(), BoxHandler::new(endpoint))
    }

    pub fn interceptors(&self) -> &[Interceptor] {
        &self.0
    }

    pub fn push(&mut self, interceptor: Interceptor) {
        self.0.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Interceptor> for Chain {
    fn from_iter<I: IntoIterator<Item = Interceptor>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// An endpoint composed with its interceptors.
#[derive(Debug, Clone)]
pub struct ChainHandler {
    endpoint: BoxHandler,
    composed: BoxHandler,
    interceptors: Vec<Interceptor>,
}

impl ChainHandler {
    pub fn new(interceptors: Vec<Interceptor>, endpoint: BoxHandler) -> Self {
        let composed = chain(&interceptors, endpoint.clone());
        Self {
            endpoint,
            composed,
            interceptors,
        }
    }

    /// The handler without any interceptors.
    pub fn endpoint(&self) -> &BoxHandler {
        &self.endpoint
    }

    /// The handler with every interceptor applied.
    pub fn composed(&self) -> &BoxHandler {
        &self.composed
    }

    pub fn interceptors(&self) -> &[Interceptor] {
        &self.interceptors
    }
}

impl Handler for ChainHandler {
    fn call(&self, req: Request) -> BoxFuture<'static, Response> {
        self.composed.call(req)
    }
}
