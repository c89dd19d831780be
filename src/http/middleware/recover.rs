//! Panic recovery.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::FutureExt;

use crate::http::chain::{from_fn, Interceptor, Next};
use crate::http::handler::Request;

/// Turn a panic anywhere inside the chain into a 500 response.
pub fn recover() -> Interceptor {
    from_fn(|req: Request, next: Next| async move {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        match AssertUnwindSafe(next.run(req)).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    panic = %panic_message(&*panic),
                    "Handler panicked"
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
