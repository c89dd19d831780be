//! Per-request logging.

use std::time::Instant;

use crate::http::chain::{from_fn, Interceptor, Next};
use crate::http::handler::Request;
use crate::http::request::RequestExt;
use crate::observability::metrics;

/// Log method, path, status and latency of each request once it completes,
/// and record its duration.
pub fn trace() -> Interceptor {
    from_fn(|req: Request, next: Next| async move {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let request_id = req.request_id().map(|id| id.to_string()).unwrap_or_default();
        let context = req.route_context();

        let res = next.run(req).await;

        let status = res.status();
        let pattern = context.map(|handle| handle.route_pattern()).unwrap_or_default();
        metrics::record_request(method.as_str(), status.as_u16(), start);
        if status.is_server_error() {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                pattern = %pattern,
                status = status.as_u16(),
                latency = ?start.elapsed(),
                "Request failed"
            );
        } else {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                pattern = %pattern,
                status = status.as_u16(),
                latency = ?start.elapsed(),
                "Request completed"
            );
        }
        res
    })
}
