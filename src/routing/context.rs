//! Per-request routing state.
//!
//! # Responsibilities
//! - Hold URL parameters bound while walking the tree (stack discipline)
//! - Carry the remaining route path across mount boundaries
//! - Record the resolved method and the 405 discriminator
//!
//! # Design Decisions
//! - One context per request, shared by every mount level via the request
//!   extensions (`RouteContextHandle`)
//! - Duplicate keys resolve to the most recently pushed value
//! - `reset` returns every field to its default so pooled reuse cannot leak

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use crate::router::service::Mux;
use crate::router::RouterService;

/// Ordered parameter keys with a parallel list of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    keys: Vec<String>,
    values: Vec<String>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.keys.push(key.into());
        self.values.push(value.into());
    }

    /// Value for `key`, searching from the most recent binding.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .rposition(|k| k == key)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    pub(crate) fn push_value(&mut self, value: &str) {
        self.values.push(value.to_string());
    }

    pub(crate) fn value_depth(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn truncate_values(&mut self, depth: usize) {
        self.values.truncate(depth);
    }

    pub(crate) fn extend_keys(&mut self, keys: &[String]) {
        self.keys.extend_from_slice(keys);
    }

    pub(crate) fn append(&mut self, other: &RouteParams) {
        self.keys.extend_from_slice(&other.keys);
        self.values.extend_from_slice(&other.values);
    }

    pub(crate) fn last(&self) -> Option<(&str, &str)> {
        match (self.keys.last(), self.values.last()) {
            (Some(k), Some(v)) if self.keys.len() == self.values.len() => {
                Some((k.as_str(), v.as_str()))
            }
            _ => None,
        }
    }
}

/// Routing state for one in-flight request.
#[derive(Debug, Default)]
pub struct RouteContext {
    /// Parameters bound by every router level that matched so far.
    url_params: RouteParams,
    /// Scratch stack for the tree walk in progress.
    pub(crate) route_params: RouteParams,
    route_path: Option<String>,
    route_method: Option<String>,
    route_patterns: Vec<String>,
    pub(crate) method_not_allowed: bool,
    pub(crate) methods_allowed: Vec<String>,
    router: Option<Weak<Mux>>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every field for reuse by another request.
    pub fn reset(&mut self) {
        self.url_params.clear();
        self.route_params.clear();
        self.route_path = None;
        self.route_method = None;
        self.route_patterns.clear();
        self.method_not_allowed = false;
        self.methods_allowed.clear();
        self.router = None;
    }

    pub fn url_param(&self, key: &str) -> Option<&str> {
        self.url_params.get(key)
    }

    pub fn url_params(&self) -> &RouteParams {
        &self.url_params
    }

    /// Path still to be routed; `None` means the request path.
    pub fn route_path(&self) -> Option<&str> {
        self.route_path.as_deref()
    }

    pub fn set_route_path(&mut self, path: impl Into<String>) {
        self.route_path = Some(path.into());
    }

    /// Method used for routing; `None` means the request method.
    pub fn route_method(&self) -> Option<&str> {
        self.route_method.as_deref()
    }

    pub fn set_route_method(&mut self, method: impl Into<String>) {
        self.route_method = Some(method.into());
    }

    /// True when some node matched the path but not the method.
    pub fn method_not_allowed(&self) -> bool {
        self.method_not_allowed
    }

    /// Methods registered on the path-matching nodes seen during the walk.
    pub fn allowed_methods(&self) -> &[String] {
        &self.methods_allowed
    }

    /// Patterns matched at each router level, outermost first.
    pub fn route_patterns(&self) -> &[String] {
        &self.route_patterns
    }

    /// The full matched pattern across mount levels, e.g. `/api/users/{id}`.
    pub fn route_pattern(&self) -> String {
        let mut pattern = collapse_wildcards(&self.route_patterns.concat());
        if pattern.len() > 1 && pattern.ends_with('/') {
            pattern.pop();
        }
        pattern
    }

    /// The top-level router serving this request, while it is alive.
    pub fn router(&self) -> Option<RouterService> {
        self.router
            .as_ref()
            .and_then(Weak::upgrade)
            .map(RouterService::from_mux)
    }

    pub(crate) fn set_router(&mut self, mux: &Arc<Mux>) {
        self.router = Some(Arc::downgrade(mux));
    }

    pub(crate) fn push_route_pattern(&mut self, pattern: &str) {
        self.route_patterns.push(pattern.to_string());
    }

    pub(crate) fn finish_match(&mut self) {
        let scratch = std::mem::take(&mut self.route_params);
        self.url_params.append(&scratch);
        self.route_params = scratch;
    }

    /// Start a lookup at a new router level.
    pub(crate) fn begin_match(&mut self) {
        self.route_params.clear();
        self.method_not_allowed = false;
        self.methods_allowed.clear();
    }

    /// Path handed to a mounted router: the value bound to the wildcard that
    /// matched the mount, or `/` when the mount matched without one.
    pub(crate) fn next_route_path(&self) -> String {
        match self.route_params.last() {
            Some(("*", rest)) => format!("/{rest}"),
            _ => "/".to_string(),
        }
    }
}

/// Collapse the `/*/` joints left by mount wildcards into `/`.
pub(crate) fn collapse_wildcards(pattern: &str) -> String {
    let mut out = pattern.to_string();
    while out.contains("/*/") {
        out = out.replace("/*/", "/");
    }
    out
}

/// Shared, lockable handle to a request's `RouteContext`.
///
/// Stored in the request extensions; nested routers detect it and reuse the
/// context instead of drawing a new one from their pool.
#[derive(Debug, Clone, Default)]
pub struct RouteContextHandle(pub(crate) Arc<Mutex<RouteContext>>);

impl RouteContextHandle {
    pub fn new(ctx: RouteContext) -> Self {
        Self(Arc::new(Mutex::new(ctx)))
    }

    pub fn lock(&self) -> MutexGuard<'_, RouteContext> {
        self.0.lock()
    }

    pub fn url_param(&self, key: &str) -> Option<String> {
        self.lock().url_param(key).map(str::to_string)
    }

    pub fn route_pattern(&self) -> String {
        self.lock().route_pattern()
    }
}
