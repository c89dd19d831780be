//! Radix tree of routes.
//!
//! # Responsibilities
//! - Store endpoints keyed by parsed pattern, splitting literal prefixes
//! - Resolve (method, path) to an endpoint with backtracking
//! - Enumerate registered routes for introspection
//!
//! # Lookup Order
//! ```text
//! At every node, child groups are tried in priority order:
//!   static    longest literal prefix, sorted by first char
//!   regex     insertion order, '/'-tailed last
//!   param     one per tail char, '/'-tailed last
//!   catch-all at most one
//! A branch that fails pops the values it pushed and the next sibling is
//! tried. A node that matches the path but not the method records its
//! methods and the walk keeps going; any allowed match wins.
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use regex::Regex;

use crate::http::chain::ChainHandler;
use crate::methods::{MethodId, MethodSet, MethodTable};
use crate::router::mux::MountPoint;
use crate::router::walk::Route;
use crate::routing::context::RouteContext;
use crate::routing::pattern::{tail_after, Pattern, Segment};

const STATIC: usize = 0;
const REGEX: usize = 1;
const PARAM: usize = 2;
const CATCH_ALL: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Static,
    Regex,
    Param,
    CatchAll,
}

impl NodeKind {
    fn group(self) -> usize {
        match self {
            NodeKind::Static => STATIC,
            NodeKind::Regex => REGEX,
            NodeKind::Param => PARAM,
            NodeKind::CatchAll => CATCH_ALL,
        }
    }
}

/// A handler stored on a node, with the pattern it was registered under.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    pub(crate) handler: ChainHandler,
    pub(crate) pattern: String,
    pub(crate) param_keys: Vec<String>,
    /// Installed by a mount rather than by the user.
    pub(crate) stub: bool,
}

impl Endpoint {
    pub(crate) fn new(pattern: &Pattern, handler: ChainHandler) -> Self {
        Self {
            handler,
            pattern: pattern.as_str().to_string(),
            param_keys: pattern.param_keys(),
            stub: false,
        }
    }

    pub(crate) fn stub(mut self) -> Self {
        self.stub = true;
        self
    }
}

/// Per-node handler table. Explicit methods shadow the any-method slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct Endpoints {
    any: Option<Endpoint>,
    methods: BTreeMap<MethodId, Endpoint>,
}

impl Endpoints {
    pub(crate) fn get(&self, method: MethodId) -> Option<&Endpoint> {
        self.methods.get(&method).or(self.any.as_ref())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.any.is_none() && self.methods.is_empty()
    }

    fn set(&mut self, methods: MethodSet, endpoint: Endpoint) {
        for id in methods.ids() {
            self.methods.insert(id, endpoint.clone());
        }
        if methods.is_any() {
            self.any = Some(endpoint);
        }
    }

    /// Every entry; `None` is the any-method slot.
    fn iter(&self) -> impl Iterator<Item = (Option<MethodId>, &Endpoint)> {
        self.any
            .iter()
            .map(|e| (None, e))
            .chain(self.methods.iter().map(|(id, e)| (Some(*id), e)))
    }
}

/// One vertex of the routing tree.
pub(crate) struct Node {
    kind: NodeKind,
    /// First char of `prefix` for static nodes.
    label: char,
    /// Char that ends a placeholder match.
    tail: char,
    /// Literal text for static nodes, the placeholder source otherwise.
    prefix: String,
    regex: Option<Regex>,
    children: [Vec<Node>; 4],
    pub(crate) endpoints: Endpoints,
    pub(crate) mount: Option<MountPoint>,
}

impl Default for Node {
    fn default() -> Self {
        Self::new(NodeKind::Static, String::new(), '/')
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .field("tail", &self.tail)
            .field("endpoints", &self.endpoints)
            .field("mounted", &self.mount.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl Node {
    fn new(kind: NodeKind, prefix: String, tail: char) -> Self {
        Self {
            kind,
            label: prefix.chars().next().unwrap_or('/'),
            tail,
            prefix,
            regex: None,
            children: Default::default(),
            endpoints: Endpoints::default(),
            mount: None,
        }
    }

    /// Walk or extend the tree along `pattern`, returning its terminal node.
    pub(crate) fn insert(&mut self, pattern: &Pattern) -> &mut Node {
        let segments = pattern.segments();
        let mut node = self;
        for (i, segment) in segments.iter().enumerate() {
            node = match segment {
                Segment::Static(text) => node.insert_static(text),
                Segment::Param(name) => node.insert_placeholder(
                    NodeKind::Param,
                    format!("{{{name}}}"),
                    None,
                    tail_after(segments, i),
                ),
                Segment::Regex { name, expr, regex } => node.insert_placeholder(
                    NodeKind::Regex,
                    format!("{{{name}:{expr}}}"),
                    Some(regex),
                    tail_after(segments, i),
                ),
                Segment::Wildcard => node.insert_catch_all(),
            };
        }
        node
    }

    /// Store `endpoint` for every method in `methods`. Last write wins.
    pub(crate) fn set_endpoint(&mut self, methods: MethodSet, endpoint: Endpoint) {
        self.endpoints.set(methods, endpoint);
    }

    fn insert_static(&mut self, text: &str) -> &mut Node {
        let Some(first) = text.chars().next() else {
            return self;
        };
        let statics = &mut self.children[STATIC];
        match statics.binary_search_by_key(&first, |n| n.label) {
            Ok(idx) => {
                let child = &mut statics[idx];
                let common = common_prefix(&child.prefix, text);
                if common < child.prefix.len() {
                    child.split_at(common);
                }
                child.insert_static(&text[common..])
            }
            Err(idx) => {
                statics.insert(idx, Node::new(NodeKind::Static, text.to_string(), '/'));
                &mut statics[idx]
            }
        }
    }

    /// Keep `prefix[..at]` here and push the rest, with everything hanging
    /// off this node, down into a single static child.
    fn split_at(&mut self, at: usize) {
        let rest = self.prefix.split_off(at);
        let mut lower = Node::new(NodeKind::Static, rest, '/');
        lower.children = mem::take(&mut self.children);
        lower.endpoints = mem::take(&mut self.endpoints);
        lower.mount = self.mount.take();
        self.children[STATIC].push(lower);
    }

    fn insert_placeholder(
        &mut self,
        kind: NodeKind,
        source: String,
        regex: Option<&Regex>,
        tail: char,
    ) -> &mut Node {
        let group = &mut self.children[kind.group()];
        let existing = group.iter().position(|n| {
            n.tail == tail
                && match (&n.regex, regex) {
                    (Some(a), Some(b)) => a.as_str() == b.as_str(),
                    (None, None) => true,
                    _ => false,
                }
        });
        if let Some(idx) = existing {
            return &mut group[idx];
        }

        let mut node = Node::new(kind, source, tail);
        node.regex = regex.cloned();
        // '/'-tailed placeholders are the least specific; keep them last.
        let idx = if tail == '/' {
            group.len()
        } else {
            group.iter().position(|n| n.tail == '/').unwrap_or(group.len())
        };
        group.insert(idx, node);
        &mut group[idx]
    }

    fn insert_catch_all(&mut self) -> &mut Node {
        let group = &mut self.children[CATCH_ALL];
        if group.is_empty() {
            group.push(Node::new(NodeKind::CatchAll, "*".to_string(), '/'));
        }
        &mut group[0]
    }

    /// Resolve `path` for `method`.
    ///
    /// On success the bound values are keyed by the endpoint's pattern,
    /// appended to the finalized URL params, and the pattern is recorded.
    pub(crate) fn find_route<'a>(
        &'a self,
        ctx: &mut RouteContext,
        method: MethodId,
        path: &str,
        methods: &MethodTable,
    ) -> Option<&'a Node> {
        ctx.begin_match();
        let node = self.find_node(ctx, method, path, methods)?;
        let endpoint = node.endpoints.get(method)?;
        ctx.route_params.extend_keys(&endpoint.param_keys);
        ctx.finish_match();
        ctx.push_route_pattern(&endpoint.pattern);
        Some(node)
    }

    fn find_node<'a>(
        &'a self,
        ctx: &mut RouteContext,
        method: MethodId,
        path: &str,
        methods: &MethodTable,
    ) -> Option<&'a Node> {
        for (group, children) in self.children.iter().enumerate() {
            if children.is_empty() {
                continue;
            }
            match group {
                STATIC => {
                    let Some(first) = path.chars().next() else {
                        continue;
                    };
                    let Ok(idx) = children.binary_search_by_key(&first, |n| n.label) else {
                        continue;
                    };
                    let child = &children[idx];
                    let Some(rest) = path.strip_prefix(child.prefix.as_str()) else {
                        continue;
                    };
                    if let Some(found) = child.descend(ctx, method, rest, methods) {
                        return Some(found);
                    }
                }
                REGEX | PARAM => {
                    for child in children {
                        let end = match path.find(child.tail) {
                            Some(end) => end,
                            None if child.tail == '/' => path.len(),
                            None => continue,
                        };
                        let value = &path[..end];
                        if value.is_empty() || value.contains('/') {
                            continue;
                        }
                        if let Some(regex) = &child.regex {
                            if !regex.is_match(value) {
                                continue;
                            }
                        }

                        let depth = ctx.route_params.value_depth();
                        ctx.route_params.push_value(value);
                        if let Some(found) = child.descend(ctx, method, &path[end..], methods) {
                            return Some(found);
                        }
                        ctx.route_params.truncate_values(depth);
                    }
                }
                _ => {
                    let child = &children[0];
                    let depth = ctx.route_params.value_depth();
                    ctx.route_params.push_value(path);
                    if let Some(found) = child.descend(ctx, method, "", methods) {
                        return Some(found);
                    }
                    ctx.route_params.truncate_values(depth);
                }
            }
        }
        None
    }

    fn descend<'a>(
        &'a self,
        ctx: &mut RouteContext,
        method: MethodId,
        rest: &str,
        methods: &MethodTable,
    ) -> Option<&'a Node> {
        if rest.is_empty() && !self.endpoints.is_empty() {
            if self.endpoints.get(method).is_some() {
                return Some(self);
            }
            ctx.method_not_allowed = true;
            for (id, _) in &self.endpoints.methods {
                if let Some(name) = methods.name(*id) {
                    if !ctx.methods_allowed.iter().any(|m| m == name) {
                        ctx.methods_allowed.push(name.to_string());
                    }
                }
            }
        }
        self.find_node(ctx, method, rest, methods)
    }

    /// Structural lookup: the node `pattern` would be stored on, if any.
    pub(crate) fn find_pattern(&self, pattern: &Pattern) -> Option<&Node> {
        let segments = pattern.segments();
        let mut node = self;
        for (i, segment) in segments.iter().enumerate() {
            node = match segment {
                Segment::Static(text) => node.find_static(text)?,
                Segment::Param(_) => node.children[PARAM]
                    .iter()
                    .find(|n| n.tail == tail_after(segments, i))?,
                Segment::Regex { regex, .. } => node.children[REGEX].iter().find(|n| {
                    n.tail == tail_after(segments, i)
                        && n.regex.as_ref().map(Regex::as_str) == Some(regex.as_str())
                })?,
                Segment::Wildcard => node.children[CATCH_ALL].first()?,
            };
        }
        Some(node)
    }

    fn find_static(&self, text: &str) -> Option<&Node> {
        let first = text.chars().next()?;
        let statics = &self.children[STATIC];
        let idx = statics.binary_search_by_key(&first, |n| n.label).ok()?;
        let child = &statics[idx];
        let rest = text.strip_prefix(child.prefix.as_str())?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.find_static(rest)
        }
    }

    /// Registered routes in lookup order, grouped by pattern.
    pub(crate) fn routes<'a>(&'a self, methods: &MethodTable, out: &mut Vec<Route<'a>>) {
        if !self.endpoints.is_empty() {
            let sub_routes = self.mount.as_ref().map(MountPoint::routes);
            let mut by_pattern: BTreeMap<&str, Route<'a>> = BTreeMap::new();
            for (id, endpoint) in self.endpoints.iter() {
                // Mount stubs are listed only through the sub-router they own.
                if endpoint.stub && sub_routes.is_none() {
                    continue;
                }
                let key = match id {
                    None => "*".to_string(),
                    Some(id) => match methods.name(id) {
                        Some(name) => name.to_string(),
                        None => continue,
                    },
                };
                by_pattern
                    .entry(endpoint.pattern.as_str())
                    .or_insert_with(|| Route::new(endpoint.pattern.clone(), sub_routes))
                    .handlers
                    .insert(key, endpoint.handler.clone());
            }
            out.extend(by_pattern.into_values());
        }
        for group in &self.children {
            for child in group {
                child.routes(methods, out);
            }
        }
    }

    /// Visit every mount point in the tree.
    pub(crate) fn for_each_mount_mut(&mut self, f: &mut dyn FnMut(&mut MountPoint)) {
        if let Some(mount) = self.mount.as_mut() {
            f(mount);
        }
        for group in &mut self.children {
            for child in group {
                child.for_each_mount_mut(f);
            }
        }
    }
}

/// Byte length of the longest common prefix, on a char boundary.
fn common_prefix(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, x), _)| i + x.len_utf8())
}
