//! Method name to bit position mapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use crate::error::RouterError;

/// Methods every registry starts with.
pub const STANDARD_METHODS: [&str; 9] = [
    "CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE",
];

/// Bit 63 means "any method"; the remaining bits are handed out in order.
const ANY_BIT: u64 = 1 << 63;
const CAPACITY: usize = 63;

/// Bit position of a registered method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(u8);

impl MethodId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A set of methods a route answers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodSet(u64);

impl MethodSet {
    pub const ANY: MethodSet = MethodSet(ANY_BIT);
    pub const EMPTY: MethodSet = MethodSet(0);

    pub fn is_any(self) -> bool {
        self.0 & ANY_BIT != 0
    }

    pub fn contains(self, id: MethodId) -> bool {
        self.0 & (1 << id.0) != 0
    }

    pub fn union(self, other: MethodSet) -> MethodSet {
        MethodSet(self.0 | other.0)
    }

    /// Concrete methods in the set, lowest bit first. Excludes the any bit.
    pub fn ids(self) -> impl Iterator<Item = MethodId> {
        (0..CAPACITY as u8)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .map(MethodId)
    }
}

impl From<MethodId> for MethodSet {
    fn from(id: MethodId) -> Self {
        MethodSet(1 << id.0)
    }
}

impl fmt::Debug for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("MethodSet(*)");
        }
        f.debug_tuple("MethodSet")
            .field(&self.ids().map(|id| id.0).collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable snapshot of the registry.
#[derive(Debug, Clone)]
pub struct MethodTable {
    by_name: HashMap<String, MethodId>,
    names: Vec<String>,
}

impl MethodTable {
    fn seeded() -> Self {
        let mut table = Self {
            by_name: HashMap::new(),
            names: Vec::new(),
        };
        for name in STANDARD_METHODS {
            table.push(name.to_string());
        }
        table
    }

    fn push(&mut self, name: String) -> MethodId {
        let id = MethodId(self.names.len() as u8);
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        id
    }

    /// Look up a method, case-insensitively.
    pub fn get(&self, name: &str) -> Option<MethodId> {
        if let Some(id) = self.by_name.get(name) {
            return Some(*id);
        }
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    pub fn name(&self, id: MethodId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    /// All registered methods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (MethodId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (MethodId(i as u8), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Shared handle to an append-only method registry.
///
/// Cloning the handle shares the registry. Routers take a snapshot of the
/// table when they are frozen, so custom methods must be registered before
/// `Router::into_service` is called on any router that routes them.
#[derive(Clone)]
pub struct MethodRegistry {
    table: Arc<ArcSwap<MethodTable>>,
}

impl MethodRegistry {
    /// A fresh registry seeded with the standard verbs.
    pub fn new() -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(MethodTable::seeded())),
        }
    }

    /// The process-wide registry used by `Router::new`.
    pub fn global() -> &'static MethodRegistry {
        static GLOBAL: OnceLock<MethodRegistry> = OnceLock::new();
        GLOBAL.get_or_init(MethodRegistry::new)
    }

    /// Register a custom method.
    ///
    /// Fails if the name is already present, is not a valid HTTP token, or
    /// the registry is full.
    pub fn register(&self, name: &str) -> Result<MethodId, RouterError> {
        let name = normalize(name)?;
        let mut result = Err(RouterError::DuplicateMethod(name.clone()));
        self.table.rcu(|current| {
            if current.by_name.contains_key(&name) {
                result = Err(RouterError::DuplicateMethod(name.clone()));
                return Arc::clone(current);
            }
            if current.len() >= CAPACITY {
                result = Err(RouterError::MethodCapacity(CAPACITY));
                return Arc::clone(current);
            }
            let mut next = MethodTable::clone(current);
            result = Ok(next.push(name.clone()));
            Arc::new(next)
        });
        if let Ok(id) = result {
            tracing::debug!(method = %name, bit = id.0, "Registered custom http method");
        }
        result
    }

    /// Register the method unless it already exists.
    pub fn ensure(&self, name: &str) -> Result<MethodId, RouterError> {
        if let Some(id) = self.lookup(name) {
            return Ok(id);
        }
        match self.register(name) {
            Err(RouterError::DuplicateMethod(_)) => self
                .lookup(name)
                .ok_or_else(|| RouterError::UnknownMethod(name.to_string())),
            other => other,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<MethodId> {
        self.table.load().get(name)
    }

    /// Resolve a method name into a single-method set.
    pub fn resolve(&self, name: &str) -> Result<MethodSet, RouterError> {
        self.lookup(name)
            .map(MethodSet::from)
            .ok_or_else(|| RouterError::UnknownMethod(name.to_string()))
    }

    pub fn snapshot(&self) -> Arc<MethodTable> {
        self.table.load_full()
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.table.load().names)
            .finish()
    }
}

fn normalize(name: &str) -> Result<String, RouterError> {
    let upper = name.trim().to_ascii_uppercase();
    if upper.is_empty() || axum::http::Method::from_bytes(upper.as_bytes()).is_err() {
        return Err(RouterError::InvalidMethodName(name.to_string()));
    }
    Ok(upper)
}
