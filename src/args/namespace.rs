//! Variable namespace: prefix-scoped scalars and lists.
//!
//! Every value a stage produces lives here, keyed by `(prefix, name)`.
//! The empty prefix is the global scope written by the main target; a
//! sidecar writes under its own prefix. Reads fall back from the prefixed
//! scope to the global one, which is how a sidecar inherits main-target
//! settings it does not override.

use indexmap::IndexMap;

/// Prefix of the main target (the global scope).
pub const GLOBAL: &str = "";

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
}

/// Prefix-scoped key/value and key/list store.
///
/// Insertion order is kept so that iteration (and anything derived from it)
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    scopes: IndexMap<String, IndexMap<String, Value>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar, overwriting any previous scalar at `(prefix, name)`.
    ///
    /// # Panics
    ///
    /// Panics if `(prefix, name)` already holds a list.
    pub fn assign(&mut self, prefix: &str, name: &str, value: impl Into<String>) {
        let scope = self.scopes.entry(prefix.to_string()).or_default();
        match scope.get_mut(name) {
            Some(Value::List(_)) => {
                panic!("namespace: scalar write to list variable '{}' (prefix '{}')", name, prefix)
            }
            Some(Value::Scalar(existing)) => *existing = value.into(),
            None => {
                scope.insert(name.to_string(), Value::Scalar(value.into()));
            }
        }
    }

    /// Extend the list at `(prefix, name)`, creating it if absent.
    ///
    /// # Panics
    ///
    /// Panics if `(prefix, name)` already holds a scalar.
    pub fn append<I, S>(&mut self, prefix: &str, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = self.scopes.entry(prefix.to_string()).or_default();
        let entry = scope
            .entry(name.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        match entry {
            Value::List(list) => list.extend(values.into_iter().map(Into::into)),
            Value::Scalar(_) => {
                panic!("namespace: list append to scalar variable '{}' (prefix '{}')", name, prefix)
            }
        }
    }

    /// Read a scalar: the prefixed value, else the global one.
    pub fn read(&self, prefix: &str, name: &str) -> Option<&str> {
        self.read_local(prefix, name).or_else(|| {
            if prefix == GLOBAL {
                None
            } else {
                self.read_local(GLOBAL, name)
            }
        })
    }

    /// Read a scalar with a default when neither scope has it.
    pub fn read_or<'a>(&'a self, prefix: &str, name: &str, default: &'a str) -> &'a str {
        self.read(prefix, name).unwrap_or(default)
    }

    /// Read a scalar from `prefix` only, without falling back to global.
    pub fn read_local(&self, prefix: &str, name: &str) -> Option<&str> {
        match self.scopes.get(prefix)?.get(name)? {
            Value::Scalar(s) => Some(s.as_str()),
            Value::List(_) => None,
        }
    }

    /// Read a list: the prefixed list if present, else the global one.
    pub fn read_list(&self, prefix: &str, name: &str) -> &[String] {
        match self.list_local(prefix, name) {
            Some(list) => list,
            None if prefix != GLOBAL => self.list_local(GLOBAL, name).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Read a list from `prefix` only.
    pub fn read_list_local(&self, prefix: &str, name: &str) -> &[String] {
        self.list_local(prefix, name).unwrap_or(&[])
    }

    /// Whether `(prefix, name)` is set, with global fallback.
    pub fn is_set(&self, prefix: &str, name: &str) -> bool {
        self.read(prefix, name).is_some()
    }

    fn list_local(&self, prefix: &str, name: &str) -> Option<&[String]> {
        match self.scopes.get(prefix)?.get(name)? {
            Value::List(list) => Some(list.as_slice()),
            Value::Scalar(_) => None,
        }
    }
}
