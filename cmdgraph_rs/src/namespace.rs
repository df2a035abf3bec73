//! Per-invocation context bag.
//!
//! A [`Namespace`] carries session values (the caller, a connection handle,
//! an actor) into providers and authorizers without routing them through the
//! positional tokens. Entries are keyed either by type or by name.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NamespaceKey {
    Type(TypeId),
    Name(String),
}

/// Open key/value context created fresh for each invocation.
#[derive(Default)]
pub struct Namespace {
    locals: HashMap<NamespaceKey, Box<dyn Any + Send + Sync>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under its own type, returning the previous one.
    pub fn put<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.locals
            .insert(NamespaceKey::Type(TypeId::of::<T>()), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.locals
            .get(&NamespaceKey::Type(TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.locals
            .get_mut(&NamespaceKey::Type(TypeId::of::<T>()))
            .and_then(|v| v.downcast_mut::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.locals.contains_key(&NamespaceKey::Type(TypeId::of::<T>()))
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.locals
            .remove(&NamespaceKey::Type(TypeId::of::<T>()))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Store a value under an arbitrary identifier.
    pub fn put_named<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.locals
            .insert(NamespaceKey::Name(name.into()), Box::new(value));
    }

    /// Look up a named value; `None` if absent or of another type.
    pub fn get_named<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.locals
            .get(&NamespaceKey::Name(name.to_string()))
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn contains_named(&self, name: &str) -> bool {
        self.locals
            .contains_key(&NamespaceKey::Name(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("entries", &self.locals.len())
            .finish()
    }
}
