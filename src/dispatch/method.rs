//! Callable implementations and the tables they are dispatched through.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{CallError, Receiver};
use crate::value::Value;

/// Signature shared by every dispatchable callable.
pub type MethodFn = dyn Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync;

/// A shared, identity-comparable callable.
///
/// Two implementations are equal only when they are the same allocation,
/// which is how restoration is checked to hand back the exact original.
#[derive(Clone)]
pub struct Implementation(Arc<MethodFn>);

impl Implementation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, receiver: &Receiver, args: &[Value]) -> Result<Value, CallError> {
        (self.0)(receiver, args)
    }

    /// Pointer identity, ignoring vtable metadata.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for Implementation {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Implementation {}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Implementation({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

/// Visibility classification of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Protected => write!(f, "protected"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// One slot of a dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodEntry {
    pub implementation: Implementation,
    pub visibility: Visibility,
}

impl MethodEntry {
    pub fn new(implementation: Implementation, visibility: Visibility) -> Self {
        Self {
            implementation,
            visibility,
        }
    }

    pub fn public<F>(f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self::new(Implementation::new(f), Visibility::Public)
    }
}

/// Name-keyed dispatch table.
///
/// Lookups clone the entry out and release the lock before anything is
/// invoked, so callables may re-enter dispatch freely.
#[derive(Default)]
pub struct MethodTable {
    entries: RwLock<HashMap<String, MethodEntry>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<MethodEntry> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Install an entry, returning whatever previously occupied the slot.
    pub fn insert(&self, name: impl Into<String>, entry: MethodEntry) -> Option<MethodEntry> {
        self.entries.write().insert(name.into(), entry)
    }

    pub fn remove(&self, name: &str) -> Option<MethodEntry> {
        self.entries.write().remove(name)
    }

    /// Sorted names of every slot in this table.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
