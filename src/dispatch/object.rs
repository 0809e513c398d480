use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{
    dispatch, Access, CallError, Class, ClassRef, Implementation, MethodEntry, MethodTable,
    ObjectId, Receiver, Visibility,
};
use crate::value::Value;

pub type ObjectRef = Arc<Object>;

/// An instance of a [`Class`], with its own singleton table and field storage.
pub struct Object {
    id: ObjectId,
    class: ClassRef,
    singleton: MethodTable,
    fields: RwLock<HashMap<String, Value>>,
}

impl Object {
    pub(super) fn new(class: ClassRef) -> Self {
        Self {
            id: ObjectId::next(),
            class,
            singleton: MethodTable::new(),
            fields: RwLock::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Callables defined on this object alone.
    pub fn singleton_table(&self) -> &MethodTable {
        &self.singleton
    }

    pub fn is_a(&self, class: &Class) -> bool {
        self.class.is_subclass_of(class)
    }

    /// Resolve `name` for this object: singleton table first, then the class chain.
    pub fn resolve(&self, name: &str) -> Option<MethodEntry> {
        self.singleton
            .get(name)
            .or_else(|| self.class.instance_method(name))
    }

    /// True if `name` resolves to a public callable.
    pub fn respond_to(&self, name: &str) -> bool {
        self.resolve(name)
            .is_some_and(|entry| entry.visibility == Visibility::Public)
    }

    pub fn define_singleton_method<F>(&self, name: impl Into<String>, visibility: Visibility, f: F)
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.singleton
            .insert(name, MethodEntry::new(Implementation::new(f), visibility));
    }

    /// Call a public method, as code outside the object would.
    pub fn call(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, CallError> {
        dispatch(
            Receiver::Object(Arc::clone(self)),
            self.resolve(name),
            name,
            args,
            Access::Public,
        )
    }

    /// Call on behalf of `caller`; protected methods are reachable when the
    /// caller belongs to this object's class family.
    pub fn call_from(
        self: &Arc<Self>,
        caller: &Object,
        name: &str,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let access = if caller.is_a(&self.class) || self.is_a(&caller.class) {
            Access::Protected
        } else {
            Access::Public
        };
        dispatch(
            Receiver::Object(Arc::clone(self)),
            self.resolve(name),
            name,
            args,
            access,
        )
    }

    /// Call regardless of visibility.
    pub fn send(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, CallError> {
        dispatch(
            Receiver::Object(Arc::clone(self)),
            self.resolve(name),
            name,
            args,
            Access::Any,
        )
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.write().insert(name.into(), value.into())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}:{}>", self.class.name(), self.id.get())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("singleton", &self.singleton)
            .finish_non_exhaustive()
    }
}
