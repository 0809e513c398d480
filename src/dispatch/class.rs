use std::fmt;
use std::sync::Arc;

use super::{
    dispatch, Access, CallError, ClassId, Implementation, MethodEntry, MethodTable, Object,
    ObjectRef, Receiver, Visibility,
};
use crate::value::Value;

pub type ClassRef = Arc<Class>;

/// A type: a shared instance dispatch table plus a table of type-level callables.
pub struct Class {
    id: ClassId,
    name: String,
    superclass: Option<ClassRef>,
    methods: MethodTable,
    statics: MethodTable,
}

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    /// This class followed by each superclass, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |&class| class.superclass.as_deref())
    }

    /// True if `self` is `other` or inherits from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class.id == other.id)
    }

    /// The table shared by every instance of this class.
    pub fn method_table(&self) -> &MethodTable {
        &self.methods
    }

    /// The table of type-level callables.
    pub fn static_table(&self) -> &MethodTable {
        &self.statics
    }

    /// Resolve an instance method through the superclass chain.
    pub fn instance_method(&self, name: &str) -> Option<MethodEntry> {
        self.ancestors().find_map(|class| class.methods.get(name))
    }

    /// Resolve a type-level callable through the superclass chain.
    pub fn static_method(&self, name: &str) -> Option<MethodEntry> {
        self.ancestors().find_map(|class| class.statics.get(name))
    }

    pub fn define_method<F>(&self, name: impl Into<String>, visibility: Visibility, f: F)
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.methods
            .insert(name, MethodEntry::new(Implementation::new(f), visibility));
    }

    pub fn define_static_method<F>(&self, name: impl Into<String>, visibility: Visibility, f: F)
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.statics
            .insert(name, MethodEntry::new(Implementation::new(f), visibility));
    }

    pub fn new_instance(self: &Arc<Self>) -> ObjectRef {
        Arc::new(Object::new(Arc::clone(self)))
    }

    /// Invoke a public type-level callable.
    pub fn call_static(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, CallError> {
        dispatch(
            Receiver::Type(Arc::clone(self)),
            self.static_method(name),
            name,
            args,
            Access::Public,
        )
    }

    /// Invoke a type-level callable regardless of visibility.
    pub fn send_static(self: &Arc<Self>, name: &str, args: &[Value]) -> Result<Value, CallError> {
        dispatch(
            Receiver::Type(Arc::clone(self)),
            self.static_method(name),
            name,
            args,
            Access::Any,
        )
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|c| c.name()))
            .field("methods", &self.methods)
            .field("statics", &self.statics)
            .finish()
    }
}

/// Builder for [`Class`].
pub struct ClassBuilder {
    name: String,
    superclass: Option<ClassRef>,
    methods: Vec<(String, MethodEntry)>,
    statics: Vec<(String, MethodEntry)>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            methods: Vec::new(),
            statics: Vec::new(),
        }
    }

    pub fn superclass(mut self, parent: &ClassRef) -> Self {
        self.superclass = Some(Arc::clone(parent));
        self
    }

    /// Add an instance method with an explicit visibility.
    pub fn method_with<F>(mut self, name: impl Into<String>, visibility: Visibility, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.methods
            .push((name.into(), MethodEntry::new(Implementation::new(f), visibility)));
        self
    }

    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.method_with(name, Visibility::Public, f)
    }

    pub fn protected_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.method_with(name, Visibility::Protected, f)
    }

    pub fn private_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.method_with(name, Visibility::Private, f)
    }

    /// Add a type-level callable with an explicit visibility.
    pub fn static_method_with<F>(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        f: F,
    ) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.statics
            .push((name.into(), MethodEntry::new(Implementation::new(f), visibility)));
        self
    }

    pub fn static_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.static_method_with(name, Visibility::Public, f)
    }

    pub fn private_static_method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.static_method_with(name, Visibility::Private, f)
    }

    pub fn build(self) -> ClassRef {
        let class = Class {
            id: ClassId::next(),
            name: self.name,
            superclass: self.superclass,
            methods: MethodTable::new(),
            statics: MethodTable::new(),
        };
        for (name, entry) in self.methods {
            class.methods.insert(name, entry);
        }
        for (name, entry) in self.statics {
            class.statics.insert(name, entry);
        }
        Arc::new(class)
    }
}
