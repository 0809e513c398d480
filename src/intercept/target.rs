//! Interception targets and the keys identifying them.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::{ClassId, ClassRef, MethodEntry, MethodTable, ObjectId, ObjectRef, Receiver};

/// A live receiver to intercept on, in one of three modes.
#[derive(Debug, Clone)]
pub enum Target {
    /// A callable as resolved for one object only.
    Instance(ObjectRef),
    /// A type-level (static) callable.
    Type(ClassRef),
    /// The shared dispatch entry consulted by every instance of the type.
    AnyInstance(ClassRef),
}

impl Target {
    pub fn any_instance(class: &ClassRef) -> Self {
        Target::AnyInstance(Arc::clone(class))
    }

    pub fn receiver_id(&self) -> ReceiverId {
        match self {
            Target::Instance(obj) => ReceiverId::Instance(obj.id()),
            Target::Type(class) => ReceiverId::Type(class.id()),
            Target::AnyInstance(class) => ReceiverId::AnyInstance(class.id()),
        }
    }

    pub fn key(&self, method: impl Into<String>) -> TargetKey {
        TargetKey {
            receiver: self.receiver_id(),
            method: method.into(),
        }
    }

    /// The table an interception for this target is written into.
    pub(crate) fn slot(&self) -> &MethodTable {
        match self {
            Target::Instance(obj) => obj.singleton_table(),
            Target::Type(class) => class.static_table(),
            Target::AnyInstance(class) => class.method_table(),
        }
    }

    /// Resolution that applies when the slot itself holds nothing for `method`.
    pub(crate) fn resolve_fallback(&self, method: &str) -> Option<MethodEntry> {
        match self {
            Target::Instance(obj) => obj.class().instance_method(method),
            Target::Type(class) => class
                .superclass()
                .and_then(|parent| parent.static_method(method)),
            Target::AnyInstance(class) => class
                .superclass()
                .and_then(|parent| parent.instance_method(method)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Instance(obj) => write!(f, "{}", obj),
            Target::Type(class) => write!(f, "{}", class.name()),
            Target::AnyInstance(class) => write!(f, "any instance of {}", class.name()),
        }
    }
}

impl From<&ObjectRef> for Target {
    fn from(obj: &ObjectRef) -> Self {
        Target::Instance(Arc::clone(obj))
    }
}

impl From<ObjectRef> for Target {
    fn from(obj: ObjectRef) -> Self {
        Target::Instance(obj)
    }
}

impl From<&ClassRef> for Target {
    fn from(class: &ClassRef) -> Self {
        Target::Type(Arc::clone(class))
    }
}

impl From<ClassRef> for Target {
    fn from(class: ClassRef) -> Self {
        Target::Type(class)
    }
}

impl From<&Receiver> for Target {
    fn from(receiver: &Receiver) -> Self {
        match receiver {
            Receiver::Object(obj) => Target::Instance(Arc::clone(obj)),
            Receiver::Type(class) => Target::Type(Arc::clone(class)),
        }
    }
}

/// Identity of an intercepted receiver. Ids are never reused, so keys of
/// dropped receivers cannot collide with new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReceiverId {
    Instance(ObjectId),
    Type(ClassId),
    AnyInstance(ClassId),
}

impl From<&Receiver> for ReceiverId {
    fn from(receiver: &Receiver) -> Self {
        match receiver {
            Receiver::Object(obj) => ReceiverId::Instance(obj.id()),
            Receiver::Type(class) => ReceiverId::Type(class.id()),
        }
    }
}

/// (receiver identity, method name). At most one live spy per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetKey {
    pub receiver: ReceiverId,
    pub method: String,
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.receiver {
            ReceiverId::Instance(id) => write!(f, "object:{}#{}", id.get(), self.method),
            ReceiverId::Type(id) => write!(f, "type:{}.{}", id.get(), self.method),
            ReceiverId::AnyInstance(id) => write!(f, "type:{}#{} (any instance)", id.get(), self.method),
        }
    }
}
