//! Dispatch Model
//!
//! Every spyable callable is reached through a lookup table instead of a
//! direct call. An [`Object`] consults its own singleton table first and then
//! its [`Class`] chain; a class keeps one table shared by all of its instances
//! and a separate table of type-level (static) callables.
//!
//! Resolution happens at call time, so rewriting a table entry immediately
//! affects every receiver that consults it, including objects constructed
//! before the rewrite.
//!
//! # Example
//!
//! ```
//! use spyglass::dispatch::{Class, CallError};
//! use spyglass::value::Value;
//!
//! let greeter = Class::builder("Greeter")
//!     .method("greet", |_, args| {
//!         let name = args.first().and_then(Value::as_str).unwrap_or("world");
//!         Ok(Value::from(format!("hello, {}", name)))
//!     })
//!     .build();
//!
//! let obj = greeter.new_instance();
//! assert_eq!(obj.call("greet", &[Value::from("ada")])?, Value::from("hello, ada"));
//! # Ok::<(), CallError>(())
//! ```

mod class;
mod error;
mod method;
mod object;

pub use class::{Class, ClassBuilder, ClassRef};
pub use error::{check_arity, CallError};
pub use method::{Implementation, MethodEntry, MethodFn, MethodTable, Visibility};
pub use object::{Object, ObjectRef};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Process-unique identity of an object. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(next_id())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Process-unique identity of a class. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        Self(next_id())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// The `self` a callable is invoked on.
#[derive(Debug, Clone)]
pub enum Receiver {
    Object(ObjectRef),
    Type(ClassRef),
}

impl Receiver {
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Receiver::Object(obj) => Some(obj),
            Receiver::Type(_) => None,
        }
    }

    pub fn as_type(&self) -> Option<&ClassRef> {
        match self {
            Receiver::Type(class) => Some(class),
            Receiver::Object(_) => None,
        }
    }

    /// The object's class, or the type itself.
    pub fn class(&self) -> &ClassRef {
        match self {
            Receiver::Object(obj) => obj.class(),
            Receiver::Type(class) => class,
        }
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Object(obj) => write!(f, "{}", obj),
            Receiver::Type(class) => write!(f, "{}", class.name()),
        }
    }
}

/// What the caller is allowed to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Protected,
    Any,
}

impl Access {
    fn check(self, visibility: Visibility, receiver: &Receiver, method: &str) -> Result<(), CallError> {
        match (self, visibility) {
            (_, Visibility::Public) | (Access::Any, _) => Ok(()),
            (Access::Protected, Visibility::Protected) => Ok(()),
            (_, Visibility::Private) => Err(CallError::PrivateMethod {
                receiver: receiver.to_string(),
                method: method.to_string(),
            }),
            (Access::Public, Visibility::Protected) => Err(CallError::ProtectedMethod {
                receiver: receiver.to_string(),
                method: method.to_string(),
            }),
        }
    }
}

/// Resolve-check-invoke. The entry was already cloned out of its table.
fn dispatch(
    receiver: Receiver,
    entry: Option<MethodEntry>,
    method: &str,
    args: &[Value],
    access: Access,
) -> Result<Value, CallError> {
    let entry = entry.ok_or_else(|| CallError::NoMethod {
        receiver: receiver.to_string(),
        method: method.to_string(),
    })?;
    access.check(entry.visibility, &receiver, method)?;
    entry.implementation.invoke(&receiver, args)
}
