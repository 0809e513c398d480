//! Call Interception
//!
//! Spies, the predicates that filter what they count, and the registry that
//! installs and restores them.
//!
//! # Example
//!
//! ```
//! use spyglass::dispatch::Class;
//! use spyglass::intercept::SpyRegistry;
//! use spyglass::value::Value;
//!
//! let calculator = Class::builder("Calculator")
//!     .method("add", |_, args| {
//!         Ok(Value::S64(args.iter().filter_map(Value::as_i64).sum()))
//!     })
//!     .build();
//! let calc = calculator.new_instance();
//!
//! let registry = SpyRegistry::new();
//! let spy = registry.on(&calc, "add")?.with_args([1, 2]);
//!
//! assert_eq!(calc.call("add", &[Value::from(1), Value::from(2)])?, Value::S64(3));
//! assert_eq!(calc.call("add", &[Value::from(1), Value::from(5)])?, Value::S64(6));
//! assert_eq!(spy.call_count(), 1);
//!
//! registry.restore(&calc, "add")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod engine;
mod error;
mod predicate;
mod registry;
mod snapshot;
mod spy;
mod target;

pub use config::RegistryConfig;
pub use error::SpyError;
pub use predicate::{Arity, BoundArgs, Predicate, PredicateChain};
pub use registry::{RegistryBuilder, RestoreRequest, SpyArg, SpyRegistry};
pub use snapshot::{SlotOrigin, Snapshot};
pub use spy::{CallRecord, Spy};
pub use target::{ReceiverId, Target, TargetKey};
