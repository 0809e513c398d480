//! Spyglass: call interception and verification for test doubles
//!
//! A spy replaces one callable of an object or type with a transparent
//! wrapper. The wrapper forwards every call to the original implementation,
//! returns its result unchanged, and counts the calls that satisfy the spy's
//! predicates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 SpyRegistry                  │
//! │   TargetKey -> (Spy, Snapshot)               │
//! ├──────────────────────────────────────────────┤
//! │  engine     - swap / restore one table slot  │
//! │  spy        - count + record forwarded calls │
//! │  predicate  - with_args / when filters       │
//! ├──────────────────────────────────────────────┤
//! │  dispatch   - Class / Object method tables   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Because Rust dispatches statically, spyable callables live in explicit
//! method tables (see [`dispatch`]). Installing a spy rewrites one table slot:
//! an object's own slot, a type's static slot, or, in any-instance mode, the
//! slot every instance of a type consults at call time.
//!
//! The registry does not reset itself. Test harnesses call [`restore_all`]
//! after every test case.

pub mod dispatch;
pub mod intercept;

/// Dynamic argument and return values.
///
/// Crates that depend only on `spyglass` point the derive here:
///
/// ```
/// use spyglass::value::{ArgValue, Value};
///
/// #[derive(ArgValue)]
/// #[arg(crate = "spyglass::value")]
/// struct Point {
///     x: i64,
///     y: i64,
/// }
///
/// assert_eq!(Value::from(Point { x: 1, y: 2 }).field("y"), Some(&Value::S64(2)));
/// ```
pub mod value {
    pub use spyglass_value::{args, ArgValue, ConversionError, FromValue, Value};

    #[doc(hidden)]
    pub use spyglass_value::__private;
}

pub use dispatch::{CallError, Class, ClassRef, Object, ObjectRef, Receiver, Visibility};
pub use intercept::{
    Arity, BoundArgs, CallRecord, RegistryConfig, RestoreRequest, Spy, SpyArg, SpyError,
    SpyRegistry, Target, TargetKey,
};
pub use spyglass_value::{args, ArgValue, Value};

/// Spy on `method` of `target` in the global registry.
pub fn on(target: impl Into<Target>, method: &str) -> Result<Spy, SpyError> {
    SpyRegistry::global().on(target, method)
}

/// Spy on the shared dispatch entry of `class` in the global registry.
pub fn on_any_instance(class: &ClassRef, method: &str) -> Result<Spy, SpyError> {
    SpyRegistry::global().on_any_instance(class, method)
}

/// Restore one spy in the global registry.
pub fn restore(target: impl Into<Target>, method: &str) -> Result<(), SpyError> {
    SpyRegistry::global().restore(target, method)
}

/// Restore every spy in the global registry.
pub fn restore_all() -> usize {
    SpyRegistry::global().restore_all()
}

/// Create a spy from a list of identifying arguments, checking their count.
///
/// ```
/// use spyglass::{spy_on, Class, SpyError, SpyRegistry, Value};
///
/// let class = Class::builder("Clock").method("now", |_, _| Ok(Value::U64(0))).build();
/// let clock = class.new_instance();
/// let registry = SpyRegistry::new();
///
/// assert!(matches!(spy_on!(registry, &clock), Err(SpyError::InvalidArgument(_))));
/// assert!(spy_on!(registry, &clock, "now").is_ok());
/// ```
#[macro_export]
macro_rules! spy_on {
    ($registry:expr $(, $arg:expr)*) => {
        $registry.on_args(::std::vec![$($crate::SpyArg::from($arg)),*])
    };
}
