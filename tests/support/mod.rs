//! Fixture classes shared by the integration tests.

#![allow(dead_code)]

use spyglass::dispatch::{check_arity, CallError, Class, ClassRef};
use spyglass::Value;

/// `Calculator` with a public `add`, a protected `scale`, a private `secret`,
/// a raising `divide` and a static `zero`.
pub fn calculator() -> ClassRef {
    Class::builder("Calculator")
        .method("add", |_, args| {
            Ok(Value::S64(args.iter().filter_map(Value::as_i64).sum()))
        })
        .method("divide", |_, args| {
            check_arity("divide", args, 2)?;
            let a = args[0].as_i64().ok_or_else(|| CallError::raised("not a number"))?;
            let b = args[1].as_i64().ok_or_else(|| CallError::raised("not a number"))?;
            if b == 0 {
                return Err(CallError::raised("divided by zero"));
            }
            Ok(Value::S64(a / b))
        })
        .protected_method("scale", |_, args| {
            let n = args.first().and_then(Value::as_i64).unwrap_or(0);
            Ok(Value::S64(n * 10))
        })
        .private_method("secret", |_, _| Ok(Value::from("42")))
        .static_method("zero", |_, _| Ok(Value::S64(0)))
        .private_static_method("build_id", |_, _| Ok(Value::from("calc-1")))
        .build()
}

/// `Counter` keeps its tally in a field so side effects stay observable.
pub fn counter() -> ClassRef {
    Class::builder("Counter")
        .method("increment", |recv, args| {
            let obj = recv
                .as_object()
                .ok_or_else(|| CallError::raised("increment needs an instance"))?;
            let by = args.first().and_then(Value::as_i64).unwrap_or(1);
            let current = obj.field("count").and_then(|v| v.as_i64()).unwrap_or(0);
            obj.set_field("count", current + by);
            Ok(Value::S64(current + by))
        })
        .method("reset", |recv, _| {
            if let Some(obj) = recv.as_object() {
                obj.set_field("count", 0i64);
            }
            Ok(Value::Unit)
        })
        .build()
}
