//! Interception Engine
//!
//! Swaps a single dispatch-table slot for a forwarding callable and puts the
//! original back later. Which slot is rewritten depends on the target mode:
//!
//! | mode          | slot                           |
//! |---------------|--------------------------------|
//! | `Instance`    | the object's singleton table   |
//! | `Type`        | the class's static table       |
//! | `AnyInstance` | the class's shared method table|
//!
//! The forwarding callable keeps the original's visibility, runs the
//! original synchronously and returns its result untouched.
//!
//! Callers are responsible for serializing install and restore per key; the
//! registry does this under its lock.

use tracing::debug;

use super::error::SpyError;
use super::snapshot::{Snapshot, SlotOrigin};
use super::spy::Spy;
use super::target::Target;
use crate::dispatch::{Implementation, MethodEntry};

/// Rewrite `method` on `target` to forward through `spy`.
///
/// Fails with [`SpyError::NoSuchMethod`] and leaves every table untouched
/// if `method` does not resolve for the target.
pub(crate) fn install(target: &Target, method: &str, spy: &Spy) -> Result<Snapshot, SpyError> {
    let slot = target.slot();
    let (original, origin) = match slot.get(method) {
        Some(entry) => (entry, SlotOrigin::Own),
        None => {
            let entry = target
                .resolve_fallback(method)
                .ok_or_else(|| SpyError::NoSuchMethod {
                    receiver: target.to_string(),
                    method: method.to_string(),
                })?;
            (entry, SlotOrigin::Inherited)
        }
    };

    let wrapper = MethodEntry::new(
        forwarding(original.implementation.clone(), spy.clone()),
        original.visibility,
    );
    slot.insert(method, wrapper);

    debug!(
        target_key = %spy.key(),
        receiver = %target,
        method,
        visibility = %original.visibility,
        origin = ?origin,
        "installed spy"
    );
    Ok(Snapshot::capture(target.clone(), method, original, origin))
}

/// Put the snapshot's original back into the slot it came from.
pub(crate) fn reinstate(snapshot: Snapshot) {
    let (target, method, original, origin) = snapshot.into_parts();
    let slot = target.slot();
    match origin {
        SlotOrigin::Own => {
            slot.insert(method.as_str(), original);
        }
        SlotOrigin::Inherited => {
            slot.remove(&method);
        }
    }
    debug!(receiver = %target, method = %method, origin = ?origin, "restored original");
}

fn forwarding(original: Implementation, spy: Spy) -> Implementation {
    Implementation::new(move |receiver, args| {
        let result = original.invoke(receiver, args);
        spy.observe(receiver, args, &result);
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CallError, Class, ClassRef, Visibility};
    use crate::intercept::{ReceiverId, RegistryConfig};
    use crate::value::Value;

    fn doubler() -> ClassRef {
        Class::builder("Doubler")
            .private_method("double", |_, args| {
                let n = args.first().and_then(Value::as_i64).unwrap_or(0);
                Ok(Value::S64(n * 2))
            })
            .build()
    }

    fn spy_for(target: &Target, method: &str) -> Spy {
        Spy::new(target.key(method), &RegistryConfig::default())
    }

    #[test]
    fn instance_install_shadows_only_that_object() {
        let class = doubler();
        let spied = class.new_instance();
        let other = class.new_instance();
        let target = Target::from(&spied);
        let spy = spy_for(&target, "double");

        let snapshot = install(&target, "double", &spy).expect("install");
        assert_eq!(snapshot.origin(), SlotOrigin::Inherited);
        assert_eq!(snapshot.method(), "double");
        assert_eq!(snapshot.receiver_id(), ReceiverId::Instance(spied.id()));
        assert!(matches!(snapshot.target(), Target::Instance(obj) if obj.id() == spied.id()));
        assert_eq!(snapshot.visibility(), Visibility::Private);

        assert_eq!(spied.send("double", &[Value::S64(4)]), Ok(Value::S64(8)));
        assert_eq!(other.send("double", &[Value::S64(4)]), Ok(Value::S64(8)));
        assert_eq!(spy.call_count(), 1);

        // Visibility survives the rewrite.
        assert!(matches!(
            spied.call("double", &[]),
            Err(CallError::PrivateMethod { .. })
        ));

        let original = snapshot.original().clone();
        reinstate(snapshot);
        assert!(spied.singleton_table().is_empty());
        let resolved = spied.resolve("double").expect("resolves");
        assert_eq!(resolved.implementation, original);
        assert_eq!(resolved.visibility, Visibility::Private);
    }

    #[test]
    fn own_slot_is_put_back_verbatim() {
        let class = doubler();
        let target = Target::any_instance(&class);
        let before = class.method_table().get("double").expect("defined");

        let snapshot = install(&target, "double", &spy_for(&target, "double")).expect("install");
        assert_eq!(snapshot.origin(), SlotOrigin::Own);
        assert_ne!(class.method_table().get("double"), Some(before.clone()));

        reinstate(snapshot);
        assert_eq!(class.method_table().get("double"), Some(before));
    }

    #[test]
    fn unresolved_method_leaves_tables_alone() {
        let class = doubler();
        let obj = class.new_instance();
        let target = Target::from(&obj);

        let err = install(&target, "triple", &spy_for(&target, "triple")).unwrap_err();
        assert!(matches!(err, SpyError::NoSuchMethod { .. }));
        assert!(obj.singleton_table().is_empty());
        assert_eq!(class.method_table().names(), vec!["double".to_string()]);
    }
}
