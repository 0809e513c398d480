//! Install / restore lifecycle, contract errors and the global registry.

mod support;

use anyhow::Result;
use pretty_assertions::assert_eq;
use serial_test::serial;
use spyglass::intercept::{ReceiverId, Target};
use spyglass::{args, spy_on, RestoreRequest, SpyError, SpyRegistry, Value};

#[test]
fn test_second_spy_on_same_key_is_rejected() -> Result<()> {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();
    let first = registry.on(&calc, "add")?;

    let err = registry.on(&calc, "add").unwrap_err();
    assert!(matches!(err, SpyError::AlreadySpied { ref method, .. } if method == "add"));

    // The live spy is untouched by the rejected install.
    calc.call("add", &args![1])?;
    assert_eq!(first.call_count(), 1);
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn test_second_spy_on_type_and_any_instance_keys_is_rejected() -> Result<()> {
    let registry = SpyRegistry::new();
    let class = support::calculator();
    let on_type = registry.on(&class, "zero")?;
    let shared = registry.on_any_instance(&class, "add")?;

    assert!(matches!(
        registry.on(&class, "zero"),
        Err(SpyError::AlreadySpied { ref method, .. }) if method == "zero"
    ));
    assert!(matches!(
        registry.on_any_instance(&class, "add"),
        Err(SpyError::AlreadySpied { ref receiver, .. }) if receiver == "any instance of Calculator"
    ));
    assert!(matches!(
        registry.on(Target::any_instance(&class), "add"),
        Err(SpyError::AlreadySpied { .. })
    ));

    class.call_static("zero", &[])?;
    class.new_instance().call("add", &args![1])?;
    assert_eq!((on_type.call_count(), shared.call_count()), (1, 1));
    assert_eq!(registry.len(), 2);
    Ok(())
}

#[test]
fn test_predicates_added_after_restore_have_no_effect() -> Result<()> {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();
    let spy = registry.on(&calc, "add")?;
    calc.call("add", &args![1, 2])?;
    registry.restore(&calc, "add")?;

    let spy = spy.with_args([1, 2]);
    assert_eq!(spy.predicate_count(), 1);
    calc.call("add", &args![1, 2])?;
    calc.call("add", &args![3])?;

    assert!(spy.is_restored());
    assert_eq!(spy.call_count(), 1);
    assert_eq!(spy.calls().len(), 1);
    assert!(calc.singleton_table().is_empty());
    Ok(())
}

#[test]
fn test_unknown_method_is_rejected_without_side_effects() {
    let registry = SpyRegistry::new();
    let class = support::calculator();
    let calc = class.new_instance();

    let err = registry.on(&calc, "multiply").unwrap_err();
    assert_eq!(
        err,
        SpyError::NoSuchMethod {
            receiver: calc.to_string(),
            method: "multiply".to_string(),
        }
    );
    assert!(matches!(
        registry.on_any_instance(&class, "multiply"),
        Err(SpyError::NoSuchMethod { .. })
    ));
    assert!(registry.is_empty());
    assert!(calc.singleton_table().is_empty());
}

#[test]
fn test_restore_without_spy_is_rejected() {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();

    assert!(matches!(
        registry.restore(&calc, "add"),
        Err(SpyError::MethodNotSpied { .. })
    ));
}

#[test]
fn test_restore_twice_is_rejected() -> Result<()> {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();
    registry.on(&calc, "add")?;

    registry.restore(&calc, "add")?;
    assert!(matches!(
        registry.restore(&calc, "add"),
        Err(SpyError::MethodNotSpied { .. })
    ));
    Ok(())
}

#[test]
fn test_restore_all_then_restore_is_rejected() -> Result<()> {
    let registry = SpyRegistry::new();
    let class = support::calculator();
    let calc = class.new_instance();
    registry.on(&calc, "add")?;
    registry.on(&class, "zero")?;

    assert_eq!(registry.restore_all(), 2);
    assert!(registry.is_empty());
    assert!(matches!(
        registry.restore(&calc, "add"),
        Err(SpyError::MethodNotSpied { .. })
    ));
    assert!(matches!(
        registry.restore(&class, "zero"),
        Err(SpyError::MethodNotSpied { .. })
    ));
    Ok(())
}

#[test]
fn test_restore_all_on_empty_registry_is_a_no_op() {
    let registry = SpyRegistry::new();
    assert_eq!(registry.restore_all(), 0);
    assert_eq!(registry.restore_all(), 0);
}

#[test]
fn test_key_can_be_spied_again_after_restore() -> Result<()> {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();

    let old = registry.on(&calc, "add")?;
    calc.call("add", &[])?;
    registry.restore(&calc, "add")?;

    let new = registry.on(&calc, "add")?;
    calc.call("add", &[])?;
    calc.call("add", &[])?;

    assert_eq!(old.call_count(), 1);
    assert!(old.is_restored());
    assert_eq!(new.call_count(), 2);
    assert!(!new.is_restored());
    Ok(())
}

#[test]
fn test_restored_spy_stops_counting() -> Result<()> {
    let registry = SpyRegistry::new();
    let counter = support::counter().new_instance();
    let spy = registry.on(&counter, "increment")?;

    counter.call("increment", &[])?;
    registry.restore(&counter, "increment")?;
    counter.call("increment", &[])?;
    counter.call("increment", &[])?;

    assert_eq!(spy.call_count(), 1);
    assert_eq!(counter.field("count"), Some(Value::S64(3)));
    Ok(())
}

#[test]
fn test_restore_request_variants() -> Result<()> {
    let registry = SpyRegistry::new();
    let class = support::counter();
    let obj = class.new_instance();
    registry.on(&obj, "increment")?;
    registry.on(&obj, "reset")?;
    registry.on_any_instance(&class, "increment")?;

    let one = RestoreRequest::Method(Target::from(&obj), "reset".to_string());
    assert_eq!(registry.restore_request(one.clone())?, 1);
    assert!(matches!(
        registry.restore_request(one),
        Err(SpyError::MethodNotSpied { .. })
    ));

    assert_eq!(registry.restore_request(RestoreRequest::All)?, 2);
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn test_spy_on_macro_checks_argument_count() -> Result<()> {
    let registry = SpyRegistry::new();
    let class = support::calculator();
    let calc = class.new_instance();

    assert!(matches!(spy_on!(registry), Err(SpyError::InvalidArgument(_))));
    assert!(matches!(spy_on!(registry, &calc), Err(SpyError::InvalidArgument(_))));
    assert!(matches!(
        spy_on!(registry, &calc, "add", "divide"),
        Err(SpyError::InvalidArgument(_))
    ));
    assert!(registry.is_empty());

    let spy = spy_on!(registry, &class, "zero")?;
    class.call_static("zero", &[])?;
    assert_eq!(spy.call_count(), 1);
    Ok(())
}

#[test]
fn test_registry_lookup() -> Result<()> {
    let registry = SpyRegistry::new();
    let class = support::calculator();
    let calc = class.new_instance();
    let spy = registry.on(&calc, "add")?;

    assert!(registry.is_spied(&calc, "add"));
    assert!(!registry.is_spied(&calc, "divide"));
    assert!(!registry.is_spied(Target::any_instance(&class), "add"));

    let found = registry.spy(&calc, "add").expect("live spy");
    calc.call("add", &[])?;
    assert_eq!(found.call_count(), spy.call_count());
    assert_eq!(found.key().receiver, ReceiverId::Instance(calc.id()));
    assert!(registry.spy(&calc, "divide").is_none());
    Ok(())
}

#[test]
fn test_separate_registries_do_not_share_keys() -> Result<()> {
    let calc = support::calculator().new_instance();
    let a = SpyRegistry::new();
    let b = SpyRegistry::new();
    a.on(&calc, "add")?;

    assert!(b.on(&calc, "divide").is_ok());
    assert!(matches!(b.restore(&calc, "add"), Err(SpyError::MethodNotSpied { .. })));

    b.restore_all();
    a.restore_all();
    assert!(calc.singleton_table().is_empty());
    Ok(())
}

#[test]
#[serial]
fn test_global_registry_free_functions() -> Result<()> {
    let class = support::counter();
    let obj = class.new_instance();

    let spy = spyglass::on(&obj, "reset")?;
    let shared = spyglass::on_any_instance(&class, "increment")?;
    obj.call("reset", &[])?;
    obj.call("increment", &[])?;

    assert_eq!(spy.call_count(), 1);
    assert_eq!(shared.call_count(), 1);
    assert!(SpyRegistry::global().is_spied(&obj, "reset"));

    spyglass::restore(&obj, "reset")?;
    assert_eq!(spyglass::restore_all(), 1);
    assert!(SpyRegistry::global().is_empty());
    Ok(())
}

#[test]
#[serial]
fn test_global_registry_is_shared_between_callers() -> Result<()> {
    let calc = support::calculator().new_instance();
    spyglass::on(&calc, "add")?;

    assert!(matches!(
        SpyRegistry::global().on(&calc, "add"),
        Err(SpyError::AlreadySpied { .. })
    ));
    assert_eq!(spyglass::restore_all(), 1);
    Ok(())
}
