//! Structured argument values flowing through spies.

mod support;

use anyhow::Result;
use pretty_assertions::assert_eq;
use spyglass::value::FromValue;
use spyglass::{ArgValue, BoundArgs, Class, SpyRegistry, Value};

#[derive(ArgValue, Debug, Clone, PartialEq)]
struct Order {
    id: u32,
    item: String,
    #[arg(rename = "qty")]
    quantity: i64,
}

#[derive(ArgValue, Debug, Clone, PartialEq)]
enum Shipping {
    Standard,
    Express(u32),
    #[arg(rename = "pickup")]
    Pickup { store: String },
}

fn shop() -> spyglass::ClassRef {
    Class::builder("Shop")
        .method("place", |_, args| {
            let order = Order::from_value(args.first().cloned().unwrap_or(Value::Unit))?;
            Ok(Value::from(order.quantity))
        })
        .build()
}

fn order(id: u32, quantity: i64) -> Order {
    Order {
        id,
        item: "tea".to_string(),
        quantity,
    }
}

#[test]
fn test_derived_records_match_by_value() -> Result<()> {
    let registry = SpyRegistry::new();
    let shop = shop().new_instance();
    let spy = registry
        .on(&shop, "place")?
        .with_args([Value::from(order(1, 2)), Value::from(Shipping::Standard)]);

    shop.call("place", &[order(1, 2).into(), Shipping::Standard.into()])?;
    shop.call("place", &[order(1, 2).into(), Shipping::Express(1).into()])?;
    shop.call("place", &[order(2, 2).into(), Shipping::Standard.into()])?;

    assert_eq!(spy.call_count(), 1);
    Ok(())
}

#[test]
fn test_predicates_read_record_fields() -> Result<()> {
    let registry = SpyRegistry::new();
    let shop = shop().new_instance();
    let bulk = registry.on(&shop, "place")?.when(1, |b: &BoundArgs<'_>| {
        b.get(0)
            .and_then(|order| order.field("qty"))
            .and_then(Value::as_i64)
            .is_some_and(|qty| qty >= 10)
    });

    for quantity in [1, 10, 25, 9] {
        shop.call("place", &[order(7, quantity).into()])?;
    }
    assert_eq!(bulk.call_count(), 2);
    Ok(())
}

#[test]
fn test_recorded_arguments_convert_back() -> Result<()> {
    let registry = SpyRegistry::new();
    let shop = shop().new_instance();
    let spy = registry.on(&shop, "place")?;

    let pickup = Shipping::Pickup {
        store: "north".to_string(),
    };
    shop.call("place", &[order(3, 4).into(), pickup.clone().into()])?;

    let call = spy.last_call().expect("recorded");
    assert_eq!(call.result, Some(Value::S64(4)));
    let mut args = call.args.into_iter();
    assert_eq!(Order::from_value(args.next().expect("order"))?, order(3, 4));
    assert_eq!(Shipping::from_value(args.next().expect("shipping"))?, pickup);
    Ok(())
}

#[test]
fn test_conversion_failure_is_forwarded_and_counted() {
    let registry = SpyRegistry::new();
    let shop = shop().new_instance();
    let spy = registry.on(&shop, "place").expect("spy");

    let err = shop.call("place", &[Value::from("not an order")]).unwrap_err();
    assert!(matches!(err, spyglass::CallError::Conversion(_)));
    assert_eq!(spy.call_count(), 1);
    assert_eq!(spy.last_call().and_then(|c| c.result), None);
}

#[test]
fn test_renamed_case_shows_in_value() {
    let value = Value::from(Shipping::Pickup {
        store: "south".to_string(),
    });
    match value {
        Value::Variant {
            type_name,
            case_name,
            ..
        } => {
            assert_eq!(type_name, "Shipping");
            assert_eq!(case_name, "pickup");
        }
        other => panic!("expected a variant, got {other:?}"),
    }
}

#[derive(ArgValue, Debug, Clone, PartialEq)]
#[arg(crate = "spyglass::value")]
enum Coupon {
    None,
    Percent(u8),
}

#[test]
fn test_derive_through_the_spyglass_value_path() -> Result<()> {
    let registry = SpyRegistry::new();
    let shop = shop().new_instance();
    let spy = registry
        .on(&shop, "place")?
        .with_args([Value::from(order(1, 1)), Value::from(Coupon::Percent(10))]);

    shop.call("place", &[order(1, 1).into(), Coupon::Percent(10).into()])?;
    shop.call("place", &[order(1, 1).into(), Coupon::None.into()])?;

    assert_eq!(spy.call_count(), 1);
    let recorded = spy.last_call().expect("recorded").args[1].clone();
    assert_eq!(Coupon::from_value(recorded)?, Coupon::None);
    Ok(())
}

#[cfg(feature = "serde")]
#[test]
fn test_call_history_serializes() -> Result<()> {
    let registry = SpyRegistry::new();
    let calc = support::calculator().new_instance();
    let spy = registry.on(&calc, "add")?;
    calc.call("add", &spyglass::args![1, 2])?;

    let json = serde_json::to_value(spy.calls())?;
    let back: Vec<spyglass::CallRecord> = serde_json::from_value(json)?;
    assert_eq!(back, spy.calls());
    Ok(())
}
