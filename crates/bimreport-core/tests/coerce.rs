use bimreport_core::coerce::coerce_number;
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn passes_finite_numbers_through() {
    assert_eq!(Some(0.2), coerce_number(Some(&json!(0.2))));
    assert_eq!(Some(3.0), coerce_number(Some(&json!(3))));
    assert_eq!(Some(-12.5), coerce_number(Some(&json!(-12.5))));
}

#[test]
fn parses_numeric_strings() {
    assert_eq!(Some(0.5), coerce_number(Some(&json!("0.5"))));
    assert_eq!(Some(1500.0), coerce_number(Some(&json!(" 1.5e3 "))));
}

#[test]
fn absent_and_non_numeric_values_have_no_number() {
    assert_eq!(None, coerce_number(None));
    assert_eq!(None, coerce_number(Some(&Value::Null)));
    assert_eq!(None, coerce_number(Some(&json!(""))));
    assert_eq!(None, coerce_number(Some(&json!("leaning"))));
    assert_eq!(None, coerce_number(Some(&json!("NaN"))));
    assert_eq!(None, coerce_number(Some(&json!(true))));
    assert_eq!(None, coerce_number(Some(&json!([1]))));
    assert_eq!(None, coerce_number(Some(&json!({ "v": 1 }))));
}

proptest! {
    #[test]
    fn any_string_yields_finite_or_nothing(s in ".*") {
        let value = Value::String(s);
        if let Some(n) = coerce_number(Some(&value)) {
            prop_assert!(n.is_finite());
        }
    }

    #[test]
    fn coercion_is_idempotent(x in prop::num::f64::ANY) {
        let first = coerce_number(Some(&json!(x)));
        if let Some(n) = first {
            prop_assert_eq!(Some(n), coerce_number(Some(&json!(n))));
            prop_assert_eq!(Some(n), coerce_number(Some(&json!(n.to_string()))));
        }
    }
}
