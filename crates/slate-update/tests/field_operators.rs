mod common;
use common::*;

use bson::{Bson, DateTime, Decimal128, Timestamp, doc};
use slate_update::{ErrorKind, apply_updates, values_equal};

fn decimal(s: &str) -> Bson {
    Bson::Decimal128(s.parse::<Decimal128>().unwrap())
}

/// The stored value, which must still be a Decimal128.
fn decimal_field<'a>(document: &'a bson::Document, key: &str) -> &'a Bson {
    let value = document.get(key).unwrap();
    assert!(matches!(value, Bson::Decimal128(_)), "{value:?}");
    value
}

// ── $set ────────────────────────────────────────────────────────

#[test]
fn set_is_idempotent() {
    let update = doc! { "$set": { "a.b": 1, "c": "x" } };
    let once = apply(doc! { "z": 0 }, update.clone());
    let twice = apply(once.clone(), update);
    assert_eq!(once, twice);
    assert_eq!(keys(&twice), vec!["z", "a", "c"]);
}

#[test]
fn set_appends_new_fields_in_spec_order() {
    let result = apply(doc! {}, doc! { "$set": { "2": 2, "1": 1 } });
    assert_eq!(keys(&result), vec!["2", "1"]);
}

#[test]
fn set_replaces_in_place() {
    let result = apply(
        doc! { "a": 1, "b": 2, "c": 3 },
        doc! { "$set": { "b": "two" } },
    );
    assert_eq!(keys(&result), vec!["a", "b", "c"]);
    assert_eq!(result.get_str("b").unwrap(), "two");
}

#[test]
fn set_array_index_pads_with_null() {
    let result = apply(doc! { "a": [1] }, doc! { "$set": { "a.3": 4 } });
    assert_eq!(
        result.get_array("a").unwrap(),
        &vec![Bson::Int32(1), Bson::Null, Bson::Null, Bson::Int32(4)]
    );
}

#[test]
fn set_index_into_missing_field_creates_document() {
    let result = apply(doc! {}, doc! { "$set": { "a.0": 1 } });
    assert_eq!(result, doc! { "a": { "0": 1 } });
}

#[test]
fn set_through_scalar_is_path_conflict() {
    assert_eq!(
        apply_err(doc! { "a": "s" }, doc! { "$set": { "a.b": 1 } }),
        ErrorKind::PathConflict
    );
    assert_eq!(
        apply_err(doc! { "a": [1] }, doc! { "$set": { "a.x": 1 } }),
        ErrorKind::PathConflict
    );
}

// ── $unset ──────────────────────────────────────────────────────

#[test]
fn unset_removes_field_and_nulls_elements() {
    let result = apply(
        doc! { "a": 1, "b": [1, 2, 3], "c": { "d": 1 } },
        doc! { "$unset": { "a": "", "b.1": "", "c.d": 1, "missing.deep": 1 } },
    );
    assert_eq!(result, doc! { "b": [1, null, 3], "c": {} });
}

// ── $inc / $mul ─────────────────────────────────────────────────

#[test]
fn inc_int32_overflow_promotes_to_int64() {
    let result = apply(doc! { "n": i32::MAX }, doc! { "$inc": { "n": 1 } });
    assert_eq!(result.get("n"), Some(&Bson::Int64(2_147_483_648)));
}

#[test]
fn inc_int64_overflow_promotes_to_double() {
    let result = apply(doc! { "n": i64::MAX }, doc! { "$inc": { "n": 1_i64 } });
    assert!(matches!(result.get("n"), Some(Bson::Double(_))));
}

#[test]
fn inc_mixed_types() {
    let result = apply(
        doc! { "a": 1, "b": 1_i64, "c": 1 },
        doc! { "$inc": { "a": 1_i64, "b": 1.5, "c": -1 } },
    );
    assert_eq!(result.get("a"), Some(&Bson::Int64(2)));
    assert_eq!(result.get("b"), Some(&Bson::Double(2.5)));
    assert_eq!(result.get("c"), Some(&Bson::Int32(0)));
}

#[test]
fn inc_decimal() {
    let d = |s: &str| s.parse::<Decimal128>().unwrap();
    let result = apply(
        doc! { "n": Bson::Decimal128(d("1.1")) },
        doc! { "$inc": { "n": 2 } },
    );
    let n = match result.get("n") {
        Some(Bson::Decimal128(n)) => n.to_string(),
        other => panic!("expected decimal, got {other:?}"),
    };
    assert_eq!(n, "3.1");
}

#[test]
fn inc_decimal_keeps_all_34_digits() {
    let result = apply(
        doc! { "n": decimal("1234567890123456789012345678901234") },
        doc! { "$inc": { "n": 1 } },
    );
    let n = decimal_field(&result, "n");
    assert!(values_equal(n, &decimal("1234567890123456789012345678901235")), "{n}");
}

#[test]
fn inc_decimal_with_large_exponent() {
    let result = apply(doc! { "n": decimal("1E+30") }, doc! { "$inc": { "n": 1 } });
    let n = decimal_field(&result, "n");
    assert!(values_equal(n, &decimal("1000000000000000000000000000001")), "{n}");
}

#[test]
fn mul_decimal_tiny_product_is_not_zero() {
    let result = apply(
        doc! { "n": decimal("1E-20") },
        doc! { "$mul": { "n": decimal("1E-20") } },
    );
    let n = decimal_field(&result, "n");
    assert!(values_equal(n, &decimal("1E-40")), "{n}");
    assert!(!values_equal(n, &Bson::Int32(0)));
}

#[test]
fn inc_decimal_nan_stays_nan() {
    let result = apply(doc! { "n": decimal("NaN") }, doc! { "$inc": { "n": 1 } });
    let n = decimal_field(&result, "n");
    assert!(values_equal(n, &decimal("NaN")), "{n}");
}

#[test]
fn mul_by_decimal_operand() {
    let result = apply(
        doc! { "a": 3 },
        doc! { "$mul": { "a": decimal("0.5"), "b": decimal("2.5") } },
    );
    assert!(values_equal(decimal_field(&result, "a"), &decimal("1.5")));
    assert!(values_equal(decimal_field(&result, "b"), &Bson::Int32(0)));
}

#[test]
fn inc_non_numeric_field() {
    assert_eq!(
        apply_err(doc! { "n": "5" }, doc! { "$inc": { "n": 1 } }),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn mul_missing_and_existing() {
    let result = apply(doc! { "a": 3 }, doc! { "$mul": { "a": 4, "b": 2_i64 } });
    assert_eq!(result, doc! { "a": 12, "b": 0_i64 });
}

// ── $min / $max ─────────────────────────────────────────────────

#[test]
fn min_on_absent_field_sets_it() {
    let result = apply(doc! {}, doc! { "$min": { "n": 5 } });
    assert_eq!(result, doc! { "n": 5 });
}

#[test]
fn min_keeps_lower_value() {
    let result = apply(doc! { "n": 3 }, doc! { "$min": { "n": 5 } });
    assert_eq!(result, doc! { "n": 3 });
    let result = apply(doc! { "n": 3 }, doc! { "$min": { "n": 1 } });
    assert_eq!(result, doc! { "n": 1 });
}

#[test]
fn max_compares_dates() {
    let early = DateTime::from_millis(1_000);
    let late = DateTime::from_millis(2_000);
    let result = apply(doc! { "d": early }, doc! { "$max": { "d": late } });
    assert_eq!(result.get("d"), Some(&Bson::DateTime(late)));
}

#[test]
fn min_max_against_document_is_type_mismatch() {
    assert_eq!(
        apply_err(doc! { "n": { "x": 1 } }, doc! { "$min": { "n": 5 } }),
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        apply_err(doc! { "n": { "x": 1 } }, doc! { "$max": { "n": 5 } }),
        ErrorKind::TypeMismatch
    );
}

// ── $rename ─────────────────────────────────────────────────────

#[test]
fn rename_field_to_alias() {
    let result = apply(doc! { "field": 1 }, doc! { "$rename": { "field": "alias" } });
    assert_eq!(result, doc! { "alias": 1 });
}

#[test]
fn rename_moves_field_to_end() {
    let result = apply(
        doc! { "a": 1, "b": 2, "c": 3 },
        doc! { "$rename": { "a": "d" } },
    );
    assert_eq!(keys(&result), vec!["b", "c", "d"]);
}

#[test]
fn rename_nested_is_unsupported() {
    assert_eq!(
        apply_err(doc! { "a": { "b": 1 } }, doc! { "$rename": { "a.b": "c" } }),
        ErrorKind::UnsupportedRename
    );
}

// ── $bit ────────────────────────────────────────────────────────

#[test]
fn bit_and_or_xor() {
    let result = apply(
        doc! { "a": 13, "b": 3, "c": 1 },
        doc! { "$bit": { "a": { "and": 10 }, "b": { "or": 5 }, "c": { "xor": 5 } } },
    );
    assert_eq!(result, doc! { "a": 8, "b": 7, "c": 4 });
}

#[test]
fn bit_on_absent_field_starts_from_zero() {
    let result = apply(
        doc! {},
        doc! { "$bit": { "a": { "or": 5_i64 }, "b": { "and": 6 }, "c": { "xor": 3 } } },
    );
    assert_eq!(result.get("a"), Some(&Bson::Int64(5)));
    assert_eq!(result.get("b"), Some(&Bson::Int32(0)));
    assert_eq!(result.get("c"), Some(&Bson::Int32(3)));
}

// ── $setOnInsert / $currentDate ─────────────────────────────────

#[test]
fn set_on_insert_respects_insert_context() {
    let update = doc! { "$set": { "a": 1 }, "$setOnInsert": { "created": true } };
    let updated = apply_updates(&doc! {}, &[update.clone()], &options()).unwrap();
    assert_eq!(updated, doc! { "a": 1 });
    let inserted = apply_updates(&doc! {}, &[update], &insert_options()).unwrap();
    assert_eq!(inserted, doc! { "a": 1, "created": true });
}

#[test]
fn current_date_uses_supplied_clock() {
    let result = apply(
        doc! {},
        doc! { "$currentDate": { "d": true, "t": { "$type": "timestamp" } } },
    );
    assert_eq!(
        result.get("d"),
        Some(&Bson::DateTime(DateTime::from_millis(NOW_MILLIS)))
    );
    assert_eq!(
        result.get("t"),
        Some(&Bson::Timestamp(Timestamp {
            time: (NOW_MILLIS / 1000) as u32,
            increment: 1
        }))
    );
}

// ── validation ──────────────────────────────────────────────────

#[test]
fn empty_field_names_are_rejected() {
    assert_eq!(
        apply_err(doc! {}, doc! { "$set": { "a": { "": 1 } } }),
        ErrorKind::InvalidDocument
    );
}

#[test]
fn unknown_operator_is_rejected() {
    assert_eq!(
        apply_err(doc! {}, doc! { "$foo": { "a": 1 } }),
        ErrorKind::UnknownOperator
    );
    assert_eq!(apply_err(doc! {}, doc! {}), ErrorKind::EmptySpec);
}
