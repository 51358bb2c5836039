//! Ordering, equality and arithmetic over `Bson` values.
//!
//! Values are ordered by a fixed cross-type bracket first and by content
//! second:
//!
//! MinKey < Null < numbers < strings < documents < arrays < binary <
//! ObjectId < booleans < dates < timestamps < regexes < MaxKey
//!
//! Numbers compare by mathematical value regardless of the declared subtype,
//! so `Int32(1)`, `Int64(1)` and `Double(1.0)` are all equal.

use std::cmp::Ordering;
use std::num::NonZeroU64;

use bigdecimal::{BigDecimal, RoundingMode, Signed, ToPrimitive, Zero};
use bson::{Bson, Decimal128, Document};

/// The MongoDB type alias of a value, used in error messages.
pub fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
    }
}

/// Position of a value's type in the cross-type ordering. Types sharing a
/// rank are compared by content.
pub(crate) fn canonical_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::DbPointer(_) => 12,
        Bson::JavaScriptCode(_) => 13,
        Bson::JavaScriptCodeWithScope(_) => 14,
        Bson::MaxKey => 15,
    }
}

pub fn is_numeric(value: &Bson) -> bool {
    matches!(
        value,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)
    )
}

/// Total order over all values.
pub fn compare(a: &Bson, b: &Bson) -> Ordering {
    let rank = canonical_rank(a).cmp(&canonical_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Bson::String(x) | Bson::Symbol(x), Bson::String(y) | Bson::Symbol(y)) => x.cmp(y),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        (Bson::Array(x), Bson::Array(y)) => compare_arrays(x, y),
        (Bson::Binary(x), Bson::Binary(y)) => x
            .bytes
            .len()
            .cmp(&y.bytes.len())
            .then_with(|| u8::from(x.subtype).cmp(&u8::from(y.subtype)))
            .then_with(|| x.bytes.cmp(&y.bytes)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::RegularExpression(x), Bson::RegularExpression(y)) => x
            .pattern
            .as_str()
            .cmp(y.pattern.as_str())
            .then_with(|| x.options.as_str().cmp(y.options.as_str())),
        (Bson::JavaScriptCode(x), Bson::JavaScriptCode(y)) => x.cmp(y),
        (Bson::JavaScriptCodeWithScope(x), Bson::JavaScriptCodeWithScope(y)) => x
            .code
            .cmp(&y.code)
            .then_with(|| compare_documents(&x.scope, &y.scope)),
        _ => match (Number::of(a), Number::of(b)) {
            (Some(x), Some(y)) => compare_numbers(x, y),
            // MinKey, MaxKey, Null, Undefined and DbPointer carry no
            // comparable content.
            _ => Ordering::Equal,
        },
    }
}

/// Structural equality: field order matters for documents, numeric subtype
/// does not.
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    compare(a, b) == Ordering::Equal
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = ka.cmp(kb).then_with(|| compare(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_arrays(a: &[Bson], b: &[Bson]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

// ── Numbers ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Double(f64),
    Decimal(Decimal128),
}

impl Number {
    fn of(value: &Bson) -> Option<Number> {
        match value {
            Bson::Int32(n) => Some(Number::Int(i64::from(*n))),
            Bson::Int64(n) => Some(Number::Int(*n)),
            Bson::Double(f) => Some(Number::Double(*f)),
            Bson::Decimal128(d) => Some(Number::Decimal(*d)),
            _ => None,
        }
    }

    fn to_decimal(self) -> Decimal {
        match self {
            Number::Int(n) => Decimal::Finite(BigDecimal::from(n)),
            Number::Double(f) if f.is_nan() => Decimal::NaN,
            Number::Double(f) if f.is_infinite() => Decimal::Infinity { negative: f < 0.0 },
            // Shortest round-trip text, so 0.1 stays 0.1.
            Number::Double(f) => Decimal::parse(&format!("{f:?}")),
            Number::Decimal(d) => Decimal::parse(&d.to_string()),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Double(f) => f,
            // Decimal128 renders NaN and the infinities in a form f64 parses.
            Number::Decimal(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        }
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (Number::Decimal(_), _) | (_, Number::Decimal(_)) => {
            a.to_decimal().cmp_total(&b.to_decimal())
        }
        (Number::Int(x), Number::Double(y)) => compare_int_double(x, y),
        (Number::Double(x), Number::Int(y)) => compare_int_double(y, x).reverse(),
        (Number::Double(x), Number::Double(y)) => compare_f64(x, y),
    }
}

/// NaN sorts below every other number.
fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an i64 against an f64 without rounding the integer.
fn compare_int_double(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ord => ord,
    }
}

// ── Decimal128 ──────────────────────────────────────────────────

/// Significant digits held by a Decimal128.
const DECIMAL_PRECISION: NonZeroU64 = NonZeroU64::MIN.saturating_add(33);

/// Largest scale (negated exponent) a Decimal128 can store.
const DECIMAL_MAX_SCALE: i64 = 6176;

// BID encodings as stored in BSON, little-endian.
const DECIMAL_ZERO: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x40, 0x30];
const DECIMAL_NAN: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x7c];
const DECIMAL_INFINITY: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x78];
const DECIMAL_NEG_INFINITY: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xf8];

/// A Decimal128 value widened to arbitrary precision for arithmetic.
/// Results are rounded back to 34 digits when stored.
#[derive(Debug, Clone)]
enum Decimal {
    NaN,
    Infinity { negative: bool },
    Finite(BigDecimal),
}

impl Decimal {
    fn parse(text: &str) -> Decimal {
        let (negative, magnitude) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        match magnitude.to_ascii_lowercase().as_str() {
            "nan" | "snan" => Decimal::NaN,
            "inf" | "infinity" => Decimal::Infinity { negative },
            _ => text.parse().map(Decimal::Finite).unwrap_or(Decimal::NaN),
        }
    }

    fn is_negative(&self) -> bool {
        match self {
            Decimal::NaN => false,
            Decimal::Infinity { negative } => *negative,
            Decimal::Finite(d) => d.is_negative(),
        }
    }

    /// NaN sorts below every other number, as it does for doubles.
    fn cmp_total(&self, other: &Decimal) -> Ordering {
        let bracket = |d: &Decimal| match d {
            Decimal::NaN => 0,
            Decimal::Infinity { negative: true } => 1,
            Decimal::Finite(_) => 2,
            Decimal::Infinity { negative: false } => 3,
        };
        match (self, other) {
            (Decimal::Finite(x), Decimal::Finite(y)) => x.cmp(y),
            _ => bracket(self).cmp(&bracket(other)),
        }
    }

    fn add(self, other: Decimal) -> Decimal {
        match (self, other) {
            (Decimal::NaN, _) | (_, Decimal::NaN) => Decimal::NaN,
            (Decimal::Infinity { negative: x }, Decimal::Infinity { negative: y }) if x != y => {
                Decimal::NaN
            }
            (inf @ Decimal::Infinity { .. }, _) | (_, inf @ Decimal::Infinity { .. }) => inf,
            (Decimal::Finite(x), Decimal::Finite(y)) => Decimal::Finite(x + y),
        }
    }

    fn mul(self, other: Decimal) -> Decimal {
        let negative = self.is_negative() != other.is_negative();
        match (self, other) {
            (Decimal::NaN, _) | (_, Decimal::NaN) => Decimal::NaN,
            (Decimal::Infinity { .. }, Decimal::Finite(d))
            | (Decimal::Finite(d), Decimal::Infinity { .. })
                if d.is_zero() =>
            {
                Decimal::NaN
            }
            (Decimal::Infinity { .. }, _) | (_, Decimal::Infinity { .. }) => {
                Decimal::Infinity { negative }
            }
            (Decimal::Finite(x), Decimal::Finite(y)) => Decimal::Finite(x * y),
        }
    }

    /// Round to 34 significant digits, half to even. Values below the
    /// smallest exponent lose digits down to zero; values above the largest
    /// overflow to infinity.
    fn into_bson(self) -> Decimal128 {
        let negative = self.is_negative();
        let mut value = match self {
            Decimal::NaN => return Decimal128::from_bytes(DECIMAL_NAN),
            Decimal::Infinity { negative } => return infinity(negative),
            Decimal::Finite(d) if d.digits() > DECIMAL_PRECISION.get() => {
                d.with_precision_round(DECIMAL_PRECISION, RoundingMode::HalfEven)
            }
            Decimal::Finite(d) => d,
        };
        if value.as_bigint_and_exponent().1 > DECIMAL_MAX_SCALE {
            value = value.with_scale_round(DECIMAL_MAX_SCALE, RoundingMode::HalfEven);
        }
        let (coefficient, scale) = value.into_bigint_and_exponent();
        format!("{coefficient}E{}", -scale)
            .parse::<Decimal128>()
            .unwrap_or_else(|_| infinity(negative))
    }

    fn to_i64(&self) -> Option<i64> {
        match self {
            Decimal::Finite(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }
}

fn infinity(negative: bool) -> Decimal128 {
    Decimal128::from_bytes(if negative {
        DECIMAL_NEG_INFINITY
    } else {
        DECIMAL_INFINITY
    })
}

// ── Arithmetic ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arith {
    Add,
    Mul,
}

impl Arith {
    fn checked_i32(self, a: i32, b: i32) -> Option<i32> {
        match self {
            Arith::Add => a.checked_add(b),
            Arith::Mul => a.checked_mul(b),
        }
    }

    fn checked_i64(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Arith::Add => a.checked_add(b),
            Arith::Mul => a.checked_mul(b),
        }
    }

    fn f64(self, a: f64, b: f64) -> f64 {
        match self {
            Arith::Add => a + b,
            Arith::Mul => a * b,
        }
    }

    fn decimal(self, a: Decimal, b: Decimal) -> Decimal128 {
        match self {
            Arith::Add => a.add(b),
            Arith::Mul => a.mul(b),
        }
        .into_bson()
    }
}

/// Combine two numbers with the promotion rules:
///
/// - int32 ⊕ int32 → int32, or int64 on overflow
/// - int64 ⊕ int64 (or mixed widths) → int64, or double on overflow
/// - any double → double
/// - any decimal → decimal
///
/// Returns `None` when either side is not a number.
pub(crate) fn arithmetic(op: Arith, current: &Bson, operand: &Bson) -> Option<Bson> {
    let (a, b) = (Number::of(current)?, Number::of(operand)?);

    let result = match (current, operand, a, b) {
        (Bson::Int32(x), Bson::Int32(y), _, _) => op
            .checked_i32(*x, *y)
            .map(Bson::Int32)
            .unwrap_or_else(|| widen_int(op, i64::from(*x), i64::from(*y))),
        (_, _, Number::Decimal(_), _) | (_, _, _, Number::Decimal(_)) => {
            Bson::Decimal128(op.decimal(a.to_decimal(), b.to_decimal()))
        }
        (_, _, Number::Double(_), _) | (_, _, _, Number::Double(_)) => {
            Bson::Double(op.f64(a.to_f64(), b.to_f64()))
        }
        (_, _, Number::Int(x), Number::Int(y)) => widen_int(op, x, y),
    };
    Some(result)
}

fn widen_int(op: Arith, a: i64, b: i64) -> Bson {
    match op.checked_i64(a, b) {
        Some(n) => Bson::Int64(n),
        None => Bson::Double(op.f64(a as f64, b as f64)),
    }
}

/// Zero of the same numeric type as `value`.
pub(crate) fn zero_like(value: &Bson) -> Option<Bson> {
    match value {
        Bson::Int32(_) => Some(Bson::Int32(0)),
        Bson::Int64(_) => Some(Bson::Int64(0)),
        Bson::Double(_) => Some(Bson::Double(0.0)),
        Bson::Decimal128(_) => Some(Bson::Decimal128(Decimal128::from_bytes(DECIMAL_ZERO))),
        _ => None,
    }
}

/// Integral value of a number, accepting doubles with no fractional part.
pub(crate) fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            Some(*f as i64)
        }
        Bson::Decimal128(d) => Number::Decimal(*d).to_decimal().to_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Binary, Timestamp, bson, doc, oid::ObjectId, spec::BinarySubtype};

    fn dec(s: &str) -> Bson {
        Bson::Decimal128(s.parse::<Decimal128>().unwrap())
    }

    // ── compare ─────────────────────────────────────────────────

    #[test]
    fn type_brackets_are_ordered() {
        let ascending = vec![
            Bson::MinKey,
            Bson::Null,
            Bson::Int32(100),
            Bson::String("a".into()),
            Bson::Document(doc! { "a": 1 }),
            bson!([1]),
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: vec![1],
            }),
            Bson::ObjectId(ObjectId::from_bytes([0; 12])),
            Bson::Boolean(false),
            Bson::DateTime(bson::DateTime::from_millis(0)),
            Bson::Timestamp(Timestamp {
                time: 0,
                increment: 0,
            }),
            Bson::MaxKey,
        ];
        for pair in ascending.windows(2) {
            assert_eq!(compare(&pair[0], &pair[1]), Ordering::Less, "{pair:?}");
            assert_eq!(compare(&pair[1], &pair[0]), Ordering::Greater, "{pair:?}");
        }
    }

    #[test]
    fn numbers_compare_across_subtypes() {
        assert_eq!(compare(&Bson::Int32(1), &Bson::Int64(1)), Ordering::Equal);
        assert_eq!(compare(&Bson::Int32(1), &Bson::Double(1.0)), Ordering::Equal);
        assert_eq!(compare(&Bson::Int64(2), &Bson::Double(1.5)), Ordering::Greater);
        assert_eq!(compare(&Bson::Double(1.5), &Bson::Int32(2)), Ordering::Less);
        assert_eq!(compare(&dec("1.0"), &Bson::Int32(1)), Ordering::Equal);
        assert_eq!(compare(&dec("0.1"), &Bson::Double(0.2)), Ordering::Less);
    }

    #[test]
    fn large_int_vs_double_is_exact() {
        let big = i64::MAX;
        assert_eq!(
            compare(&Bson::Int64(big), &Bson::Double(9.3e18)),
            Ordering::Less
        );
        assert_eq!(
            compare(&Bson::Int64(big - 1), &Bson::Int64(big)),
            Ordering::Less
        );
    }

    #[test]
    fn nan_sorts_below_numbers() {
        assert_eq!(
            compare(&Bson::Double(f64::NAN), &Bson::Int32(i32::MIN)),
            Ordering::Less
        );
        assert_eq!(
            compare(&Bson::Double(f64::NAN), &Bson::Double(f64::NAN)),
            Ordering::Equal
        );
    }

    #[test]
    fn documents_compare_by_pairs_in_field_order() {
        let a = Bson::Document(doc! { "a": 1, "b": 2 });
        let b = Bson::Document(doc! { "b": 2, "a": 1 });
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert!(!values_equal(&a, &b));
        let prefix = Bson::Document(doc! { "a": 1 });
        assert_eq!(compare(&prefix, &a), Ordering::Less);
    }

    #[test]
    fn arrays_compare_element_wise() {
        assert_eq!(compare(&bson!([1, 2]), &bson!([1, 3])), Ordering::Less);
        assert_eq!(compare(&bson!([1, 2]), &bson!([1])), Ordering::Greater);
        assert!(values_equal(&bson!([1, { "x": 2 }]), &bson!([1.0, { "x": 2_i64 }])));
    }

    // ── arithmetic ──────────────────────────────────────────────

    #[test]
    fn int32_overflow_promotes_to_int64() {
        let r = arithmetic(Arith::Add, &Bson::Int32(i32::MAX), &Bson::Int32(1)).unwrap();
        assert_eq!(r, Bson::Int64(i64::from(i32::MAX) + 1));
        let r = arithmetic(Arith::Mul, &Bson::Int32(65_536), &Bson::Int32(65_536)).unwrap();
        assert_eq!(r, Bson::Int64(4_294_967_296));
    }

    #[test]
    fn int64_overflow_promotes_to_double() {
        let r = arithmetic(Arith::Add, &Bson::Int64(i64::MAX), &Bson::Int32(1)).unwrap();
        assert!(matches!(r, Bson::Double(_)));
    }

    #[test]
    fn mixed_widths_yield_int64() {
        let r = arithmetic(Arith::Add, &Bson::Int32(10), &Bson::Int64(100)).unwrap();
        assert_eq!(r, Bson::Int64(110));
    }

    #[test]
    fn double_operand_yields_double() {
        let r = arithmetic(Arith::Mul, &Bson::Int32(3), &Bson::Double(0.5)).unwrap();
        assert_eq!(r, Bson::Double(1.5));
    }

    #[test]
    fn decimal_operand_yields_decimal() {
        let r = arithmetic(Arith::Add, &Bson::Int32(1), &dec("0.25")).unwrap();
        assert!(values_equal(&r, &dec("1.25")));
        assert!(matches!(r, Bson::Decimal128(_)));
    }

    #[test]
    fn non_numeric_is_rejected() {
        assert_eq!(
            arithmetic(Arith::Add, &Bson::String("x".into()), &Bson::Int32(1)),
            None
        );
    }

    #[test]
    fn decimal_keeps_34_digits() {
        let r = arithmetic(
            Arith::Add,
            &dec("1234567890123456789012345678901234"),
            &Bson::Int32(1),
        )
        .unwrap();
        assert!(values_equal(&r, &dec("1234567890123456789012345678901235")), "{r}");
    }

    #[test]
    fn decimal_exponents_beyond_fixed_point() {
        let r = arithmetic(Arith::Add, &dec("1E+30"), &Bson::Int32(1)).unwrap();
        assert!(values_equal(&r, &dec("1000000000000000000000000000001")), "{r}");
        let r = arithmetic(Arith::Mul, &dec("1E-20"), &dec("1E-20")).unwrap();
        assert!(values_equal(&r, &dec("1E-40")), "{r}");
        assert_eq!(compare(&r, &dec("0")), Ordering::Greater);
    }

    #[test]
    fn decimal_nan_and_infinity_carry_through() {
        let r = arithmetic(Arith::Add, &dec("NaN"), &Bson::Int32(1)).unwrap();
        assert!(matches!(r, Bson::Decimal128(_)));
        assert!(values_equal(&r, &dec("NaN")));
        assert_eq!(compare(&r, &Bson::Int32(i32::MIN)), Ordering::Less);
        let r = arithmetic(Arith::Mul, &dec("Infinity"), &Bson::Int32(2)).unwrap();
        assert_eq!(compare(&r, &dec("9E+6000")), Ordering::Greater);
        let r = arithmetic(Arith::Mul, &dec("Infinity"), &Bson::Int32(0)).unwrap();
        assert!(values_equal(&r, &dec("NaN")));
    }

    #[test]
    fn decimal_range_limits() {
        let r = arithmetic(Arith::Mul, &dec("9E+6000"), &dec("9E+6000")).unwrap();
        assert_eq!(compare(&r, &dec("9E+6000")), Ordering::Greater);
        let r = arithmetic(Arith::Mul, &dec("1E-6000"), &dec("1E-6000")).unwrap();
        assert!(values_equal(&r, &Bson::Int32(0)));
        let r = arithmetic(Arith::Mul, &dec("1.5E-6000"), &dec("1E-176")).unwrap();
        assert!(values_equal(&r, &dec("2E-6176")), "{r}");
    }

    #[test]
    fn decimal_rounds_half_to_even() {
        let r = arithmetic(
            Arith::Add,
            &dec("1000000000000000000000000000000000"),
            &dec("0.5"),
        )
        .unwrap();
        assert!(values_equal(&r, &dec("1000000000000000000000000000000000")), "{r}");
    }

    #[test]
    fn decimal_zero_like() {
        let zero = zero_like(&dec("7.5")).unwrap();
        assert!(matches!(zero, Bson::Decimal128(_)));
        assert!(values_equal(&zero, &Bson::Int32(0)));
    }

    #[test]
    fn integer_extraction() {
        assert_eq!(as_integer(&Bson::Double(3.0)), Some(3));
        assert_eq!(as_integer(&Bson::Double(3.5)), None);
        assert_eq!(as_integer(&Bson::Int64(-2)), Some(-2));
        assert_eq!(as_integer(&Bson::String("1".into())), None);
        assert_eq!(as_integer(&dec("4.0")), Some(4));
        assert_eq!(as_integer(&dec("4.5")), None);
    }
}
