//! Arithmetic on StaticValues
//!
//! The operations an interpreter performs on its registers, with the
//! integer fast path the encoding is built for: when both operands are
//! integer compatible the 32-bit payloads are used directly, and the result
//! falls back to a double only on overflow (or when it has to be -0).
//!
//! Managed operands would need `ToPrimitive`, which belongs to the object
//! model. Here they convert to NaN, like undefined.
//!
//! # Overflow Behavior
//!
//! - `add`/`sub`/`mul`: int32 overflow promotes to double
//! - bitwise and shift operators: operands go through `ToInt32`, results wrap
//! - `ushr`: result is unsigned and may come back as a double

use nanval_core::StaticValue;

#[inline(always)]
fn int_compatible(v: StaticValue) -> bool {
    !v.is_empty() && v.integer_compatible()
}

/// ECMAScript `ToNumber` for the non-object cases
#[inline]
pub fn to_number(v: StaticValue) -> f64 {
    if int_compatible(v) {
        return v.int_32() as f64;
    }
    if v.is_double() {
        return v.double_value();
    }
    f64::NAN
}

#[inline]
pub fn add(a: StaticValue, b: StaticValue) -> StaticValue {
    if int_compatible(a) && int_compatible(b) {
        if let Some(r) = a.int_32().checked_add(b.int_32()) {
            return StaticValue::from_int32(r);
        }
    }
    StaticValue::from_double(to_number(a) + to_number(b))
}

#[inline]
pub fn sub(a: StaticValue, b: StaticValue) -> StaticValue {
    if int_compatible(a) && int_compatible(b) {
        if let Some(r) = a.int_32().checked_sub(b.int_32()) {
            return StaticValue::from_int32(r);
        }
    }
    StaticValue::from_double(to_number(a) - to_number(b))
}

#[inline]
pub fn mul(a: StaticValue, b: StaticValue) -> StaticValue {
    if int_compatible(a) && int_compatible(b) {
        let (x, y) = (a.int_32(), b.int_32());
        // A zero product with a negative operand is -0, which needs a double
        if let Some(r) = x.checked_mul(y)
            && (r != 0 || (x >= 0 && y >= 0))
        {
            return StaticValue::from_int32(r);
        }
    }
    StaticValue::from_double(to_number(a) * to_number(b))
}

/// Unary minus. Negating NaN gives the negative canonical NaN.
#[inline]
pub fn negate(v: StaticValue) -> StaticValue {
    if int_compatible(v) {
        let i = v.int_32();
        if i != 0 && i != i32::MIN {
            return StaticValue::from_int32(-i);
        }
    }
    StaticValue::from_double(-to_number(v))
}

#[inline]
pub fn increment(v: StaticValue) -> StaticValue {
    add(v, StaticValue::from_int32(1))
}

#[inline]
pub fn decrement(v: StaticValue) -> StaticValue {
    sub(v, StaticValue::from_int32(1))
}

#[inline]
pub fn bit_and(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_int32(a.to_int32() & b.to_int32())
}

#[inline]
pub fn bit_or(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_int32(a.to_int32() | b.to_int32())
}

#[inline]
pub fn bit_xor(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_int32(a.to_int32() ^ b.to_int32())
}

#[inline]
pub fn shl(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_int32(a.to_int32().wrapping_shl(b.to_int32() as u32 & 31))
}

#[inline]
pub fn shr(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_int32(a.to_int32() >> (b.to_int32() as u32 & 31))
}

#[inline]
pub fn ushr(a: StaticValue, b: StaticValue) -> StaticValue {
    StaticValue::from_uint32((a.to_int32() as u32) >> (b.to_int32() as u32 & 31))
}

/// `===` for the non-string cases.
///
/// Numbers compare by value (so `1 === 1.0`, `0 === -0`, `NaN !== NaN`);
/// everything else compares by word, which is identity for managed values.
pub fn strict_equals(a: StaticValue, b: StaticValue) -> bool {
    if a.is_number() && b.is_number() {
        return a.as_double() == b.as_double();
    }
    a.raw_value() == b.raw_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i32) -> StaticValue {
        StaticValue::from_int32(i)
    }

    fn dbl(d: f64) -> StaticValue {
        StaticValue::from_double(d)
    }

    #[test]
    fn test_add_fast_path() {
        let r = add(int(40), int(2));
        assert!(r.is_integer());
        assert_eq!(r.integer_value(), 42);
    }

    #[test]
    fn test_add_overflow_promotes() {
        let r = add(int(i32::MAX), int(1));
        assert!(r.is_double());
        assert_eq!(r.double_value(), i32::MAX as f64 + 1.0);
    }

    #[test]
    fn test_add_mixed() {
        let r = add(int(1), dbl(0.5));
        assert_eq!(r.double_value(), 1.5);
        // Booleans and null are integer compatible
        let r = add(StaticValue::from_boolean(true), StaticValue::null_value());
        assert_eq!(r, int(1));
        // undefined is NaN
        assert!(add(int(1), StaticValue::undefined_value()).is_nan());
    }

    #[test]
    fn test_sub() {
        assert_eq!(sub(int(5), int(7)), int(-2));
        assert!(sub(int(i32::MIN), int(1)).is_double());
    }

    #[test]
    fn test_mul_negative_zero() {
        let r = mul(int(0), int(-5));
        assert!(r.is_double());
        assert!(r.double_value().is_sign_negative());
        assert_eq!(mul(int(0), int(5)), int(0));
        assert_eq!(mul(int(-3), int(4)), int(-12));
        assert!(mul(int(65536), int(65536)).is_double());
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(int(5)), int(-5));
        let z = negate(int(0));
        assert!(z.is_double() && z.double_value().is_sign_negative());
        assert!(negate(int(i32::MIN)).is_double());
        assert_eq!(
            negate(dbl(f64::NAN)).raw_value(),
            nanval_core::QuickType::MinusNaN.word()
        );
    }

    #[test]
    fn test_increment_decrement() {
        assert_eq!(increment(int(1)), int(2));
        assert_eq!(decrement(int(1)), int(0));
        assert!(increment(int(i32::MAX)).is_double());
        assert_eq!(increment(dbl(0.5)).double_value(), 1.5);
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(bit_and(int(0b1100), int(0b1010)), int(0b1000));
        assert_eq!(bit_or(int(0b1100), int(0b1010)), int(0b1110));
        assert_eq!(bit_xor(int(0b1100), int(0b1010)), int(0b0110));
        // ToInt32 wraps doubles
        assert_eq!(bit_or(dbl(4294967297.0), int(0)), int(1));
        assert_eq!(bit_or(dbl(f64::NAN), int(0)), int(0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(int(1), int(33)), int(2));
        assert_eq!(shr(int(-8), int(1)), int(-4));
        let r = ushr(int(-1), int(0));
        assert!(r.is_double());
        assert_eq!(r.double_value(), u32::MAX as f64);
        assert_eq!(ushr(int(-8), int(28)), int(15));
    }

    #[test]
    fn test_strict_equals() {
        assert!(strict_equals(int(1), dbl(1.0)));
        assert!(strict_equals(dbl(0.0), dbl(-0.0)));
        assert!(!strict_equals(dbl(f64::NAN), dbl(f64::NAN)));
        assert!(strict_equals(StaticValue::null_value(), StaticValue::null_value()));
        assert!(!strict_equals(StaticValue::null_value(), StaticValue::undefined_value()));
        assert!(!strict_equals(StaticValue::from_boolean(true), int(1)));
    }
}
