//! ECMAScript numeric coercions on plain doubles
//!
//! These are the conversions the value encoding needs when demoting a double
//! to an integer or when an interpreter asks for `ToInt32` of a number.

const TWO_POW_32: f64 = 4_294_967_296.0;

/// ECMAScript `ToIntegerOrInfinity`: NaN becomes +0, zeros and infinities
/// are returned unchanged, everything else is truncated toward zero.
pub fn to_integer(d: f64) -> f64 {
    if d.is_nan() {
        return 0.0;
    }
    if d == 0.0 || d.is_infinite() {
        return d;
    }
    d.trunc()
}

/// ECMAScript `ToInt32`: truncate toward zero, then wrap modulo 2^32.
///
/// NaN and the infinities become 0.
#[inline]
pub fn to_int32(d: f64) -> i32 {
    if !d.is_finite() {
        return 0;
    }
    // Fast path: `as` truncates toward zero for in-range values
    if d > i32::MIN as f64 - 1.0 && d < i32::MAX as f64 + 1.0 {
        return d as i32;
    }
    // `%` on integral doubles is exact, so the wrapped value is too
    let wrapped = d.trunc().rem_euclid(TWO_POW_32);
    wrapped as u32 as i32
}

/// ECMAScript `ToUint32`
#[inline]
pub fn to_uint32(d: f64) -> u32 {
    to_int32(d) as u32
}

/// True if `d` is exactly representable as an i32.
///
/// Negative zero is rejected even though `-0.0 == 0`: it would lose its sign
/// when stored as an integer.
#[inline]
pub fn is_int32(d: f64) -> bool {
    let i = to_int32(d);
    i as f64 == d && !(d == 0.0 && d.is_sign_negative())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int32_in_range() {
        assert_eq!(to_int32(0.0), 0);
        assert_eq!(to_int32(42.9), 42);
        assert_eq!(to_int32(-42.9), -42);
        assert_eq!(to_int32(2147483647.0), i32::MAX);
        assert_eq!(to_int32(-2147483648.0), i32::MIN);
        assert_eq!(to_int32(-2147483648.5), i32::MIN);
    }

    #[test]
    fn test_to_int32_wraps() {
        assert_eq!(to_int32(2147483648.0), i32::MIN);
        assert_eq!(to_int32(4294967295.0), -1);
        assert_eq!(to_int32(4294967296.0), 0);
        assert_eq!(to_int32(4294967297.5), 1);
        assert_eq!(to_int32(-2147483649.0), i32::MAX);
        assert_eq!(to_int32(-4294967297.0), -1);
        assert_eq!(to_int32(1e20), 1661992960);
    }

    #[test]
    fn test_to_int32_non_finite() {
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_int32(f64::INFINITY), 0);
        assert_eq!(to_int32(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn test_to_uint32() {
        assert_eq!(to_uint32(-1.0), u32::MAX);
        assert_eq!(to_uint32(4294967296.0 + 5.0), 5);
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(f64::NAN), 0.0);
        assert_eq!(to_integer(3.7), 3.0);
        assert_eq!(to_integer(-3.7), -3.0);
        assert!(to_integer(-0.0).is_sign_negative());
        assert_eq!(to_integer(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_is_int32() {
        assert!(is_int32(0.0));
        assert!(is_int32(-7.0));
        assert!(is_int32(i32::MAX as f64));
        assert!(is_int32(i32::MIN as f64));
        assert!(!is_int32(-0.0));
        assert!(!is_int32(0.5));
        assert!(!is_int32(2147483648.0));
        assert!(!is_int32(f64::NAN));
        assert!(!is_int32(f64::INFINITY));
    }
}
