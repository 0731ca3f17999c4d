//! Sweeps over the value encoding
//!
//! These tests walk large, deterministic samples of the input space (all
//! tag combinations, special doubles, pseudo-random doubles and pointers)
//! and check the classification predicates against each other.

use nanval_core::layout::{EXPONENT_MASK, MANAGED_MASK, QuickType};
use nanval_core::pointer::{
    Arm64TopByte, FiveLevelPaging, Flat, Ia64, PointerLayout, Sparc64, decode_pointer,
    encode_pointer,
};
use nanval_core::{StaticValue, TypedValue, ValueType};

/// xorshift64*, deterministic so failures reproduce
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }
}

fn exactly_one_predicate(v: StaticValue) -> bool {
    [
        v.is_double(),
        v.is_managed(),
        v.is_undefined(),
        v.is_null(),
        v.is_boolean(),
        v.is_integer(),
        v.is_empty(),
    ]
    .iter()
    .filter(|b| **b)
    .count()
        == 1
}

#[test]
fn test_int32_round_trip_sweep() {
    let mut i: i64 = i32::MIN as i64;
    while i <= i32::MAX as i64 {
        let n = i as i32;
        let v = StaticValue::from_int32(n);
        assert_eq!(v.integer_value(), n);
        assert_eq!(v.to_int32(), n);
        assert!(exactly_one_predicate(v));
        i += 65_521; // prime stride reaches both ends and plenty in between
    }
    for n in [i32::MIN, i32::MAX, -1, 0, 1] {
        assert_eq!(StaticValue::from_int32(n).integer_value(), n);
    }
}

#[test]
fn test_random_double_round_trip() {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15);
    for _ in 0..200_000 {
        let d = f64::from_bits(rng.next());
        let v = StaticValue::from_double(d);
        assert!(v.is_double());
        assert!(exactly_one_predicate(v));
        if d.is_nan() {
            assert!(v.is_nan());
            assert_eq!(v.double_value().is_sign_negative(), d.is_sign_negative());
        } else {
            assert_eq!(v.double_value().to_bits(), d.to_bits());
            assert!(!v.is_nan());
        }
    }
}

#[test]
fn test_every_nan_payload_canonicalizes() {
    let mut rng = Rng(42);
    for _ in 0..50_000 {
        let mantissa = (rng.next() & 0x000F_FFFF_FFFF_FFFF).max(1);
        let positive = f64::from_bits(0x7FF0_0000_0000_0000 | mantissa);
        let negative = f64::from_bits(0xFFF0_0000_0000_0000 | mantissa);
        assert_eq!(
            StaticValue::from_double(positive).raw_value(),
            QuickType::NaN.word()
        );
        assert_eq!(
            StaticValue::from_double(negative).raw_value(),
            QuickType::MinusNaN.word()
        );
    }
}

#[test]
fn test_integral_doubles_demote() {
    let mut rng = Rng(7);
    for _ in 0..100_000 {
        let n = rng.next() as i32;
        let mut v = StaticValue::from_double(n as f64);
        assert!(v.is_int32());
        assert!(v.is_integer());
        assert_eq!(v.integer_value(), n);
    }
}

#[test]
fn test_fractional_doubles_do_not_demote() {
    let mut rng = Rng(11);
    for _ in 0..100_000 {
        let d = (rng.next() as i32) as f64 + 0.5;
        let mut v = StaticValue::from_double(d);
        assert!(!v.is_int32());
        assert!(v.is_double());
    }
}

#[test]
fn test_tag_space_classification() {
    // Every combination of word bits 46..=51 (the discriminating tag bits),
    // the sign bit, a few fillers for the rest of the tag and a few payloads.
    // Whatever checked() accepts must classify consistently.
    for high in 0u64..(1 << 6) {
        for sign in [0u64, 1 << 63] {
            for filler in [0u64, 1 << 32, 0x2AAA << 32] {
                for payload in [0u64, 1, 0xFFFF_FFFF] {
                    let raw = sign | (high << 46) | filler | payload;
                    assert_eq!(raw & EXPONENT_MASK, 0);
                    let Ok(v) = StaticValue::checked(raw) else {
                        continue;
                    };
                    assert!(exactly_one_predicate(v), "0x{:016x}", raw);
                    let ty = v.value_type();
                    match ty {
                        ValueType::Double => assert!(v.is_double()),
                        ValueType::Managed => assert!(v.is_managed()),
                        ValueType::Undefined => assert_eq!(raw, 0),
                        ValueType::Empty => assert!(v.is_empty()),
                        ValueType::Null => assert!(v.is_null()),
                        ValueType::Boolean => assert!(v.is_boolean()),
                        ValueType::Integer => assert!(v.is_integer()),
                    }
                    let typed: TypedValue = v.into();
                    assert_eq!(typed.value_type(), ty);
                }
            }
        }
    }
}

#[test]
fn test_is_number_matches_type() {
    let samples = [
        StaticValue::from_int32(1),
        StaticValue::from_double(1.5),
        StaticValue::from_double(f64::NAN),
        StaticValue::from_boolean(true),
        StaticValue::null_value(),
        StaticValue::empty_value(),
        StaticValue::undefined_value(),
        StaticValue::from_managed_address(0x40),
    ];
    for v in samples {
        let expected = matches!(v.value_type(), ValueType::Integer | ValueType::Double);
        assert_eq!(v.is_number(), expected, "{:?}", v);
    }
}

fn random_pointer_round_trip<L: PointerLayout>(seed: u64) {
    let mut rng = Rng(seed);
    for _ in 0..100_000 {
        let address = rng.next() & L::ADDRESS_MASK;
        let word = encode_pointer::<L>(address);
        assert_eq!(word & MANAGED_MASK, 0, "{} 0x{:016x}", L::NAME, address);
        assert_eq!(decode_pointer::<L>(word), address, "{}", L::NAME);

        let v = StaticValue::from_returned_value(word);
        if address == 0 {
            assert!(v.is_undefined());
        } else {
            assert!(v.is_managed());
            assert!(exactly_one_predicate(v));
        }
    }
}

#[test]
fn test_pointer_round_trip_every_layout() {
    random_pointer_round_trip::<Flat>(1);
    random_pointer_round_trip::<Ia64>(2);
    random_pointer_round_trip::<Sparc64>(3);
    random_pointer_round_trip::<FiveLevelPaging>(4);
    random_pointer_round_trip::<Arm64TopByte>(5);
}

#[test]
fn test_typed_round_trip_through_json() {
    let values = [
        StaticValue::undefined_value(),
        StaticValue::null_value(),
        StaticValue::empty_value(),
        StaticValue::from_boolean(false),
        StaticValue::from_int32(i32::MIN),
        StaticValue::from_double(-1234.5),
    ];
    for v in values {
        let json = serde_json::to_string(&v.decode()).unwrap();
        let back: TypedValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.encode(), v);
    }
}
