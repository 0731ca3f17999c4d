//! Bit Layout of a StaticValue
//!
//! A value is one 64-bit word. A "special" double has all eleven exponent
//! bits set (NaN, +Inf, -Inf). Doubles are stored XOR-ed with
//! [`ENCODE_MASK`], which moves every special double into a region where all
//! exponent bits read as zero. That region is then shared with the non-double
//! values, and bit 48 (the "unmanaged" bit) tells managed pointers apart from
//! everything else.
//!
//! ## Word Layout
//!
//! ```text
//!   0 = always 0, 1 = always 1, x = stored value,
//!   y = stored value shifted to a different position,
//!   a = xor-ed bits with at least one bit set, b = xor-ed bits
//!
//!   63      56 55      48 47      40 39      32 31                      0
//!   00000000 00000000 00000000 00000000 00000000 ... 00000000   Undefined
//!   y0000000 0000yyy0 xxxxxxxx xxxxxxxx xxxxxxxx ... xxxyyyyy   Managed
//!   00000000 00001101 01000000 00000000 00000000 ... 00000000   NaN
//!   00000000 00000101 01000000 00000000 00000000 ... 00000000   +Inf
//!   10000000 00000101 01000000 00000000 00000000 ... 00000000   -Inf
//!   xaaaaaaa aaaaxbxb bxxxxxxx xxxxxxxx xxxxxxxx ... xxxxxxxx   Double
//!   00000000 00000001 00000000 00000000 00000000 ... 00000000   Empty
//!   00000000 00000011 00000000 00000000 00000000 ... 00000000   Null
//!   00000000 00000011 10000000 00000000 00000000 ... 0000000x   Bool
//!   00000000 00000011 11000000 00000000 xxxxxxxx ... xxxxxxxx   Int
//! ```
//!
//! Bits 51..46 of the word are, from high to low: special QNaN, special,
//! integer compatible, unmanaged, int-or-bool, number. Bit 63 is the double
//! sign and doubles as the "negative" flag for special doubles.

// =============================================================================
// Tag Word
// =============================================================================

/// The tag is the upper 32 bits of the word.
pub const TAG_SHIFT: u32 = 32;

/// Individual bits of the tag word
///
/// ```text
/// s: sign bit
/// e: double exponent bit
/// u: upper 3 bits if managed
/// m: bit 48, denotes "unmanaged" if 1
/// p: significant pointer bits (some re-used for non-managed)
///                  seeeeeeeeeeeuuumpppp
/// ```
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagBit {
    SpecialNegative = 0b1000_0000_0000_0000_0000 << 12,
    SpecialQNaN = 0b0000_0000_0000_1000_0000 << 12,
    Special = 0b0000_0000_0000_0100_0000 << 12,
    IntCompat = 0b0000_0000_0000_0010_0000 << 12,
    Unmanaged = 0b0000_0000_0000_0001_0000 << 12,
    IntOrBool = 0b0000_0000_0000_0000_1000 << 12,
    Number = 0b0000_0000_0000_0000_0100 << 12,
}

impl TagBit {
    /// The tag bit, positioned within the full 64-bit word
    #[inline(always)]
    pub const fn word_mask(self) -> u64 {
        (self as u64) << TAG_SHIFT
    }
}

/// Coarse classification returned by `StaticValue::value_type`.
///
/// Managed, Double and Undefined are not directly encoded in the tag; the
/// other four are the literal tag words of their encodings.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Managed = 0,
    Double = 1,
    Undefined = 2,
    Empty = TagBit::Unmanaged as u32,
    Null = TagBit::Unmanaged as u32 | TagBit::IntCompat as u32,
    Boolean = TagBit::Unmanaged as u32 | TagBit::IntCompat as u32 | TagBit::IntOrBool as u32,
    Integer = TagBit::Unmanaged as u32
        | TagBit::IntCompat as u32
        | TagBit::IntOrBool as u32
        | TagBit::Number as u32,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Managed => "managed",
            ValueType::Double => "double",
            ValueType::Undefined => "undefined",
            ValueType::Empty => "empty",
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tag words that can be identified by looking at the upper 4 bytes alone.
///
/// Managed takes precedence over all others: other bits may be set if the
/// value is managed, but since every other quick type includes the Unmanaged
/// bit they can still be checked with plain equality. Tags not listed here
/// are ordinary doubles.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickType {
    Managed = ValueType::Managed as u32,
    Empty = ValueType::Empty as u32,
    Null = ValueType::Null as u32,
    Boolean = ValueType::Boolean as u32,
    Integer = ValueType::Integer as u32,
    PlusInf = PLUS_INF_TAG,
    MinusInf = PLUS_INF_TAG | TagBit::SpecialNegative as u32,
    NaN = NAN_TAG,
    /// Produced by negating a NaN
    MinusNaN = NAN_TAG | TagBit::SpecialNegative as u32,
}

const PLUS_INF_TAG: u32 = TagBit::Number as u32 | TagBit::Special as u32 | TagBit::Unmanaged as u32;
const NAN_TAG: u32 = PLUS_INF_TAG | TagBit::SpecialQNaN as u32;

impl QuickType {
    /// Identify a tag word, if it is one of the quick types
    pub fn from_tag(tag: u32) -> Option<QuickType> {
        const MANAGED: u32 = QuickType::Managed as u32;
        const EMPTY: u32 = QuickType::Empty as u32;
        const NULL: u32 = QuickType::Null as u32;
        const BOOLEAN: u32 = QuickType::Boolean as u32;
        const INTEGER: u32 = QuickType::Integer as u32;
        const PLUS_INF: u32 = QuickType::PlusInf as u32;
        const MINUS_INF: u32 = QuickType::MinusInf as u32;
        const NAN: u32 = QuickType::NaN as u32;
        const MINUS_NAN: u32 = QuickType::MinusNaN as u32;

        match tag {
            MANAGED => Some(QuickType::Managed),
            EMPTY => Some(QuickType::Empty),
            NULL => Some(QuickType::Null),
            BOOLEAN => Some(QuickType::Boolean),
            INTEGER => Some(QuickType::Integer),
            PLUS_INF => Some(QuickType::PlusInf),
            MINUS_INF => Some(QuickType::MinusInf),
            NAN => Some(QuickType::NaN),
            MINUS_NAN => Some(QuickType::MinusNaN),
            _ => None,
        }
    }

    /// The full 64-bit word for this tag with a zero payload
    #[inline(always)]
    pub const fn word(self) -> u64 {
        (self as u64) << TAG_SHIFT
    }
}

// =============================================================================
// Word Masks
// =============================================================================

/// `word >> 48 == 3` for Null, Boolean and Integer
pub const IS_INTEGER_CONVERTIBLE_SHIFT: u32 = 48;
pub const IS_INTEGER_CONVERTIBLE_VALUE: u64 = 3;

/// `word >> 47 == 7` for Boolean and Integer
pub const IS_INTEGER_OR_BOOL_SHIFT: u32 = 47;
pub const IS_INTEGER_OR_BOOL_VALUE: u64 = 7;

const _: () = assert!(
    IS_INTEGER_CONVERTIBLE_VALUE
        == ((TagBit::IntCompat as u64 | TagBit::Unmanaged as u64)
            >> (IS_INTEGER_CONVERTIBLE_SHIFT - TAG_SHIFT))
);

const _: () = assert!(
    IS_INTEGER_OR_BOOL_VALUE
        == ((TagBit::IntOrBool as u64 | TagBit::IntCompat as u64 | TagBit::Unmanaged as u64)
            >> (IS_INTEGER_OR_BOOL_SHIFT - TAG_SHIFT))
);

/// The eleven IEEE 754 exponent bits
pub const EXPONENT_MASK: u64 = 0b0111_1111_1111_0000 << 48;

/// Pointer fragments that do not fit in the 48 verbatim pointer bits
pub const TOP1_MASK: u64 = 0b1000_0000_0000_0000 << 48;
pub const UPPER3_MASK: u64 = 0b0000_0000_0000_1110 << 48;
pub const LOWER5_MASK: u64 = 0b0000_0000_0001_1111;

/// All zero for managed values (and undefined)
pub const MANAGED_MASK: u64 = EXPONENT_MASK | TagBit::Unmanaged.word_mask();
pub const DOUBLE_MASK: u64 = MANAGED_MASK | TagBit::Special.word_mask();
pub const NUMBER_MASK: u64 = MANAGED_MASK | TagBit::Number.word_mask();
pub const INT_OR_BOOL_MASK: u64 = MANAGED_MASK | TagBit::IntOrBool.word_mask();
pub const INT_COMPAT_MASK: u64 = MANAGED_MASK | TagBit::IntCompat.word_mask();

/// XOR-ed into the IEEE 754 bits of every stored double
pub const ENCODE_MASK: u64 = DOUBLE_MASK | NUMBER_MASK;

/// `word & DOUBLE_MASK` is at least this for every double
pub const DOUBLE_DISCRIMINATOR: u64 =
    TagBit::Unmanaged.word_mask() | TagBit::Special.word_mask();

/// `word & NUMBER_MASK` is at least this for every double and integer
pub const NUMBER_DISCRIMINATOR: u64 = TagBit::Unmanaged.word_mask() | TagBit::Number.word_mask();

// The pointer fragments must never overlap the bits that classify a word.
const _: () = assert!(UPPER3_MASK & MANAGED_MASK == 0);
const _: () = assert!(TOP1_MASK & MANAGED_MASK == 0);
const _: () = assert!(LOWER5_MASK & MANAGED_MASK == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_values() {
        assert_eq!(EXPONENT_MASK, 0x7FF0_0000_0000_0000);
        assert_eq!(MANAGED_MASK, 0x7FF1_0000_0000_0000);
        assert_eq!(DOUBLE_MASK, 0x7FF5_0000_0000_0000);
        assert_eq!(NUMBER_MASK, 0x7FF1_4000_0000_0000);
        assert_eq!(ENCODE_MASK, 0x7FF5_4000_0000_0000);
        assert_eq!(DOUBLE_DISCRIMINATOR, 0x0005_0000_0000_0000);
        assert_eq!(NUMBER_DISCRIMINATOR, 0x0001_4000_0000_0000);
    }

    #[test]
    fn test_quick_type_words() {
        assert_eq!(QuickType::Empty.word(), 0x0001_0000_0000_0000);
        assert_eq!(QuickType::Null.word(), 0x0003_0000_0000_0000);
        assert_eq!(QuickType::Boolean.word(), 0x0003_8000_0000_0000);
        assert_eq!(QuickType::Integer.word(), 0x0003_C000_0000_0000);
        assert_eq!(QuickType::PlusInf.word(), 0x0005_4000_0000_0000);
        assert_eq!(QuickType::MinusInf.word(), 0x8005_4000_0000_0000);
        assert_eq!(QuickType::NaN.word(), 0x000D_4000_0000_0000);
        assert_eq!(QuickType::MinusNaN.word(), 0x800D_4000_0000_0000);
    }

    #[test]
    fn test_special_doubles_xor_into_quick_types() {
        let tag = |d: f64| ((d.to_bits() ^ ENCODE_MASK) >> TAG_SHIFT) as u32;
        assert_eq!(QuickType::from_tag(tag(f64::INFINITY)), Some(QuickType::PlusInf));
        assert_eq!(
            QuickType::from_tag(tag(f64::NEG_INFINITY)),
            Some(QuickType::MinusInf)
        );
        assert_eq!(
            QuickType::from_tag(tag(f64::from_bits(0x7FF8_0000_0000_0000))),
            Some(QuickType::NaN)
        );
    }

    #[test]
    fn test_from_tag_rejects_double_tags() {
        let one = ((1.0f64.to_bits() ^ ENCODE_MASK) >> TAG_SHIFT) as u32;
        assert_eq!(QuickType::from_tag(one), None);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::Integer.to_string(), "integer");
        assert_eq!(ValueType::Undefined.name(), "undefined");
    }
}
