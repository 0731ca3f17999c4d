//! StaticValue: the 8-byte tagged value word
//!
//! Every runtime value of the interpreter (undefined, null, boolean, int32,
//! double, empty hole or heap pointer) is one `u64`. See [`crate::layout`]
//! for the bit layout and [`crate::pointer`] for how heap pointers are
//! folded into the word.
//!
//! The type is trivially copyable and carries no synchronization. Mutating
//! methods (`set_double`, `set_int_32`, `is_int32`, `try_integer_conversion`)
//! are plain read-modify-write on the word.
//!
//! Typed accessors have preconditions (e.g. `double_value` needs `is_double`).
//! They are checked with `debug_assert!` only; breaking them in release
//! builds yields a meaningless result, never undefined behavior.

use crate::coercion;
use crate::error::EncodeError;
use crate::layout::{
    DOUBLE_DISCRIMINATOR, DOUBLE_MASK, ENCODE_MASK, IS_INTEGER_CONVERTIBLE_SHIFT,
    IS_INTEGER_CONVERTIBLE_VALUE, IS_INTEGER_OR_BOOL_SHIFT, IS_INTEGER_OR_BOOL_VALUE,
    MANAGED_MASK, NUMBER_DISCRIMINATOR, NUMBER_MASK, QuickType, TAG_SHIFT, TagBit, ValueType,
};
use crate::pointer::{self, NativeLayout, PointerLayout};

/// A value in the form runtime functions return it: one register-sized word
pub type ReturnedValue = u64;

/// An 8-byte NaN-boxed value
///
/// `StaticValue::default()` is the all-zero word, which is `undefined`, so
/// zero-initialized storage needs no further setup.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StaticValue(u64);

const _: () = assert!(std::mem::size_of::<StaticValue>() == 8);

const EMPTY_TAG: u32 = QuickType::Empty as u32;
const NULL_TAG: u32 = QuickType::Null as u32;
const BOOLEAN_TAG: u32 = QuickType::Boolean as u32;
const INTEGER_TAG: u32 = QuickType::Integer as u32;

impl StaticValue {
    // =========================================================================
    // Raw Word
    // =========================================================================

    #[inline(always)]
    pub const fn raw_value(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub fn set_raw_value(&mut self, raw: u64) {
        self.0 = raw;
    }

    /// Build a full word from a tag and a 32-bit payload
    #[inline(always)]
    pub const fn tag_value(tag: u32, value: u32) -> u64 {
        ((tag as u64) << TAG_SHIFT) | value as u64
    }

    #[inline(always)]
    pub fn set_tag_value(&mut self, tag: u32, value: u32) {
        self.0 = Self::tag_value(tag, value);
    }

    /// Lower 32 bits
    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0 as u32
    }

    /// Upper 32 bits
    #[inline(always)]
    pub const fn tag(self) -> u32 {
        (self.0 >> TAG_SHIFT) as u32
    }

    #[inline(always)]
    pub fn set_tag(&mut self, tag: u32) {
        self.set_tag_value(tag, self.value());
    }

    /// The tag word, for comparison against [`QuickType`]s
    #[inline(always)]
    pub const fn quick_type(self) -> u64 {
        self.0 >> TAG_SHIFT
    }

    #[inline(always)]
    pub const fn int_32(self) -> i32 {
        self.value() as i32
    }

    #[inline(always)]
    pub fn set_int_32(&mut self, i: i32) {
        self.set_tag_value(INTEGER_TAG, i as u32);
    }

    #[inline(always)]
    pub const fn uint_32(self) -> u32 {
        self.value()
    }

    #[inline(always)]
    pub fn set_empty(&mut self) {
        self.set_tag_value(EMPTY_TAG, 0);
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify the word.
    ///
    /// One masked comparison settles doubles, a second settles
    /// managed/undefined, and only then is the tag field inspected.
    #[inline]
    pub fn value_type(self) -> ValueType {
        let masked = self.0 & DOUBLE_MASK;
        if masked >= DOUBLE_DISCRIMINATOR {
            return ValueType::Double;
        }

        // Any exponent bit, or Special together with Unmanaged, was caught
        // above. Neither bit, or only Special, means managed. Only Unmanaged
        // means one of the four tagged types.
        if masked != TagBit::Unmanaged.word_mask() {
            debug_assert_eq!(self.0 & TagBit::Unmanaged.word_mask(), 0);
            return if self.is_undefined() {
                ValueType::Undefined
            } else {
                ValueType::Managed
            };
        }

        match self.tag() {
            EMPTY_TAG => ValueType::Empty,
            NULL_TAG => ValueType::Null,
            BOOLEAN_TAG => ValueType::Boolean,
            INTEGER_TAG => ValueType::Integer,
            tag => {
                debug_assert!(false, "unmanaged word with unknown tag 0x{:08x}", tag);
                ValueType::Empty
            }
        }
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.tag() == EMPTY_TAG
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self.tag() == NULL_TAG
    }

    #[inline(always)]
    pub fn is_boolean(self) -> bool {
        self.tag() == BOOLEAN_TAG
    }

    #[inline(always)]
    pub fn is_integer(self) -> bool {
        self.tag() == INTEGER_TAG
    }

    #[inline(always)]
    pub fn is_null_or_undefined(self) -> bool {
        self.is_null() || self.is_undefined()
    }

    #[inline(always)]
    pub fn is_undefined(self) -> bool {
        self.0 == 0
    }

    /// True for every stored double, including NaN and the infinities.
    ///
    /// If any of the flipped exponent bits is set the masked word is above
    /// the discriminator. If none is set, the word is a special double only
    /// when both Unmanaged and Special are set.
    #[inline(always)]
    pub fn is_double(self) -> bool {
        (self.0 & DOUBLE_MASK) >= DOUBLE_DISCRIMINATOR
    }

    /// True for doubles and integers
    #[inline(always)]
    pub fn is_number(self) -> bool {
        (self.0 & NUMBER_MASK) >= NUMBER_DISCRIMINATOR
    }

    #[inline(always)]
    pub fn is_managed_or_undefined(self) -> bool {
        (self.0 & MANAGED_MASK) == 0
    }

    #[inline(always)]
    pub fn is_managed(self) -> bool {
        self.is_managed_or_undefined() && !self.is_undefined()
    }

    /// Boolean or integer
    #[inline(always)]
    pub fn is_int_or_bool(self) -> bool {
        (self.0 >> IS_INTEGER_OR_BOOL_SHIFT) == IS_INTEGER_OR_BOOL_VALUE
    }

    /// Null, boolean or integer: the 32-bit payload is the numeric value
    #[inline(always)]
    pub fn integer_compatible(self) -> bool {
        debug_assert!(!self.is_empty());
        (self.0 >> IS_INTEGER_CONVERTIBLE_SHIFT) == IS_INTEGER_CONVERTIBLE_VALUE
    }

    #[inline(always)]
    pub fn both_integer_compatible(a: StaticValue, b: StaticValue) -> bool {
        a.integer_compatible() && b.integer_compatible()
    }

    #[inline(always)]
    pub fn both_double(a: StaticValue, b: StaticValue) -> bool {
        a.is_double() && b.is_double()
    }

    #[inline]
    pub fn is_nan(self) -> bool {
        let tag = self.tag();
        tag == QuickType::NaN as u32 || tag == QuickType::MinusNaN as u32
    }

    #[inline]
    pub fn is_positive_int(self) -> bool {
        self.is_integer() && self.int_32() >= 0
    }

    // =========================================================================
    // Doubles and Integers
    // =========================================================================

    #[inline(always)]
    pub fn double_value(self) -> f64 {
        debug_assert!(self.is_double(), "double_value() called on {:?}", self);
        f64::from_bits(self.0 ^ ENCODE_MASK)
    }

    /// Store a double.
    ///
    /// NaN payload bits share space with the type tags, so every NaN is
    /// collapsed to [`QuickType::NaN`] or [`QuickType::MinusNaN`] depending
    /// on its sign.
    #[inline(always)]
    pub fn set_double(&mut self, d: f64) {
        if d.is_nan() {
            self.0 = if d.is_sign_negative() {
                QuickType::MinusNaN.word()
            } else {
                QuickType::NaN.word()
            };
            debug_assert!(self.is_nan());
        } else {
            self.0 = d.to_bits() ^ ENCODE_MASK;
        }
        debug_assert!(self.is_double());
    }

    /// True if the value is an integer, or a double holding an exact int32.
    ///
    /// A double that qualifies is rewritten in place to the integer encoding,
    /// so the next call takes the fast path. Negative zero never qualifies.
    #[inline]
    pub fn is_int32(&mut self) -> bool {
        if self.tag() == INTEGER_TAG {
            return true;
        }
        if self.is_double() {
            let d = self.double_value();
            if coercion::is_int32(d) {
                self.set_int_32(d as i32);
                return true;
            }
        }
        false
    }

    /// Static form of the int32 test, see [`coercion::is_int32`]
    #[inline(always)]
    pub fn double_is_int32(d: f64) -> bool {
        coercion::is_int32(d)
    }

    /// Numeric value of an integer or double
    #[inline]
    pub fn as_double(self) -> f64 {
        if self.tag() == INTEGER_TAG {
            return self.int_32() as f64;
        }
        self.double_value()
    }

    #[inline(always)]
    pub fn boolean_value(self) -> bool {
        self.int_32() != 0
    }

    #[inline(always)]
    pub fn integer_value(self) -> i32 {
        self.int_32()
    }

    /// Retag null/boolean/integer as an integer with the same payload.
    #[inline]
    pub fn try_integer_conversion(&mut self) -> bool {
        let ok = self.integer_compatible();
        if ok {
            self.set_tag_value(INTEGER_TAG, self.value());
        }
        ok
    }

    // =========================================================================
    // Coercions
    // =========================================================================

    /// ECMAScript `ToBoolean` for the non-object cases.
    ///
    /// Managed values and undefined read as false here; object truthiness is
    /// the caller's business. The empty hole also reads as false.
    #[inline]
    pub fn to_boolean(self) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.integer_compatible() {
            return self.int_32() != 0;
        }
        if self.is_managed_or_undefined() {
            return false;
        }
        let d = self.double_value();
        d != 0.0 && !d.is_nan()
    }

    /// ECMAScript `ToInt32` for the non-object cases.
    #[inline]
    pub fn to_int32(self) -> i32 {
        match self.value_type() {
            ValueType::Null | ValueType::Boolean | ValueType::Integer => self.int_32(),
            ValueType::Double => coercion::to_int32(self.double_value()),
            // Coercing NaN to int gives 0
            ValueType::Empty | ValueType::Undefined | ValueType::Managed => 0,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[inline(always)]
    pub const fn as_returned_value(self) -> ReturnedValue {
        self.0
    }

    #[inline(always)]
    pub const fn from_returned_value(val: ReturnedValue) -> Self {
        StaticValue(val)
    }

    #[inline(always)]
    pub const fn empty_value() -> Self {
        StaticValue(Self::tag_value(EMPTY_TAG, 0))
    }

    #[inline(always)]
    pub const fn from_boolean(b: bool) -> Self {
        StaticValue(Self::tag_value(BOOLEAN_TAG, b as u32))
    }

    #[inline(always)]
    pub const fn from_int32(i: i32) -> Self {
        StaticValue(Self::tag_value(INTEGER_TAG, i as u32))
    }

    #[inline(always)]
    pub const fn undefined_value() -> Self {
        StaticValue(0)
    }

    #[inline(always)]
    pub const fn null_value() -> Self {
        StaticValue(Self::tag_value(NULL_TAG, 0))
    }

    #[inline(always)]
    pub fn from_double(d: f64) -> Self {
        let mut v = StaticValue::default();
        v.set_double(d);
        v
    }

    /// Integers below `i32::MAX` are stored as integers, the rest as doubles.
    #[inline]
    pub fn from_uint32(i: u32) -> Self {
        if i < i32::MAX as u32 {
            StaticValue(Self::tag_value(INTEGER_TAG, i))
        } else {
            Self::from_double(i as f64)
        }
    }

    /// Validate a word coming from outside the runtime.
    ///
    /// Accepts exactly the patterns the constructors produce: any managed
    /// word, any non-NaN double, the two canonical NaNs, and the four tagged
    /// types with a well-formed payload.
    pub fn checked(raw: u64) -> Result<Self, EncodeError> {
        let v = StaticValue(raw);
        if v.is_double() {
            let exponent_clear = raw & crate::layout::EXPONENT_MASK == 0;
            if !exponent_clear {
                return Ok(v);
            }
            // Special double: only the infinities and canonical NaNs exist
            return match QuickType::from_tag(v.tag()) {
                Some(
                    QuickType::PlusInf
                    | QuickType::MinusInf
                    | QuickType::NaN
                    | QuickType::MinusNaN,
                ) if v.value() == 0 => Ok(v),
                _ => Err(EncodeError::InvalidWord(raw)),
            };
        }
        if v.is_managed_or_undefined() {
            return Ok(v);
        }
        let well_formed = match v.tag() {
            EMPTY_TAG | NULL_TAG => v.value() == 0,
            BOOLEAN_TAG => v.value() <= 1,
            INTEGER_TAG => true,
            _ => false,
        };
        if well_formed {
            Ok(v)
        } else {
            Err(EncodeError::InvalidWord(raw))
        }
    }

    // =========================================================================
    // Heap Pointers
    // =========================================================================
    //
    // A value holding a heap pointer is not really static, but setting and
    // retrieving it lives here so that the whole encoding is in one place.

    /// Heap address of a managed value (0 for undefined)
    #[cfg(target_pointer_width = "64")]
    #[inline(always)]
    pub fn managed_address(self) -> u64 {
        debug_assert_eq!(self.0 & MANAGED_MASK, 0, "managed_address() on {:?}", self);
        pointer::decode_pointer::<NativeLayout>(self.0)
    }

    #[cfg(target_pointer_width = "32")]
    #[inline(always)]
    pub fn managed_address(self) -> u64 {
        self.value() as u64
    }

    /// Managed value from a heap address (0 gives undefined)
    #[cfg(target_pointer_width = "64")]
    #[inline(always)]
    pub fn from_managed_address(address: u64) -> Self {
        debug_assert_eq!(address & crate::layout::LOWER5_MASK, 0, "heap pointers are 32-byte aligned");
        StaticValue(pointer::encode_pointer::<NativeLayout>(address))
    }

    #[cfg(target_pointer_width = "32")]
    #[inline(always)]
    pub fn from_managed_address(address: u64) -> Self {
        StaticValue(Self::tag_value(QuickType::Managed as u32, address as u32))
    }

    /// The heap pointer of a managed value
    #[inline(always)]
    pub fn m<T>(self) -> *mut T {
        self.managed_address() as usize as *mut T
    }

    /// Store a heap pointer. The pointer must be 32-byte aligned.
    #[inline(always)]
    pub fn set_m<T>(&mut self, ptr: *const T) {
        *self = Self::from_managed_address(ptr as usize as u64);
    }

    /// `m` with an explicit pointer layout
    #[inline(always)]
    pub fn m_with<L: PointerLayout, T>(self) -> *mut T {
        debug_assert_eq!(self.0 & MANAGED_MASK, 0, "m_with() on {:?}", self);
        pointer::decode_pointer::<L>(self.0) as usize as *mut T
    }

    /// `set_m` with an explicit pointer layout
    #[inline(always)]
    pub fn set_m_with<L: PointerLayout, T>(&mut self, ptr: *const T) {
        let address = ptr as usize as u64;
        debug_assert!(
            pointer::is_encodable::<L>(address),
            "0x{:016x} not encodable with {}",
            address,
            L::NAME
        );
        self.0 = pointer::encode_pointer::<L>(address);
    }

    /// Checked `set_m` for pointers handed over from foreign allocators.
    pub fn try_set_m<T>(&mut self, ptr: *const T) -> Result<(), EncodeError> {
        let address = ptr as usize as u64;
        if address & crate::layout::LOWER5_MASK != 0 {
            return Err(EncodeError::Misaligned { address });
        }
        if cfg!(target_pointer_width = "64") && !pointer::is_encodable::<NativeLayout>(address) {
            return Err(EncodeError::OutOfReach {
                address,
                layout: NativeLayout::NAME,
            });
        }
        self.set_m(ptr);
        Ok(())
    }
}

impl From<StaticValue> for ReturnedValue {
    fn from(v: StaticValue) -> Self {
        v.as_returned_value()
    }
}

impl std::fmt::Debug for StaticValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_double() {
            return write!(f, "Double({:?})", self.double_value());
        }
        if self.is_undefined() {
            return write!(f, "Undefined");
        }
        if self.is_managed_or_undefined() {
            return write!(f, "Managed(0x{:016x})", self.0);
        }
        match self.tag() {
            EMPTY_TAG => write!(f, "Empty"),
            NULL_TAG => write!(f, "Null"),
            BOOLEAN_TAG => write!(f, "Boolean({})", self.boolean_value()),
            INTEGER_TAG => write!(f, "Integer({})", self.int_32()),
            _ => write!(f, "Invalid(0x{:016x})", self.0),
        }
    }
}
