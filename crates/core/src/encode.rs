//! Encode: build a `ReturnedValue` from native values
//!
//! Runtime functions return values as a bare `u64` so that they come back in
//! a register on every ABI. `Encode` is the short way to produce one:
//!
//! ```
//! use nanval_core::{Encode, ReturnedValue, StaticValue};
//!
//! let r: ReturnedValue = Encode::from(42).into();
//! assert!(StaticValue::from_returned_value(r).is_integer());
//! ```

use crate::value::{ReturnedValue, StaticValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encode(ReturnedValue);

impl Encode {
    pub const fn undefined() -> ReturnedValue {
        StaticValue::undefined_value().as_returned_value()
    }

    pub const fn null() -> ReturnedValue {
        StaticValue::null_value().as_returned_value()
    }

    /// Encode a number as an integer when it is an exact int32, else as a double
    pub fn smallest_number(d: f64) -> ReturnedValue {
        if StaticValue::double_is_int32(d) {
            Encode::from(d as i32).into()
        } else {
            Encode::from(d).into()
        }
    }

    pub const fn raw(v: ReturnedValue) -> Self {
        Encode(v)
    }

    /// Encode a heap pointer (must be 32-byte aligned)
    pub fn managed<T>(ptr: *const T) -> Self {
        let mut v = StaticValue::default();
        v.set_m(ptr);
        Encode(v.as_returned_value())
    }

    pub const fn value(self) -> ReturnedValue {
        self.0
    }
}

impl From<bool> for Encode {
    fn from(b: bool) -> Self {
        Encode(StaticValue::from_boolean(b).as_returned_value())
    }
}

impl From<i32> for Encode {
    fn from(i: i32) -> Self {
        Encode(StaticValue::from_int32(i).as_returned_value())
    }
}

impl From<u32> for Encode {
    fn from(i: u32) -> Self {
        Encode(StaticValue::from_uint32(i).as_returned_value())
    }
}

impl From<f64> for Encode {
    fn from(d: f64) -> Self {
        Encode(StaticValue::from_double(d).as_returned_value())
    }
}

impl From<StaticValue> for Encode {
    fn from(v: StaticValue) -> Self {
        Encode(v.as_returned_value())
    }
}

impl From<Encode> for ReturnedValue {
    fn from(e: Encode) -> Self {
        e.0
    }
}

impl From<Encode> for StaticValue {
    fn from(e: Encode) -> Self {
        StaticValue::from_returned_value(e.0)
    }
}
