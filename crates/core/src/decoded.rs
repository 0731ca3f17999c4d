//! Decoded view of a StaticValue
//!
//! `TypedValue` is the enum an outside observer wants to look at: no bit
//! tricks, serializable with serde. Managed values carry the heap address
//! only; what lives there belongs to the runtime.

use crate::layout::ValueType;
use crate::value::StaticValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypedValue {
    Undefined,
    Null,
    Empty,
    Boolean(bool),
    Integer(i32),
    Double(f64),
    Managed(u64),
}

impl TypedValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            TypedValue::Undefined => ValueType::Undefined,
            TypedValue::Null => ValueType::Null,
            TypedValue::Empty => ValueType::Empty,
            TypedValue::Boolean(_) => ValueType::Boolean,
            TypedValue::Integer(_) => ValueType::Integer,
            TypedValue::Double(_) => ValueType::Double,
            TypedValue::Managed(_) => ValueType::Managed,
        }
    }

    /// Encode back into a word. `Managed(0)` encodes as undefined.
    pub fn encode(&self) -> StaticValue {
        match *self {
            TypedValue::Undefined => StaticValue::undefined_value(),
            TypedValue::Null => StaticValue::null_value(),
            TypedValue::Empty => StaticValue::empty_value(),
            TypedValue::Boolean(b) => StaticValue::from_boolean(b),
            TypedValue::Integer(i) => StaticValue::from_int32(i),
            TypedValue::Double(d) => StaticValue::from_double(d),
            TypedValue::Managed(address) => StaticValue::from_managed_address(address),
        }
    }
}

impl StaticValue {
    pub fn decode(self) -> TypedValue {
        match self.value_type() {
            ValueType::Undefined => TypedValue::Undefined,
            ValueType::Null => TypedValue::Null,
            ValueType::Empty => TypedValue::Empty,
            ValueType::Boolean => TypedValue::Boolean(self.boolean_value()),
            ValueType::Integer => TypedValue::Integer(self.integer_value()),
            ValueType::Double => TypedValue::Double(self.double_value()),
            ValueType::Managed => TypedValue::Managed(self.managed_address()),
        }
    }
}

impl From<StaticValue> for TypedValue {
    fn from(v: StaticValue) -> Self {
        v.decode()
    }
}

impl From<TypedValue> for StaticValue {
    fn from(v: TypedValue) -> Self {
        v.encode()
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Undefined => write!(f, "undefined"),
            TypedValue::Null => write!(f, "null"),
            TypedValue::Empty => write!(f, "<empty>"),
            TypedValue::Boolean(b) => write!(f, "{}", b),
            TypedValue::Integer(i) => write!(f, "{}", i),
            TypedValue::Double(d) if d.is_nan() => write!(f, "NaN"),
            TypedValue::Double(d) if d.is_infinite() => {
                write!(f, "{}Infinity", if *d < 0.0 { "-" } else { "" })
            }
            TypedValue::Double(d) => write!(f, "{:?}", d),
            TypedValue::Managed(address) => write!(f, "<managed 0x{:x}>", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(StaticValue::default().decode(), TypedValue::Undefined);
        assert_eq!(StaticValue::null_value().decode(), TypedValue::Null);
        assert_eq!(StaticValue::empty_value().decode(), TypedValue::Empty);
        assert_eq!(
            StaticValue::from_boolean(true).decode(),
            TypedValue::Boolean(true)
        );
        assert_eq!(
            StaticValue::from_int32(-8).decode(),
            TypedValue::Integer(-8)
        );
        assert_eq!(
            StaticValue::from_double(0.25).decode(),
            TypedValue::Double(0.25)
        );
        assert_eq!(
            StaticValue::from_managed_address(0x2000).decode(),
            TypedValue::Managed(0x2000)
        );
    }

    #[test]
    fn test_encode_matches_constructors() {
        assert_eq!(TypedValue::Integer(5).encode(), StaticValue::from_int32(5));
        assert_eq!(TypedValue::Managed(0).encode(), StaticValue::undefined_value());
        assert!(TypedValue::Double(f64::NAN).encode().is_nan());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypedValue::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(TypedValue::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(TypedValue::Double(1.0).to_string(), "1.0");
        assert_eq!(TypedValue::Empty.to_string(), "<empty>");
        assert_eq!(TypedValue::Managed(0x40).to_string(), "<managed 0x40>");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&TypedValue::Integer(3)).unwrap();
        assert_eq!(json, r#"{"integer":3}"#);
        let back: TypedValue = serde_json::from_str(r#""null""#).unwrap();
        assert_eq!(back, TypedValue::Null);
    }
}
