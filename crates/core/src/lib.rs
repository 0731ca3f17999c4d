//! nanval Core: the 8-byte tagged value word of the interpreter
//!
//! Every value an interpreter register or heap slot can hold (undefined,
//! null, boolean, int32, double, empty array hole, pointer to a
//! garbage-collected object) is NaN-boxed into a single `u64`.
//!
//! # Modules
//!
//! - `layout`: tag bits, masks and discriminators of the word
//! - `value`: `StaticValue`, classification, accessors and constructors
//! - `pointer`: platform pointer layouts and pointer bit movement
//! - `coercion`: ECMAScript `ToInt32` and friends on plain doubles
//! - `encode`: `Encode`, the shorthand for building a `ReturnedValue`
//! - `decoded`: `TypedValue`, a serializable decoded view
//! - `error`: errors of the checked entry points

pub mod coercion;
pub mod decoded;
pub mod encode;
pub mod error;
pub mod layout;
pub mod pointer;
pub mod value;

pub use decoded::TypedValue;
pub use encode::Encode;
pub use error::EncodeError;
pub use layout::{QuickType, TagBit, ValueType};
pub use pointer::{LayoutInfo, LayoutKind, NativeLayout, PointerLayout, layouts};
pub use value::{ReturnedValue, StaticValue};
