//! C ABI
//!
//! Entry points for generated code and C embedders. Values cross the
//! boundary as `ReturnedValue` (a bare `u64`) so they travel in a single
//! register on every calling convention.

use crate::register_file::RegisterFile;
use nanval_core::{Encode, ReturnedValue, StaticValue};

#[unsafe(no_mangle)]
pub extern "C" fn nanval_from_int32(i: i32) -> ReturnedValue {
    Encode::from(i).into()
}

/// NaN payloads are canonicalized
#[unsafe(no_mangle)]
pub extern "C" fn nanval_from_double(d: f64) -> ReturnedValue {
    Encode::from(d).into()
}

#[unsafe(no_mangle)]
pub extern "C" fn nanval_from_bool(b: bool) -> ReturnedValue {
    Encode::from(b).into()
}

#[unsafe(no_mangle)]
pub extern "C" fn nanval_undefined() -> ReturnedValue {
    Encode::undefined()
}

#[unsafe(no_mangle)]
pub extern "C" fn nanval_null() -> ReturnedValue {
    Encode::null()
}

/// ECMAScript `ToInt32` of any value (non-numbers give 0)
#[unsafe(no_mangle)]
pub extern "C" fn nanval_to_int32(v: ReturnedValue) -> i32 {
    StaticValue::from_returned_value(v).to_int32()
}

#[unsafe(no_mangle)]
pub extern "C" fn nanval_to_boolean(v: ReturnedValue) -> bool {
    StaticValue::from_returned_value(v).to_boolean()
}

/// `ValueType` discriminant of a value
#[unsafe(no_mangle)]
pub extern "C" fn nanval_type(v: ReturnedValue) -> u32 {
    StaticValue::from_returned_value(v).value_type() as u32
}

// =============================================================================
// Register file
// =============================================================================

/// Create a register file. Free it with `nanval_regs_free`.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub extern "C" fn nanval_regs_new(capacity: usize) -> *mut RegisterFile {
    Box::into_raw(Box::new(RegisterFile::new(capacity)))
}

/// # Safety
/// `regs` must come from `nanval_regs_new` and not be used afterwards.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nanval_regs_free(regs: *mut RegisterFile) {
    if !regs.is_null() {
        unsafe {
            drop(Box::from_raw(regs));
        }
    }
}

/// # Safety
/// `regs` must be a live register file from `nanval_regs_new`.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nanval_regs_push(regs: *mut RegisterFile, v: ReturnedValue) {
    unsafe {
        (*regs).push(StaticValue::from_returned_value(v));
    }
}

/// Pop the top register. An empty register file yields undefined.
///
/// # Safety
/// `regs` must be a live register file from `nanval_regs_new`.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nanval_regs_pop(regs: *mut RegisterFile) -> ReturnedValue {
    unsafe {
        let regs = &mut *regs;
        if regs.is_empty() {
            return Encode::undefined();
        }
        regs.pop().as_returned_value()
    }
}

/// # Safety
/// `regs` must be a live register file from `nanval_regs_new`.
#[allow(improper_ctypes_definitions)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn nanval_regs_depth(regs: *const RegisterFile) -> usize {
    unsafe { (*regs).depth() }
}
