//! Register File
//!
//! A contiguous array of 8-byte `StaticValue` slots: the interpreter's
//! registers and operand stack in one.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬─────────┐
//! │   r0     │   r1     │   r2     │   r3     │  ...    │
//! │  (8 B)   │  (8 B)   │  (8 B)   │  (8 B)   │         │
//! └──────────┴──────────┴──────────┴──────────┴─────────┘
//!                                              ↑ SP
//! ```
//!
//! - Grows upward, SP is the next free slot
//! - Slots at or above SP are always zero, which reads as `undefined`.
//!   Storage comes from `alloc_zeroed`, growth zeroes the new tail, and
//!   pop/truncate write zero back. A new frame is therefore just an SP bump.

use nanval_core::StaticValue;
use std::alloc::{Layout, alloc_zeroed, dealloc, realloc};
use std::ptr;
use tracing::trace;

/// Default register file capacity (number of slots)
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct RegisterFile {
    /// Pointer to the first slot
    base: *mut StaticValue,
    /// Index of the next free slot
    sp: usize,
    /// Number of allocated slots
    capacity: usize,
}

impl RegisterFile {
    /// Create a register file with room for `capacity` slots
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let layout = Layout::array::<StaticValue>(capacity).expect("register file layout overflow");
        let base = unsafe { alloc_zeroed(layout) as *mut StaticValue };
        if base.is_null() {
            std::alloc::handle_alloc_error(layout);
        }

        RegisterFile {
            base,
            sp: 0,
            capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.sp
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Grow to at least `min_capacity` slots (doubling by default).
    ///
    /// New slots are zeroed so they read as `undefined`.
    pub fn grow(&mut self, min_capacity: usize) {
        let new_capacity = self.capacity.saturating_mul(2).max(min_capacity);
        let old_layout = Layout::array::<StaticValue>(self.capacity).expect("old layout overflow");
        let new_layout = Layout::array::<StaticValue>(new_capacity).expect("new layout overflow");

        let new_base = unsafe {
            realloc(self.base as *mut u8, old_layout, new_layout.size()) as *mut StaticValue
        };
        if new_base.is_null() {
            std::alloc::handle_alloc_error(new_layout);
        }

        unsafe {
            ptr::write_bytes(
                new_base.add(self.capacity),
                0,
                new_capacity - self.capacity,
            );
        }

        trace!(
            from = self.capacity,
            to = new_capacity,
            "register file grown"
        );
        self.base = new_base;
        self.capacity = new_capacity;
    }

    #[inline]
    fn ensure(&mut self, n: usize) {
        let needed = self.sp.checked_add(n).expect("register file capacity overflow");
        if needed > self.capacity {
            self.grow(needed);
        }
    }

    #[inline]
    pub fn push(&mut self, val: StaticValue) {
        self.ensure(1);
        unsafe {
            *self.base.add(self.sp) = val;
        }
        self.sp += 1;
    }

    /// Pop the top slot. Panics if the register file is empty.
    #[inline]
    pub fn pop(&mut self) -> StaticValue {
        assert!(self.sp > 0, "pop: register file is empty");
        self.sp -= 1;
        unsafe {
            let slot = self.base.add(self.sp);
            let val = *slot;
            *slot = StaticValue::default();
            val
        }
    }

    /// Top slot without removing it. Panics if the register file is empty.
    #[inline]
    pub fn peek(&self) -> StaticValue {
        assert!(self.sp > 0, "peek: register file is empty");
        unsafe { *self.base.add(self.sp - 1) }
    }

    /// Reserve `n` slots on top and return the index of the first.
    ///
    /// The new slots read as `undefined` without being written.
    pub fn alloc_frame(&mut self, n: usize) -> usize {
        self.ensure(n);
        let start = self.sp;
        self.sp += n;
        start
    }

    /// Drop everything above `depth`, zeroing the released slots.
    pub fn truncate(&mut self, depth: usize) {
        if depth >= self.sp {
            return;
        }
        unsafe {
            ptr::write_bytes(self.base.add(depth), 0, self.sp - depth);
        }
        self.sp = depth;
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<StaticValue> {
        if index < self.sp {
            Some(unsafe { *self.base.add(index) })
        } else {
            None
        }
    }

    /// Overwrite a live slot. Returns false if `index` is above the top.
    #[inline]
    pub fn set(&mut self, index: usize, val: StaticValue) -> bool {
        if index < self.sp {
            unsafe {
                *self.base.add(index) = val;
            }
            true
        } else {
            false
        }
    }

    /// Mutable access to a live slot, for in-place operations like `is_int32`
    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut StaticValue> {
        if index < self.sp {
            Some(unsafe { &mut *self.base.add(index) })
        } else {
            None
        }
    }

    /// Live slots, bottom first
    pub fn as_slice(&self) -> &[StaticValue] {
        unsafe { std::slice::from_raw_parts(self.base, self.sp) }
    }

    pub fn iter(&self) -> impl Iterator<Item = StaticValue> + '_ {
        self.as_slice().iter().copied()
    }

    /// Raw base pointer, for compiled code doing inline register access
    #[inline(always)]
    pub fn base_ptr(&self) -> *mut StaticValue {
        self.base
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

impl Drop for RegisterFile {
    fn drop(&mut self) {
        // Values are plain words; heap objects they point to belong to the heap
        if !self.base.is_null() {
            let layout = Layout::array::<StaticValue>(self.capacity).expect("layout overflow");
            unsafe {
                dealloc(self.base as *mut u8, layout);
            }
        }
    }
}

impl std::fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
