//! nanval Runtime: the interpreter-side machinery around `StaticValue`
//!
//! Key pieces:
//! - RegisterFile: contiguous array of 8-byte value slots, fresh slots read as undefined
//! - ManagedHeap: bump-allocated, 32-byte aligned cells of values, with a mark phase
//! - arithmetic: integer fast paths over the encoding, falling back to doubles
//! - Snapshot: serializable capture of a register file
//! - ffi: C ABI for generated code

pub mod arithmetic;
pub mod ffi;
pub mod heap;
pub mod register_file;
pub mod snapshot;

// Re-export key types and functions
pub use heap::{HeapError, HeapStats, ManagedHeap, MarkStats};
pub use register_file::RegisterFile;
pub use snapshot::{Snapshot, SnapshotError};

// Re-export the value encoding so embedders need only this crate
pub use nanval_core::{Encode, ReturnedValue, StaticValue, TypedValue, ValueType};
