//! Managed Heap
//!
//! Bump-allocated heap of slot arrays that `StaticValue`s point to.
//!
//! The value encoding borrows the 5 low bits of every heap pointer, so every
//! cell starts on a 32-byte boundary. The header type carries
//! `#[repr(align(32))]` and each allocation asks bumpalo for that alignment,
//! which makes the invariant hold by construction rather than by checking.
//!
//! Cells hold only `StaticValue`s. The mark phase walks them the way a
//! collector does: a slot is an edge iff `is_managed()`, and `m()` gives the
//! target cell. Cells are released as a whole with `reset`, like the
//! runtime arena.
//!
//! Handles carry no generation, so a pre-reset handle can only be told apart
//! from a new cell by its address. `reset` therefore retires the arena
//! instead of rewinding it: retired memory stays reserved and no later cell
//! reuses an address handed out before. `reclaim` frees it once the caller
//! knows no such handle survives.

use bumpalo::Bump;
use nanval_core::StaticValue;
use std::alloc::Layout;
use std::cell::Cell;
use std::collections::HashSet;
use std::ptr::{self, NonNull};
use tracing::{debug, trace};

/// Heap cells are aligned so that `StaticValue::set_m` can reclaim the low bits
pub const CELL_ALIGN: usize = 32;

/// Largest slot count a single cell may have
pub const MAX_CELL_SLOTS: usize = u32::MAX as usize;

/// Header in front of every cell's slots
#[repr(C, align(32))]
struct CellHeader {
    len: u32,
    marked: Cell<bool>,
}

const _: () = assert!(std::mem::align_of::<CellHeader>() == CELL_ALIGN);
const _: () = assert!(std::mem::size_of::<CellHeader>() == CELL_ALIGN);

impl CellHeader {
    #[inline(always)]
    fn slots(this: NonNull<CellHeader>) -> *mut StaticValue {
        // Slots start right after the 32-byte header
        unsafe { this.as_ptr().add(1) as *mut StaticValue }
    }
}

/// Error while operating on the heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapError {
    /// The value does not point at a live cell of this heap
    NotAHeapObject(u64),
    /// Slot index past the end of the cell
    IndexOutOfBounds { index: usize, len: usize },
    /// Cell would exceed `MAX_CELL_SLOTS`
    TooLarge(usize),
    /// The arena could not get more memory
    OutOfMemory,
}

impl std::fmt::Display for HeapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeapError::NotAHeapObject(raw) => {
                write!(f, "0x{:016x} is not a live heap object", raw)
            }
            HeapError::IndexOutOfBounds { index, len } => {
                write!(f, "Slot {} out of bounds for cell of length {}", index, len)
            }
            HeapError::TooLarge(len) => write!(f, "Cell of {} slots is too large", len),
            HeapError::OutOfMemory => write!(f, "Heap arena out of memory"),
        }
    }
}

impl std::error::Error for HeapError {}

/// Result of a mark phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkStats {
    pub live_cells: usize,
    pub live_slots: usize,
}

/// Heap statistics for debugging/monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub cells: usize,
    pub allocated_bytes: usize,
    /// Bytes held by arenas retired by `reset` and not yet reclaimed
    pub retired_bytes: usize,
    /// Number of resets so far
    pub epoch: u64,
}

pub struct ManagedHeap {
    arena: Bump,
    cells: Vec<NonNull<CellHeader>>,
    /// Addresses of live cells, for validating handles
    index: HashSet<u64>,
    /// Arenas released by `reset`, kept so their addresses are not reissued
    retired: Vec<Bump>,
    epoch: u64,
}

impl ManagedHeap {
    pub fn new() -> Self {
        ManagedHeap {
            arena: Bump::new(),
            cells: Vec::new(),
            index: HashSet::new(),
            retired: Vec::new(),
            epoch: 0,
        }
    }

    /// Create a heap whose arena starts with `bytes` of capacity
    pub fn with_capacity(bytes: usize) -> Self {
        ManagedHeap {
            arena: Bump::with_capacity(bytes),
            cells: Vec::new(),
            index: HashSet::new(),
            retired: Vec::new(),
            epoch: 0,
        }
    }

    fn alloc_cell(&mut self, len: usize) -> Result<NonNull<CellHeader>, HeapError> {
        if len > MAX_CELL_SLOTS {
            return Err(HeapError::TooLarge(len));
        }
        let size = std::mem::size_of::<CellHeader>()
            .checked_add(len.checked_mul(8).ok_or(HeapError::TooLarge(len))?)
            .ok_or(HeapError::TooLarge(len))?;
        let layout =
            Layout::from_size_align(size, CELL_ALIGN).map_err(|_| HeapError::TooLarge(len))?;
        let raw = self
            .arena
            .try_alloc_layout(layout)
            .map_err(|_| HeapError::OutOfMemory)?;

        let cell = raw.cast::<CellHeader>();
        unsafe {
            ptr::write(
                cell.as_ptr(),
                CellHeader {
                    len: len as u32,
                    marked: Cell::new(false),
                },
            );
        }
        let address = cell.as_ptr() as usize as u64;
        debug_assert_eq!(address % CELL_ALIGN as u64, 0);
        self.cells.push(cell);
        self.index.insert(address);
        trace!(address = format_args!("0x{:x}", address), len, "heap cell allocated");
        Ok(cell)
    }

    fn encode(cell: NonNull<CellHeader>) -> StaticValue {
        let mut v = StaticValue::default();
        v.set_m(cell.as_ptr() as *const CellHeader);
        v
    }

    /// Allocate a cell holding a copy of `slots`
    pub fn alloc_array(&mut self, slots: &[StaticValue]) -> Result<StaticValue, HeapError> {
        let cell = self.alloc_cell(slots.len())?;
        unsafe {
            ptr::copy_nonoverlapping(slots.as_ptr(), CellHeader::slots(cell), slots.len());
        }
        Ok(Self::encode(cell))
    }

    /// Allocate a cell of `len` holes (each slot is the empty value)
    pub fn alloc_holes(&mut self, len: usize) -> Result<StaticValue, HeapError> {
        let cell = self.alloc_cell(len)?;
        let slots = CellHeader::slots(cell);
        for i in 0..len {
            unsafe {
                ptr::write(slots.add(i), StaticValue::empty_value());
            }
        }
        Ok(Self::encode(cell))
    }

    /// True if `value` points at a live cell of this heap
    pub fn contains(&self, value: StaticValue) -> bool {
        value.is_managed() && self.index.contains(&value.managed_address())
    }

    fn cell(&self, value: StaticValue) -> Result<NonNull<CellHeader>, HeapError> {
        if !self.contains(value) {
            return Err(HeapError::NotAHeapObject(value.raw_value()));
        }
        NonNull::new(value.m::<CellHeader>()).ok_or(HeapError::NotAHeapObject(value.raw_value()))
    }

    /// Number of slots of a cell
    pub fn len(&self, value: StaticValue) -> Result<usize, HeapError> {
        let cell = self.cell(value)?;
        Ok(unsafe { cell.as_ref().len as usize })
    }

    pub fn get(&self, value: StaticValue, index: usize) -> Result<StaticValue, HeapError> {
        let cell = self.cell(value)?;
        let len = unsafe { cell.as_ref().len as usize };
        if index >= len {
            return Err(HeapError::IndexOutOfBounds { index, len });
        }
        Ok(unsafe { *CellHeader::slots(cell).add(index) })
    }

    pub fn set(
        &mut self,
        value: StaticValue,
        index: usize,
        slot: StaticValue,
    ) -> Result<(), HeapError> {
        let cell = self.cell(value)?;
        let len = unsafe { cell.as_ref().len as usize };
        if index >= len {
            return Err(HeapError::IndexOutOfBounds { index, len });
        }
        unsafe {
            *CellHeader::slots(cell).add(index) = slot;
        }
        Ok(())
    }

    /// Slots of a cell, copied out
    pub fn slots(&self, value: StaticValue) -> Result<Vec<StaticValue>, HeapError> {
        let cell = self.cell(value)?;
        let len = unsafe { cell.as_ref().len as usize };
        let slots = unsafe { std::slice::from_raw_parts(CellHeader::slots(cell), len) };
        Ok(slots.to_vec())
    }

    /// Mark every cell reachable from `roots`.
    ///
    /// Marks from an earlier phase are cleared first. Non-managed roots and
    /// managed words that do not belong to this heap are skipped.
    pub fn mark<I>(&self, roots: I) -> MarkStats
    where
        I: IntoIterator<Item = StaticValue>,
    {
        for cell in &self.cells {
            unsafe { cell.as_ref().marked.set(false) };
        }

        let mut stats = MarkStats::default();
        let mut worklist: Vec<StaticValue> = roots.into_iter().collect();
        while let Some(value) = worklist.pop() {
            let Ok(cell) = self.cell(value) else {
                continue;
            };
            let header = unsafe { cell.as_ref() };
            if header.marked.get() {
                continue;
            }
            header.marked.set(true);
            stats.live_cells += 1;
            stats.live_slots += header.len as usize;

            let slots = CellHeader::slots(cell);
            for i in 0..header.len as usize {
                let slot = unsafe { *slots.add(i) };
                if slot.is_managed() {
                    worklist.push(slot);
                }
            }
        }

        debug!(
            live_cells = stats.live_cells,
            total_cells = self.cells.len(),
            "mark phase complete"
        );
        stats
    }

    /// True if the last mark phase reached this cell
    pub fn is_marked(&self, value: StaticValue) -> Result<bool, HeapError> {
        let cell = self.cell(value)?;
        Ok(unsafe { cell.as_ref().marked.get() })
    }

    /// Release every cell. All outstanding values pointing here become invalid
    /// and stay invalid: later cells never reuse their addresses.
    pub fn reset(&mut self) {
        debug!(
            cells = self.cells.len(),
            bytes = self.arena.allocated_bytes(),
            epoch = self.epoch,
            "heap reset"
        );
        self.cells.clear();
        self.index.clear();
        let retired = std::mem::take(&mut self.arena);
        if retired.allocated_bytes() > 0 {
            self.retired.push(retired);
        }
        self.epoch += 1;
    }

    /// Free the arenas retired by earlier resets.
    ///
    /// Afterwards a handle from before a reset may alias a new cell, so call
    /// this only once no such handle is reachable.
    pub fn reclaim(&mut self) {
        let bytes: usize = self.retired.iter().map(Bump::allocated_bytes).sum();
        debug!(arenas = self.retired.len(), bytes, "heap reclaim");
        self.retired.clear();
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            cells: self.cells.len(),
            allocated_bytes: self.arena.allocated_bytes(),
            retired_bytes: self.retired.iter().map(Bump::allocated_bytes).sum(),
            epoch: self.epoch,
        }
    }
}

impl Default for ManagedHeap {
    fn default() -> Self {
        Self::new()
    }
}
