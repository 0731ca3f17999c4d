//! Platform Pointer Layouts
//!
//! On 64-bit targets a managed value keeps 43 pointer bits (5..=47) in place.
//! Heap objects are aligned to 32 bytes, so the 5 low bits are free, and the
//! 3 bits between the exponent and bit 48 are free as well. Platforms that
//! use more than 48 address bits, or that tag the top byte of a pointer,
//! move the excess bits into those free slots.
//!
//! Each layout names three shifts, one per fragment (`Top1`, `Upper3`,
//! `Lower5`). A shift is the distance the fragment travels from its place in
//! the pointer to its place in the word, from more significant to less
//! significant bits. Storing shifts right by that amount, retrieving shifts
//! left. Negative shifts go the other way and zero leaves the fragment alone.
//!
//! The bit manipulation below is written purely in terms of those shifts, so
//! adding a platform means adding a layout, not touching the algorithm.

use crate::layout::{LOWER5_MASK, MANAGED_MASK, TOP1_MASK, UPPER3_MASK};
use std::str::FromStr;

/// A compile-time pointer layout
pub trait PointerLayout {
    /// Human-readable name, used by tooling and in errors
    const NAME: &'static str;
    const TOP1_SHIFT: i32;
    const UPPER3_SHIFT: i32;
    const LOWER5_SHIFT: i32;
    /// Pointer bits this layout can carry (32-byte aligned, so the low 5 are clear)
    const ADDRESS_MASK: u64;
}

/// Plain 48-bit user-space pointers (x86-64, aarch64 without top-byte tags)
#[derive(Debug, Clone, Copy)]
pub struct Flat;

impl PointerLayout for Flat {
    const NAME: &'static str = "flat";
    const TOP1_SHIFT: i32 = 0;
    const UPPER3_SHIFT: i32 = 0;
    const LOWER5_SHIFT: i32 = 0;
    const ADDRESS_MASK: u64 = 0x0000_FFFF_FFFF_FFE0;
}

/// Itanium: bits 63-61 hold the virtual region number and move to Upper3.
#[derive(Debug, Clone, Copy)]
pub struct Ia64;

impl PointerLayout for Ia64 {
    const NAME: &'static str = "ia64";
    const TOP1_SHIFT: i32 = 0;
    const UPPER3_SHIFT: i32 = 12;
    const LOWER5_SHIFT: i32 = 0;
    const ADDRESS_MASK: u64 = 0xE000_FFFF_FFFF_FFE0;
}

/// Sparc64 uses 52 address bits. Upper3 stays put, bit 48 moves to the top.
#[derive(Debug, Clone, Copy)]
pub struct Sparc64;

impl PointerLayout for Sparc64 {
    const NAME: &'static str = "sparc64";
    const TOP1_SHIFT: i32 = -15;
    const UPPER3_SHIFT: i32 = 0;
    const LOWER5_SHIFT: i32 = 0;
    const ADDRESS_MASK: u64 = 0x000F_FFFF_FFFF_FFE0;
}

/// 5-level page tables need 57 address bits. Bit 48 moves to the top and
/// bits 52-56 move to Lower5.
#[derive(Debug, Clone, Copy)]
pub struct FiveLevelPaging;

impl PointerLayout for FiveLevelPaging {
    const NAME: &'static str = "five-level-paging";
    const TOP1_SHIFT: i32 = -15;
    const UPPER3_SHIFT: i32 = 0;
    const LOWER5_SHIFT: i32 = 52;
    const ADDRESS_MASK: u64 = 0x01FF_FFFF_FFFF_FFE0;
}

/// Tagged top byte (arm64 memory tagging). The top byte is split between
/// Upper3 and Lower5.
#[derive(Debug, Clone, Copy)]
pub struct Arm64TopByte;

impl PointerLayout for Arm64TopByte {
    const NAME: &'static str = "arm64-top-byte";
    const TOP1_SHIFT: i32 = 0;
    const UPPER3_SHIFT: i32 = 12;
    const LOWER5_SHIFT: i32 = 56;
    const ADDRESS_MASK: u64 = 0xFF00_FFFF_FFFF_FFE0;
}

/// Layout used by `StaticValue::m` and `StaticValue::set_m`.
///
/// The JS heap is mapped with `mmap`, which does not apply top-byte tags,
/// so arm64 uses the flat layout as well.
#[cfg(target_arch = "sparc64")]
pub type NativeLayout = Sparc64;

#[cfg(not(target_arch = "sparc64"))]
pub type NativeLayout = Flat;

// =============================================================================
// Bit Movement
// =============================================================================

/// Move the bits selected by `mask` right by `offset` (left if negative).
#[inline(always)]
pub const fn move_pointer_bits(offset: i32, mask: u64, val: u64) -> u64 {
    if offset > 0 {
        (val & !mask) | ((val & mask) >> offset as u32)
    } else if offset < 0 {
        (val & !mask) | ((val & mask) << (-offset) as u32)
    } else {
        val
    }
}

/// Move a fragment from its place in the pointer to `mask` in the word.
#[inline(always)]
pub const fn store_pointer_bits(offset: i32, mask: u64, val: u64) -> u64 {
    let origin_mask = move_pointer_bits(-offset, mask, mask);
    move_pointer_bits(offset, origin_mask, val)
}

/// Move a fragment from `mask` in the word back to its place in the pointer.
#[inline(always)]
pub const fn retrieve_pointer_bits(offset: i32, mask: u64, val: u64) -> u64 {
    move_pointer_bits(-offset, mask, val)
}

/// Encode a heap address into a managed word.
#[inline(always)]
pub const fn encode_pointer<L: PointerLayout>(address: u64) -> u64 {
    store_pointer_bits(
        L::TOP1_SHIFT,
        TOP1_MASK,
        store_pointer_bits(
            L::UPPER3_SHIFT,
            UPPER3_MASK,
            store_pointer_bits(L::LOWER5_SHIFT, LOWER5_MASK, address),
        ),
    )
}

/// Re-assemble a heap address from a managed word.
#[inline(always)]
pub const fn decode_pointer<L: PointerLayout>(word: u64) -> u64 {
    retrieve_pointer_bits(
        L::TOP1_SHIFT,
        TOP1_MASK,
        retrieve_pointer_bits(
            L::UPPER3_SHIFT,
            UPPER3_MASK,
            retrieve_pointer_bits(L::LOWER5_SHIFT, LOWER5_MASK, word),
        ),
    )
}

/// True if `address` is 32-byte aligned and inside the layout's reach
#[inline]
pub const fn is_encodable<L: PointerLayout>(address: u64) -> bool {
    address & LOWER5_MASK == 0 && address & !L::ADDRESS_MASK == 0
}

// Every layout must keep the classification bits of a managed word clear.
const fn check_layout<L: PointerLayout>() -> bool {
    encode_pointer::<L>(L::ADDRESS_MASK) & MANAGED_MASK == 0
        && decode_pointer::<L>(encode_pointer::<L>(L::ADDRESS_MASK)) == L::ADDRESS_MASK
}

const _: () = assert!(check_layout::<Flat>());
const _: () = assert!(check_layout::<Ia64>());
const _: () = assert!(check_layout::<Sparc64>());
const _: () = assert!(check_layout::<FiveLevelPaging>());
const _: () = assert!(check_layout::<Arm64TopByte>());

// =============================================================================
// Runtime Selection (tooling)
// =============================================================================

/// Runtime handle on one of the compile-time layouts
///
/// The value encoding itself always uses [`NativeLayout`]. Tools that look
/// at words from other platforms pick a layout with this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Flat,
    Ia64,
    Sparc64,
    FiveLevelPaging,
    Arm64TopByte,
}

/// Shift constants of a layout, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LayoutInfo {
    pub name: &'static str,
    pub top1_shift: i32,
    pub upper3_shift: i32,
    pub lower5_shift: i32,
    pub address_mask: u64,
}

impl LayoutInfo {
    const fn of<L: PointerLayout>() -> Self {
        LayoutInfo {
            name: L::NAME,
            top1_shift: L::TOP1_SHIFT,
            upper3_shift: L::UPPER3_SHIFT,
            lower5_shift: L::LOWER5_SHIFT,
            address_mask: L::ADDRESS_MASK,
        }
    }
}

impl LayoutKind {
    pub const ALL: [LayoutKind; 5] = [
        LayoutKind::Flat,
        LayoutKind::Ia64,
        LayoutKind::Sparc64,
        LayoutKind::FiveLevelPaging,
        LayoutKind::Arm64TopByte,
    ];

    /// The layout [`NativeLayout`] resolves to on this target
    pub fn native() -> Self {
        if cfg!(target_arch = "sparc64") {
            LayoutKind::Sparc64
        } else {
            LayoutKind::Flat
        }
    }

    pub fn info(self) -> LayoutInfo {
        match self {
            LayoutKind::Flat => LayoutInfo::of::<Flat>(),
            LayoutKind::Ia64 => LayoutInfo::of::<Ia64>(),
            LayoutKind::Sparc64 => LayoutInfo::of::<Sparc64>(),
            LayoutKind::FiveLevelPaging => LayoutInfo::of::<FiveLevelPaging>(),
            LayoutKind::Arm64TopByte => LayoutInfo::of::<Arm64TopByte>(),
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn encode(self, address: u64) -> u64 {
        match self {
            LayoutKind::Flat => encode_pointer::<Flat>(address),
            LayoutKind::Ia64 => encode_pointer::<Ia64>(address),
            LayoutKind::Sparc64 => encode_pointer::<Sparc64>(address),
            LayoutKind::FiveLevelPaging => encode_pointer::<FiveLevelPaging>(address),
            LayoutKind::Arm64TopByte => encode_pointer::<Arm64TopByte>(address),
        }
    }

    pub fn decode(self, word: u64) -> u64 {
        match self {
            LayoutKind::Flat => decode_pointer::<Flat>(word),
            LayoutKind::Ia64 => decode_pointer::<Ia64>(word),
            LayoutKind::Sparc64 => decode_pointer::<Sparc64>(word),
            LayoutKind::FiveLevelPaging => decode_pointer::<FiveLevelPaging>(word),
            LayoutKind::Arm64TopByte => decode_pointer::<Arm64TopByte>(word),
        }
    }

    pub fn is_encodable(self, address: u64) -> bool {
        address & LOWER5_MASK == 0 && address & !self.info().address_mask == 0
    }
}

/// Every supported layout, in `LayoutKind::ALL` order
pub fn layouts() -> Vec<LayoutInfo> {
    LayoutKind::ALL.iter().map(|k| k.info()).collect()
}

impl FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LayoutKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = LayoutKind::ALL.iter().map(|k| k.name()).collect();
                format!(
                    "Unknown pointer layout '{}' (expected one of: {})",
                    s,
                    names.join(", ")
                )
            })
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
