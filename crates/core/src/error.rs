//! Errors for the checked (non hot-path) entry points
//!
//! Typed accessors never fail: calling one against the wrong tag is a
//! programming error caught by `debug_assert!`. Only the checked constructors
//! used at trust boundaries (tooling, foreign words, allocator hand-off)
//! return these errors.

/// Error while building or validating a value word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Heap pointer not aligned to 32 bytes
    Misaligned { address: u64 },
    /// Heap pointer has bits the pointer layout cannot carry
    OutOfReach { address: u64, layout: &'static str },
    /// Raw word is not a pattern any encoder produces
    InvalidWord(u64),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Misaligned { address } => {
                write!(f, "Heap pointer 0x{:016x} is not 32-byte aligned", address)
            }
            EncodeError::OutOfReach { address, layout } => write!(
                f,
                "Heap pointer 0x{:016x} cannot be encoded with the {} pointer layout",
                address, layout
            ),
            EncodeError::InvalidWord(raw) => {
                write!(f, "0x{:016x} is not a valid value encoding", raw)
            }
        }
    }
}

impl std::error::Error for EncodeError {}
