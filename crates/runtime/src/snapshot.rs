//! Register Snapshots
//!
//! Captures the live slots of a register file as `TypedValue`s so they can
//! be written out with bincode and restored later, e.g. for debugging a
//! stopped interpreter or replaying a test.
//!
//! Managed values are addresses into one process's heap and mean nothing
//! anywhere else, so a register file holding one cannot be captured, and a
//! snapshot carrying one (e.g. from hand-edited bytes) cannot be restored.

use crate::register_file::RegisterFile;
use nanval_core::{StaticValue, TypedValue};
use serde::{Deserialize, Serialize};

/// Error while capturing or decoding a snapshot
#[derive(Debug)]
pub enum SnapshotError {
    /// Register `index` holds a heap pointer
    ManagedNotSerializable { index: usize },
    /// Bincode encoding/decoding error, kept as the source
    BincodeError(Box<bincode::Error>),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::ManagedNotSerializable { index } => {
                write!(
                    f,
                    "Register {} holds a heap pointer - heap state is not data",
                    index
                )
            }
            SnapshotError::BincodeError(e) => write!(f, "Bincode error: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::BincodeError(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<bincode::Error> for SnapshotError {
    fn from(e: bincode::Error) -> Self {
        SnapshotError::BincodeError(Box::new(e))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub values: Vec<TypedValue>,
}

impl Snapshot {
    /// Capture the live slots of `regs`, bottom first
    pub fn capture(regs: &RegisterFile) -> Result<Self, SnapshotError> {
        let values = regs
            .iter()
            .enumerate()
            .map(|(index, v)| {
                if v.is_managed() {
                    Err(SnapshotError::ManagedNotSerializable { index })
                } else {
                    Ok(v.decode())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Snapshot { values })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(SnapshotError::from)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(SnapshotError::from)
    }

    /// Build a register file holding exactly the captured slots
    pub fn restore(&self) -> Result<RegisterFile, SnapshotError> {
        let mut regs = RegisterFile::new(self.values.len());
        for (index, v) in self.values.iter().enumerate() {
            if let TypedValue::Managed(_) = v {
                return Err(SnapshotError::ManagedNotSerializable { index });
            }
            regs.push(StaticValue::from(*v));
        }
        Ok(regs)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
