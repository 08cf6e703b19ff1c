//! Binary object format.
//!
//! An object file is a fixed 24-byte header followed by a contiguous code
//! region, little-endian throughout:
//!
//! | Offset | Size | Field       |
//! |-------:|-----:|-------------|
//! | 0      | 4    | magic       |
//! | 4      | 4    | version     |
//! | 8      | 8    | entry_point |
//! | 16     | 8    | code_size   |
//! | 24     | —    | code        |
//!
//! When loaded, the whole file (header included) is copied into VM memory at
//! address 0 and execution starts at `entry_point`, so entry points and label
//! addresses are byte offsets into the file itself.

use crate::errors::VmError;
use crate::types::encoding::{Decode, DecodeError, Encode};
use bytevm_derive::BinaryCodec;

/// Magic constant identifying an object file ("poco").
pub const MAGIC: u32 = 0x706F_636F;

/// Current object format version; a mismatch is a load error.
pub const VERSION: u32 = 1;

/// Size of the serialized header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Size of the VM's instruction-addressable linear memory, and therefore the
/// largest loadable object.
pub const MEMORY_SIZE: usize = 640 * 1000;

/// Conventional entry label; a program without it fails to link.
pub const ENTRY_LABEL: &str = "_start";

/// Object file header. Field order is the on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinaryCodec)]
pub struct ObjectHeader {
    /// Magic constant, [`MAGIC`].
    pub magic: u32,
    /// Format version, [`VERSION`].
    pub version: u32,
    /// Byte offset of `_start` in the file.
    pub entry_point: u64,
    /// Number of bytes in the code region.
    pub code_size: u64,
}

impl ObjectHeader {
    /// Builds a current-version header for a code region of `code_size`
    /// bytes entered at `entry_point`.
    pub fn new(entry_point: u64, code_size: u64) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            entry_point,
            code_size,
        }
    }

    /// Reads a header from the start of `bytes`.
    pub fn read_from(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut input = bytes;
        Self::decode(&mut input)
    }

    /// Checks magic and version, the loader's compatibility gate.
    pub fn validate(&self) -> Result<(), VmError> {
        if self.magic != MAGIC {
            return Err(VmError::BadMagic { found: self.magic });
        }
        if self.version != VERSION {
            return Err(VmError::UnsupportedVersion {
                found: self.version,
            });
        }
        Ok(())
    }
}
