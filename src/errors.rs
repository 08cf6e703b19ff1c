//! Error taxonomy for the assembler and the virtual machine.

use bytevm_derive::Error;

/// Errors surfaced by the assembler as source diagnostics or I/O failures.
#[derive(Debug, Error)]
pub enum AsmError {
    /// Byte that starts no token.
    #[error("illegal character '{ch}' in program")]
    IllegalCharacter { ch: char },
    /// Integer literal outside the signed 64-bit range.
    #[error("integer out of range")]
    IntegerOutOfRange,
    /// Identifier in statement position matching no mnemonic and no label.
    #[error("unknown `{name}` instruction in program")]
    UnknownInstruction { name: String },
    /// Label defined more than once.
    #[error("duplicate label `{name}`")]
    DuplicateLabel { name: String },
    /// Identifier in operand position naming no label at pass 2.
    #[error("identifier `{name}` not defined")]
    UndefinedIdentifier { name: String },
    /// Token where an operand was expected.
    #[error("expected operand, found {found}")]
    ExpectedOperand { found: String },
    /// Program has no `_start` label. A link error, carries no position.
    #[error("`_start` entry point not defined")]
    MissingEntry,
    /// File I/O failure with the host's error string.
    #[error("{message}")]
    Io { message: String },
    /// Summary failure after one or more source diagnostics.
    #[error("compilation failed ({errors} total errors)")]
    Failed { errors: u32 },
}

/// Errors surfaced by the object loader and the execution engine.
///
/// Runtime kinds map onto the runner's exit status through
/// [`VmError::exit_code`].
#[derive(Debug, Error)]
pub enum VmError {
    /// File I/O failure with the host's error string.
    #[error("{message}")]
    Io { message: String },
    /// Object path does not name a regular file.
    #[error("file format not recognized")]
    NotRegularFile,
    /// Zero-length object file.
    #[error("empty object file")]
    EmptyObject,
    /// Object larger than the VM's linear memory.
    #[error("size exceeds limit: {size}/{limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    /// Object too short to contain a header.
    #[error("truncated object header")]
    TruncatedHeader,
    /// Header magic does not identify an object file.
    #[error("wrong magic number `0x{found:08X}`")]
    BadMagic { found: u32 },
    /// Header version this build does not understand.
    #[error("unsupported object version {found}")]
    UnsupportedVersion { found: u32 },
    /// Opcode byte outside the instruction table.
    #[error("unrecognized opcode 0x{opcode:02X}")]
    UnrecognizedOpcode { opcode: u8 },
    /// Fetch at or beyond the end of memory.
    #[error("illegal memory access at 0x{pc:X}")]
    IllegalMemoryAccess { pc: u64 },
    /// Push with no free stack slot.
    #[error("stack overflow")]
    StackOverflow,
    /// Pop from an empty stack.
    #[error("stack underflow")]
    StackUnderflow,
}

impl VmError {
    /// Maps the error to the runner's exit status. Runtime errors use their
    /// kind enumerator; load and I/O failures exit 1.
    pub const fn exit_code(&self) -> i32 {
        match self {
            VmError::UnrecognizedOpcode { .. } => 1,
            VmError::IllegalMemoryAccess { .. } => 2,
            VmError::StackOverflow => 3,
            VmError::StackUnderflow => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_exit_codes_match_enumerators() {
        assert_eq!(VmError::UnrecognizedOpcode { opcode: 0xFF }.exit_code(), 1);
        assert_eq!(VmError::IllegalMemoryAccess { pc: 0 }.exit_code(), 2);
        assert_eq!(VmError::StackOverflow.exit_code(), 3);
        assert_eq!(VmError::StackUnderflow.exit_code(), 4);
    }

    #[test]
    fn load_errors_exit_one() {
        assert_eq!(VmError::EmptyObject.exit_code(), 1);
        assert_eq!(VmError::BadMagic { found: 0 }.exit_code(), 1);
        assert_eq!(
            VmError::TooLarge {
                size: 1,
                limit: 0
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn display_messages_name_the_kind() {
        assert_eq!(VmError::StackOverflow.to_string(), "stack overflow");
        assert_eq!(VmError::StackUnderflow.to_string(), "stack underflow");
        assert_eq!(
            VmError::IllegalMemoryAccess { pc: 0xFF }.to_string(),
            "illegal memory access at 0xFF"
        );
        assert_eq!(
            VmError::UnrecognizedOpcode { opcode: 9 }.to_string(),
            "unrecognized opcode 0x09"
        );
    }

    #[test]
    fn asm_error_interpolates_fields() {
        let err = AsmError::DuplicateLabel {
            name: "loop".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate label `loop`");

        let err = AsmError::IllegalCharacter { ch: '@' };
        assert_eq!(err.to_string(), "illegal character '@' in program");
    }
}
