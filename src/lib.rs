//! bytevm library.
//!
//! A toolchain and runtime for a small bytecode virtual machine: a two-pass
//! assembler that translates line-oriented assembly into a binary object
//! format, and a register-and-stack interpreter that loads and runs those
//! objects.

pub mod assembler;
pub mod errors;
pub mod isa;
pub mod object;
pub mod types;
pub mod vm;
