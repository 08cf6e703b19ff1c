//! Two-pass assembler.
//!
//! Translates line-oriented assembly into the binary object format. Both
//! passes walk the same source and share one symbol table and a *virtual
//! program counter* that tracks the byte offset of the next emission
//! (initialized, each pass, to the header size):
//!
//! - **Pass 1** discovers label addresses and validates instruction shapes.
//!   Unknown identifiers stay silent so forward label references survive.
//! - **Pass 2** emits bytes, resolving label operands through the now
//!   complete symbol table.
//!
//! The assembler never aborts on a user-source error: diagnostics accumulate
//! and a non-zero total suppresses the output.
//!
//! # Syntax
//!
//! ```text
//! _start:
//!     push 10      ; comments run to end of line
//!     pop r0
//!     add r0, 32   ; commas are separators, not grammar
//!     print r0
//!     halt
//! ```

pub mod diagnostics;
pub mod lexer;
pub mod symbol;

use crate::errors::AsmError;
use crate::isa::{pack_descriptor, Opcode, OperandType, REG_INDEX_MASK};
use crate::object::{ObjectHeader, ENTRY_LABEL, HEADER_SIZE};
use crate::types::encoding::Encode;
use diagnostics::Diagnostics;
use lexer::{Token, TokenKind};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use symbol::{Symbol, SymbolKind, SymbolTable};

/// Default object path for the assembler CLI.
pub const DEFAULT_OUTPUT: &str = "out.pob";

/// Which of the two passes is walking the source. Only pass 2 writes bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    One,
    Two,
}

/// Assembler context: source cursor, position counters, symbol table,
/// diagnostics and the output image. One context per translation unit;
/// constructing a fresh context makes the assembler re-entrant.
pub struct Assembler<'a> {
    /// Origin label for diagnostics, usually the input path.
    path: String,
    source: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    /// Lex-level diagnostics are reported by pass 1 only; pass 2 re-lexes
    /// the same bytes with reporting muted.
    report_lex_errors: bool,
    pub diagnostics: Diagnostics,
    symbols: SymbolTable,
    /// Byte offset of the next emission, header included.
    virtual_pc: u64,
    /// Object image: placeholder header, then code. Pass 2 only.
    out: Vec<u8>,
    /// Final virtual pc of pass 1; pass 2 must emit exactly this many bytes.
    pass1_end_pc: u64,
}

impl<'a> Assembler<'a> {
    pub fn new(path: impl Into<String>, source: &'a str) -> Self {
        Self {
            path: path.into(),
            source,
            pos: 0,
            line: 1,
            col: 1,
            report_lex_errors: true,
            diagnostics: Diagnostics::new(),
            symbols: SymbolTable::new(),
            virtual_pc: HEADER_SIZE as u64,
            out: Vec::new(),
            pass1_end_pc: 0,
        }
    }

    /// Runs both passes and finalizes the header.
    ///
    /// Returns the complete object image, or the accumulated diagnostics
    /// when any error was recorded.
    pub fn assemble(mut self) -> Result<Vec<u8>, Diagnostics> {
        self.run_pass(Pass::One);
        self.run_pass(Pass::Two);
        self.finalize_header();

        if self.diagnostics.count() > 0 {
            Err(self.diagnostics)
        } else {
            Ok(self.out)
        }
    }

    fn run_pass(&mut self, pass: Pass) {
        self.pos = 0;
        self.line = 1;
        self.col = 1;
        self.virtual_pc = HEADER_SIZE as u64;
        self.report_lex_errors = pass == Pass::One;
        if pass == Pass::Two {
            self.out.extend_from_slice(&[0u8; HEADER_SIZE]);
        }

        // Labels defined so far in this walk. Pass 1 reads the growing
        // symbol table; pass 2 replays the same definition order so both
        // passes make identical size decisions.
        let mut seen: HashSet<&'a str> = HashSet::new();

        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::LabelDef => self.define_label(pass, token, &mut seen),
                TokenKind::Ident => self.statement(pass, token, &seen),
                // stray integers and illegal bytes are skipped
                _ => {}
            }
        }

        if pass == Pass::One {
            self.pass1_end_pc = self.virtual_pc;
        }
    }

    /// Handles a label definition token. The rest of the label's line is not
    /// parsed.
    fn define_label(&mut self, pass: Pass, token: Token<'a>, seen: &mut HashSet<&'a str>) {
        match pass {
            Pass::One => {
                if let Err(err) = self.symbols.push(Symbol::label(token.text, self.virtual_pc)) {
                    self.diagnostics
                        .error_at(&self.path, token.line, token.col, err);
                }
            }
            Pass::Two => {
                seen.insert(token.text);
            }
        }
        self.consume_until_newline();
    }

    /// Handles an identifier in statement position: an instruction, a raw
    /// label address, or an error.
    fn statement(&mut self, pass: Pass, token: Token<'a>, seen: &HashSet<&'a str>) {
        if let Some(opcode) = Opcode::from_mnemonic(token.text) {
            self.instruction(pass, opcode);
            return;
        }

        // An identifier naming a label already defined at this point of the
        // walk is emitted as a raw 8-byte immediate.
        let known = match pass {
            Pass::One => self.symbols.find(SymbolKind::Label, token.text).is_some(),
            Pass::Two => seen.contains(token.text),
        };
        if known {
            let pc = self
                .symbols
                .find(SymbolKind::Label, token.text)
                .map(|sym| sym.label.pc)
                .unwrap_or(0);
            self.emit64(pass, pc);
            return;
        }

        // Unknown identifiers stay silent in pass 1 so forward label
        // references survive; pass 2 reports them. Recovery skips the line
        // in both passes.
        if pass == Pass::Two {
            self.diagnostics.error_at(
                &self.path,
                token.line,
                token.col,
                AsmError::UnknownInstruction {
                    name: token.text.to_string(),
                },
            );
        }
        self.consume_until_newline();
    }

    /// Assembles one instruction: opcode byte, descriptor byte, operands.
    fn instruction(&mut self, pass: Pass, opcode: Opcode) {
        let arity = opcode.arity();

        // Operand types come from the token kinds: a register token gives a
        // register operand, an integer or identifier gives an immediate.
        let mut types = [OperandType::None; 2];
        for slot in 0..arity {
            types[slot] = match self.peek(slot + 1).kind {
                TokenKind::Register => OperandType::Register,
                TokenKind::Int | TokenKind::Ident => OperandType::Immediate,
                _ => OperandType::None,
            };
        }

        self.emit8(pass, opcode as u8);
        self.emit8(pass, pack_descriptor(types[0], types[1]));

        for slot in 0..arity {
            let token = self.next_token();
            match types[slot] {
                OperandType::Register => {
                    self.emit8(pass, (token.value as u8) & REG_INDEX_MASK);
                }
                OperandType::Immediate => {
                    let value = self.immediate_value(pass, token);
                    self.emit64(pass, value);
                }
                OperandType::None => {
                    if pass == Pass::Two {
                        self.diagnostics.error_at(
                            &self.path,
                            token.line,
                            token.col,
                            AsmError::ExpectedOperand {
                                found: operand_name(&token),
                            },
                        );
                    }
                    if token.kind == TokenKind::Eof {
                        return;
                    }
                }
            }
        }
    }

    /// Resolves an immediate operand. Identifier operands read the label's
    /// address; unresolved identifiers at pass 2 are an error and a
    /// placeholder keeps the byte offsets stable.
    fn immediate_value(&mut self, pass: Pass, token: Token<'a>) -> u64 {
        if token.kind != TokenKind::Ident {
            return token.value as u64;
        }
        match pass {
            Pass::One => 0,
            Pass::Two => match self.symbols.find(SymbolKind::Label, token.text) {
                Some(sym) if sym.label.defined => sym.label.pc,
                _ => {
                    self.diagnostics.error_at(
                        &self.path,
                        token.line,
                        token.col,
                        AsmError::UndefinedIdentifier {
                            name: token.text.to_string(),
                        },
                    );
                    0
                }
            },
        }
    }

    fn emit8(&mut self, pass: Pass, byte: u8) {
        if pass == Pass::Two {
            byte.encode(&mut self.out);
        }
        self.virtual_pc += 1;
    }

    fn emit64(&mut self, pass: Pass, value: u64) {
        if pass == Pass::Two {
            value.encode(&mut self.out);
        }
        self.virtual_pc += 8;
    }

    /// Overwrites the placeholder header with final values. Missing `_start`
    /// is a link error and carries no position.
    fn finalize_header(&mut self) {
        let entry = match self.symbols.find(SymbolKind::Label, ENTRY_LABEL) {
            Some(sym) => sym.label.pc,
            None => {
                self.diagnostics.error(&self.path, AsmError::MissingEntry);
                return;
            }
        };
        let code_size = (self.out.len() - HEADER_SIZE) as u64;
        let header = ObjectHeader::new(entry, code_size);
        self.out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }
}

/// Describes an unexpected operand token for diagnostics.
fn operand_name(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        _ => format!("`{}`", token.text),
    }
}

/// Assembles a full source string into an object image (header + code).
///
/// `origin` labels diagnostics, usually the input path. On failure the
/// accumulated diagnostics are returned and no object is produced.
pub fn assemble_source(source: &str, origin: &str) -> Result<Vec<u8>, Diagnostics> {
    Assembler::new(origin, source).assemble()
}

/// Assembles `input` and writes the object to `output`.
///
/// The object is staged in a temporary file beside `output` and renamed into
/// place only when assembly reports no errors; the staging file is removed on
/// failure. Diagnostics go to stderr.
pub fn assemble_file(input: &Path, output: &Path) -> Result<(), AsmError> {
    let origin = input.display().to_string();
    let source = fs::read_to_string(input).map_err(|err| report_io(&origin, err))?;

    match assemble_source(&source, &origin) {
        Ok(image) => write_object(&origin, input, output, &image),
        Err(diagnostics) => {
            let failed = AsmError::Failed {
                errors: diagnostics.count(),
            };
            eprint!("{}", diagnostics.rendered());
            eprint!("{}", Diagnostics::render_plain(&origin, &failed));
            Err(failed)
        }
    }
}

/// Renders an I/O failure as a positionless diagnostic on stderr.
fn report_io(origin: &str, err: io::Error) -> AsmError {
    let failure = AsmError::Io {
        message: err.to_string(),
    };
    eprint!("{}", Diagnostics::render_plain(origin, &failure));
    failure
}

fn write_object(origin: &str, input: &Path, output: &Path, image: &[u8]) -> Result<(), AsmError> {
    let staging = staging_path(input, output);
    fs::write(&staging, image).map_err(|err| report_io(&staging.display().to_string(), err))?;

    if let Err(err) = fs::rename(&staging, output) {
        let _ = fs::remove_file(&staging);
        return Err(report_io(origin, err));
    }

    mark_executable(output);
    Ok(())
}

/// The staging file lives in the output's directory, so the final rename
/// stays on one filesystem, and is named from a stable identifier of the
/// input file.
fn staging_path(input: &Path, output: &Path) -> PathBuf {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    dir.join(format!(".{}.pob.tmp", input_key(input)))
}

#[cfg(unix)]
fn input_key(input: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(input).map(|meta| meta.ino()).unwrap_or(0)
}

#[cfg(not(unix))]
fn input_key(input: &Path) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish()
}

/// The finished object is marked readable, writable and executable for all
/// classes. Cosmetic; the runner does not require the bit.
#[cfg(unix)]
fn mark_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o777));
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) {}
