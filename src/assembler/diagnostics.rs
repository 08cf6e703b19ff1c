//! Compiler-style diagnostics.
//!
//! Diagnostics are additive writes to a rendering buffer plus an error
//! counter; the assembler main loop decides when enough is enough and the
//! CLI flushes the buffer to stderr. The rendered shape is
//! `path:line:col: error: message` with the position segment omitted for
//! link, load and I/O errors.

use std::fmt;

pub const ANSI_BOLD: &str = "\x1b[1m";
pub const ANSI_RED: &str = "\x1b[31m";
pub const ANSI_RESET: &str = "\x1b[0m";

/// Renders one diagnostic line.
fn render(path: &str, position: Option<(u32, u32)>, message: &dyn fmt::Display) -> String {
    match position {
        Some((line, col)) => format!(
            "{ANSI_BOLD}{path}:{line}:{col}: {ANSI_RED}error{ANSI_RESET}: {message}\n"
        ),
        None => format!("{ANSI_BOLD}{path}: {ANSI_RED}error{ANSI_RESET}: {message}\n"),
    }
}

/// Accumulated diagnostics for one assembly run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    rendered: String,
    count: u32,
}

/// Snapshot of the diagnostics state, used to roll back reports emitted
/// during token lookahead.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DiagnosticsMark {
    len: usize,
    count: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error with a source position.
    pub fn error_at(&mut self, path: &str, line: u32, col: u32, message: impl fmt::Display) {
        self.rendered
            .push_str(&render(path, Some((line, col)), &message));
        self.count += 1;
    }

    /// Records a positionless error (link and I/O failures).
    pub fn error(&mut self, path: &str, message: impl fmt::Display) {
        self.rendered.push_str(&render(path, None, &message));
        self.count += 1;
    }

    /// Total number of errors recorded.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The rendered diagnostic text, one line per error.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub(crate) fn mark(&self) -> DiagnosticsMark {
        DiagnosticsMark {
            len: self.rendered.len(),
            count: self.count,
        }
    }

    pub(crate) fn rewind_to(&mut self, mark: DiagnosticsMark) {
        self.rendered.truncate(mark.len);
        self.count = mark.count;
    }

    /// Renders a standalone positionless diagnostic, for callers without an
    /// accumulating run (the CLIs).
    pub fn render_plain(path: &str, message: impl fmt::Display) -> String {
        render(path, None, &message)
    }
}
