//! Assembly lexer.
//!
//! Tokenization happens over the [`Assembler`] context, which owns the
//! cursor into the source and the line/column counters. The lexer never
//! aborts: illegal bytes and overflowing integers are diagnostics, and
//! lexing continues after each.

use super::Assembler;
use crate::errors::AsmError;

/// Token variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// Byte that starts no token; reported as a diagnostic.
    Illegal,
    /// Base-10 integer literal, optional leading minus.
    Int,
    /// Plain identifier.
    Ident,
    /// Register reference (`r0`..`r7`).
    Register,
    /// Identifier immediately followed by `:`; the colon is consumed with
    /// the label.
    LabelDef,
}

/// One token with its source text and position. Tokens borrow from the
/// source and live for a single parse step.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Source text of the token, colon excluded for label definitions.
    pub text: &'a str,
    /// Parsed value for `Int` (the literal) and `Register` (the index).
    pub value: i64,
    /// 1-based source line of the first byte.
    pub line: u32,
    /// 1-based source column of the first byte.
    pub col: u32,
}

impl<'a> Assembler<'a> {
    /// Byte under the cursor, or `None` at end of input.
    fn current(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    /// Byte one past the cursor.
    fn lookahead_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos + 1).copied()
    }

    /// Moves the cursor forward one byte, tracking line and column.
    fn consume(&mut self) {
        match self.current() {
            None => {}
            Some(b'\n') => {
                self.line += 1;
                self.col = 1;
                self.pos += 1;
            }
            Some(_) => {
                self.col += 1;
                self.pos += 1;
            }
        }
    }

    /// Error recovery: advances the cursor to the next newline.
    pub(super) fn consume_until_newline(&mut self) {
        while let Some(b) = self.current() {
            if b == b'\n' {
                break;
            }
            self.consume();
        }
    }

    /// Records a lexer-level diagnostic. Muted during pass 2, which re-lexes
    /// the same bytes; every lex error is surfaced exactly once.
    fn lex_error(&mut self, line: u32, col: u32, message: AsmError) {
        if self.report_lex_errors {
            self.diagnostics.error_at(&self.path, line, col, message);
        }
    }

    /// Takes the next token from the cursor.
    pub(super) fn next_token(&mut self) -> Token<'a> {
        // Skip separators (whitespace and commas) and `;` comments.
        while let Some(b) = self.current() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.consume(),
                b',' => self.consume(),
                b';' => self.consume_until_newline(),
                _ => break,
            }
        }

        let line = self.line;
        let col = self.col;
        let start = self.pos;

        let Some(b) = self.current() else {
            return Token {
                kind: TokenKind::Eof,
                text: "",
                value: 0,
                line,
                col,
            };
        };

        // Integer literal: digit, or '-' directly followed by a digit.
        if b.is_ascii_digit()
            || (b == b'-' && self.lookahead_byte().is_some_and(|c| c.is_ascii_digit()))
        {
            if b == b'-' {
                self.consume();
            }
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.consume();
            }
            let text = &self.source[start..self.pos];
            let value = match text.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    self.lex_error(line, col, AsmError::IntegerOutOfRange);
                    0
                }
            };
            return Token {
                kind: TokenKind::Int,
                text,
                value,
                line,
                col,
            };
        }

        // Identifier run, then classify: label definition, register, or
        // plain identifier.
        if b.is_ascii_alphabetic() || b == b'_' {
            while self
                .current()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
            {
                self.consume();
            }
            let text = &self.source[start..self.pos];

            if self.current() == Some(b':') {
                self.consume();
                return Token {
                    kind: TokenKind::LabelDef,
                    text,
                    value: 0,
                    line,
                    col,
                };
            }

            let bytes = text.as_bytes();
            if bytes[0] == b'r' && bytes.len() > 1 && bytes[1].is_ascii_digit() {
                let value = self.register_index(text, line, col);
                return Token {
                    kind: TokenKind::Register,
                    text,
                    value,
                    line,
                    col,
                };
            }

            return Token {
                kind: TokenKind::Ident,
                text,
                value: 0,
                line,
                col,
            };
        }

        // No valid token starts here.
        self.lex_error(line, col, AsmError::IllegalCharacter { ch: b as char });
        self.consume();
        Token {
            kind: TokenKind::Illegal,
            text: &self.source[start..self.pos],
            value: 0,
            line,
            col,
        }
    }

    /// Parses the numeric suffix of a register token: the digit run after
    /// `r`, trailing non-digits ignored.
    fn register_index(&mut self, text: &str, line: u32, col: u32) -> i64 {
        let suffix = &text[1..];
        let digits_end = suffix
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(suffix.len());
        match suffix[..digits_end].parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                self.lex_error(line, col, AsmError::IntegerOutOfRange);
                0
            }
        }
    }

    /// Returns the n-th following token (n >= 1) without moving the cursor.
    ///
    /// Restores the cursor, line and column, and rolls back any diagnostics
    /// emitted while looking ahead; lookahead is side-effect free.
    pub(super) fn peek(&mut self, n: usize) -> Token<'a> {
        let saved_pos = self.pos;
        let saved_line = self.line;
        let saved_col = self.col;
        let mark = self.diagnostics.mark();

        let mut token = self.next_token();
        for _ in 1..n {
            token = self.next_token();
        }

        self.pos = saved_pos;
        self.line = saved_line;
        self.col = saved_col;
        self.diagnostics.rewind_to(mark);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> (Vec<(TokenKind, String, i64)>, u32) {
        let mut asm = Assembler::new("test.asm", source);
        let mut tokens = Vec::new();
        loop {
            let t = asm.next_token();
            if t.kind == TokenKind::Eof {
                break;
            }
            tokens.push((t.kind, t.text.to_string(), t.value));
        }
        (tokens, asm.diagnostics.count())
    }

    #[test]
    fn empty_source_is_eof() {
        let (tokens, errors) = lex_all("");
        assert!(tokens.is_empty());
        assert_eq!(errors, 0);
    }

    #[test]
    fn whitespace_commas_and_comments_are_separators() {
        let (tokens, errors) = lex_all("push 1, 2\t; trailing comment\n; full line\n  halt");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Ident, "push".to_string(), 0),
                (TokenKind::Int, "1".to_string(), 1),
                (TokenKind::Int, "2".to_string(), 2),
                (TokenKind::Ident, "halt".to_string(), 0),
            ]
        );
        assert_eq!(errors, 0);
    }

    #[test]
    fn negative_integer() {
        let (tokens, _) = lex_all("-42");
        assert_eq!(tokens, vec![(TokenKind::Int, "-42".to_string(), -42)]);
    }

    #[test]
    fn minus_without_digit_is_illegal() {
        let (tokens, errors) = lex_all("- 5");
        assert_eq!(tokens[0].0, TokenKind::Illegal);
        assert_eq!(tokens[1], (TokenKind::Int, "5".to_string(), 5));
        assert_eq!(errors, 1);
    }

    #[test]
    fn integer_out_of_range_reports_and_continues() {
        let (tokens, errors) = lex_all("99999999999999999999 halt");
        assert_eq!(tokens[0].0, TokenKind::Int);
        assert_eq!(tokens[0].2, 0);
        assert_eq!(tokens[1].0, TokenKind::Ident);
        assert_eq!(errors, 1);
    }

    #[test]
    fn register_token_value() {
        let (tokens, _) = lex_all("r0 r7 r15");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Register, "r0".to_string(), 0),
                (TokenKind::Register, "r7".to_string(), 7),
                (TokenKind::Register, "r15".to_string(), 15),
            ]
        );
    }

    #[test]
    fn r_followed_by_non_digit_is_identifier() {
        let (tokens, _) = lex_all("run rx r");
        assert_eq!(tokens[0].0, TokenKind::Ident);
        assert_eq!(tokens[1].0, TokenKind::Ident);
        assert_eq!(tokens[2].0, TokenKind::Ident);
    }

    #[test]
    fn register_with_trailing_letters_keeps_digit_prefix() {
        let (tokens, _) = lex_all("r1x");
        assert_eq!(tokens, vec![(TokenKind::Register, "r1x".to_string(), 1)]);
    }

    #[test]
    fn label_definition_consumes_colon() {
        let (tokens, _) = lex_all("_start: push");
        assert_eq!(tokens[0], (TokenKind::LabelDef, "_start".to_string(), 0));
        assert_eq!(tokens[1], (TokenKind::Ident, "push".to_string(), 0));
    }

    #[test]
    fn illegal_byte_consumes_one_byte() {
        let (tokens, errors) = lex_all("@halt");
        assert_eq!(tokens[0].0, TokenKind::Illegal);
        assert_eq!(tokens[1], (TokenKind::Ident, "halt".to_string(), 0));
        assert_eq!(errors, 1);
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let mut asm = Assembler::new("test.asm", "push 1\n  halt");
        let push = asm.next_token();
        assert_eq!((push.line, push.col), (1, 1));
        let one = asm.next_token();
        assert_eq!((one.line, one.col), (1, 6));
        let halt = asm.next_token();
        assert_eq!((halt.line, halt.col), (2, 3));
    }

    #[test]
    fn peek_does_not_move_the_cursor() {
        let mut asm = Assembler::new("test.asm", "push 1 2");
        let first = asm.peek(1);
        assert_eq!(first.text, "push");
        let third = asm.peek(3);
        assert_eq!(third.value, 2);

        // cursor still at the start
        let t = asm.next_token();
        assert_eq!(t.text, "push");
    }

    #[test]
    fn peek_rolls_back_lookahead_diagnostics() {
        let mut asm = Assembler::new("test.asm", "push @");
        let t = asm.peek(2);
        assert_eq!(t.kind, TokenKind::Illegal);
        assert_eq!(asm.diagnostics.count(), 0);

        // the real scan still reports it
        asm.next_token();
        asm.next_token();
        assert_eq!(asm.diagnostics.count(), 1);
    }

    #[test]
    fn consume_until_newline_stops_at_newline() {
        let mut asm = Assembler::new("test.asm", "garbage here\nhalt");
        asm.consume_until_newline();
        let t = asm.next_token();
        assert_eq!(t.text, "halt");
        assert_eq!(t.line, 2);
    }
}
