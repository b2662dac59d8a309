// This file is part of ras, an assembler.
// Copyright (C) 2020 Jeffrey Sharp
//
// ras is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published
// by the Free Software Foundation, either version 3 of the License,
// or (at your option) any later version.
//
// ras is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ras.  If not, see <http://www.gnu.org/licenses/>.

//! User-facing diagnostics: a message tied to a contiguous token span on a
//! single source line.

use crate::lang::token::Token;

/// A user-facing error tied to one or more tokens on a single source line.
///
/// Every other assembler failure (bad integer, unknown mnemonic, oversized
/// operand, unbound name, reserved name, duplicate label, misaligned
/// padding, unmatched bracket, end of input) is reported as a `Diagnostic`.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    msg: String,
    toks: Vec<Token>,
}

impl Diagnostic {
    /// Creates a diagnostic for `msg` spanning `toks`.
    ///
    /// # Panics
    ///
    /// Panics if `toks` is empty or its tokens are not all on the same
    /// source line — both are programmer errors, not user-facing failures.
    pub fn new(msg: impl Into<String>, toks: impl Into<Vec<Token>>) -> Self {
        let toks = toks.into();
        assert!(!toks.is_empty(), "diagnostic requires at least one token");

        let line_num = toks[0].line_num();
        assert!(
            toks.iter().all(|t| t.line_num() == line_num),
            "diagnostic tokens must share a line"
        );

        Self { msg: msg.into(), toks }
    }

    /// The diagnostic message text, without position information.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// The tokens this diagnostic spans.
    pub fn tokens(&self) -> &[Token] {
        &self.toks
    }

    /// Recovers the (untrimmed) line of `source` that this diagnostic's
    /// tokens fall on.
    fn line_text<'s>(&self, source: &'s str) -> &'s str {
        let start = self.toks[0].line_start();
        match source[start..].find('\n') {
            Some(rel) => &source[start..start + rel + 1],
            None => &source[start..],
        }
    }

    /// Renders this diagnostic against `source` as:
    ///
    /// ```text
    /// at line L, col C:
    /// <line>
    /// <spaces><carets>
    ///
    /// <message>
    /// ```
    pub fn render(&self, source: &str) -> String {
        let fst = &self.toks[0];
        let lst = self.toks.last().unwrap();

        let line = self.line_text(source);
        let line_trimmed = line.trim_end_matches(['\n', '\r']);

        let marker_start = (fst.col() as usize).min(line_trimmed.len());
        let marker_end = (lst.end_col() as usize).max(marker_start + 1);
        let marker_len = marker_end.saturating_sub(marker_start).max(1);

        let marker = format!(
            "{}{}",
            " ".repeat(marker_start),
            "^".repeat(marker_len)
        );

        format!(
            "at line {}, col {}:\n{}\n{}\n\n{}",
            fst.line_num(),
            fst.col() + 1,
            line_trimmed,
            marker,
            self.msg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn text(s: &str, line_start: usize, col: u32) -> Token {
        Token::Text { text: Rc::from(s), line_start, line_num: 1, col }
    }

    #[test]
    fn renders_single_token_span() {
        let src = "lda 256\n";
        let tok = text("256", 0, 4);
        let d = Diagnostic::new("evaluated result '256' is too large", vec![tok]);

        let rendered = d.render(src);
        assert!(rendered.contains("at line 1, col 5:"));
        assert!(rendered.contains("lda 256"));
        assert!(rendered.contains("is too large"));

        let marker_line = rendered.lines().nth(2).unwrap();
        assert_eq!(marker_line, "    ^^^");
    }

    #[test]
    fn renders_multi_token_span() {
        let src = "lda foo, 1\n";
        let toks = vec![text("lda", 0, 0), text("foo", 0, 4), text(",", 0, 7)];
        let d = Diagnostic::new("bad statement", toks);
        let rendered = d.render(src);
        let marker_line = rendered.lines().nth(2).unwrap();
        assert_eq!(marker_line, "^^^^^^^^");
    }

    #[test]
    fn line_without_trailing_newline() {
        let src = "hlt";
        let d = Diagnostic::new("oops", vec![text("hlt", 0, 0)]);
        let rendered = d.render(src);
        assert!(rendered.contains("hlt"));
    }
}
