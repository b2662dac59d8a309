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

//! Token stream: a buffered, positionally indexed view over the lexer with
//! `mark`/`reset` primitives for backtracking.

use crate::diagnostic::Diagnostic;

use super::lexer::Lexer;
use super::token::Token;

/// An opaque cursor position within a [`TokenStream`], produced by
/// [`TokenStream::mark`] and consumed by [`TokenStream::reset`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos(usize);

/// Buffers every token the lexer has produced so the parser can rewind to
/// any earlier position.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    buf: Vec<Token>,
    cursor: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a token stream over `lexer`.
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self { lexer, buf: Vec::new(), cursor: 0 }
    }

    /// Returns the next token, advancing the cursor. Pulls a new token from
    /// the lexer only when the buffer has been exhausted.
    ///
    /// Fails with an "unexpected end of tokens" diagnostic if called again
    /// after the buffer's last token was an `Eof` and the cursor has already
    /// passed it.
    pub fn get(&mut self) -> Result<Token, Diagnostic> {
        if self.cursor == self.buf.len() {
            if let Some(last) = self.buf.last() {
                if last.is_eof() {
                    return Err(Diagnostic::new("unexpected end of tokens", vec![last.clone()]));
                }
            }
            let tok = self.lexer.next_token()?;
            self.buf.push(tok);
        }

        let tok = self.buf[self.cursor].clone();
        self.cursor += 1;
        Ok(tok)
    }

    /// Reads the current cursor position without advancing it.
    pub fn mark(&self) -> Pos {
        Pos(self.cursor)
    }

    /// Rewinds the cursor to a position previously returned by [`mark`](Self::mark).
    pub fn reset(&mut self, pos: Pos) {
        self.cursor = pos.0;
    }
}

impl Pos {
    /// Builds a position from a raw cursor index, for use by the parser's
    /// packrat cache when replaying a memoized result.
    pub(crate) fn from_usize(pos: usize) -> Self {
        Pos(pos)
    }

    /// Exposes the raw cursor index, for use as a packrat cache key.
    pub(crate) fn as_usize(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(src: &'static str) -> TokenStream<'static> {
        TokenStream::new(Lexer::new(src))
    }

    #[test]
    fn advances_and_yields_eof() {
        let mut s = stream("nop\n");
        assert_eq!(s.get().unwrap().text(), Some("nop"));
        assert!(s.get().unwrap().is_newline());
        assert!(s.get().unwrap().is_eof());
    }

    #[test]
    fn mark_and_reset_rewind() {
        let mut s = stream("lda 1\n");
        let pos = s.mark();
        let first = s.get().unwrap();
        s.get().unwrap();
        s.reset(pos);
        let replay = s.get().unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn exhaustion_past_eof_is_an_error() {
        let mut s = stream("nop\n");
        loop {
            let tok = s.get().unwrap();
            if tok.is_eof() {
                break;
            }
        }
        assert!(s.get().is_err());
    }

    #[test]
    fn buffers_tokens_so_replay_does_not_relex() {
        let mut s = stream("a b c\n");
        let pos = s.mark();
        let a1 = s.get().unwrap();
        let b1 = s.get().unwrap();
        s.reset(pos);
        let a2 = s.get().unwrap();
        let b2 = s.get().unwrap();
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
    }
}
