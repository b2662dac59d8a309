// This file is part of ras, an assembler.
// Copyright (C) 2019 Jeffrey Sharp
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

//! Lexical tokens.

use std::rc::Rc;

/// A lexical token.
///
/// Every variant carries the byte offset of the start of its source line
/// (`line_start`), the 1-based line number (`line_num`), and the 0-based
/// column at which the token begins (`col`). Two tokens are equal iff they
/// are the same variant with the same positional fields (and, for `Text`,
/// the same text).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    /// A run of non-whitespace, non-comment characters.
    Text {
        text: Rc<str>,
        line_start: usize,
        line_num: u32,
        col: u32,
    },

    /// The end of a logical line.
    Newline {
        line_start: usize,
        line_num: u32,
        col: u32,
    },

    /// The end of input. Exactly one is produced per lex, as the final
    /// token.
    Eof {
        line_start: usize,
        line_num: u32,
        col: u32,
    },
}

impl Token {
    /// Returns the byte offset of the start of this token's source line.
    pub fn line_start(&self) -> usize {
        match *self {
            Token::Text { line_start, .. } => line_start,
            Token::Newline { line_start, .. } => line_start,
            Token::Eof { line_start, .. } => line_start,
        }
    }

    /// Returns the 1-based line number on which this token begins.
    pub fn line_num(&self) -> u32 {
        match *self {
            Token::Text { line_num, .. } => line_num,
            Token::Newline { line_num, .. } => line_num,
            Token::Eof { line_num, .. } => line_num,
        }
    }

    /// Returns the 0-based column at which this token begins.
    pub fn col(&self) -> u32 {
        match *self {
            Token::Text { col, .. } => col,
            Token::Newline { col, .. } => col,
            Token::Eof { col, .. } => col,
        }
    }

    /// Returns the column immediately past the end of this token.
    pub fn end_col(&self) -> u32 {
        match self {
            Token::Text { text, col, .. } => col + text.chars().count() as u32,
            Token::Newline { col, .. } | Token::Eof { col, .. } => col + 1,
        }
    }

    /// Returns the text run this token represents, if it is a
    /// [`Text`](Token::Text) token.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if this token is [`Newline`](Token::Newline).
    pub fn is_newline(&self) -> bool {
        matches!(self, Token::Newline { .. })
    }

    /// Returns `true` if this token is [`Eof`](Token::Eof).
    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Token {
        Token::Text { text: Rc::from(s), line_start: 0, line_num: 1, col: 0 }
    }

    #[test]
    fn end_col_of_text() {
        assert_eq!(text("lda").end_col(), 3);
    }

    #[test]
    fn end_col_of_newline() {
        let tok = Token::Newline { line_start: 0, line_num: 1, col: 4 };
        assert_eq!(tok.end_col(), 5);
    }

    #[test]
    fn equality_ignores_nothing() {
        assert_eq!(text("lda"), text("lda"));
        assert_ne!(text("lda"), text("sta"));
    }

    #[test]
    fn predicates() {
        let eof = Token::Eof { line_start: 0, line_num: 1, col: 0 };
        assert!(eof.is_eof());
        assert!(!eof.is_newline());
    }
}
