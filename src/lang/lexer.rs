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

//! Lexer.
//!
//! Splits the source text into a sequence of [`Token`]s, one logical line at
//! a time. Each line is partitioned into maximal runs of whitespace, the
//! "joined" operator characters `* < >` (so `**`, `<<`, `>>` lex as single
//! tokens), the "disjoined" single-character punctuation `- ~ + / ^ & | % :
//! , [ ] ( )`, and everything else (identifiers and numbers). A `;` begins
//! an end-of-line comment. While a `[` or `(` is open, logical newlines are
//! suppressed so that an expression may span physical lines.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::diagnostic::Diagnostic;

use super::token::Token;

const COMMENT_CHAR: char = ';';

fn is_joined(c: char) -> bool {
    matches!(c, '*' | '<' | '>')
}

fn is_disjoined(c: char) -> bool {
    matches!(c, '-' | '~' | '+' | '/' | '^' | '&' | '|' | '%' | ':' | ',' | '[' | ']' | '(' | ')')
}

/// Splits source text into a lazy sequence of [`Token`]s terminated by
/// exactly one [`Token::Eof`].
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line_num: u32,
    queue: VecDeque<Token>,
    brackets: Vec<Token>,
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line_num: 0,
            queue: VecDeque::new(),
            brackets: Vec::new(),
            done: false,
        }
    }

    /// Returns the next token, advancing the lexer.
    ///
    /// Once `Eof` has been produced, further calls keep returning an `Eof`
    /// token at the same position; the caller ([`TokenStream`](super::stream::TokenStream))
    /// is responsible for treating a second `Eof` as exhaustion.
    pub fn next_token(&mut self) -> Result<Token, Diagnostic> {
        loop {
            if let Some(tok) = self.queue.pop_front() {
                return Ok(tok);
            }
            self.pump()?;
        }
    }

    /// Reads and tokenizes one physical line into `self.queue`, or produces
    /// `Eof` if the input is exhausted.
    fn pump(&mut self) -> Result<(), Diagnostic> {
        loop {
            if self.pos >= self.input.len() {
                if let Some(open) = self.brackets.last() {
                    return Err(Diagnostic::new(
                        "unmatched bracket at end of file",
                        vec![open.clone()],
                    ));
                }
                self.queue.push_back(Token::Eof {
                    line_start: self.pos,
                    line_num: self.line_num.max(1),
                    col: 0,
                });
                self.done = true;
                return Ok(());
            }

            let line_start = self.pos;
            self.line_num += 1;

            let rest = &self.input[self.pos..];
            let (line, consumed) = match rest.find('\n') {
                Some(i) => (&rest[..i], i + 1),
                None => (rest, rest.len()),
            };
            self.pos += consumed;

            let code = match line.find(COMMENT_CHAR) {
                Some(i) => &line[..i],
                None => line,
            };

            if code.trim().is_empty() {
                continue;
            }

            self.tokenize_line(code, line_start)?;

            if self.brackets.is_empty() {
                self.queue.push_back(Token::Newline {
                    line_start,
                    line_num: self.line_num,
                    col: line.len() as u32,
                });
            }

            return Ok(());
        }
    }

    fn tokenize_line(&mut self, code: &str, line_start: usize) -> Result<(), Diagnostic> {
        let mut chars = code.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if c.is_whitespace() {
                continue;
            }

            if is_disjoined(c) {
                let end = i + c.len_utf8();
                self.push_text(&code[i..end], line_start, i)?;
                continue;
            }

            let start = i;
            let mut end = i + c.len_utf8();

            if is_joined(c) {
                while let Some(&(j, c2)) = chars.peek() {
                    if is_joined(c2) {
                        end = j + c2.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
            } else {
                while let Some(&(j, c2)) = chars.peek() {
                    if c2.is_whitespace() || is_disjoined(c2) || is_joined(c2) {
                        break;
                    }
                    end = j + c2.len_utf8();
                    chars.next();
                }
            }

            self.push_text(&code[start..end], line_start, start)?;
        }

        Ok(())
    }

    fn push_text(&mut self, text: &str, line_start: usize, col: usize) -> Result<(), Diagnostic> {
        let tok = Token::Text {
            text: Rc::from(text),
            line_start,
            line_num: self.line_num,
            col: col as u32,
        };

        match text {
            "[" | "(" => self.brackets.push(tok.clone()),
            "]" => self.pop_bracket(&tok, '[')?,
            ")" => self.pop_bracket(&tok, '(')?,
            _ => {}
        }

        self.queue.push_back(tok);
        Ok(())
    }

    fn pop_bracket(&mut self, closer: &Token, wants: char) -> Result<(), Diagnostic> {
        match self.brackets.pop() {
            Some(open) if open.text() == Some(&wants.to_string()) => Ok(()),
            // The stray opener may be on an earlier physical line than `closer`
            // (brackets suppress newlines), so the diagnostic can only span
            // `closer` itself, not both tokens.
            Some(open) => {
                let expected = match open.text() {
                    Some("[") => ']',
                    _ => ')',
                };
                Err(Diagnostic::new(
                    format!("mismatched closing bracket, expected '{}'", expected),
                    vec![closer.clone()],
                ))
            }
            None => Err(Diagnostic::new(
                format!("unmatched closing bracket '{}'", closer.text().unwrap_or("")),
                vec![closer.clone()],
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex error");
            let is_eof = tok.is_eof();
            out.push(tok);
            if is_eof {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let toks = lex_all("\n; just a comment\n   \nnop\n");
        // one nullary-instruction line: Text("nop"), Newline, Eof
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].text(), Some("nop"));
        assert!(toks[1].is_newline());
        assert!(toks[2].is_eof());
    }

    #[test]
    fn joined_operators_merge() {
        let toks = lex_all("a ** b\n");
        assert_eq!(toks[0].text(), Some("a"));
        assert_eq!(toks[1].text(), Some("**"));
        assert_eq!(toks[2].text(), Some("b"));
    }

    #[test]
    fn disjoined_operators_never_merge() {
        let toks = lex_all("a+-b\n");
        let texts: Vec<_> = toks.iter().filter_map(|t| t.text()).collect();
        assert_eq!(texts, vec!["a", "+", "-", "b"]);
    }

    #[test]
    fn brackets_suppress_newlines_across_lines() {
        let toks = lex_all("lda [0xff +\n  x]\n");
        let texts: Vec<_> = toks.iter().filter_map(|t| t.text()).collect();
        assert_eq!(texts, vec!["lda", "[", "0xff", "+", "x", "]"]);
        // only one Newline: after the closing bracket's line
        assert_eq!(toks.iter().filter(|t| t.is_newline()).count(), 1);
    }

    #[test]
    fn unmatched_closing_bracket_is_an_error() {
        let mut lexer = Lexer::new("lda ]\n");
        let mut err = None;
        loop {
            match lexer.next_token() {
                Ok(tok) if tok.is_eof() => break,
                Ok(_) => continue,
                Err(d) => {
                    err = Some(d);
                    break;
                }
            }
        }
        assert!(err.is_some());
    }

    #[test]
    fn unmatched_opener_at_eof_is_an_error() {
        let mut lexer = Lexer::new("lda [0xff\n");
        let mut err = None;
        loop {
            match lexer.next_token() {
                Ok(tok) if tok.is_eof() => break,
                Ok(_) => continue,
                Err(d) => {
                    err = Some(d);
                    break;
                }
            }
        }
        assert!(err.is_some());
    }

    #[test]
    fn positional_correctness() {
        let src = "  lda 0x2a\n";
        let toks = lex_all(src);
        for tok in &toks {
            if let Token::Text { text, line_start, col, .. } = tok {
                let start = line_start + *col as usize;
                assert_eq!(&src[start..start + text.len()], &**text);
            }
        }
    }

    #[test]
    fn exactly_one_eof() {
        let toks = lex_all("nop\nhlt\n");
        assert_eq!(toks.iter().filter(|t| t.is_eof()).count(), 1);
        assert!(toks.last().unwrap().is_eof());
    }
}
