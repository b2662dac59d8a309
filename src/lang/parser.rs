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

//! Packrat PEG recursive-descent parser.
//!
//! Every production is a method that either succeeds (consuming tokens and
//! returning a node) or fails. A failure is either a soft [`Failure::Reset`]
//! — the caller backtracks and tries another alternative — or a hard
//! [`Failure::Stop`], raised once enough has been consumed to commit to one
//! alternative; `Stop` propagates straight out of [`Parser::parse_file`].
//!
//! The six binary-operator productions (`expr` through `term`) are directly
//! left-recursive. Each is memoized with [`left_recursive!`], which seeds the
//! cache with a failure, invokes the production body, and keeps re-invoking
//! it at the same start position — the body's own recursive call to itself
//! hits the cache and receives the current best result — accepting a new
//! result only when it consumes further than the last. `factor`, `power`,
//! and `atom` are not left-recursive and use the simpler [`memoized!`] cache.

use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostic::Diagnostic;
use crate::util::{is_name, parse_int_literal};

use super::ast::{
    BinExpr, BinOp, Const, Deref, Expr, File, Label, Name, Offset, Op, Relative, Stmt, UnExpr,
    UnOp, Val,
};
use super::lexer::Lexer;
use super::stream::{Pos, TokenStream};
use super::token::Token;

/// A parse failure: soft (backtrackable) or hard (committed).
#[derive(Clone, Debug)]
enum Failure {
    /// No match at this position; the caller should try another
    /// alternative. Carries the attempted token for diagnostic purposes,
    /// except for the left-recursion seed, which is never surfaced.
    Reset(String, Vec<Token>),
    /// A malformed statement past the point of no return.
    Stop(Diagnostic),
}

impl Failure {
    fn reset(message: impl Into<String>, tok: Token) -> Self {
        Failure::Reset(message.into(), vec![tok])
    }

    fn reset_seed() -> Self {
        Failure::Reset("left-recursion seed".into(), vec![])
    }

    /// Promotes a soft failure to a hard one, for use past a commit point.
    fn commit(self) -> Self {
        match self {
            Failure::Reset(msg, toks) => Failure::Stop(Diagnostic::new(msg, toks)),
            stop @ Failure::Stop(_) => stop,
        }
    }
}

type PResult<T> = Result<T, Failure>;

macro_rules! memoized {
    ($name:ident, $cache:ident, $body:ident) => {
        fn $name(&mut self) -> PResult<Expr> {
            let start = self.toks.mark().as_usize();

            if let Some(entry) = self.$cache.get(&start).cloned() {
                return match entry {
                    Ok((node, end)) => {
                        self.toks.reset(Pos::from_usize(end));
                        Ok(node)
                    }
                    Err(e) => {
                        self.toks.reset(Pos::from_usize(start));
                        Err(e)
                    }
                };
            }

            let result = self.$body();
            let entry = match &result {
                Ok(node) => Ok((node.clone(), self.toks.mark().as_usize())),
                Err(e) => Err(e.clone()),
            };
            self.$cache.insert(start, entry);

            if result.is_err() {
                self.toks.reset(Pos::from_usize(start));
            }
            result
        }
    };
}

macro_rules! left_recursive {
    ($name:ident, $cache:ident, $grow:ident) => {
        fn $name(&mut self) -> PResult<Expr> {
            let start = self.toks.mark().as_usize();

            if let Some(entry) = self.$cache.get(&start).cloned() {
                return match entry {
                    Ok((node, end)) => {
                        self.toks.reset(Pos::from_usize(end));
                        Ok(node)
                    }
                    Err(e) => {
                        self.toks.reset(Pos::from_usize(start));
                        Err(e)
                    }
                };
            }

            // Seed so that a same-position recursive call made by $grow
            // fails softly instead of recursing forever.
            self.$cache.insert(start, Err(Failure::reset_seed()));

            self.toks.reset(Pos::from_usize(start));
            let mut best: PResult<(Expr, usize)> = match self.$grow() {
                Ok(node) => {
                    let end = self.toks.mark().as_usize();
                    Ok((node, end))
                }
                Err(e) => Err(e),
            };

            loop {
                self.$cache.insert(start, best.clone());

                let end = match &best {
                    Ok((_, end)) => *end,
                    Err(_) => break,
                };

                self.toks.reset(Pos::from_usize(start));
                match self.$grow() {
                    Ok(node2) => {
                        let end2 = self.toks.mark().as_usize();
                        if end2 > end {
                            best = Ok((node2, end2));
                        } else {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }

            self.$cache.insert(start, best.clone());
            match best {
                Ok((node, end)) => {
                    self.toks.reset(Pos::from_usize(end));
                    Ok(node)
                }
                Err(e) => {
                    self.toks.reset(Pos::from_usize(start));
                    Err(e)
                }
            }
        }
    };
}

type ExprCache = HashMap<usize, PResult<(Expr, usize)>>;

/// A packrat recursive-descent parser over a [`TokenStream`].
pub struct Parser<'a> {
    toks: TokenStream<'a>,
    or_cache: ExprCache,
    xor_cache: ExprCache,
    and_cache: ExprCache,
    shift_cache: ExprCache,
    sum_cache: ExprCache,
    term_cache: ExprCache,
    factor_cache: ExprCache,
    power_cache: ExprCache,
    atom_cache: ExprCache,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            toks: TokenStream::new(Lexer::new(source)),
            or_cache: HashMap::new(),
            xor_cache: HashMap::new(),
            and_cache: HashMap::new(),
            shift_cache: HashMap::new(),
            sum_cache: HashMap::new(),
            term_cache: HashMap::new(),
            factor_cache: HashMap::new(),
            power_cache: HashMap::new(),
            atom_cache: HashMap::new(),
        }
    }

    /// Parses `source` completely, returning an AST or the first diagnostic
    /// encountered.
    pub fn parse(source: &str) -> Result<File, Diagnostic> {
        Parser::new(source).parse_file()
    }

    // -- token primitives ---------------------------------------------

    fn next(&mut self) -> PResult<Token> {
        self.toks.get().map_err(Failure::Stop)
    }

    fn peek_one(&mut self) -> PResult<Token> {
        let pos = self.toks.mark();
        let tok = self.next()?;
        self.toks.reset(pos);
        Ok(tok)
    }

    fn stop_here(&mut self, message: impl Into<String>) -> Failure {
        match self.peek_one() {
            Ok(tok) => Failure::Stop(Diagnostic::new(message, vec![tok])),
            Err(f) => f,
        }
    }

    fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        match f(self) {
            Ok(v) => Ok(Some(v)),
            Err(Failure::Reset(_, _)) => Ok(None),
            Err(stop) => Err(stop),
        }
    }

    fn expect_text(&mut self, alts: &[&str]) -> PResult<Token> {
        let pos = self.toks.mark();
        let tok = self.next()?;
        match tok.text() {
            Some(t) if alts.contains(&t) => Ok(tok),
            _ => {
                let msg = format!("expected one of {:?}", alts);
                self.toks.reset(pos);
                Err(Failure::reset(msg, tok))
            }
        }
    }

    fn expect_newline(&mut self) -> PResult<()> {
        let pos = self.toks.mark();
        let tok = self.next()?;
        if tok.is_newline() {
            Ok(())
        } else {
            self.toks.reset(pos);
            Err(Failure::reset("expected end of line", tok))
        }
    }

    fn expect_name(&mut self) -> PResult<(Rc<str>, Token)> {
        let pos = self.toks.mark();
        let tok = self.next()?;
        match tok.text() {
            Some(t) if is_name(t) => Ok((Rc::from(t), tok)),
            _ => {
                self.toks.reset(pos);
                Err(Failure::reset("expected a name", tok))
            }
        }
    }

    fn expect_val(&mut self) -> PResult<(i64, Token)> {
        let pos = self.toks.mark();
        let tok = self.next()?;
        match tok.text().and_then(parse_int_literal) {
            Some(v) => Ok((v, tok)),
            None => {
                self.toks.reset(pos);
                Err(Failure::reset("expected a number", tok))
            }
        }
    }

    // -- file / statements ----------------------------------------------

    /// `file := stmt* EOF`
    pub fn parse_file(&mut self) -> Result<File, Diagnostic> {
        let mut stmts = Vec::new();

        loop {
            let pos = self.toks.mark();
            match self.next() {
                Ok(tok) if tok.is_eof() => break,
                Ok(_) => self.toks.reset(pos),
                Err(f) => return Err(self.finish(f)),
            }

            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(f) => return Err(self.finish(f)),
            }
        }

        Ok(File { stmts })
    }

    fn finish(&mut self, f: Failure) -> Diagnostic {
        match f {
            Failure::Stop(d) => d,
            Failure::Reset(msg, toks) if !toks.is_empty() => Diagnostic::new(msg, toks),
            Failure::Reset(msg, _) => match self.peek_one() {
                Ok(tok) => Diagnostic::new(msg, vec![tok]),
                Err(Failure::Stop(d)) => d,
                Err(_) => unreachable!("peek_one only ever fails with Stop"),
            },
        }
    }

    /// `stmt := const | offset | label | inst`
    ///
    /// Constants and offsets are tried before labels so that `foo = x` is
    /// preferred over reading `foo` as a bare expression statement.
    fn parse_stmt(&mut self) -> Result<Stmt, Failure> {
        if let Some(c) = self.optional(Self::parse_const)? {
            return Ok(Stmt::Const(c));
        }
        if let Some(o) = self.optional(Self::parse_offset)? {
            return Ok(Stmt::Offset(o));
        }
        if let Some(l) = self.optional(Self::parse_label)? {
            return Ok(Stmt::Label(l));
        }
        self.parse_inst()
    }

    /// `const := NAME "=" expr NEWLINE`
    fn parse_const(&mut self) -> PResult<Const> {
        let start = self.toks.mark();

        let (name, name_tok) = self.expect_name()?;

        if let Err(e) = self.expect_text(&["="]) {
            self.toks.reset(start);
            return Err(e);
        }

        // "=" appears nowhere else in the grammar: committed to a const.
        let val = self.parse_expr().map_err(Failure::commit)?;
        self.expect_newline().map_err(Failure::commit)?;

        Ok(Const { name, val, toks: vec![name_tok] })
    }

    /// `offset := ("+"|"-")? VAL ":" NEWLINE?`
    fn parse_offset(&mut self) -> PResult<Offset> {
        let start = self.toks.mark();

        let relative = match self.expect_text(&["+", "-"]) {
            Ok(tok) => Some(if tok.text() == Some("+") {
                Relative::Forward
            } else {
                Relative::Backward
            }),
            Err(_) => None,
        };

        let (offset, val_tok) = match self.expect_val() {
            Ok(v) => v,
            Err(e) => {
                self.toks.reset(start);
                return Err(e);
            }
        };

        if let Err(e) = self.expect_text(&[":"]) {
            self.toks.reset(start);
            return Err(e);
        }

        let _ = self.expect_newline();

        Ok(Offset { offset: offset as u64, relative, toks: vec![val_tok] })
    }

    /// `label := NAME ":" NEWLINE?`
    fn parse_label(&mut self) -> PResult<Label> {
        let start = self.toks.mark();

        let (name, name_tok) = self.expect_name()?;

        if let Err(e) = self.expect_text(&[":"]) {
            self.toks.reset(start);
            return Err(e);
        }

        let _ = self.expect_newline();

        Ok(Label { name, toks: vec![name_tok] })
    }

    /// `inst := nullary | unary | binary`
    fn parse_inst(&mut self) -> PResult<Stmt> {
        if let Some(e) = self.optional(Self::parse_nullary)? {
            return Ok(Stmt::Expr(e));
        }
        if let Some(op) = self.optional(Self::parse_unary)? {
            return Ok(Stmt::Op(op));
        }
        self.parse_binary().map(Stmt::Op)
    }

    /// `nullary := expr NEWLINE`
    fn parse_nullary(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();
        let e = self.parse_expr()?;

        if let Err(err) = self.expect_newline() {
            self.toks.reset(start);
            return Err(err);
        }

        Ok(e)
    }

    /// `unary := NAME expr NEWLINE`
    fn parse_unary(&mut self) -> PResult<Op> {
        let start = self.toks.mark();

        let (name, name_tok) = self.expect_name()?;

        let arg = match self.parse_expr() {
            Ok(e) => e,
            Err(e) => {
                self.toks.reset(start);
                return Err(e);
            }
        };

        if let Err(e) = self.expect_newline() {
            self.toks.reset(start);
            return Err(e);
        }

        Ok(Op { mnemonic: name, args: vec![arg], toks: vec![name_tok] })
    }

    /// `binary := NAME expr "," expr NEWLINE`
    fn parse_binary(&mut self) -> PResult<Op> {
        let start = self.toks.mark();

        let (name, name_tok) = self.expect_name()?;

        let arg1 = match self.parse_expr() {
            Ok(e) => e,
            Err(e) => {
                self.toks.reset(start);
                return Err(e);
            }
        };

        if let Err(e) = self.expect_text(&[","]) {
            self.toks.reset(start);
            return Err(e);
        }

        // The comma appears nowhere else: a mnemonic, an expr, and a comma
        // together fix this statement as a binary op.
        let arg2 = self.parse_expr().map_err(Failure::commit)?;
        self.expect_newline().map_err(Failure::commit)?;

        Ok(Op { mnemonic: name, args: vec![arg1, arg2], toks: vec![name_tok] })
    }

    // -- expressions ------------------------------------------------------

    left_recursive!(parse_expr, or_cache, parse_expr_grow);
    left_recursive!(parse_xor, xor_cache, parse_xor_grow);
    left_recursive!(parse_and, and_cache, parse_and_grow);
    left_recursive!(parse_shift, shift_cache, parse_shift_grow);
    left_recursive!(parse_sum, sum_cache, parse_sum_grow);
    left_recursive!(parse_term, term_cache, parse_term_grow);

    memoized!(parse_factor, factor_cache, parse_factor_body);
    memoized!(parse_power, power_cache, parse_power_body);
    memoized!(parse_atom, atom_cache, parse_atom_body);

    /// `expr := expr "|" xor | xor`
    fn parse_expr_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_expr() {
            if let Ok(op_tok) = self.expect_text(&["|"]) {
                if let Ok(rhs) = self.parse_xor() {
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op: BinOp::Or,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_xor()
    }

    /// `xor := xor "^" and | and`
    fn parse_xor_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_xor() {
            if let Ok(op_tok) = self.expect_text(&["^"]) {
                if let Ok(rhs) = self.parse_and() {
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op: BinOp::Xor,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_and()
    }

    /// `and := and "&" shift | shift`
    fn parse_and_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_and() {
            if let Ok(op_tok) = self.expect_text(&["&"]) {
                if let Ok(rhs) = self.parse_shift() {
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op: BinOp::And,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_shift()
    }

    /// `shift := shift ("<<"|">>") sum | sum`
    fn parse_shift_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_shift() {
            if let Ok(op_tok) = self.expect_text(&["<<", ">>"]) {
                if let Ok(rhs) = self.parse_sum() {
                    let op = if op_tok.text() == Some("<<") { BinOp::Shl } else { BinOp::Shr };
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_sum()
    }

    /// `sum := sum ("+"|"-") term | term`
    fn parse_sum_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_sum() {
            if let Ok(op_tok) = self.expect_text(&["+", "-"]) {
                if let Ok(rhs) = self.parse_term() {
                    let op = if op_tok.text() == Some("+") { BinOp::Add } else { BinOp::Sub };
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_term()
    }

    /// `term := term ("*"|"/"|"%") factor | factor`
    fn parse_term_grow(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(lhs) = self.parse_term() {
            if let Ok(op_tok) = self.expect_text(&["*", "/", "%"]) {
                if let Ok(rhs) = self.parse_factor() {
                    let op = match op_tok.text() {
                        Some("*") => BinOp::Mul,
                        Some("/") => BinOp::Div,
                        _ => BinOp::Mod,
                    };
                    return Ok(Expr::BinExpr(BinExpr {
                        x: Box::new(lhs),
                        op,
                        y: Box::new(rhs),
                        toks: vec![op_tok],
                    }));
                }
            }
        }

        self.toks.reset(start);
        self.parse_factor()
    }

    /// `factor := ("-"|"~") factor | power`
    fn parse_factor_body(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(op_tok) = self.expect_text(&["-", "~"]) {
            if let Ok(x) = self.parse_factor() {
                let op = if op_tok.text() == Some("-") { UnOp::Neg } else { UnOp::Not };
                return Ok(Expr::UnExpr(UnExpr { op, x: Box::new(x), toks: vec![op_tok] }));
            }
        }

        self.toks.reset(start);
        self.parse_power()
    }

    /// `power := atom "**" factor | atom`
    fn parse_power_body(&mut self) -> PResult<Expr> {
        let base = self.parse_atom()?;
        let save = self.toks.mark();

        if let Ok(op_tok) = self.expect_text(&["**"]) {
            if let Ok(exp) = self.parse_factor() {
                return Ok(Expr::BinExpr(BinExpr {
                    x: Box::new(base),
                    op: BinOp::Pow,
                    y: Box::new(exp),
                    toks: vec![op_tok],
                }));
            }
        }

        self.toks.reset(save);
        Ok(base)
    }

    /// `atom := "[" expr "]" | "(" expr ")" | NAME | VAL`
    ///
    /// The bracket atom produces a [`Deref`]; the paren atom transparently
    /// re-returns the inner node (rather than extending its token span to
    /// include the parentheses), since a parenthesized expression may itself
    /// span physical lines and a [`Diagnostic`] requires a single-line span.
    fn parse_atom_body(&mut self) -> PResult<Expr> {
        let start = self.toks.mark();

        if let Ok(open) = self.expect_text(&["["]) {
            if let Ok(inner) = self.parse_expr() {
                if let Ok(_close) = self.expect_text(&["]"]) {
                    return Ok(Expr::Deref(Deref { expr: Box::new(inner), toks: vec![open] }));
                }
            }
            self.toks.reset(start);
            return Err(self.stop_here("expected ']' to close '['"));
        }

        if let Ok(_open) = self.expect_text(&["("]) {
            if let Ok(inner) = self.parse_expr() {
                if let Ok(_close) = self.expect_text(&[")"]) {
                    return Ok(inner);
                }
            }
            self.toks.reset(start);
            return Err(self.stop_here("expected ')' to close '('"));
        }

        if let Ok((name, tok)) = self.expect_name() {
            return Ok(Expr::Name(Name { name, toks: vec![tok] }));
        }

        let (val, tok) = self.expect_val()?;
        Ok(Expr::Val(Val { val, toks: vec![tok] }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::Scope;

    fn parse(src: &str) -> File {
        Parser::parse(src).unwrap_or_else(|d| panic!("{}", d.render(src)))
    }

    fn eval_only_stmt(src: &str) -> i64 {
        let file = parse(src);
        assert_eq!(file.stmts.len(), 1);
        match &file.stmts[0] {
            Stmt::Expr(e) => e.eval(&Scope::new()).unwrap(),
            other => panic!("expected a bare expression statement, got {:?}", other),
        }
    }

    #[test]
    fn precedence_follows_grammar_levels() {
        assert_eq!(eval_only_stmt("1 + 2 * 3\n"), 7);
        assert_eq!(eval_only_stmt("2 ** 3 + 1\n"), 9);
        assert_eq!(eval_only_stmt("1 | 2 & 3\n"), 3);
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(eval_only_stmt("10 - 3 - 2\n"), 5);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(eval_only_stmt("2 ** 2 ** 3\n"), 256);
    }

    #[test]
    fn long_left_recursive_chain_parses() {
        assert_eq!(eval_only_stmt("1 + 1 + 1 + 1 + 1 + 1\n"), 6);
    }

    #[test]
    fn bracket_atom_is_transparent_to_evaluation() {
        assert_eq!(eval_only_stmt("[1 + 2]\n"), 3);
    }

    #[test]
    fn paren_atom_does_not_change_value() {
        assert_eq!(eval_only_stmt("(1 + 2) * 3\n"), 9);
    }

    #[test]
    fn bracket_may_span_physical_lines() {
        let file = parse("lda [1 +\n  2]\n");
        assert_eq!(file.stmts.len(), 1);
    }

    #[test]
    fn unclosed_bracket_is_a_hard_failure() {
        // The lexer itself rejects this at the character level.
        assert!(Parser::parse("lda [1 + 2\n").is_err());
    }

    #[test]
    fn mismatched_paren_inside_a_bracket_is_reported() {
        let err = Parser::parse("lda [1 + 2)]\n").unwrap_err();
        assert!(err.message().contains("']'"));
    }

    #[test]
    fn const_statement_parses() {
        let file = parse("foo = 1 + 2\nlda foo\n");
        match &file.stmts[0] {
            Stmt::Const(c) => {
                assert_eq!(&*c.name, "foo");
                assert_eq!(c.val.eval(&Scope::new()).unwrap(), 3);
            }
            other => panic!("expected const, got {:?}", other),
        }
    }

    #[test]
    fn malformed_const_is_a_hard_failure() {
        let err = Parser::parse("foo = \n").unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn label_statement_parses() {
        let file = parse("loop:\n");
        match &file.stmts[0] {
            Stmt::Label(l) => assert_eq!(&*l.name, "loop"),
            other => panic!("expected label, got {:?}", other),
        }
    }

    #[test]
    fn label_and_instruction_may_share_a_line() {
        let file = parse("loop: nop\n");
        assert_eq!(file.stmts.len(), 2);
        assert!(matches!(file.stmts[0], Stmt::Label(_)));
    }

    #[test]
    fn offset_statement_parses_absolute_and_relative() {
        let file = parse("0x10:\n+4:\n-1:\n");
        assert_eq!(file.stmts.len(), 3);
        match &file.stmts[0] {
            Stmt::Offset(o) => {
                assert_eq!(o.offset, 0x10);
                assert_eq!(o.relative, None);
            }
            other => panic!("expected offset, got {:?}", other),
        }
        match &file.stmts[1] {
            Stmt::Offset(o) => assert_eq!(o.relative, Some(Relative::Forward)),
            other => panic!("expected offset, got {:?}", other),
        }
        match &file.stmts[2] {
            Stmt::Offset(o) => assert_eq!(o.relative, Some(Relative::Backward)),
            other => panic!("expected offset, got {:?}", other),
        }
    }

    #[test]
    fn nullary_instruction_parses_as_bare_expr() {
        let file = parse("nop\n");
        match &file.stmts[0] {
            Stmt::Expr(Expr::Name(n)) => assert_eq!(&*n.name, "nop"),
            other => panic!("expected a bare name expr, got {:?}", other),
        }
    }

    #[test]
    fn unary_instruction_parses() {
        let file = parse("lda 0xff\n");
        match &file.stmts[0] {
            Stmt::Op(op) => {
                assert_eq!(&*op.mnemonic, "lda");
                assert_eq!(op.args.len(), 1);
            }
            other => panic!("expected a unary op, got {:?}", other),
        }
    }

    #[test]
    fn binary_instruction_parses() {
        let file = parse("mvi a, 5\n");
        match &file.stmts[0] {
            Stmt::Op(op) => {
                assert_eq!(&*op.mnemonic, "mvi");
                assert_eq!(op.args.len(), 2);
            }
            other => panic!("expected a binary op, got {:?}", other),
        }
    }

    #[test]
    fn missing_second_binary_operand_is_a_hard_failure() {
        let err = Parser::parse("mvi a,\n").unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn indexed_addressing_expression_parses() {
        let file = parse("lda [0xff + x]\n");
        match &file.stmts[0] {
            Stmt::Op(op) => match &op.args[0] {
                Expr::Deref(d) => assert!(matches!(&*d.expr, Expr::BinExpr(_))),
                other => panic!("expected a deref, got {:?}", other),
            },
            other => panic!("expected a unary op, got {:?}", other),
        }
    }
}
