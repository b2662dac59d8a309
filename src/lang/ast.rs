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

//! Abstract syntax tree.
//!
//! Expression nodes ([`Expr::Name`], [`Expr::BinExpr`], [`Expr::Deref`]) do
//! double duty as addressing-mode patterns: see [`crate::unify`]. A parsed
//! program never contains [`Expr::Var`] — only addressing-mode templates do.

use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostic::Diagnostic;
use crate::unify::Var;

use super::token::Token;

/// A whole program: a sequence of statements in source order.
#[derive(Clone, Debug)]
pub struct File {
    pub stmts: Vec<Stmt>,
}

/// A top-level statement.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// `foo = expr` — a compile-time constant binding.
    Const(Const),
    /// `foo:` — a named location declaration.
    Label(Label),
    /// `N:`, `+N:`, `-N:` — an absolute or relative padding directive.
    Offset(Offset),
    /// `mnemonic arg`, `mnemonic arg1, arg2` — an explicit instruction invocation.
    Op(Op),
    /// A bare expression statement (`nullary` in the grammar): either a free
    /// identifier, a literal, or any other expression, resolved to an
    /// instruction or literal byte during compilation.
    Expr(Expr),
}

impl Stmt {
    pub fn toks(&self) -> &[Token] {
        match self {
            Stmt::Const(c) => &c.toks,
            Stmt::Label(l) => &l.toks,
            Stmt::Offset(o) => &o.toks,
            Stmt::Op(o) => &o.toks,
            Stmt::Expr(e) => e.toks(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Const {
    pub name: Rc<str>,
    pub val: Expr,
    pub toks: Vec<Token>,
}

#[derive(Clone, Debug)]
pub struct Label {
    pub name: Rc<str>,
    pub toks: Vec<Token>,
}

/// The direction an [`Offset`] is measured from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Relative {
    /// `+N:` — forward from the current location.
    Forward,
    /// `-N:` — backward from the end of the address space.
    Backward,
}

#[derive(Clone, Debug)]
pub struct Offset {
    pub offset: u64,
    pub relative: Option<Relative>,
    pub toks: Vec<Token>,
}

#[derive(Clone, Debug)]
pub struct Op {
    pub mnemonic: Rc<str>,
    pub args: Vec<Expr>,
    pub toks: Vec<Token>,
}

/// An expression, or an addressing-mode pattern.
///
/// [`Expr::Name`], [`Expr::BinExpr`], and [`Expr::Deref`] are the only
/// variants ever compared structurally by [`crate::unify::unify`]; the
/// others ([`Expr::Val`], [`Expr::UnExpr`]) unify only as opaque concrete
/// terms.
#[derive(Clone, Debug)]
pub enum Expr {
    Val(Val),
    Name(Name),
    UnExpr(UnExpr),
    BinExpr(BinExpr),
    Deref(Deref),
    /// A pattern variable. Never produced by the parser.
    Var(Var),
}

#[derive(Clone, Debug)]
pub struct Val {
    pub val: i64,
    pub toks: Vec<Token>,
}

#[derive(Clone, Debug)]
pub struct Name {
    pub name: Rc<str>,
    pub toks: Vec<Token>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Debug)]
pub struct UnExpr {
    pub op: UnOp,
    pub x: Box<Expr>,
    pub toks: Vec<Token>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOp {
    Or,
    Xor,
    And,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Clone, Debug)]
pub struct BinExpr {
    pub x: Box<Expr>,
    pub op: BinOp,
    pub y: Box<Expr>,
    pub toks: Vec<Token>,
}

#[derive(Clone, Debug)]
pub struct Deref {
    pub expr: Box<Expr>,
    pub toks: Vec<Token>,
}

/// The bindings in scope for expression evaluation: labels and constants
/// share one namespace.
pub type Scope = HashMap<Rc<str>, i64>;

impl Expr {
    pub fn toks(&self) -> &[Token] {
        match self {
            Expr::Val(v) => &v.toks,
            Expr::Name(n) => &n.toks,
            Expr::UnExpr(u) => &u.toks,
            Expr::BinExpr(b) => &b.toks,
            Expr::Deref(d) => &d.toks,
            Expr::Var(_) => &[],
        }
    }

    /// Evaluates this expression against `scope`, looking up free names and
    /// folding operators. Division and modulus truncate toward negative
    /// infinity.
    pub fn eval(&self, scope: &Scope) -> Result<i64, Diagnostic> {
        match self {
            Expr::Val(v) => Ok(v.val),

            Expr::Name(n) => scope.get(&n.name).copied().ok_or_else(|| {
                Diagnostic::new(format!("name '{}' is not bound", n.name), n.toks.clone())
            }),

            Expr::UnExpr(u) => {
                let x = u.x.eval(scope)?;
                Ok(match u.op {
                    UnOp::Neg => -x,
                    UnOp::Not => !x,
                })
            }

            Expr::BinExpr(b) => {
                let x = b.x.eval(scope)?;
                let y = b.y.eval(scope)?;

                match b.op {
                    BinOp::Or => Ok(x | y),
                    BinOp::Xor => Ok(x ^ y),
                    BinOp::And => Ok(x & y),
                    BinOp::Shl => Ok(x << y),
                    BinOp::Shr => Ok(x >> y),
                    BinOp::Add => Ok(x + y),
                    BinOp::Sub => Ok(x - y),
                    BinOp::Mul => Ok(x * y),
                    BinOp::Div => {
                        if y == 0 {
                            return Err(Diagnostic::new("division by zero", b.toks.clone()));
                        }
                        Ok(floor_div(x, y))
                    }
                    BinOp::Mod => {
                        if y == 0 {
                            return Err(Diagnostic::new("division by zero", b.toks.clone()));
                        }
                        Ok(floor_mod(x, y))
                    }
                    BinOp::Pow => {
                        if y < 0 {
                            return Err(Diagnostic::new(
                                "cannot raise to a negative power",
                                b.toks.clone(),
                            ));
                        }
                        x.checked_pow(y as u32).ok_or_else(|| {
                            Diagnostic::new(
                                format!("evaluated result '{}**{}' overflows", x, y),
                                b.toks.clone(),
                            )
                        })
                    }
                }
            }

            Expr::Deref(d) => d.expr.eval(scope),

            Expr::Var(_) => unreachable!("pattern variables are never evaluated"),
        }
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}
