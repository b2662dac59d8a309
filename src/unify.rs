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

//! First-order structural unification (Martelli-Montanari) over [`Expr`]
//! trees, used to match an operand expression against an addressing-mode
//! template.
//!
//! Only [`Expr::BinExpr`] and [`Expr::Deref`] decompose into sub-equations;
//! every other variant (including [`Expr::Name`]) unifies as an opaque
//! concrete term once a [`Var`] is not involved.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::lang::ast::Expr;

/// A named placeholder in an addressing-mode template.
///
/// `predicate`, when present, must accept the term a variable is about to be
/// bound to, or unification fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Var {
    pub name: &'static str,
    pub predicate: Option<fn(&Expr) -> bool>,
}

impl Var {
    pub const fn new(name: &'static str) -> Self {
        Self { name, predicate: None }
    }

    pub const fn with_predicate(name: &'static str, predicate: fn(&Expr) -> bool) -> Self {
        Self { name, predicate: Some(predicate) }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The addressing-mode operand placeholder shared by every template.
pub const T: Var = Var::new("T");

/// A failure to unify two terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternError(pub String);

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The bindings produced by a successful [`unify`].
pub type Substitutions = HashMap<Var, Expr>;

fn kind_name(e: &Expr) -> &'static str {
    match e {
        Expr::Val(_) => "Val",
        Expr::Name(_) => "Name",
        Expr::UnExpr(_) => "UnExpr",
        Expr::BinExpr(_) => "BinExpr",
        Expr::Deref(_) => "Deref",
        Expr::Var(_) => "Var",
    }
}

fn is_var(e: &Expr) -> bool {
    matches!(e, Expr::Var(_))
}

fn is_compound(e: &Expr) -> bool {
    matches!(e, Expr::BinExpr(_) | Expr::Deref(_))
}

/// Structural equality ignoring token spans; the Martelli-Montanari "delete"
/// rule fires when this holds.
fn terms_equal(x: &Expr, y: &Expr) -> bool {
    match (x, y) {
        (Expr::Val(a), Expr::Val(b)) => a.val == b.val,
        (Expr::Name(a), Expr::Name(b)) => a.name == b.name,
        (Expr::UnExpr(a), Expr::UnExpr(b)) => a.op == b.op && terms_equal(&a.x, &b.x),
        (Expr::BinExpr(a), Expr::BinExpr(b)) => {
            a.op == b.op && terms_equal(&a.x, &b.x) && terms_equal(&a.y, &b.y)
        }
        (Expr::Deref(a), Expr::Deref(b)) => terms_equal(&a.expr, &b.expr),
        (Expr::Var(a), Expr::Var(b)) => a == b,
        _ => false,
    }
}

fn occurs_check(v: Var, term: &Expr) -> bool {
    match term {
        Expr::Var(v2) => *v2 == v,
        Expr::BinExpr(b) => occurs_check(v, &b.x) || occurs_check(v, &b.y),
        Expr::Deref(d) => occurs_check(v, &d.expr),
        _ => false,
    }
}

fn occurs_in_equations(v: Var, equations: &VecDeque<(Expr, Expr)>) -> bool {
    equations.iter().any(|(x, y)| occurs_check(v, x) || occurs_check(v, y))
}

fn substitute(v: Var, replacement: &Expr, term: &Expr) -> Expr {
    match term {
        Expr::Var(v2) if *v2 == v => replacement.clone(),
        Expr::BinExpr(b) => Expr::BinExpr(crate::lang::ast::BinExpr {
            x: Box::new(substitute(v, replacement, &b.x)),
            op: b.op,
            y: Box::new(substitute(v, replacement, &b.y)),
            toks: b.toks.clone(),
        }),
        Expr::Deref(d) => Expr::Deref(crate::lang::ast::Deref {
            expr: Box::new(substitute(v, replacement, &d.expr)),
            toks: d.toks.clone(),
        }),
        _ => term.clone(),
    }
}

fn apply_sub(v: Var, replacement: &Expr, equations: VecDeque<(Expr, Expr)>) -> VecDeque<(Expr, Expr)> {
    equations
        .into_iter()
        .map(|(x, y)| (substitute(v, replacement, &x), substitute(v, replacement, &y)))
        .collect()
}

/// Unifies `lhs` with `rhs`, returning the bindings that make them
/// structurally equivalent, or a [`PatternError`] if no such binding exists.
pub fn unify(lhs: Expr, rhs: Expr) -> Result<Substitutions, PatternError> {
    let mut equations = VecDeque::new();
    equations.push_back((lhs, rhs));
    let mut rule_misses = 0usize;

    while equations.len() > rule_misses {
        let (x, y) = equations.pop_front().unwrap();

        if terms_equal(&x, &y) {
            rule_misses = 0;
            continue;
        }

        match (&x, &y) {
            (Expr::BinExpr(a), Expr::BinExpr(b)) => {
                if a.op != b.op {
                    return Err(PatternError(format!(
                        "concrete mismatch: expected operator {:?}, got {:?}",
                        a.op, b.op
                    )));
                }
                equations.push_back((*a.x.clone(), *b.x.clone()));
                equations.push_back((*a.y.clone(), *b.y.clone()));
                rule_misses = 0;
            }
            (Expr::Deref(a), Expr::Deref(b)) => {
                equations.push_back((*a.expr.clone(), *b.expr.clone()));
                rule_misses = 0;
            }
            (a, b) if is_compound(a) && is_compound(b) => {
                return Err(PatternError(format!(
                    "type mismatch: expected {}, got {}",
                    kind_name(a),
                    kind_name(b)
                )));
            }
            (a, b) if !is_var(a) && !is_var(b) => {
                return Err(PatternError(format!(
                    "concrete mismatch: expected {:?}, got {:?}",
                    a, b
                )));
            }
            (a, b) if !is_var(a) && is_var(b) => {
                equations.push_back((y, x));
                rule_misses = 0;
            }
            (Expr::Var(v), _) => {
                let v = *v;

                if occurs_check(v, &y) {
                    return Err(PatternError(format!(
                        "substituting {} for {} would cause recursive self reference",
                        kind_name(&y),
                        v
                    )));
                }

                if let Some(pred) = v.predicate {
                    if !pred(&y) {
                        return Err(PatternError(format!(
                            "term did not satisfy predicate for {}",
                            v
                        )));
                    }
                }

                if occurs_in_equations(v, &equations) {
                    equations = apply_sub(v, &y, equations);
                    equations.push_back((x, y));
                    rule_misses = 0;
                } else {
                    equations.push_back((x, y));
                    rule_misses += 1;
                }
            }
            _ => unreachable!("unification invariant: one side must be a Var"),
        }
    }

    let mut subs = Substitutions::new();
    for (x, y) in equations {
        if let Expr::Var(v) = x {
            subs.insert(v, y);
        }
    }
    Ok(subs)
}
