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

//! Encodable instructions: the product of validating a parsed statement
//! against a target, ready to report its size or produce bytes.
//!
//! Every constructor here runs its validation eagerly and returns a
//! `Diagnostic` on failure, so a live `Box<dyn Instruction>` is always safe
//! to size and encode.

use crate::diagnostic::Diagnostic;
use crate::lang::ast::{Expr, Op, Scope, Val};
use crate::util::byte_length;

/// A fully validated instruction: either a concrete mnemonic invocation or a
/// bare literal byte.
pub trait Instruction {
    /// The number of bytes this instruction emits.
    fn size(&self) -> u32;

    /// Produces this instruction's bytes in emission order.
    fn encode(&self) -> Result<Vec<u8>, Diagnostic>;
}

/// Checks that `op` takes no argument.
pub fn validate_nullary(op: &Op) -> Result<(), Diagnostic> {
    if !op.args.is_empty() {
        return Err(Diagnostic::new(
            format!("'{}' instruction takes no argument", op.mnemonic),
            op.toks.clone(),
        ));
    }
    Ok(())
}

/// Checks that `op` takes exactly one argument, returning it.
pub fn validate_unary(op: &Op) -> Result<&Expr, Diagnostic> {
    match op.args.as_slice() {
        [arg] => Ok(arg),
        _ => Err(Diagnostic::new(
            format!("'{}' instruction takes one argument", op.mnemonic),
            op.toks.clone(),
        )),
    }
}

/// A bare literal byte, emitted by a statement that is just an expression
/// (`42`) rather than a named mnemonic.
pub struct Value {
    val: i64,
}

impl Value {
    pub fn new(val: &Val, max_val: u64) -> Result<Self, Diagnostic> {
        if val.val < 0 || val.val as u64 > max_val {
            return Err(Diagnostic::new(
                format!("evaluated result '{}' is too large", val.val),
                val.toks.clone(),
            ));
        }
        Ok(Self { val: val.val })
    }
}

impl Instruction for Value {
    fn size(&self) -> u32 {
        byte_length(self.val)
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        Ok(vec![self.val as u8])
    }
}

/// A nullary mnemonic that always emits the same fixed byte (`nop`, `hlt`,
/// `out`, ...).
pub struct Constant {
    output: u8,
}

impl Constant {
    pub fn new(op: &Op, output: u8) -> Result<Self, Diagnostic> {
        validate_nullary(op)?;
        Ok(Self { output })
    }
}

impl Instruction for Constant {
    fn size(&self) -> u32 {
        byte_length(self.output as i64)
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        Ok(vec![self.output])
    }
}

/// `word expr` — a two-byte little-endian literal or label address. Unlike
/// every other instruction here, its operand is evaluated lazily at
/// [`encode`](Instruction::encode) time, and only against label bindings
/// (not constants), so a forward reference to a label defined later in the
/// file still resolves once the whole label table has been built.
pub struct Word {
    arg: Expr,
    labels: Scope,
}

const MAX_WORD: i64 = 0xFFFF;

impl Word {
    pub fn new(op: &Op, labels: &Scope) -> Result<Self, Diagnostic> {
        let arg = validate_unary(op)?.clone();
        Ok(Self { arg, labels: labels.clone() })
    }
}

impl Instruction for Word {
    fn size(&self) -> u32 {
        2
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        let evaled = self.arg.eval(&self.labels)?;
        if !(0..=MAX_WORD).contains(&evaled) {
            return Err(Diagnostic::new(
                format!("evaluated result '{}' does not fit in two bytes", evaled),
                self.arg.toks().to_vec(),
            ));
        }
        Ok(vec![(evaled & 0xFF) as u8, ((evaled >> 8) & 0xFF) as u8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::BinOp;
    use std::rc::Rc;

    fn val(v: i64) -> Val {
        Val { val: v, toks: vec![] }
    }

    fn mnemonic_op(name: &str, args: Vec<Expr>) -> Op {
        Op { mnemonic: Rc::from(name), args, toks: vec![] }
    }

    #[test]
    fn value_within_range_encodes_one_byte() {
        let inst = Value::new(&val(42), 255).unwrap();
        assert_eq!(inst.size(), 1);
        assert_eq!(inst.encode().unwrap(), vec![42]);
    }

    #[test]
    fn value_over_max_is_a_diagnostic() {
        assert!(Value::new(&val(256), 255).is_err());
    }

    #[test]
    fn constant_rejects_an_argument() {
        let op = mnemonic_op("hlt", vec![Expr::Val(val(1))]);
        assert!(Constant::new(&op, 0xF0).is_err());
    }

    #[test]
    fn constant_encodes_fixed_byte() {
        let op = mnemonic_op("hlt", vec![]);
        let inst = Constant::new(&op, 0xF0).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0xF0]);
    }

    #[test]
    fn word_resolves_against_labels_only() {
        let op = mnemonic_op("word", vec![Expr::Name(crate::lang::ast::Name {
            name: Rc::from("start"),
            toks: vec![],
        })]);
        let mut labels = Scope::new();
        labels.insert(Rc::from("start"), 0x1234);
        let inst = Word::new(&op, &labels).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0x34, 0x12]);
    }

    #[test]
    fn word_over_two_bytes_is_a_diagnostic() {
        let op = mnemonic_op(
            "word",
            vec![Expr::BinExpr(crate::lang::ast::BinExpr {
                x: Box::new(Expr::Val(val(0x10000))),
                op: BinOp::Add,
                y: Box::new(Expr::Val(val(0))),
                toks: vec![],
            })],
        );
        let inst = Word::new(&op, &Scope::new()).unwrap();
        assert!(inst.encode().is_err());
    }
}
