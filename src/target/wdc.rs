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

//! The `w65c02s` target: the 6502-family instruction set, including its
//! addressing-mode-dependent encodings.

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::instruction::{validate_unary, Constant, Instruction};
use crate::lang::ast::{BinExpr, BinOp, Deref, Expr, Name, Op};
use crate::unify::{unify, T};
use crate::util::{byte_length, le_bytes};

use super::{word_ctor, EvalCtx, InstructionCtor, Target};

/// One addressing-mode template, matched against an operand expression in
/// declaration order; the first match wins and binds `T` to the operand
/// sub-expression.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum Mode {
    /// `[[T + x]]` — indexed-indirect.
    IdxInd,
    /// `[[T]]` — indirect.
    Ind,
    /// `[[T] + y]` — indirect-indexed with Y.
    IndY,
    /// `[T + x]` — indexed with X.
    IdxX,
    /// `[T + y]` — indexed with Y.
    IdxY,
    /// `[T]` — zero-page/absolute direct.
    Dir,
    /// `T` — immediate.
    Imm,
}

/// Every mode, in match order: each mode must precede any mode whose
/// template it structurally subsumes (e.g. `IdxInd` before `Ind`, or every
/// bracketed mode before the `Imm` fallback).
const MODES: [Mode; 7] =
    [Mode::IdxInd, Mode::Ind, Mode::IndY, Mode::IdxX, Mode::IdxY, Mode::Dir, Mode::Imm];

fn name_expr(s: &'static str) -> Expr {
    Expr::Name(Name { name: s.into(), toks: vec![] })
}

fn deref_expr(e: Expr) -> Expr {
    Expr::Deref(Deref { expr: Box::new(e), toks: vec![] })
}

fn bin_expr(x: Expr, op: BinOp, y: Expr) -> Expr {
    Expr::BinExpr(BinExpr { x: Box::new(x), op, y: Box::new(y), toks: vec![] })
}

impl Mode {
    fn template(self) -> Expr {
        let t = Expr::Var(T);
        match self {
            Mode::IdxInd => deref_expr(deref_expr(bin_expr(t, BinOp::Add, name_expr("x")))),
            Mode::Ind => deref_expr(deref_expr(t)),
            Mode::IndY => deref_expr(bin_expr(deref_expr(t), BinOp::Add, name_expr("y"))),
            Mode::IdxX => deref_expr(bin_expr(t, BinOp::Add, name_expr("x"))),
            Mode::IdxY => deref_expr(bin_expr(t, BinOp::Add, name_expr("y"))),
            Mode::Dir => deref_expr(t),
            Mode::Imm => t,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Mode::IdxInd => "indexed-indirect",
            Mode::Ind => "indirect",
            Mode::IndY => "indirect-indexed",
            Mode::IdxX => "indexed (x)",
            Mode::IdxY => "indexed (y)",
            Mode::Dir => "direct",
            Mode::Imm => "immediate",
        }
    }
}

/// Matches `arg` against every [`Mode`] in order, returning the first mode
/// that unifies along with the bound operand sub-expression.
fn match_mode(arg: &Expr) -> Option<(Mode, Expr)> {
    for mode in MODES {
        if let Ok(mut subs) = unify(mode.template(), arg.clone()) {
            if let Some(bound) = subs.remove(&T) {
                return Some((mode, bound));
            }
        }
    }
    None
}

/// A 6502-family unary instruction whose opcode depends on both the
/// addressing mode and the operand's byte length.
struct WdcUnary {
    opcode: u8,
    bytes: Vec<u8>,
}

impl WdcUnary {
    fn new(
        mnemonic: &str,
        op_codes: &HashMap<(Mode, u32), u8>,
        op: &Op,
        ctx: &EvalCtx,
    ) -> Result<Self, Diagnostic> {
        let arg = validate_unary(op)?;

        let (mode, bound) = match_mode(arg).ok_or_else(|| {
            Diagnostic::new(
                format!("argument does not match a known addressing mode for '{}'", mnemonic),
                arg.toks().to_vec(),
            )
        })?;

        let evaled = bound.eval(ctx.scope)?;
        let len = byte_length(evaled);

        if len > 2 {
            return Err(Diagnostic::new(
                format!("evaluated result '{}' does not fit in two bytes", evaled),
                bound.toks().to_vec(),
            ));
        }

        let opcode = *op_codes.get(&(mode, len)).ok_or_else(|| {
            Diagnostic::new(
                format!(
                    "instruction '{}' does not support addressing mode '{}' for {} byte operands '{}'",
                    mnemonic,
                    mode.name(),
                    len,
                    evaled,
                ),
                bound.toks().to_vec(),
            )
        })?;

        Ok(Self { opcode, bytes: le_bytes(evaled, len) })
    }
}

impl Instruction for WdcUnary {
    fn size(&self) -> u32 {
        1 + self.bytes.len() as u32
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        let mut out = vec![self.opcode];
        out.extend_from_slice(&self.bytes);
        Ok(out)
    }
}

/// A relative-branch instruction: opcode followed by a one-byte
/// displacement (`bcc`, `bcs`, `beq`, `bbrN`, `bbsN`).
struct RelativeUnary {
    opcode: u8,
    operand: u8,
}

impl RelativeUnary {
    fn new(opcode: u8, op: &Op, ctx: &EvalCtx) -> Result<Self, Diagnostic> {
        let arg = validate_unary(op)?;
        let evaled = arg.eval(ctx.scope)?;

        if evaled < 0 || evaled > 255 {
            return Err(Diagnostic::new(
                format!("evaluated result '{}' is too large", evaled),
                arg.toks().to_vec(),
            ));
        }

        Ok(Self { opcode, operand: evaled as u8 })
    }
}

impl Instruction for RelativeUnary {
    fn size(&self) -> u32 {
        2
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        Ok(vec![self.opcode, self.operand])
    }
}

fn lda_op_codes() -> HashMap<(Mode, u32), u8> {
    let mut m = HashMap::new();
    m.insert((Mode::Dir, 2), 0xAD);
    m.insert((Mode::IdxX, 2), 0xBD);
    m.insert((Mode::IdxY, 2), 0xB9);
    m.insert((Mode::Imm, 1), 0xA9);
    m.insert((Mode::Dir, 1), 0xA5);
    m.insert((Mode::IdxInd, 1), 0xA1);
    m.insert((Mode::IdxX, 1), 0xB5);
    m.insert((Mode::Ind, 1), 0xB2);
    m.insert((Mode::IndY, 1), 0xB1);
    m
}

fn ldx_op_codes() -> HashMap<(Mode, u32), u8> {
    let mut m = HashMap::new();
    m.insert((Mode::Dir, 2), 0xAE);
    m.insert((Mode::IdxY, 2), 0xBE);
    m.insert((Mode::Imm, 1), 0xA2);
    m.insert((Mode::Dir, 1), 0xA6);
    m.insert((Mode::IdxY, 1), 0xB6);
    m
}

/// Builds the `w65c02s` target: `max_addr=65535`, `max_val=255`.
pub fn target() -> Target {
    let mut instructions: HashMap<&'static str, InstructionCtor> = HashMap::new();

    instructions.insert(
        "nop",
        Box::new(|op: &Op, _ctx: &EvalCtx| {
            Ok(Box::new(Constant::new(op, 0xEA)?) as Box<dyn Instruction>)
        }),
    );

    instructions.insert(
        "lda",
        Box::new(|op: &Op, ctx: &EvalCtx| {
            Ok(Box::new(WdcUnary::new("lda", &lda_op_codes(), op, ctx)?) as Box<dyn Instruction>)
        }),
    );

    instructions.insert(
        "ldx",
        Box::new(|op: &Op, ctx: &EvalCtx| {
            Ok(Box::new(WdcUnary::new("ldx", &ldx_op_codes(), op, ctx)?) as Box<dyn Instruction>)
        }),
    );

    instructions.insert(
        "bcc",
        Box::new(|op: &Op, ctx: &EvalCtx| {
            Ok(Box::new(RelativeUnary::new(0x90, op, ctx)?) as Box<dyn Instruction>)
        }),
    );
    instructions.insert(
        "bcs",
        Box::new(|op: &Op, ctx: &EvalCtx| {
            Ok(Box::new(RelativeUnary::new(0xB0, op, ctx)?) as Box<dyn Instruction>)
        }),
    );
    instructions.insert(
        "beq",
        Box::new(|op: &Op, ctx: &EvalCtx| {
            Ok(Box::new(RelativeUnary::new(0xF0, op, ctx)?) as Box<dyn Instruction>)
        }),
    );

    for n in 0u8..8 {
        let bbr_name: &'static str = BBR_NAMES[n as usize];
        let bbs_name: &'static str = BBS_NAMES[n as usize];
        let bbr_opcode = (n << 4) | 0x0F;
        let bbs_opcode = (n << 4) | 0x8F;
        instructions.insert(
            bbr_name,
            Box::new(move |op: &Op, ctx: &EvalCtx| {
                Ok(Box::new(RelativeUnary::new(bbr_opcode, op, ctx)?) as Box<dyn Instruction>)
            }),
        );
        instructions.insert(
            bbs_name,
            Box::new(move |op: &Op, ctx: &EvalCtx| {
                Ok(Box::new(RelativeUnary::new(bbs_opcode, op, ctx)?) as Box<dyn Instruction>)
            }),
        );
    }

    instructions.insert("word", word_ctor());

    Target::new("w65c02s", 65535, 255, instructions)
}

const BBR_NAMES: [&str; 8] = ["bbr0", "bbr1", "bbr2", "bbr3", "bbr4", "bbr5", "bbr6", "bbr7"];
const BBS_NAMES: [&str; 8] = ["bbs0", "bbs1", "bbs2", "bbs3", "bbs4", "bbs5", "bbs6", "bbs7"];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::{Scope, Val};
    use std::rc::Rc;

    fn op(name: &str, args: Vec<Expr>) -> Op {
        Op { mnemonic: Rc::from(name), args, toks: vec![] }
    }

    fn val(v: i64) -> Expr {
        Expr::Val(Val { val: v, toks: vec![] })
    }

    fn name(s: &str) -> Expr {
        Expr::Name(Name { name: Rc::from(s), toks: vec![] })
    }

    #[test]
    fn immediate_mode_selected_for_bare_value() {
        let t = target();
        let scope = Scope::new();
        let inst = t.get_instruction(&op("lda", vec![val(0x2a)]), &scope, &scope).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0xA9, 0x2a]);
    }

    #[test]
    fn two_byte_immediate_is_a_diagnostic() {
        let t = target();
        let scope = Scope::new();
        let err = t.get_instruction(&op("lda", vec![val(0x100)]), &scope, &scope).unwrap_err();
        assert!(err.message().contains("addressing mode 'immediate'"));
        assert!(err.message().contains("2 byte operands"));
    }

    #[test]
    fn indirect_indexed_y_matches_nested_deref() {
        let t = target();
        let scope = Scope::new();
        let arg = deref_expr(bin_expr(deref_expr(val(0xff)), BinOp::Add, name("y")));
        let inst = t.get_instruction(&op("lda", vec![arg]), &scope, &scope).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0xB1, 0xFF]);
    }

    #[test]
    fn direct_mode_absolute_two_byte() {
        let t = target();
        let scope = Scope::new();
        let arg = deref_expr(val(0x1234));
        let inst = t.get_instruction(&op("lda", vec![arg]), &scope, &scope).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0xAD, 0x34, 0x12]);
    }

    #[test]
    fn bbr_and_bbs_opcodes_follow_the_bit_formula() {
        let t = target();
        let scope = Scope::new();
        let bbr3 = t.get_instruction(&op("bbr3", vec![val(1)]), &scope, &scope).unwrap();
        let bbs5 = t.get_instruction(&op("bbs5", vec![val(1)]), &scope, &scope).unwrap();
        assert_eq!(bbr3.encode().unwrap()[0], (3 << 4) | 0x0F);
        assert_eq!(bbs5.encode().unwrap()[0], (5 << 4) | 0x8F);
    }

    #[test]
    fn nop_is_a_fixed_byte() {
        let t = target();
        let scope = Scope::new();
        let inst = t.get_instruction(&op("nop", vec![]), &scope, &scope).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0xEA]);
    }
}
