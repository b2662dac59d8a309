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

//! The SAP-8 target: a 4-bit-opcode, 4-bit-operand educational machine with
//! a 16-byte address space.

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::instruction::{validate_unary, Constant, Instruction};

use super::{word_ctor, EvalCtx, InstructionCtor, Target};

/// A SAP-8 unary instruction: 4-bit opcode in the high nibble, operand
/// (an address) in the low nibble.
struct SapUnary {
    byte: u8,
}

impl SapUnary {
    fn new(code: u8, op: &crate::lang::ast::Op, ctx: &EvalCtx) -> Result<Self, Diagnostic> {
        let arg = validate_unary(op)?;
        let evaled = arg.eval(ctx.scope)?;

        if evaled < 0 || evaled as u64 > ctx.max_addr {
            return Err(Diagnostic::new(
                format!("evaluated result '{}' is too large", evaled),
                arg.toks().to_vec(),
            ));
        }

        Ok(Self { byte: (code << 4) | (evaled as u8) })
    }
}

impl Instruction for SapUnary {
    fn size(&self) -> u32 {
        1
    }

    fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        Ok(vec![self.byte])
    }
}

macro_rules! sap_unary_ctor {
    ($code:expr) => {
        Box::new(|op: &crate::lang::ast::Op, ctx: &EvalCtx| {
            Ok(Box::new(SapUnary::new($code, op, ctx)?) as Box<dyn Instruction>)
        })
    };
}

macro_rules! sap_constant_ctor {
    ($output:expr) => {
        Box::new(|op: &crate::lang::ast::Op, _ctx: &EvalCtx| {
            Ok(Box::new(Constant::new(op, $output)?) as Box<dyn Instruction>)
        })
    };
}

/// Builds the SAP-8 target: `max_addr=15`, `max_val=255`.
pub fn target() -> Target {
    let mut instructions: HashMap<&'static str, InstructionCtor> = HashMap::new();

    instructions.insert("nop", sap_constant_ctor!(0b0000_0000));
    instructions.insert("lda", sap_unary_ctor!(0b0001));
    instructions.insert("add", sap_unary_ctor!(0b0010));
    instructions.insert("sub", sap_unary_ctor!(0b0011));
    instructions.insert("sta", sap_unary_ctor!(0b0100));
    instructions.insert("ldi", sap_unary_ctor!(0b0101));
    instructions.insert("jmp", sap_unary_ctor!(0b0110));
    instructions.insert("jc", sap_unary_ctor!(0b0111));
    instructions.insert("jz", sap_unary_ctor!(0b1000));
    instructions.insert("out", sap_constant_ctor!(0b1110_0000));
    instructions.insert("hlt", sap_constant_ctor!(0b1111_0000));
    instructions.insert("word", word_ctor());

    Target::new("sap", 15, 255, instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ast::{Expr, Op, Scope, Val};
    use std::rc::Rc;

    fn op(name: &str, args: Vec<Expr>) -> Op {
        Op { mnemonic: Rc::from(name), args, toks: vec![] }
    }

    fn val(v: i64) -> Expr {
        Expr::Val(Val { val: v, toks: vec![] })
    }

    #[test]
    fn lda_encodes_opcode_and_operand() {
        let t = target();
        let scope = Scope::new();
        let inst = t.get_instruction(&op("lda", vec![val(1)]), &scope, &scope).unwrap();
        assert_eq!(inst.encode().unwrap(), vec![0x11]);
    }

    #[test]
    fn out_and_hlt_are_fixed_bytes() {
        let t = target();
        let scope = Scope::new();
        let out = t.get_instruction(&op("out", vec![]), &scope, &scope).unwrap();
        let hlt = t.get_instruction(&op("hlt", vec![]), &scope, &scope).unwrap();
        assert_eq!(out.encode().unwrap(), vec![0b1110_0000]);
        assert_eq!(hlt.encode().unwrap(), vec![0b1111_0000]);
    }

    #[test]
    fn operand_over_max_addr_is_a_diagnostic() {
        let t = target();
        let scope = Scope::new();
        assert!(t.get_instruction(&op("lda", vec![val(16)]), &scope, &scope).is_err());
    }

    #[test]
    fn unrecognized_mnemonic_is_a_diagnostic() {
        let t = target();
        let scope = Scope::new();
        let tok = crate::lang::token::Token::Text {
            text: Rc::from("xyz"),
            line_start: 0,
            line_num: 1,
            col: 0,
        };
        let o = Op { mnemonic: Rc::from("xyz"), args: vec![], toks: vec![tok] };
        assert!(t.get_instruction(&o, &scope, &scope).is_err());
    }

    #[test]
    fn count_program_matches_known_byte_sequence() {
        // Spot-checks a couple of entries from the opcode table rather than
        // the full instruction set.
        let t = target();
        let scope = Scope::new();
        let lda = t.get_instruction(&op("lda", vec![val(10)]), &scope, &scope).unwrap();
        assert_eq!(lda.encode().unwrap(), vec![26]);
        let sta = t.get_instruction(&op("sta", vec![val(1)]), &scope, &scope).unwrap();
        assert_eq!(sta.encode().unwrap(), vec![65]);
    }
}
