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

//! Target configuration: an immutable description of one assembly target's
//! limits and its mnemonic-to-instruction registry, passed into the
//! compiler rather than baked into it.

pub mod sap;
pub mod wdc;

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::instruction::Instruction;
use crate::lang::ast::{Op, Scope};

/// The bindings an instruction constructor needs to validate and size
/// itself: the merged const+label scope, the label-only scope (for `word`),
/// and the target's limits.
pub struct EvalCtx<'a> {
    pub scope: &'a Scope,
    pub labels: &'a Scope,
    pub max_addr: u64,
    pub max_val: u64,
}

/// Builds an [`Instruction`] for one parsed [`Op`], or fails with a
/// diagnostic (unrecognized addressing mode, oversized operand, wrong
/// argument count, ...). Boxed rather than a bare `fn` pointer so that
/// per-mnemonic data (e.g. a branch's fixed opcode) can be captured.
pub type InstructionCtor = Box<dyn Fn(&Op, &EvalCtx) -> Result<Box<dyn Instruction>, Diagnostic>>;

/// An assembly target: its address-space and operand-width limits, and the
/// mnemonics it recognizes.
pub struct Target {
    pub name: &'static str,
    pub max_addr: u64,
    pub max_val: u64,
    instructions: HashMap<&'static str, InstructionCtor>,
}

impl Target {
    /// Looks up a target by its CLI name (`-a` option).
    pub fn by_name(name: &str) -> Option<Target> {
        match name {
            "sap" => Some(sap::target()),
            "w65c02s" => Some(wdc::target()),
            _ => None,
        }
    }

    fn new(
        name: &'static str,
        max_addr: u64,
        max_val: u64,
        instructions: HashMap<&'static str, InstructionCtor>,
    ) -> Self {
        Self { name, max_addr, max_val, instructions }
    }

    /// Builds the instruction named by `op.mnemonic`, or a diagnostic if the
    /// target does not recognize it.
    pub fn get_instruction(
        &self,
        op: &Op,
        scope: &Scope,
        labels: &Scope,
    ) -> Result<Box<dyn Instruction>, Diagnostic> {
        let ctor = self.instructions.get(op.mnemonic.as_ref()).ok_or_else(|| {
            Diagnostic::new(
                format!("unrecognized instruction '{}'", op.mnemonic),
                vec![op.toks[0].clone()],
            )
        })?;

        let ctx = EvalCtx { scope, labels, max_addr: self.max_addr, max_val: self.max_val };
        ctor(op, &ctx)
    }

    /// `true` if `name` is a mnemonic this target recognizes, used to reject
    /// labels and constants that would collide with one.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.instructions.contains_key(name)
    }
}

/// Shared `word` constructor, registered by every target under the mnemonic
/// `"word"`.
pub(super) fn word_ctor() -> InstructionCtor {
    Box::new(|op: &Op, ctx: &EvalCtx| {
        Ok(Box::new(crate::instruction::Word::new(op, ctx.labels)?) as Box<dyn Instruction>)
    })
}
