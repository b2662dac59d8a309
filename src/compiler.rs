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

//! Two-pass compiler: pass 1 sizes the program and resolves names, pass 2
//! emits bytes.

use std::collections::HashSet;

use crate::diagnostic::Diagnostic;
use crate::instruction::{Instruction, Value};
use crate::lang::ast::{Expr, File, Op, Relative, Scope, Stmt, Val};
use crate::target::Target;

/// A statement rewritten into the form an instruction constructor expects:
/// a bare literal, or a named mnemonic invocation. A free name resolves to
/// either a constant's value or a nullary op; every other bare expression
/// resolves to its evaluated value.
enum Resolved {
    Value(Val),
    Op(Op),
}

fn resolve_expr_stmt(e: &Expr, consts: &Scope, scope: &Scope) -> Result<Resolved, Diagnostic> {
    if let Expr::Name(n) = e {
        if let Some(&v) = consts.get(&n.name) {
            return Ok(Resolved::Value(Val { val: v, toks: n.toks.clone() }));
        }
        return Ok(Resolved::Op(Op { mnemonic: n.name.clone(), args: vec![], toks: n.toks.clone() }));
    }

    let v = e.eval(scope)?;
    Ok(Resolved::Value(Val { val: v, toks: e.toks().to_vec() }))
}

/// Drives a [`File`] through two passes against one [`Target`]: `scan` to
/// resolve constants, labels, and sizes, and `encode` to emit bytes.
pub struct Compiler<'t> {
    target: &'t Target,
    file: File,
    consts: Scope,
    labels: Scope,
}

impl<'t> Compiler<'t> {
    pub fn new(target: &'t Target, file: File) -> Self {
        Self { target, file, consts: Scope::new(), labels: Scope::new() }
    }

    fn scope(&self) -> Scope {
        let mut s = self.consts.clone();
        s.extend(self.labels.iter().map(|(k, v)| (k.clone(), *v)));
        s
    }

    fn build_instruction(
        &self,
        resolved: &Resolved,
        scope: &Scope,
    ) -> Result<Box<dyn Instruction>, Diagnostic> {
        match resolved {
            Resolved::Value(v) => Ok(Box::new(Value::new(v, self.target.max_val)?)),
            Resolved::Op(op) => self.target.get_instruction(op, scope, &self.labels),
        }
    }

    /// Evaluates every `Const` statement, in source order, against the
    /// consts resolved so far (so a constant may reference an earlier one).
    pub fn resolve_consts(&mut self) -> Result<(), Diagnostic> {
        let mut seen = HashSet::new();
        let mut const_stmts = Vec::new();

        for stmt in &self.file.stmts {
            if let Stmt::Const(c) = stmt {
                if self.target.is_reserved(&c.name) {
                    return Err(Diagnostic::new(
                        format!("constant '{}' uses reserved name", c.name),
                        c.toks.clone(),
                    ));
                }
                if !seen.insert(c.name.clone()) {
                    return Err(Diagnostic::new(
                        format!("redefinition of constant '{}'", c.name),
                        c.toks.clone(),
                    ));
                }
                const_stmts.push(c.clone());
            }
        }

        for c in &const_stmts {
            let v = c.val.eval(&self.consts)?;
            self.consts.insert(c.name.clone(), v);
        }

        Ok(())
    }

    /// Resolves an `Offset`'s target location relative to `loc`, failing if
    /// it would move the cursor backward or past `max_addr`.
    fn resolve_offset(&self, loc: u64, offset: &crate::lang::ast::Offset) -> Result<u64, Diagnostic> {
        let offset_loc = match offset.relative {
            None => offset.offset,
            Some(Relative::Forward) => loc + offset.offset,
            Some(Relative::Backward) => self.target.max_addr - offset.offset + 1,
        };

        if offset_loc > self.target.max_addr {
            return Err(Diagnostic::new(
                format!("offset resolves to oversized location '{}'", offset_loc),
                offset.toks.clone(),
            ));
        }
        if offset_loc < loc {
            return Err(Diagnostic::new(
                format!("offset resolves to location '{}' before current position", offset_loc),
                offset.toks.clone(),
            ));
        }

        Ok(offset_loc)
    }

    fn check_loc(&self, loc: u64, toks: &[crate::lang::token::Token]) -> Result<(), Diagnostic> {
        if loc > self.target.max_addr {
            return Err(Diagnostic::new("statement makes program too large", toks.to_vec()));
        }
        Ok(())
    }

    /// Pass 1: resolves constants and labels, and validates that the
    /// program fits within the target's address space, without producing
    /// any bytes.
    pub fn scan(&mut self) -> Result<(), Diagnostic> {
        self.resolve_consts()?;

        let mut last_size: Option<u32> = None;
        let mut loc: u64 = 0;
        let stmts = self.file.stmts.clone();

        for stmt in &stmts {
            match stmt {
                Stmt::Const(_) => {}

                Stmt::Label(l) => {
                    if self.target.is_reserved(&l.name) {
                        return Err(Diagnostic::new(
                            format!("label '{}' uses reserved name", l.name),
                            l.toks.clone(),
                        ));
                    }
                    if self.labels.contains_key(&l.name) {
                        return Err(Diagnostic::new(
                            format!("redefinition of label '{}'", l.name),
                            l.toks.clone(),
                        ));
                    }
                    if self.consts.contains_key(&l.name) {
                        return Err(Diagnostic::new(
                            format!("label name '{}' collides with constant name", l.name),
                            l.toks.clone(),
                        ));
                    }
                    self.labels.insert(l.name.clone(), loc as i64);
                }

                Stmt::Offset(o) => {
                    let offset_loc = self.resolve_offset(loc, o)?;
                    let size = last_size.ok_or_else(|| {
                        Diagnostic::new(
                            "offset must follow generated code usable as padding",
                            o.toks.clone(),
                        )
                    })?;
                    let padding_len = offset_loc - loc;
                    if padding_len % size as u64 != 0 {
                        return Err(Diagnostic::new(
                            "size of padding instruction is not a divisor of padding length",
                            o.toks.clone(),
                        ));
                    }
                    loc = offset_loc;
                }

                Stmt::Op(op) => {
                    self.check_loc(loc, &op.toks)?;
                    let scope = self.scope();
                    let inst = self.build_instruction(&Resolved::Op(op.clone()), &scope)?;
                    loc += inst.size() as u64;
                    last_size = Some(inst.size());
                }

                Stmt::Expr(e) => {
                    self.check_loc(loc, e.toks())?;
                    let scope = self.scope();
                    let resolved = resolve_expr_stmt(e, &self.consts, &scope)?;
                    let inst = self.build_instruction(&resolved, &scope)?;
                    loc += inst.size() as u64;
                    last_size = Some(inst.size());
                }
            }
        }

        Ok(())
    }

    /// Pass 2: replays the same walk as [`scan`](Self::scan), emitting bytes
    /// for every `Op`/`Expr` statement and padding for every `Offset`.
    /// Assumes `scan` has already run and succeeded.
    pub fn encode(&self) -> Result<Vec<u8>, Diagnostic> {
        let mut out = Vec::new();
        let mut last_inst: Option<Box<dyn Instruction>> = None;
        let mut loc: u64 = 0;

        for stmt in &self.file.stmts {
            match stmt {
                Stmt::Const(_) | Stmt::Label(_) => {}

                Stmt::Offset(o) => {
                    let offset_loc = self.resolve_offset(loc, o)?;
                    let inst = last_inst
                        .as_ref()
                        .expect("scan guarantees an offset is preceded by a sized instruction");

                    let padding_len = offset_loc - loc;
                    let step = inst.size() as u64;
                    let mut emitted = 0u64;
                    while emitted < padding_len {
                        out.extend(inst.encode()?);
                        emitted += step;
                    }
                    loc = offset_loc;
                }

                Stmt::Op(op) => {
                    let scope = self.scope();
                    let inst = self.build_instruction(&Resolved::Op(op.clone()), &scope)?;
                    out.extend(inst.encode()?);
                    loc += inst.size() as u64;
                    last_inst = Some(inst);
                }

                Stmt::Expr(e) => {
                    let scope = self.scope();
                    let resolved = resolve_expr_stmt(e, &self.consts, &scope)?;
                    let inst = self.build_instruction(&resolved, &scope)?;
                    out.extend(inst.encode()?);
                    loc += inst.size() as u64;
                    last_inst = Some(inst);
                }
            }
        }

        Ok(out)
    }

    /// Runs both passes and returns the assembled bytes.
    pub fn compile(&mut self) -> Result<Vec<u8>, Diagnostic> {
        self.scan()?;
        self.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parser::Parser;
    use crate::target::sap;
    use crate::target::wdc;

    fn compile(src: &str, target: &Target) -> Result<Vec<u8>, Diagnostic> {
        let file = Parser::parse(src).unwrap_or_else(|d| panic!("{}", d.render(src)));
        Compiler::new(target, file).compile()
    }

    #[test]
    fn lda_one_on_sap() {
        let t = sap::target();
        assert_eq!(compile("lda 1\n", &t).unwrap(), vec![0x11]);
    }

    #[test]
    fn oversized_literal_is_a_diagnostic() {
        let t = sap::target();
        let err = compile("256\n", &t).unwrap_err();
        assert!(err.message().contains("is too large"));
    }

    #[test]
    fn unbound_label_reference_is_a_diagnostic() {
        let t = sap::target();
        let err = compile("lda foo\n", &t).unwrap_err();
        assert!(err.message().contains("not bound"));
    }

    #[test]
    fn count_program_matches_known_byte_sequence() {
        let t = sap::target();
        let src = "\
            lda 10\n\
            out\n\
            sub 11\n\
            sta 1\n\
            lda 1\n\
            out\n\
            hlt\n\
            10:\n\
              42\n\
            11:\n\
              1\n\
        ";
        let bytes = compile(src, &t).unwrap();
        assert_eq!(bytes[0], 26); // lda 10 -> (1<<4)|10
        assert_eq!(bytes[1], 224); // out
    }

    #[test]
    fn immediate_too_wide_on_wdc_is_a_diagnostic() {
        let t = wdc::target();
        let err = compile("lda 0x100\n", &t).unwrap_err();
        assert!(err.message().contains("addressing mode 'immediate'"));
        assert!(err.message().contains("2 byte operands"));
    }

    #[test]
    fn indirect_indexed_on_wdc() {
        let t = wdc::target();
        let bytes = compile("lda [[0xff] + y]\n", &t).unwrap();
        assert_eq!(bytes, vec![0xB1, 0xFF]);
    }

    #[test]
    fn back_offset_pads_with_last_instruction() {
        let t = sap::target();
        // max_addr = 15; nop then -2: pads until loc == 14.
        let bytes = compile("nop\n-2:\n", &t).unwrap();
        assert_eq!(bytes.len(), 14);
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn duplicate_label_is_a_diagnostic() {
        let t = sap::target();
        let err = compile("foo:\nfoo:\n", &t).unwrap_err();
        assert!(err.message().contains("redefinition"));
    }

    #[test]
    fn const_using_reserved_mnemonic_is_a_diagnostic() {
        let t = sap::target();
        let err = compile("nop = 1\n", &t).unwrap_err();
        assert!(err.message().contains("reserved name"));
    }

    #[test]
    fn word_directive_emits_little_endian_label_address() {
        let t = sap::target();
        let src = "start:\nword start\n";
        let bytes = compile(src, &t).unwrap();
        assert_eq!(bytes, vec![0x00, 0x00]);
    }
}
