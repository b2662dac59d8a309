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

//! End-to-end scenarios driving the full lexer/parser/compiler pipeline.

use rasm::compiler::Compiler;
use rasm::diagnostic::Diagnostic;
use rasm::lang::parser::Parser;
use rasm::target::{sap, wdc, Target};

fn compile(src: &str, target: &Target) -> Result<Vec<u8>, Diagnostic> {
    let file = Parser::parse(src).unwrap_or_else(|d| panic!("{}", d.render(src)));
    Compiler::new(target, file).compile()
}

fn compile_or_render(src: &str, target: &Target) -> String {
    match compile(src, target) {
        Ok(_) => panic!("expected a diagnostic"),
        Err(d) => d.render(src),
    }
}

#[test]
fn lda_one_on_sap_emits_a_single_byte() {
    let t = sap::target();
    assert_eq!(compile("lda 1\n", &t).unwrap(), vec![0x11]);
}

#[test]
fn oversized_literal_on_sap_is_too_large() {
    let t = sap::target();
    let rendered = compile_or_render("256\n", &t);
    assert!(rendered.contains("is too large"));
}

#[test]
fn unbound_label_on_sap_is_not_bound() {
    let t = sap::target();
    let rendered = compile_or_render("lda foo\n", &t);
    assert!(rendered.contains("not bound"));
}

#[test]
fn count_program_matches_the_expected_byte_sequence() {
    let t = sap::target();
    let src = "\
; Counts from 42 to 256 (zero really in 8 bits), then down from 255 to 1
; before halting

lda init

count_up:
  out
  add incr
  jc count_down  ; jump to \"count_down\" if we overflowed
  jmp count_up

count_down:
  out
  sub incr
  jz end         ; jump to \"end\" if we hit zero
  jmp count_down

end: hlt

init: 42
incr: 1
";
    let bytes = compile(src, &t).unwrap();
    assert_eq!(
        bytes,
        vec![26, 224, 43, 117, 97, 224, 59, 137, 101, 240, 42, 1]
    );
}

#[test]
fn immediate_too_wide_on_6502_names_mode_and_width() {
    let t = wdc::target();
    let rendered = compile_or_render("lda 0x100\n", &t);
    assert!(rendered.contains("addressing mode 'immediate'"));
    assert!(rendered.contains("2 byte operands"));
}

#[test]
fn indirect_indexed_on_6502_selects_ind_y() {
    let t = wdc::target();
    let bytes = compile("lda [[0xff] + y]\n", &t).unwrap();
    assert_eq!(bytes, vec![0xB1, 0xFF]);
}

#[test]
fn back_offset_on_sap_pads_with_the_preceding_instruction() {
    let t = sap::target();
    let bytes = compile("nop\n-2:\n", &t).unwrap();
    assert_eq!(bytes.len(), 14);
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn fib_program_matches_the_expected_byte_sequence() {
    let t = sap::target();
    let src = "\
; Counts up in fibonacci numbers forever (with a lot of overflow)

loop:
  lda a
  out
  add b
  sta a

  lda b
  out
  add a
  sta b

  jmp loop

a: 1
b: 1
";
    let bytes = compile(src, &t).unwrap();
    assert_eq!(bytes, vec![25, 224, 42, 73, 26, 224, 41, 74, 96, 1, 1]);
}
