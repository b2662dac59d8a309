// This file is part of ras, an assembler.
// Copyright 2020 Jeffrey Sharp
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

//! Top-level assembler interface.

use std::fs;
use std::io::{stdin, stdout, Read, Write};

use crate::compiler::Compiler;
use crate::format;
use crate::lang::parser::Parser;
use crate::message::*;
use crate::target::Target;

/// Type returned by fallible assembler methods.
pub type Result<T = (), E = ()> = std::result::Result<T, E>;

/// An output format named by the `-f` option.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum OutputFormat {
    /// Raw assembled bytes.
    Binary,

    /// One `iiii: hhhh llll` line per byte.
    BinaryText,
}

impl OutputFormat {
    /// Looks up an output format by its CLI name (`-f` option).
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "binary" => Some(Self::Binary),
            "binary_text" => Some(Self::BinaryText),
            _ => None,
        }
    }

    fn write<W: Write>(&self, out: &mut W, bytes: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Binary => format::binary(out, bytes),
            Self::BinaryText => format::binary_text(out, bytes),
        }
    }
}

/// Top-level assembler interface: parses and compiles source against one
/// [`Target`], and writes the result in one [`OutputFormat`].
pub struct Assembler {
    target: Target,
    format: OutputFormat,
    output: Vec<u8>,
    warning_count: u16,
    error_count: u16,
}

impl Assembler {
    /// Creates a new assembler for `target`, writing output as `format`.
    pub fn new(target: Target, format: OutputFormat) -> Self {
        Self {
            target,
            format,
            output: Vec::with_capacity(16 * 1024),
            warning_count: 0,
            error_count: 0,
        }
    }

    /// Returns the result of assembly: `Err(())` if any condition prevented
    /// the assembler from producing output, and `Ok(())` otherwise.
    pub fn result(&self) -> Result {
        match self.error_count {
            0 => Ok(()),
            _ => Err(()),
        }
    }

    /// Assembles the file at the given `path`.
    pub fn assemble_file(&mut self, path: &str) -> Result {
        match fs::read_to_string(path) {
            Ok(s) => self.assemble_bytes(path, s.as_bytes()),
            Err(e) => read_error(path, &e).tell(self).map_err(|_| ()),
        }
    }

    /// Assembles the bytes read from standard input.
    pub fn assemble_stdin(&mut self) -> Result {
        self.assemble_from("stdin", stdin())
    }

    /// Assembles the bytes read from `src`, using `path` as the pathname.
    pub fn assemble_from<R: Read>(&mut self, path: &str, mut src: R) -> Result {
        let mut s = String::new();
        match src.read_to_string(&mut s) {
            Ok(_) => self.assemble_bytes(path, s.as_bytes()),
            Err(e) => read_error(path, &e).tell(self).map_err(|_| ()),
        }
    }

    /// Assembles the given `bytes`, using `path` as the pathname.
    pub fn assemble_bytes(&mut self, path: &str, bytes: &[u8]) -> Result {
        let source = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => return read_invalid_utf8(path, &e).tell(self).map_err(|_| ()),
        };

        let file = match Parser::parse(source) {
            Ok(f) => f,
            Err(d) => return diagnostic(path, source, &d).tell(self).map_err(|_| ()),
        };

        match Compiler::new(&self.target, file).compile() {
            Ok(bytes) => {
                self.output.extend(bytes);
                self.result()
            }
            Err(d) => diagnostic(path, source, &d).tell(self).map_err(|_| ()),
        }
    }

    /// Writes assembly output.
    pub fn write_output(&mut self) -> Result {
        let bytes = std::mem::take(&mut self.output);
        let written = self.format.write(&mut stdout(), &bytes);
        self.output = bytes;

        match written {
            Ok(_) => Ok(()),
            Err(e) => write_error("stdout", &e).tell(self).map_err(|_| ()),
        }
    }
}

impl Log for Assembler {
    fn log(&mut self, msg: &dyn Message) -> std::io::Result<()> {
        eprintln!("{}: {}{}", msg.origin(), msg.severity(), msg);
        Ok(())
    }

    fn log_warning(&mut self, msg: &dyn Message) -> std::io::Result<()> {
        self.warning_count += 1;
        self.log(msg)
    }

    fn log_error(&mut self, msg: &dyn Message) -> std::io::Result<()> {
        self.error_count += 1;
        self.log(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::sap;

    #[test]
    fn assembles_valid_source_to_binary() {
        let mut asm = Assembler::new(sap::target(), OutputFormat::Binary);
        assert!(asm.assemble_bytes("test.asm", b"lda 1\nhlt\n").is_ok());
        assert!(asm.result().is_ok());
    }

    #[test]
    fn parse_failure_increments_error_count() {
        let mut asm = Assembler::new(sap::target(), OutputFormat::Binary);
        let _ = asm.assemble_bytes("test.asm", b",,,\n");
        assert!(asm.result().is_err());
    }

    #[test]
    fn compile_failure_increments_error_count() {
        let mut asm = Assembler::new(sap::target(), OutputFormat::Binary);
        let _ = asm.assemble_bytes("test.asm", b"lda 999\n");
        assert!(asm.result().is_err());
    }

    #[test]
    fn output_format_names_round_trip() {
        assert_eq!(OutputFormat::by_name("binary"), Some(OutputFormat::Binary));
        assert_eq!(OutputFormat::by_name("binary_text"), Some(OutputFormat::BinaryText));
        assert_eq!(OutputFormat::by_name("nope"), None);
    }
}
