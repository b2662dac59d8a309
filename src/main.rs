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

use std::env::args;
use std::io::{stderr, Write};
use std::process::exit;

use rasm::asm::{self, Assembler, OutputFormat};
use rasm::target::Target;
use rasm::PROGRAM_NAME;

const USAGE: &str = "\
usage: ras -a {sap,w65c02s} [-f {binary,binary_text}] [FILE]

Assembles FILE (or stdin, if omitted) and writes the result to stdout.

options:
  -a {sap,w65c02s}          select target architecture
  -f {binary,binary_text}   select output format (default: binary)
  -h                        print this message and exit
";

struct Options {
    arch: Option<String>,
    format: Option<String>,
    path: Option<String>,
}

fn parse_args() -> std::result::Result<Options, String> {
    let mut opts = Options { arch: None, format: None, path: None };
    let mut args = args();
    args.next();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => return Err(String::new()),
            "-a" => {
                opts.arch = Some(args.next().ok_or("-a requires an argument")?);
            }
            "-f" => {
                opts.format = Some(args.next().ok_or("-f requires an argument")?);
            }
            _ if opts.path.is_none() => opts.path = Some(arg),
            _ => return Err(format!("unexpected argument '{}'", arg)),
        }
    }

    Ok(opts)
}

fn run() -> asm::Result {
    let opts = parse_args().map_err(|e| {
        if !e.is_empty() {
            let _ = writeln!(stderr(), "{}: {}", PROGRAM_NAME, e);
        }
        let _ = write!(stderr(), "{}", USAGE);
    })?;

    let arch = opts.arch.as_deref().ok_or_else(|| {
        let _ = writeln!(stderr(), "{}: -a is required", PROGRAM_NAME);
        let _ = write!(stderr(), "{}", USAGE);
    })?;

    let target = Target::by_name(arch).ok_or_else(|| {
        let _ = writeln!(stderr(), "{}: unrecognized architecture '{}'", PROGRAM_NAME, arch);
    })?;

    let format = match opts.format.as_deref() {
        None => OutputFormat::Binary,
        Some(name) => OutputFormat::by_name(name).ok_or_else(|| {
            let _ = writeln!(stderr(), "{}: unrecognized output format '{}'", PROGRAM_NAME, name);
        })?,
    };

    let mut asm = Assembler::new(target, format);

    match &opts.path {
        Some(path) => asm.assemble_file(path)?,
        None => asm.assemble_stdin()?,
    }

    asm.write_output()?;
    asm.result()
}

fn main() {
    exit(match run() {
        Ok(()) => 0,
        Err(()) => 1,
    });
}
