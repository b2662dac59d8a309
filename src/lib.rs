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

#![allow(dead_code)]

pub mod asm;
pub mod compiler;
pub mod diagnostic;
pub mod format;
pub mod instruction;
pub mod lang;
pub mod message;
pub mod target;
pub mod unify;
pub mod util;

/// The name of the assembler.
pub const PROGRAM_NAME: &str = "ras";
