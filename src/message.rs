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

//! Assembler Messages

use std::fmt::{self, Arguments, Display, Formatter};
use colored::Colorize;
use crate::util::Location;

// -----------------------------------------------------------------------------

/// Trait for assembler message types.
pub trait Message: Display {
    /// Returns the origin (e.g. path, line, and column) of the message.
    #[inline]
    fn origin(&self) -> Origin { Origin::General }

    /// Returns the severity level of the message.
    #[inline]
    fn severity(&self) -> Severity { Severity::Normal }
}

impl Message for str           {}
impl Message for String        {}
impl Message for Arguments<'_> {}

impl<T> Message for &T where T: Message + ?Sized {
    #[inline]
    fn origin(&self) -> Origin { (*self).origin() }

    #[inline]
    fn severity(&self) -> Severity { (*self).severity() }
}

// -----------------------------------------------------------------------------

/// Assembler message origins.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Origin<'a> {
    /// The message originates from the assembler itself.
    General,

    /// The message originates from a source code file.
    File {
        /// Path of the source code file.
        path: &'a str,

        /// Line-and-column location within the source code file.
        loc: Location
    },
}

impl Display for Origin<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Origin::General            => write!(f, "{}", crate::PROGRAM_NAME),
            Origin::File { path, loc } => write!(f, "{}:{}", path, loc),
        }
    }
}

// -----------------------------------------------------------------------------

/// Wrapper type that adds file origin information to an assembler message.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FileMessage<'a, M: Message> {
    /// The assembler message.
    msg: M,

    /// Path of the source code file.
    path: &'a str,

    /// Line-and-column location within the source code file.
    loc: Location,
}

impl<'a, M: Message> Message for FileMessage<'a, M> {
    #[inline]
    fn origin(&self) -> Origin {
        Origin::File { path: self.path, loc: self.loc }
    }

    #[inline]
    fn severity(&self) -> Severity {
        self.msg.severity()
    }
}

impl<'a, M: Message> Display for FileMessage<'a, M> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.msg.fmt(f)
    }
}

// -----------------------------------------------------------------------------

/// Message severity levels.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    /// For informational messages.
    Normal,

    /// For potential problems that do not prevent complete assembly.
    /// Assembly continues, and the assembler will produce output.
    Warning,

    /// For problems that prevent complete assembly.
    /// Assembly might continue, but the assembler will not produce output.
    Error,

    /// For severe, unrecoverable problems.
    /// The assembler terminates immediately and does not produce output.
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Severity::Normal  => Ok(()),
            Severity::Warning => write!(f, "{} ", "warning:".yellow().bold()),
            Severity::Error   => write!(f, "{} ", "error:".red().bold()),
            Severity::Fatal   => write!(f, "{} ", "fatal:".red().bold()),
        }
    }
}

// -----------------------------------------------------------------------------

/// Wrapper type that gives warning severity to an assembler message.
#[derive(Copy, Clone, Debug)]
pub struct Warning<T: Message>(T);

impl<T: Message> Message for Warning<T> {
    #[inline]
    fn origin(&self) -> Origin {
        self.0.origin()
    }

    #[inline]
    fn severity(&self) -> Severity {
        Severity::Warning
    }
}

impl<T: Message> Display for Warning<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

// -----------------------------------------------------------------------------

/// Wrapper type that gives error severity to an assembler message.
#[derive(Copy, Clone, Debug)]
pub struct Error<T: Message>(T);

impl<T: Message> Message for Error<T> {
    #[inline]
    fn origin(&self) -> Origin {
        self.0.origin()
    }

    #[inline]
    fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl<T: Message> Display for Error<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

// -----------------------------------------------------------------------------

/// Wrapper type that gives fatal severity to an assembler message.
#[derive(Copy, Clone, Debug)]
pub struct Fatal<T: Message>(T);

impl<T: Message> Message for Fatal<T> {
    #[inline]
    fn origin(&self) -> Origin {
        self.0.origin()
    }

    #[inline]
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

impl<T: Message> Display for Fatal<T> {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

// -----------------------------------------------------------------------------

/// Trait for sinks that record assembler messages and keep a tally of
/// warnings and errors seen so far.
pub trait Log {
    /// Records a message, regardless of severity.
    fn log(&mut self, msg: &dyn Message) -> std::io::Result<()>;

    /// Records a warning-severity message and increments the warning tally.
    fn log_warning(&mut self, msg: &dyn Message) -> std::io::Result<()> {
        self.log(msg)
    }

    /// Records an error-severity message and increments the error tally.
    fn log_error(&mut self, msg: &dyn Message) -> std::io::Result<()> {
        self.log(msg)
    }
}

impl dyn Message + '_ {
    /// Dispatches this message to `log`, routing by [`severity`](Message::severity).
    pub fn tell(&self, log: &mut dyn Log) -> std::io::Result<()> {
        match self.severity() {
            Severity::Warning => log.log_warning(self),
            Severity::Error | Severity::Fatal => log.log_error(self),
            Severity::Normal => log.log(self),
        }
    }
}

/// Builds a message reporting that the file at `path` could not be read,
/// with the underlying I/O error as explanatory text.
pub fn read_error<'a>(path: &'a str, cause: &std::io::Error) -> impl Message + 'a {
    FileMessage {
        msg: Error(format!("could not read '{}': {}", path, cause)),
        path,
        loc: Location::UNKNOWN,
    }
}

/// Builds a message reporting that output could not be written to `path`,
/// with the underlying I/O error as explanatory text.
pub fn write_error<'a>(path: &'a str, cause: &std::io::Error) -> impl Message + 'a {
    FileMessage {
        msg: Error(format!("could not write '{}': {}", path, cause)),
        path,
        loc: Location::UNKNOWN,
    }
}

/// Builds a message reporting that `path`'s bytes are not valid UTF-8.
pub fn read_invalid_utf8<'a>(path: &'a str, cause: &std::str::Utf8Error) -> impl Message + 'a {
    FileMessage {
        msg: Error(format!("could not read '{}': not valid UTF-8: {}", path, cause)),
        path,
        loc: Location::UNKNOWN,
    }
}

/// Builds a message reporting a [`Diagnostic`](crate::diagnostic::Diagnostic)
/// raised while assembling `path`, rendered against that file's `source`.
pub fn diagnostic<'a>(path: &'a str, source: &str, d: &crate::diagnostic::Diagnostic) -> impl Message + 'a {
    FileMessage {
        msg: Error(d.render(source)),
        path,
        loc: Location::UNKNOWN,
    }
}
