// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Error types for zone file parsing.
//!
//! All syntax errors are recorded with an [`ErrorKind`] value so that
//! calling code can get an appropriate error message without string
//! allocation.

use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::name;

////////////////////////////////////////////////////////////////////////
// ERROR                                                              //
////////////////////////////////////////////////////////////////////////

/// Represents errors that may occur during zone file parsing.
#[derive(Debug)]
pub enum Error {
    /// I/O errors encountered while reading a zone file.
    Io(io::Error),

    /// Syntax errors.
    Syntax(ErrorDetails),
}

impl Error {
    /// Constructs a new [`Error`] of the [`Syntax`](`Error::Syntax`)
    /// variant with provided information.
    pub(super) fn new(line: usize, kind: ErrorKind) -> Self {
        Self::Syntax(ErrorDetails { line, kind })
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Self::Io(io_error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(io_error) => write!(f, "I/O error: {}", io_error),
            Self::Syntax(details) => details.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(io_error) => Some(io_error),
            Self::Syntax(_) => None,
        }
    }
}

/// A result type for zone file parsing.
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////
// ERROR DETAILS                                                      //
////////////////////////////////////////////////////////////////////////

/// Provides information about the position and kind of zone file syntax
/// errors.
#[derive(Debug)]
pub struct ErrorDetails {
    line: usize,
    kind: ErrorKind,
}

impl ErrorDetails {
    /// Returns the line in the file at which the error occurred.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the kind of syntax error that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}

////////////////////////////////////////////////////////////////////////
// ERROR KINDS                                                        //
////////////////////////////////////////////////////////////////////////

/// Kinds of zone file syntax errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    AtWhenOriginNotSet,
    BadUtf8(Utf8Error),
    EmptyOwnerWithNoPrevious,
    EofBeforeCloseParen,
    EscapeAtEndOfLine,
    ExpectedName,
    ExpectedTtl,
    ExpectedType,
    IncludeNotSupported,
    InvalidName(name::Error),
    InvalidTtl(&'static str),
    InvalidType(&'static str),
    NestedParens,
    OmittedClassWithNoPrevious,
    OmittedTtlWithNoDefaultOrPrevious,
    PqdnWhenOriginNotSet,
    UnknownDirective,
    UnmatchedCloseParen,
    UnterminatedQuote,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::AtWhenOriginNotSet => f.write_str("cannot use @ when no origin is set"),
            Self::BadUtf8(utf8_err) => utf8_err.fmt(f),
            Self::EmptyOwnerWithNoPrevious => {
                f.write_str("the owner cannot be empty when no previous owner is available")
            }
            Self::EofBeforeCloseParen => {
                f.write_str("reached end of file before close parenthesis")
            }
            Self::EscapeAtEndOfLine => f.write_str("escape sequence at the end of a line"),
            Self::ExpectedName => f.write_str("expected a domain name"),
            Self::ExpectedTtl => f.write_str("expected a TTL"),
            Self::ExpectedType => f.write_str("expected an RR type"),
            Self::IncludeNotSupported => f.write_str("$INCLUDE is not supported"),
            Self::InvalidName(name_err) => write!(f, "invalid name: {}", name_err),
            Self::InvalidTtl(ttl_err) => write!(f, "invalid TTL: {}", ttl_err),
            Self::InvalidType(type_err) => type_err.fmt(f),
            Self::NestedParens => f.write_str("nested parentheses"),
            Self::OmittedClassWithNoPrevious => {
                f.write_str("class omitted with no previous class available")
            }
            Self::OmittedTtlWithNoDefaultOrPrevious => {
                f.write_str("TTL omitted with no default TTL or previous TTL available")
            }
            Self::PqdnWhenOriginNotSet => {
                f.write_str("cannot use a partially qualified domain name when no origin is set")
            }
            Self::UnknownDirective => f.write_str("unknown directive"),
            Self::UnmatchedCloseParen => f.write_str("unmatched close parenthesis"),
            Self::UnterminatedQuote => f.write_str("quoted string is not terminated"),
        }
    }
}
