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

//! Implementation of the [`Error`] type for zone loading.

use std::fmt;

use crate::class::Class;
use crate::zone_file;

/// Errors that arise while loading a [`Zone`](super::Zone). Any of
/// these prevents a simulation from starting.
#[derive(Debug)]
pub enum Error {
    /// The zone file could not be read or parsed.
    Parse(zone_file::Error),

    /// A record had a class other than `IN`.
    ClassMismatch { line: usize, class: Class },

    /// The zone has no SOA record at the root.
    MissingSoa,

    /// A second SOA record was found.
    DuplicateSoa { line: usize },

    /// An SOA record was found somewhere other than the root.
    SoaNotAtApex { line: usize },

    /// The RDATA of an SOA record could not be interpreted.
    InvalidSoa { line: usize, reason: &'static str },

    /// The RDATA of an NSEC record could not be interpreted.
    InvalidNsec { line: usize, reason: &'static str },

    /// A second NSEC record was found at the same owner.
    DuplicateNsec { line: usize },

    /// NSEC records are needed, but the apex has none.
    MissingApexNsec,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Parse(parse_error) => parse_error.fmt(f),
            Self::ClassMismatch { line, class } => write!(
                f,
                "the record at line {} has class {}, but only IN is supported",
                line, class
            ),
            Self::MissingSoa => f.write_str("the zone has no SOA record at the root"),
            Self::DuplicateSoa { line } => {
                write!(f, "duplicate SOA record at line {}", line)
            }
            Self::SoaNotAtApex { line } => {
                write!(f, "the SOA record at line {} is not at the root", line)
            }
            Self::InvalidSoa { line, reason } => {
                write!(f, "invalid SOA RDATA at line {}: {}", line, reason)
            }
            Self::InvalidNsec { line, reason } => {
                write!(f, "invalid NSEC RDATA at line {}: {}", line, reason)
            }
            Self::DuplicateNsec { line } => {
                write!(f, "duplicate NSEC record at line {}", line)
            }
            Self::MissingApexNsec => {
                f.write_str("the zone is not signed: the root has no NSEC record")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(parse_error) => Some(parse_error),
            _ => None,
        }
    }
}

impl From<zone_file::Error> for Error {
    fn from(parse_error: zone_file::Error) -> Self {
        Self::Parse(parse_error)
    }
}
