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

//! The crate-level [`Error`] type.

use std::fmt;
use std::io;

use crate::cache::ContractViolation;
use crate::clock::Timestamp;
use crate::zone;

/// Errors that abort a simulation run.
#[derive(Debug)]
pub enum Error {
    /// The trace went back in time at the given line. `attempted` is
    /// in seconds since the first event, and may be negative.
    TraceOrdering {
        line: usize,
        previous: Timestamp,
        attempted: i64,
    },

    /// The cache's invariants were broken.
    CacheContract(ContractViolation),

    /// The zone could not be loaded.
    Zone(zone::Error),

    /// Reading the trace or writing the report failed.
    Io(io::Error),
}

/// A result type for simulation runs.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TraceOrdering {
                line,
                previous,
                attempted,
            } => write!(
                f,
                "trace line {} goes back in time (from {} to {}s)",
                line, previous, attempted
            ),
            Self::CacheContract(violation) => write!(f, "cache contract violated: {}", violation),
            Self::Zone(zone_error) => write!(f, "failed to load zone: {}", zone_error),
            Self::Io(io_error) => write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TraceOrdering { .. } => None,
            Self::CacheContract(violation) => Some(violation),
            Self::Zone(zone_error) => Some(zone_error),
            Self::Io(io_error) => Some(io_error),
        }
    }
}

impl From<ContractViolation> for Error {
    fn from(violation: ContractViolation) -> Self {
        Self::CacheContract(violation)
    }
}

impl From<zone::Error> for Error {
    fn from(zone_error: zone::Error) -> Self {
        Self::Zone(zone_error)
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Self {
        Self::Io(io_error)
    }
}
