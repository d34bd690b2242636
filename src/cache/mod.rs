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

//! Resolver caches.
//!
//! A [`Cache`] remembers what the [`Oracle`](crate::oracle::Oracle)
//! said and until when. It never stores RDATA: a lookup is either a
//! [`Hit`](Lookup::Hit), meaning the cache could answer on its own, or
//! a [`Miss`](Lookup::Miss), meaning the resolver must ask. Two
//! implementations are provided:
//!
//! * [`ExactCache`], which caches NXDOMAIN for whole names and
//!   everything else per type ([RFC 2308]); and
//! * [`AggressiveCache`], which additionally proves non-existence from
//!   cached NSEC records ([RFC 8198]).
//!
//! [RFC 2308]: https://datatracker.ietf.org/doc/html/rfc2308
//! [RFC 8198]: https://datatracker.ietf.org/doc/html/rfc8198

use std::fmt;

use crate::clock::Timestamp;
use crate::name::Name;
use crate::oracle::Answer;
use crate::rr::Type;

mod aggressive;
mod exact;
pub use aggressive::AggressiveCache;
pub use exact::ExactCache;

/// The interface shared by all cache implementations.
pub trait Cache {
    /// Looks up `rr_type` at `name` at time `now`, counting the result
    /// as a hit or a miss.
    fn lookup(&mut self, name: &Name, rr_type: Type, now: Timestamp) -> Lookup;

    /// Stores `answer`, learned at time `now`. The answer expires at
    /// `now` plus its TTL.
    fn store(&mut self, answer: &Answer, now: Timestamp) -> Result<(), ContractViolation>;

    /// Returns the hit and miss counters.
    fn stats(&self) -> CacheStats;

    /// Returns the number of names the cache holds data for.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The result of a [`Cache::lookup`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Lookup {
    Hit,
    Miss(MissReason),
}

/// Why a [`Cache::lookup`] missed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MissReason {
    /// Nothing is known about the name and type.
    NotCached,

    /// The relevant knowledge has expired.
    Expired,

    /// No cached name sorts before the queried one.
    NoPredecessor,

    /// The name that would have to prove non-existence has no cached
    /// NSEC record.
    NoNsec,

    /// The closest cached NSEC record does not cover the name.
    NotCovering,

    /// The name's NSEC record says the type exists, but it is not in
    /// the cache.
    TypePresent,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::NotCached => "not cached",
            Self::Expired => "expired",
            Self::NoPredecessor => "no predecessor",
            Self::NoNsec => "no NSEC",
            Self::NotCovering => "NSEC does not cover the name",
            Self::TypePresent => "type present in NSEC bitmap",
        })
    }
}

/// Running hit and miss counters.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Counts the outcome of a lookup.
    fn record(&mut self, lookup: Lookup) {
        match lookup {
            Lookup::Hit => self.hits += 1,
            Lookup::Miss(_) => self.misses += 1,
        }
    }
}

/// A store operation that would break a cache's invariants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ContractViolation {
    /// Whole-name negative knowledge was given to a cache that only
    /// learns non-existence from NSEC records.
    WholeNameNegative { name: Name },

    /// Whole-name negative knowledge was given for a name that has
    /// unexpired data.
    NegativeOverData { name: Name },

    /// Data was given for a name cached as nonexistent.
    DataOverNegative { name: Name },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WholeNameNegative { name } => write!(
                f,
                "whole-name negative answer for {} given to an NSEC-only cache",
                name
            ),
            Self::NegativeOverData { name } => {
                write!(f, "NXDOMAIN for {}, which has cached data", name)
            }
            Self::DataOverNegative { name } => {
                write!(f, "data for {}, which is cached as nonexistent", name)
            }
        }
    }
}

impl std::error::Error for ContractViolation {}
