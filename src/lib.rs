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

//! Negsim simulates the cache of a recursive DNS resolver answering
//! queries against a static root zone, to compare how much traffic
//! three negative-caching policies save:
//!
//! * exact negative caching ([RFC 2308]);
//! * DNSSEC-aware caching, where DS records ride along with NS answers
//!   ([RFC 4035]); and
//! * aggressive use of DNSSEC-validated NSEC records ([RFC 8198]).
//!
//! A [`Resolver`](resolver::Resolver) owns a [`Cache`](cache::Cache),
//! an [`Oracle`](oracle::Oracle) built from a [`Zone`](zone::Zone)
//! snapshot, and a [`VirtualClock`](clock::VirtualClock). No DNS
//! messages are ever sent; the simulation only tracks what the cache
//! knows and when that knowledge expires.
//!
//! [RFC 2308]: https://datatracker.ietf.org/doc/html/rfc2308
//! [RFC 4035]: https://datatracker.ietf.org/doc/html/rfc4035
//! [RFC 8198]: https://datatracker.ietf.org/doc/html/rfc8198

pub mod cache;
pub mod class;
pub mod clock;
mod error;
pub mod name;
pub mod oracle;
pub mod policy;
pub mod replay;
pub mod report;
pub mod resolver;
pub mod rr;
pub mod trace;
mod util;
pub mod zone;
pub mod zone_file;

pub use error::{Error, Result};
