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

//! Reading of query traces.
//!
//! A trace is a query log with one query per line:
//!
//! ```text
//! 2017-09-08T15:42:22.186207+02:00 'prod-t.singular.net.' type 'A'
//! ```
//!
//! The timestamp is in [RFC 3339] format, the name must be absolute,
//! and the type is a mnemonic or an [RFC 3597] `TYPEnnn` value.
//! Anything after the type is ignored. Lines that do not have this
//! form are skipped.
//!
//! [RFC 3339]: https://datatracker.ietf.org/doc/html/rfc3339
//! [RFC 3597]: https://datatracker.ietf.org/doc/html/rfc3597

use std::io::{self, BufRead};
use std::str;

use chrono::{DateTime, FixedOffset};
use log::trace;

use crate::name::Name;
use crate::rr::Type;

/// A query read from a trace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    /// The line of the trace the query was read from.
    pub line: usize,
    pub time: DateTime<FixedOffset>,

    /// Whole seconds since the first event of the trace. This is
    /// negative if the trace goes back in time before its first event.
    pub reltime: i64,
    pub name: Name,
    pub rr_type: Type,
}

/// An iterator over the [`Event`]s of a trace.
///
/// By default only queries for the root and for top-level domains are
/// returned, since only those are answered from the root zone without
/// a referral. See [`TraceReader::top_level_only`].
pub struct TraceReader<S> {
    stream: S,
    buf: Vec<u8>,
    line: usize,
    top_level_only: bool,
    start: Option<DateTime<FixedOffset>>,
    malformed: u64,
    filtered: u64,
}

impl<S: BufRead> TraceReader<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            line: 0,
            top_level_only: true,
            start: None,
            malformed: 0,
            filtered: 0,
        }
    }

    /// Sets whether queries for names more than one label below the
    /// root are skipped.
    pub fn top_level_only(mut self, top_level_only: bool) -> Self {
        self.top_level_only = top_level_only;
        self
    }

    /// Returns the time of the first event, once it has been read.
    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start
    }

    /// Returns how many lines have been skipped as malformed.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Returns how many queries have been skipped by the top-level
    /// filter.
    pub fn filtered(&self) -> u64 {
        self.filtered
    }
}

impl<S: BufRead> Iterator for TraceReader<S> {
    type Item = io::Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.stream.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e)),
            }

            let (time, name, rr_type) = match str::from_utf8(&self.buf)
                .map_err(|_| "not UTF-8")
                .and_then(parse_line)
            {
                Ok(parsed) => parsed,
                Err(reason) => {
                    trace!("Skipping trace line {}: {}.", self.line, reason);
                    self.malformed += 1;
                    continue;
                }
            };
            if self.top_level_only && name.len() > 2 {
                self.filtered += 1;
                continue;
            }

            let start = *self.start.get_or_insert(time);
            return Some(Ok(Event {
                line: self.line,
                time,
                reltime: (time - start).num_seconds(),
                name,
                rr_type,
            }));
        }
    }
}

/// Parses one line of a trace.
fn parse_line(line: &str) -> Result<(DateTime<FixedOffset>, Name, Type), &'static str> {
    let (time, rest) = line.split_once(' ').ok_or("missing fields")?;
    let time = DateTime::parse_from_rfc3339(time).map_err(|_| "invalid timestamp")?;
    let (name, rest) = rest
        .strip_prefix('\'')
        .and_then(|rest| rest.split_once('\''))
        .ok_or("expected a quoted name")?;
    let (rr_type, _) = rest
        .strip_prefix(" type '")
        .and_then(|rest| rest.split_once('\''))
        .ok_or("expected a quoted type")?;
    let name = name.parse::<Name>().map_err(|_| "invalid name")?;
    Ok((time, name, rr_type.parse()?))
}
