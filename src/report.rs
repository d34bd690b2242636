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

//! Periodic reporting of cache statistics.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::cache::CacheStats;
use crate::util::Caseless;

/// The default reporting interval, in seconds.
pub const DEFAULT_INTERVAL: u64 = 3600;

/// The output format of a [`Reporter`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Format {
    /// A `time,hit,miss` header, then one row per boundary, with the
    /// boundary as a Unix timestamp.
    #[default]
    Csv,

    /// Lines of the form `time <t> hit <h> miss <m>`, where `t` is
    /// relative to the first event.
    Text,
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if Caseless(text) == Caseless("csv") {
            Ok(Self::Csv)
        } else if Caseless(text) == Caseless("text") {
            Ok(Self::Text)
        } else {
            Err("unknown format (expected csv or text)")
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Text => "text",
        })
    }
}

/// Writes cumulative hit and miss counters each time replay crosses a
/// multiple of the interval.
///
/// Boundaries are aligned to absolute time, so with the default
/// interval a row is written at the top of every hour. A row at time
/// `t` always shows the counters for the events before `t`, so the row
/// written by [`Reporter::finish`] is one second after the last event.
/// If several boundaries pass between two events, a row is written for
/// each.
pub struct Reporter<W> {
    out: W,
    format: Format,
    interval: i64,
    start: Option<i64>,
    next_boundary: i64,
    last: i64,
    wrote_header: bool,
}

impl<W: Write> Reporter<W> {
    /// Creates a reporter writing to `out`. An `interval` of zero is
    /// treated as one second.
    pub fn new(out: W, format: Format, interval: u64) -> Self {
        Self {
            out,
            format,
            interval: i64::try_from(interval.max(1)).unwrap_or(i64::MAX),
            start: None,
            next_boundary: 0,
            last: 0,
            wrote_header: false,
        }
    }

    /// Reports any boundaries passed on the way to `time` (a Unix
    /// timestamp). This must be called before the event at `time` is
    /// counted.
    pub fn advance(&mut self, time: i64, stats: CacheStats) -> io::Result<()> {
        if self.start.is_none() {
            self.start = Some(time);
            self.next_boundary = time
                .div_euclid(self.interval)
                .saturating_add(1)
                .saturating_mul(self.interval);
        }
        while time >= self.next_boundary {
            self.row(self.next_boundary, stats)?;
            self.next_boundary = self.next_boundary.saturating_add(self.interval);
        }
        self.last = time;
        Ok(())
    }

    /// Writes the final row, one second after the last event, and
    /// flushes the output. Nothing is written if there were no events.
    pub fn finish(&mut self, stats: CacheStats) -> io::Result<()> {
        if self.start.is_some() {
            self.row(self.last.saturating_add(1), stats)?;
        }
        self.out.flush()
    }

    /// Consumes the reporter, returning the output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn row(&mut self, time: i64, stats: CacheStats) -> io::Result<()> {
        match self.format {
            Format::Csv => {
                if !self.wrote_header {
                    writeln!(self.out, "time,hit,miss")?;
                    self.wrote_header = true;
                }
                writeln!(self.out, "{},{},{}", time, stats.hits, stats.misses)
            }
            Format::Text => writeln!(
                self.out,
                "time {} hit {} miss {}",
                time - self.start.unwrap_or(time),
                stats.hits,
                stats.misses
            ),
        }
    }
}
