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

//! Replaying traces through a [`Resolver`].

use std::io::{BufRead, Write};

use log::{debug, info};

use crate::cache::CacheStats;
use crate::report::Reporter;
use crate::resolver::Resolver;
use crate::trace::TraceReader;
use crate::{Error, Result};

/// The outcome of a replay.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// The number of queries resolved.
    pub events: u64,
    pub stats: CacheStats,
    pub oracle_queries: u64,

    /// Lines skipped as malformed.
    pub malformed: u64,

    /// Queries skipped by the top-level filter.
    pub filtered: u64,
}

/// Resolves every query of `trace` in order, reporting statistics to
/// `reporter` along the way.
///
/// The replay stops with [`Error::TraceOrdering`] at the first query
/// that is earlier than the one before it.
pub fn replay<S, W>(
    resolver: &mut Resolver,
    trace: &mut TraceReader<S>,
    reporter: &mut Reporter<W>,
) -> Result<Summary>
where
    S: BufRead,
    W: Write,
{
    let mut events = 0;
    for event in trace.by_ref() {
        let event = event?;
        let previous = resolver.now();
        let ordering_error = || Error::TraceOrdering {
            line: event.line,
            previous,
            attempted: event.reltime,
        };
        let reltime = u64::try_from(event.reltime).map_err(|_| ordering_error())?;
        resolver
            .set_reltime(reltime)
            .map_err(|_| ordering_error())?;

        reporter.advance(event.time.timestamp(), resolver.stats())?;
        let lookup = resolver.lookup(&event.name, event.rr_type)?;
        debug!(
            "Line {}: {} {} at {}: {:?}.",
            event.line,
            event.name,
            event.rr_type,
            resolver.now(),
            lookup
        );
        events += 1;
    }
    reporter.finish(resolver.stats())?;

    let summary = Summary {
        events,
        stats: resolver.stats(),
        oracle_queries: resolver.oracle_queries(),
        malformed: trace.malformed(),
        filtered: trace.filtered(),
    };
    if let Some(start) = trace.start() {
        debug!(
            "Trace started at {}; {} names cached at the end.",
            start,
            resolver.cached_names()
        );
    }
    info!(
        "Replayed {} queries under {}: {} hits, {} misses, {} oracle queries ({} lines malformed, {} filtered).",
        summary.events,
        resolver.policy(),
        summary.stats.hits,
        summary.stats.misses,
        summary.oracle_queries,
        summary.malformed,
        summary.filtered
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::oracle::Oracle;
    use crate::policy::Policy;
    use crate::report::Format;
    use crate::zone::Zone;

    const ZONE: &[u8] = b"\
. 10 IN SOA a.root-servers.net. nstld.verisign-grs.com. 1 2 3 4 10
. 2 IN NS a.root-servers.net.
. 10 IN NSEC test. NS SOA RRSIG NSEC
test. 2 IN NS ns.test.
test. 10 IN NSEC . NS RRSIG NSEC
";

    fn run(policy: Policy, trace: &str) -> (Result<Summary>, String) {
        let zone = Zone::load(Cursor::new(ZONE)).unwrap();
        let mut resolver = Resolver::new(Oracle::new(zone, policy).unwrap());
        let mut trace = TraceReader::new(Cursor::new(trace.as_bytes().to_vec()));
        let mut reporter = Reporter::new(Vec::new(), Format::Csv, 3600);
        let result = replay(&mut resolver, &mut trace, &mut reporter);
        let output = String::from_utf8(reporter.into_inner()).unwrap();
        (result, output)
    }

    #[test]
    fn replay_counts_and_reports() {
        let (result, output) = run(
            Policy::Rfc8198,
            "1970-01-01T00:59:58Z 'foo.' type 'A'\n\
             1970-01-01T00:59:59Z 'bar.' type 'A'\n\
             not a query\n\
             1970-01-01T01:00:00Z 'baz.' type 'A'\n\
             1970-01-01T01:00:30Z 'www.test.' type 'A'\n",
        );
        let summary = result.unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.stats, CacheStats { hits: 2, misses: 1 });
        assert_eq!(summary.oracle_queries, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.filtered, 1);
        assert_eq!(output, "time,hit,miss\n3600,1,1\n3601,2,1\n");
    }

    #[test]
    fn replay_rejects_time_travel() {
        let (result, _) = run(
            Policy::Rfc2308,
            "1970-01-01T00:00:10Z 'foo.' type 'A'\n\
             1970-01-01T00:00:20Z 'foo.' type 'A'\n\
             1970-01-01T00:00:15Z 'foo.' type 'A'\n",
        );
        match result {
            Err(Error::TraceOrdering {
                line,
                previous,
                attempted,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(previous.secs(), 10);
                assert_eq!(attempted, 5);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
