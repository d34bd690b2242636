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

//! The simulated recursive resolver.

use log::trace;

use crate::cache::{AggressiveCache, Cache, CacheStats, ExactCache, Lookup};
use crate::clock::{TimeError, Timestamp, VirtualClock};
use crate::name::Name;
use crate::oracle::Oracle;
use crate::policy::Policy;
use crate::rr::Type;
use crate::Result;

/// A recursive resolver that answers from its cache when it can and
/// asks the [`Oracle`] when it cannot.
///
/// The cache implementation is chosen by the oracle's [`Policy`]:
/// [`AggressiveCache`] for RFC 8198 and [`ExactCache`] otherwise.
pub struct Resolver {
    clock: VirtualClock,
    cache: Box<dyn Cache>,
    oracle: Oracle,
}

impl Resolver {
    /// Creates a resolver with an empty cache, at time zero.
    pub fn new(oracle: Oracle) -> Self {
        let cache: Box<dyn Cache> = if oracle.policy().aggressive_nsec() {
            Box::new(AggressiveCache::new())
        } else {
            Box::new(ExactCache::new())
        };
        Self {
            clock: VirtualClock::new(),
            cache,
            oracle,
        }
    }

    /// Moves the clock to `reltime` seconds after the start of the
    /// simulation. Time cannot go backwards.
    pub fn set_reltime(&mut self, reltime: u64) -> std::result::Result<Timestamp, TimeError> {
        self.clock.advance(reltime)
    }

    /// Resolves `rr_type` at `name`, returning whether the cache could
    /// answer. On a miss, the oracle is queried and everything it
    /// returns is cached.
    pub fn lookup(&mut self, name: &Name, rr_type: Type) -> Result<Lookup> {
        let now = self.clock.now();
        let canonical;
        let name = if self.policy().aggressive_nsec() {
            canonical = name.to_canonical();
            &canonical
        } else {
            name
        };

        let lookup = self.cache.lookup(name, rr_type, now);
        if let Lookup::Miss(reason) = lookup {
            trace!("Miss for {} {} ({}); querying.", name, rr_type, reason);
            let response = self.oracle.query(name, rr_type);
            for answer in &response.answers {
                self.cache.store(answer, now)?;
            }
        }
        Ok(lookup)
    }

    /// Returns the cache's hit and miss counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns how many queries the oracle has answered.
    pub fn oracle_queries(&self) -> u64 {
        self.oracle.queries()
    }

    /// Returns the number of names in the cache.
    pub fn cached_names(&self) -> usize {
        self.cache.len()
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn policy(&self) -> Policy {
        self.oracle.policy()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::cache::MissReason;
    use crate::zone::Zone;
    use crate::Error;

    const ZONE: &[u8] = b"\
$TTL 10
.       IN SOA a.root-servers.net. nstld.verisign-grs.com. (
            2017090800 1800 900 604800 10 )
.     2 IN NS a.root-servers.net.
.       IN NSEC test. NS SOA RRSIG NSEC DNSKEY
.       IN DNSKEY 257 3 8 AwEAAQ==
test. 2 IN NS ns.test.
test. 2 IN DS 12345 8 2 0000
test.   IN NSEC . NS DS RRSIG NSEC
";

    fn resolver(policy: Policy) -> Resolver {
        let zone = Zone::load(Cursor::new(ZONE)).unwrap();
        Resolver::new(Oracle::new(zone, policy).unwrap())
    }

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    /// Looks up `name` and `rr_type`, then checks the cumulative
    /// misses, hits, and oracle queries.
    fn check(resolver: &mut Resolver, owner: &str, rr_type: u16, counts: (u64, u64, u64)) {
        resolver.lookup(&name(owner), Type::from(rr_type)).unwrap();
        let stats = resolver.stats();
        assert_eq!(
            (stats.misses, stats.hits, resolver.oracle_queries()),
            counts,
            "after looking up {} {}",
            owner,
            rr_type
        );
    }

    const NS: u16 = 2;
    const DS: u16 = 43;

    #[test]
    fn nxdomain_is_cached_for_the_whole_name() {
        for policy in [Policy::Rfc2308, Policy::Rfc4035] {
            let mut resolver = resolver(policy);
            check(&mut resolver, "nonexistent.", NS, (1, 0, 1));
            check(&mut resolver, "nonexistent.", 666, (1, 1, 1));
            resolver.set_reltime(5).unwrap();
            check(&mut resolver, "NonExistent.", 324, (1, 2, 1));
            resolver.set_reltime(11).unwrap();
            check(&mut resolver, "nonexistent.", 555, (2, 2, 2));
        }
    }

    #[test]
    fn nodata_is_cached_per_type() {
        for policy in [Policy::Rfc2308, Policy::Rfc4035] {
            let mut resolver = resolver(policy);
            check(&mut resolver, ".", 666, (1, 0, 1));
            resolver.set_reltime(1).unwrap();
            check(&mut resolver, ".", 666, (1, 1, 1));
            check(&mut resolver, ".", NS, (2, 1, 2));
            resolver.set_reltime(2).unwrap();
            check(&mut resolver, ".", NS, (2, 2, 2));
            resolver.set_reltime(5).unwrap();
            check(&mut resolver, ".", NS, (3, 2, 3));
        }
    }

    #[test]
    fn base_expires_exactly_at_ttl() {
        let mut resolver = resolver(Policy::Rfc2308);
        check(&mut resolver, ".", NS, (1, 0, 1));
        resolver.set_reltime(1).unwrap();
        check(&mut resolver, ".", NS, (1, 1, 1));
        resolver.set_reltime(2).unwrap();
        check(&mut resolver, ".", NS, (2, 1, 2));
    }

    #[test]
    fn base_does_not_keep_ds_from_ns_answers() {
        let mut resolver = resolver(Policy::Rfc2308);
        check(&mut resolver, "test.", NS, (1, 0, 1));
        check(&mut resolver, "test.", DS, (2, 0, 2));
    }

    #[test]
    fn dnssec_keeps_ds_from_ns_answers() {
        for policy in [Policy::Rfc4035, Policy::Rfc8198] {
            let mut resolver = resolver(policy);
            check(&mut resolver, "test.", NS, (1, 0, 1));
            resolver.set_reltime(1).unwrap();
            check(&mut resolver, "test.", NS, (1, 1, 1));
            check(&mut resolver, "test.", DS, (1, 2, 1));
            resolver.set_reltime(3).unwrap();
            check(&mut resolver, "test.", DS, (2, 2, 2));
            check(&mut resolver, "test.", NS, (3, 2, 3));
        }
    }

    #[test]
    fn aggressive_nxdomain() {
        let mut resolver = resolver(Policy::Rfc8198);
        check(&mut resolver, "nonexistent.", NS, (1, 0, 1));
        check(&mut resolver, "nonexistent.", 666, (1, 1, 1));
        // Covered by the NSEC record from . to test.
        check(&mut resolver, "nonexistent2.", 666, (1, 2, 1));
        resolver.set_reltime(5).unwrap();
        check(&mut resolver, "NONEXISTENT3.", 324, (1, 3, 1));
        resolver.set_reltime(11).unwrap();
        check(&mut resolver, "nonexistent4.", 555, (2, 3, 2));
        // Outside the interval from . to test.
        check(&mut resolver, "zzz.", 555, (3, 3, 3));
        // The NSEC record at test. wraps around to the apex, so it
        // covers nothing.
        check(&mut resolver, "zzzz.", 555, (4, 3, 4));
        assert_eq!(resolver.cached_names(), 2);
    }

    #[test]
    fn aggressive_nodata() {
        let mut resolver = resolver(Policy::Rfc8198);
        check(&mut resolver, ".", 666, (1, 0, 1));
        resolver.set_reltime(1).unwrap();
        check(&mut resolver, ".", 666, (1, 1, 1));
        // NS is in the NSEC bitmap, so it must be fetched.
        check(&mut resolver, ".", NS, (2, 1, 2));
        check(&mut resolver, ".", NS, (2, 2, 2));
        // Yet another missing type is proven by the cached NSEC record.
        check(&mut resolver, ".", 111, (2, 3, 2));
        resolver.set_reltime(5).unwrap();
        check(&mut resolver, ".", NS, (3, 3, 3));
        check(&mut resolver, ".", NS, (3, 4, 3));
    }

    #[test]
    fn aggressive_reports_miss_reasons() {
        let mut resolver = resolver(Policy::Rfc8198);
        assert_eq!(
            resolver.lookup(&name("."), Type::NS).unwrap(),
            Lookup::Miss(MissReason::NoPredecessor)
        );
        assert_eq!(
            resolver.lookup(&name("."), Type::SOA).unwrap(),
            Lookup::Miss(MissReason::NoNsec)
        );
        assert_eq!(
            resolver.lookup(&name("."), Type::DNSKEY).unwrap(),
            Lookup::Miss(MissReason::NoNsec)
        );
        assert_eq!(
            resolver.lookup(&name("."), Type::from(666)).unwrap(),
            Lookup::Miss(MissReason::NoNsec)
        );
        assert_eq!(
            resolver.lookup(&name("."), Type::MX).unwrap(),
            Lookup::Hit
        );
        assert_eq!(
            resolver.lookup(&name("."), Type::RRSIG).unwrap(),
            Lookup::Miss(MissReason::TypePresent)
        );
    }

    #[test]
    fn time_cannot_go_backwards() {
        let mut resolver = resolver(Policy::Rfc2308);
        resolver.set_reltime(10).unwrap();
        let error = resolver.set_reltime(9).unwrap_err();
        assert_eq!(error.previous, Timestamp::from(10));
        assert_eq!(resolver.now(), Timestamp::from(10));
    }

    #[test]
    fn contract_violations_abort() {
        // NXDOMAIN for a name with live data.
        let mut resolver = resolver(Policy::Rfc2308);
        check(&mut resolver, "test.", NS, (1, 0, 1));
        let answer = crate::oracle::Answer {
            owner: name("test."),
            data: crate::oracle::AnswerData::NxDomain {
                ttl: crate::rr::Ttl::from(5),
            },
        };
        let violation = resolver.cache.store(&answer, resolver.now()).unwrap_err();
        assert!(matches!(Error::from(violation), Error::CacheContract(_)));
    }
}
