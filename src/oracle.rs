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

//! The authoritative oracle.
//!
//! An [`Oracle`] stands in for the root servers: given a question, it
//! answers from the [`Zone`] snapshot with the records the active
//! [`Policy`] would put in a real response. Only the facts a cache
//! needs are produced (owner, type, TTL, and for NSEC records the next
//! name and type set); RDATA is never returned.

use std::collections::BTreeSet;

use log::trace;

use crate::name::Name;
use crate::policy::Policy;
use crate::rr::{type_bitmap, Ttl, Type};
use crate::zone::{self, Zone};

/// The response code of a [`Response`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Rcode {
    NoError,
    NxDomain,
}

/// The oracle's answer to one query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    pub rcode: Rcode,
    pub answers: Vec<Answer>,
}

/// One piece of cacheable knowledge in a [`Response`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Answer {
    pub owner: Name,
    pub data: AnswerData,
}

/// What an [`Answer`] says about its owner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnswerData {
    /// The owner does not exist.
    NxDomain { ttl: Ttl },

    /// Knowledge about one type at the owner. This is used both for
    /// records that exist and for NODATA, since the cache only tracks
    /// how long it knows the answer.
    Rrset { rr_type: Type, ttl: Ttl },

    /// The owner's NSEC record.
    Nsec {
        ttl: Ttl,
        next: Name,
        types: BTreeSet<Type>,
    },
}

impl AnswerData {
    /// Returns how long the knowledge may be cached.
    pub fn ttl(&self) -> Ttl {
        match *self {
            Self::NxDomain { ttl } | Self::Rrset { ttl, .. } | Self::Nsec { ttl, .. } => ttl,
        }
    }
}

/// A deterministic stand-in for an authoritative server.
#[derive(Debug)]
pub struct Oracle {
    zone: Zone,
    policy: Policy,
    queries: u64,
}

impl Oracle {
    /// Creates an oracle answering from `zone` under `policy`.
    ///
    /// When `policy` uses NSEC records, the zone must be signed: if the
    /// root has no NSEC record, this fails with
    /// [`zone::Error::MissingApexNsec`]. Since the root sorts before
    /// every other name, this also guarantees that every nonexistent
    /// name has a covering NSEC record.
    pub fn new(zone: Zone, policy: Policy) -> Result<Self, zone::Error> {
        if policy.aggressive_nsec() && zone.nsec(&Name::root()).is_none() {
            return Err(zone::Error::MissingApexNsec);
        }
        Ok(Self {
            zone,
            policy,
            queries: 0,
        })
    }

    /// Returns the policy the oracle answers under.
    pub fn policy(&self) -> Policy {
        self.policy
    }

    /// Returns how many queries have been answered.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Answers a query for `name` and `rr_type`.
    pub fn query(&mut self, name: &Name, rr_type: Type) -> Response {
        self.queries += 1;
        let response = if !self.zone.contains_name(name) {
            self.nxdomain(name)
        } else if let Some(ttl) = self.zone.ttl(name, rr_type) {
            self.noerror(name, rr_type, ttl)
        } else {
            self.nodata(name, rr_type)
        };
        trace!(
            "Oracle query {} for {} {}: {:?}.",
            self.queries,
            name,
            rr_type,
            response
        );
        response
    }

    fn nxdomain(&self, name: &Name) -> Response {
        let negative_ttl = self.zone.negative_ttl();
        let answer = self
            .policy
            .aggressive_nsec()
            .then(|| self.zone.nsec_predecessor(name))
            .flatten()
            .and_then(|owner| self.nsec_answer(owner, negative_ttl))
            .unwrap_or_else(|| Answer {
                owner: name.clone(),
                data: AnswerData::NxDomain { ttl: negative_ttl },
            });
        Response {
            rcode: Rcode::NxDomain,
            answers: vec![answer],
        }
    }

    fn nodata(&self, name: &Name, rr_type: Type) -> Response {
        let negative_ttl = self.zone.negative_ttl();

        // Names without an NSEC record of their own (glue, for
        // instance) get the per-type answer even under RFC 8198.
        let answer = self
            .policy
            .aggressive_nsec()
            .then(|| self.nsec_answer(name, negative_ttl))
            .flatten()
            .unwrap_or_else(|| Answer {
                owner: name.clone(),
                data: AnswerData::Rrset {
                    rr_type,
                    ttl: negative_ttl,
                },
            });
        Response {
            rcode: Rcode::NoError,
            answers: vec![answer],
        }
    }

    fn noerror(&self, name: &Name, rr_type: Type, ttl: Ttl) -> Response {
        let answer = if self.policy.aggressive_nsec() && rr_type == Type::NSEC {
            self.nsec_answer(name, ttl)
        } else {
            None
        };
        let mut answers = vec![answer.unwrap_or_else(|| Answer {
            owner: name.clone(),
            data: AnswerData::Rrset { rr_type, ttl },
        })];

        if self.policy.dnssec_piggyback() && rr_type == Type::NS {
            if let Some(ds_ttl) = self.zone.ttl(name, Type::DS) {
                answers.push(Answer {
                    owner: name.clone(),
                    data: AnswerData::Rrset {
                        rr_type: Type::DS,
                        ttl: ds_ttl,
                    },
                });
            }
        }

        Response {
            rcode: Rcode::NoError,
            answers,
        }
    }

    /// Builds an answer carrying the NSEC record at `owner`, if there
    /// is one.
    fn nsec_answer(&self, owner: &Name, ttl: Ttl) -> Option<Answer> {
        let nsec = self.zone.nsec(owner)?;
        Some(Answer {
            owner: owner.clone(),
            data: AnswerData::Nsec {
                ttl,
                next: nsec.next.clone(),
                types: type_bitmap::decode(nsec.types.windows()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const ZONE: &[u8] = b"\
. 10 IN SOA a.root-servers.net. nstld.verisign-grs.com. 1 2 3 4 10
. 2 IN NS a.root-servers.net.
. 10 IN NSEC test. NS SOA RRSIG NSEC DNSKEY
test. 2 IN NS ns.test.
test. 2 IN DS 1 8 2 0000
test. 10 IN NSEC . NS DS RRSIG NSEC
ns.test. 5 IN A 192.0.2.1
";

    fn oracle(policy: Policy) -> Oracle {
        Oracle::new(Zone::load(Cursor::new(ZONE)).unwrap(), policy).unwrap()
    }

    fn name(text: &str) -> Name {
        text.parse().unwrap()
    }

    fn rrset(owner: &str, rr_type: Type, ttl: u32) -> Answer {
        Answer {
            owner: name(owner),
            data: AnswerData::Rrset {
                rr_type,
                ttl: Ttl::from(ttl),
            },
        }
    }

    #[test]
    fn base_answers() {
        let mut oracle = oracle(Policy::Rfc2308);
        assert_eq!(
            oracle.query(&name("nonexistent."), Type::A),
            Response {
                rcode: Rcode::NxDomain,
                answers: vec![Answer {
                    owner: name("nonexistent."),
                    data: AnswerData::NxDomain { ttl: Ttl::from(10) },
                }],
            }
        );
        assert_eq!(
            oracle.query(&name("."), Type::from(666)).answers,
            vec![rrset(".", Type::from(666), 10)]
        );
        assert_eq!(
            oracle.query(&name("test."), Type::NS).answers,
            vec![rrset("test.", Type::NS, 2)]
        );
        assert_eq!(oracle.queries(), 3);
    }

    #[test]
    fn dnssec_piggybacks_ds_on_ns() {
        let mut oracle = oracle(Policy::Rfc4035);
        assert_eq!(
            oracle.query(&name("test."), Type::NS).answers,
            vec![rrset("test.", Type::NS, 2), rrset("test.", Type::DS, 2)]
        );
        assert_eq!(
            oracle.query(&name("."), Type::NS).answers,
            vec![rrset(".", Type::NS, 2)]
        );
    }

    #[test]
    fn aggressive_answers_with_nsec() {
        let mut oracle = oracle(Policy::Rfc8198);
        let root_nsec = Answer {
            owner: Name::root(),
            data: AnswerData::Nsec {
                ttl: Ttl::from(10),
                next: name("test."),
                types: [Type::NS, Type::SOA, Type::RRSIG, Type::NSEC, Type::DNSKEY]
                    .into_iter()
                    .collect(),
            },
        };

        let response = oracle.query(&name("nonexistent."), Type::A);
        assert_eq!(response.rcode, Rcode::NxDomain);
        assert_eq!(response.answers, vec![root_nsec.clone()]);

        let response = oracle.query(&name("."), Type::from(666));
        assert_eq!(response.rcode, Rcode::NoError);
        assert_eq!(response.answers, vec![root_nsec]);

        let response = oracle.query(&name("zzz."), Type::A);
        assert_eq!(response.answers[0].owner, name("test."));

        // Glue has no NSEC record.
        assert_eq!(
            oracle.query(&name("ns.test."), Type::AAAA).answers,
            vec![rrset("ns.test.", Type::AAAA, 10)]
        );
    }

    #[test]
    fn aggressive_requires_signed_zone() {
        let zone = Zone::load(Cursor::new(&b". 1 IN SOA a. b. 1 2 3 4 5\n"[..])).unwrap();
        assert!(matches!(
            Oracle::new(zone, Policy::Rfc8198),
            Err(zone::Error::MissingApexNsec)
        ));
    }
}
