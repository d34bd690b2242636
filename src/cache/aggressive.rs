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

//! Implementation of the [`AggressiveCache`].

use std::collections::{BTreeSet, HashMap};

use log::trace;

use super::{Cache, CacheStats, ContractViolation, Lookup, MissReason};
use crate::clock::Timestamp;
use crate::name::Name;
use crate::oracle::{Answer, AnswerData};
use crate::rr::Type;

/// A cache that uses NSEC records to answer questions it has never
/// seen answered, as described in [RFC 8198].
///
/// Non-existence is never cached by name. Instead, the cache keeps the
/// names it has learned about in canonical order, and a name it knows
/// nothing about is proven not to exist when the closest preceding name
/// has an unexpired NSEC record whose next name sorts after it. A type
/// not cached at a known name is proven not to exist when the name's
/// own NSEC record does not list it.
///
/// [RFC 8198]: https://datatracker.ietf.org/doc/html/rfc8198
#[derive(Debug, Default)]
pub struct AggressiveCache {
    nodes: HashMap<Name, Node>,
    index: Vec<Name>,
    stats: CacheStats,
}

#[derive(Debug, Default)]
struct Node {
    entries: HashMap<Type, Timestamp>,
    nsec: Option<NsecEntry>,
}

#[derive(Debug)]
struct NsecEntry {
    expires: Timestamp,
    next: Name,
    types: BTreeSet<Type>,
}

impl AggressiveCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &Name, rr_type: Type, now: Timestamp) -> Lookup {
        let node = match self.nodes.get(name) {
            Some(node) => node,
            None => return self.prove_nonexistence(name, now),
        };

        match node.entries.get(&rr_type) {
            Some(expires) if now < *expires => return Lookup::Hit,
            Some(_) => return Lookup::Miss(MissReason::Expired),
            None => (),
        }

        match node.nsec {
            None => Lookup::Miss(MissReason::NoNsec),
            Some(ref nsec) if now >= nsec.expires => Lookup::Miss(MissReason::Expired),
            // The type exists but has not been fetched yet, as for the
            // root's NS after the root NSEC came in as an NXDOMAIN
            // proof. This is an ordinary miss, not a broken cache.
            Some(ref nsec) if nsec.types.contains(&rr_type) => {
                Lookup::Miss(MissReason::TypePresent)
            }
            Some(_) => Lookup::Hit,
        }
    }

    /// Tries to prove that `name`, which is not in the cache, does not
    /// exist.
    fn prove_nonexistence(&self, name: &Name, now: Timestamp) -> Lookup {
        let after = self.index.partition_point(|cached| cached <= name);
        let predecessor = match after.checked_sub(1) {
            Some(i) => &self.index[i],
            None => return Lookup::Miss(MissReason::NoPredecessor),
        };

        match self.nodes.get(predecessor).and_then(|node| node.nsec.as_ref()) {
            None => Lookup::Miss(MissReason::NoNsec),
            Some(nsec) if now >= nsec.expires => Lookup::Miss(MissReason::Expired),
            Some(nsec) if nsec.next > *name => Lookup::Hit,
            // This includes the last NSEC record of the zone, whose
            // next name is the apex.
            Some(_) => Lookup::Miss(MissReason::NotCovering),
        }
    }

    /// Returns the node for `name`, adding it to the index if it is
    /// new.
    fn node_mut(&mut self, name: &Name) -> &mut Node {
        if !self.nodes.contains_key(name) {
            let at = self.index.partition_point(|cached| cached < name);
            self.index.insert(at, name.clone());
        }
        self.nodes.entry(name.clone()).or_default()
    }
}

impl Cache for AggressiveCache {
    fn lookup(&mut self, name: &Name, rr_type: Type, now: Timestamp) -> Lookup {
        let lookup = self.find(name, rr_type, now);
        trace!("Aggressive cache lookup {} {} at {}: {:?}.", name, rr_type, now, lookup);
        self.stats.record(lookup);
        lookup
    }

    fn store(&mut self, answer: &Answer, now: Timestamp) -> Result<(), ContractViolation> {
        let expires = now.after(answer.data.ttl().secs());
        match answer.data {
            AnswerData::NxDomain { .. } => {
                return Err(ContractViolation::WholeNameNegative {
                    name: answer.owner.clone(),
                })
            }
            AnswerData::Rrset { rr_type, .. } => {
                self.node_mut(&answer.owner).entries.insert(rr_type, expires);
            }
            AnswerData::Nsec {
                ref next,
                ref types,
                ..
            } => {
                let node = self.node_mut(&answer.owner);
                node.entries.insert(Type::NSEC, expires);
                node.nsec = Some(NsecEntry {
                    expires,
                    next: next.clone(),
                    types: types.clone(),
                });
            }
        }
        Ok(())
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
