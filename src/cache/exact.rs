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

//! Implementation of the [`ExactCache`].

use std::collections::HashMap;

use log::trace;

use super::{Cache, CacheStats, ContractViolation, Lookup, MissReason};
use crate::clock::Timestamp;
use crate::name::Name;
use crate::oracle::{Answer, AnswerData};
use crate::rr::Type;

/// A cache that answers only the exact questions it has seen answered,
/// as described in [RFC 2308].
///
/// NXDOMAIN is cached for the whole name, so any type at a nonexistent
/// name hits. Everything else, NODATA included, is cached per type.
///
/// [RFC 2308]: https://datatracker.ietf.org/doc/html/rfc2308
#[derive(Debug, Default)]
pub struct ExactCache {
    nodes: HashMap<Name, NodeState>,
    stats: CacheStats,
}

/// What is known about a name.
#[derive(Debug)]
enum NodeState {
    /// The name does not exist, until the given time.
    WholeNegative(Timestamp),

    /// Per-type knowledge with expiry times.
    PerType(HashMap<Type, Timestamp>),
}

impl ExactCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&mut self, name: &Name, rr_type: Type, now: Timestamp) -> Lookup {
        match self.nodes.get_mut(name) {
            None => Lookup::Miss(MissReason::NotCached),
            Some(NodeState::WholeNegative(expires)) => {
                if now < *expires {
                    Lookup::Hit
                } else {
                    self.nodes.remove(name);
                    Lookup::Miss(MissReason::Expired)
                }
            }
            Some(NodeState::PerType(entries)) => match entries.get(&rr_type) {
                None => Lookup::Miss(MissReason::NotCached),
                Some(expires) if now < *expires => Lookup::Hit,
                Some(_) => {
                    entries.remove(&rr_type);
                    Lookup::Miss(MissReason::Expired)
                }
            },
        }
    }

    fn store_negative(
        &mut self,
        name: &Name,
        expires: Timestamp,
        now: Timestamp,
    ) -> Result<(), ContractViolation> {
        if let Some(NodeState::PerType(entries)) = self.nodes.get(name) {
            if entries.values().any(|entry| now < *entry) {
                return Err(ContractViolation::NegativeOverData { name: name.clone() });
            }
        }
        self.nodes
            .insert(name.clone(), NodeState::WholeNegative(expires));
        Ok(())
    }

    fn store_type(
        &mut self,
        name: &Name,
        rr_type: Type,
        expires: Timestamp,
        now: Timestamp,
    ) -> Result<(), ContractViolation> {
        let node = self
            .nodes
            .entry(name.clone())
            .or_insert_with(|| NodeState::PerType(HashMap::new()));
        if let NodeState::WholeNegative(negative_expires) = *node {
            if now < negative_expires {
                return Err(ContractViolation::DataOverNegative { name: name.clone() });
            }
            // Stale negative knowledge is superseded.
            *node = NodeState::PerType(HashMap::new());
        }
        if let NodeState::PerType(entries) = node {
            entries.insert(rr_type, expires);
        }
        Ok(())
    }
}

impl Cache for ExactCache {
    fn lookup(&mut self, name: &Name, rr_type: Type, now: Timestamp) -> Lookup {
        let lookup = self.find(name, rr_type, now);
        trace!("Exact cache lookup {} {} at {}: {:?}.", name, rr_type, now, lookup);
        self.stats.record(lookup);
        lookup
    }

    fn store(&mut self, answer: &Answer, now: Timestamp) -> Result<(), ContractViolation> {
        let expires = now.after(answer.data.ttl().secs());
        match answer.data {
            AnswerData::NxDomain { .. } => self.store_negative(&answer.owner, expires, now),
            AnswerData::Rrset { rr_type, .. } => {
                self.store_type(&answer.owner, rr_type, expires, now)
            }
            AnswerData::Nsec { .. } => self.store_type(&answer.owner, Type::NSEC, expires, now),
        }
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
