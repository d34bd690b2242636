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

//! The authoritative zone snapshot.
//!
//! A [`Zone`] is loaded once from a master file rooted at the DNS root
//! and is read-only thereafter. It keeps only what the simulation
//! needs: which types exist at each name (and their TTLs), the root SOA
//! parameters, and the NSEC data of every signed name. RDATA of other
//! types is never interpreted.

use std::cmp;
use std::collections::HashMap;
use std::io::BufRead;

use log::debug;

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Ttl, Type, TypeBitmap};
use crate::util::decode_hex;
use crate::zone_file::{self, ParsedRr, Parser};

mod error;
pub use error::Error;

/// A DNS zone snapshot loaded into memory.
#[derive(Debug)]
pub struct Zone {
    nodes: HashMap<Name, Node>,
    soa_ttl: Ttl,
    soa_minimum: Ttl,
    nsec_owners: Vec<Name>,
}

/// The data kept for a single name.
#[derive(Debug, Default)]
struct Node {
    rrsets: HashMap<Type, Ttl>,
    nsec: Option<Nsec>,
}

/// The interpreted RDATA of an NSEC record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Nsec {
    /// The next owner name in the zone's canonical order.
    pub next: Name,

    /// The types present at the NSEC record's owner.
    pub types: TypeBitmap,
}

impl Zone {
    /// Loads a zone from a master file.
    pub fn load<S: BufRead>(stream: S) -> Result<Self, Error> {
        Self::from_records(Parser::with_origin(stream, Name::root()))
    }

    /// Builds a zone from parsed records.
    pub fn from_records<I>(records: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = zone_file::Result<ParsedRr>>,
    {
        let mut nodes: HashMap<Name, Node> = HashMap::new();
        let mut soa = None;

        for record in records {
            let record = record?;
            if record.class != Class::IN {
                return Err(Error::ClassMismatch {
                    line: record.line,
                    class: record.class,
                });
            }
            let owner = record.owner.to_canonical();

            match record.rr_type {
                Type::SOA => {
                    if !owner.is_root() {
                        return Err(Error::SoaNotAtApex { line: record.line });
                    } else if soa.is_some() {
                        return Err(Error::DuplicateSoa { line: record.line });
                    }
                    soa = Some((record.ttl, parse_soa_minimum(&record)?));
                }
                Type::NSEC => {
                    let nsec = parse_nsec(&record)?;
                    let node = nodes.entry(owner.clone()).or_default();
                    if node.nsec.is_some() {
                        return Err(Error::DuplicateNsec { line: record.line });
                    }
                    node.nsec = Some(nsec);
                }
                _ => (),
            }

            // RFC 2181 § 5.2 forbids TTLs that differ within an RRset.
            // We tolerate it and use the smallest.
            nodes
                .entry(owner)
                .or_default()
                .rrsets
                .entry(record.rr_type)
                .and_modify(|ttl| *ttl = cmp::min(*ttl, record.ttl))
                .or_insert(record.ttl);
        }

        let (soa_ttl, soa_minimum) = soa.ok_or(Error::MissingSoa)?;
        let mut nsec_owners: Vec<Name> = nodes
            .iter()
            .filter(|(_, node)| node.nsec.is_some())
            .map(|(name, _)| name.clone())
            .collect();
        nsec_owners.sort_unstable();

        let zone = Self {
            nodes,
            soa_ttl,
            soa_minimum,
            nsec_owners,
        };
        debug!(
            "Loaded zone with {} names and {} NSEC records; SOA TTL {}, MINIMUM {}, negative TTL {}.",
            zone.len(),
            zone.nsec_owners().len(),
            zone.soa_ttl(),
            zone.soa_minimum(),
            zone.negative_ttl()
        );
        Ok(zone)
    }

    /// Returns whether any record exists at `name`.
    pub fn contains_name(&self, name: &Name) -> bool {
        self.nodes.contains_key(name)
    }

    /// Returns the TTL of the RRset of type `rr_type` at `name`, if it
    /// exists.
    pub fn ttl(&self, name: &Name, rr_type: Type) -> Option<Ttl> {
        self.nodes
            .get(name)
            .and_then(|node| node.rrsets.get(&rr_type))
            .copied()
    }

    /// Returns the NSEC data of `name`, if it has an NSEC record.
    pub fn nsec(&self, name: &Name) -> Option<&Nsec> {
        self.nodes.get(name).and_then(|node| node.nsec.as_ref())
    }

    /// Returns the owners of all NSEC records, sorted in canonical
    /// order.
    pub fn nsec_owners(&self) -> &[Name] {
        &self.nsec_owners
    }

    /// Returns the greatest NSEC owner that sorts before or equal to
    /// `name`, that is, the owner of the NSEC record that covers or
    /// matches `name`.
    pub fn nsec_predecessor(&self, name: &Name) -> Option<&Name> {
        let index = self.nsec_owners.partition_point(|owner| owner <= name);
        index.checked_sub(1).map(|i| &self.nsec_owners[i])
    }

    /// Returns the TTL of the root SOA RRset.
    pub fn soa_ttl(&self) -> Ttl {
        self.soa_ttl
    }

    /// Returns the MINIMUM field of the root SOA record.
    pub fn soa_minimum(&self) -> Ttl {
        self.soa_minimum
    }

    /// Returns the TTL of negative answers, per [RFC 2308 § 5]: the
    /// smaller of the SOA record's TTL and its MINIMUM field.
    ///
    /// [RFC 2308 § 5]: https://datatracker.ietf.org/doc/html/rfc2308#section-5
    pub fn negative_ttl(&self) -> Ttl {
        cmp::min(self.soa_ttl, self.soa_minimum)
    }

    /// Returns the number of names in the zone.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the zone has no names. A loaded zone always has
    /// at least the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// RDATA INTERPRETATION                                               //
////////////////////////////////////////////////////////////////////////

/// Decodes RDATA in the [RFC 3597 § 5] generic format, if the fields
/// use it.
///
/// [RFC 3597 § 5]: https://datatracker.ietf.org/doc/html/rfc3597#section-5
fn generic_rdata(fields: &[String]) -> Option<Result<Vec<u8>, &'static str>> {
    if fields.first().map(String::as_str) != Some("\\#") {
        return None;
    }
    let len = match fields.get(1).and_then(|text| text.parse::<usize>().ok()) {
        Some(len) => len,
        None => return Some(Err("invalid RDATA length")),
    };
    Some(match decode_hex(&fields[2..].concat()) {
        Some(octets) if octets.len() == len => Ok(octets),
        Some(_) => Err("RDATA length does not match"),
        None => Err("invalid hexadecimal RDATA"),
    })
}

fn parse_soa_minimum(record: &ParsedRr) -> Result<Ttl, Error> {
    let invalid = |reason| Error::InvalidSoa {
        line: record.line,
        reason,
    };

    if let Some(octets) = generic_rdata(&record.rdata) {
        let octets = octets.map_err(invalid)?;
        let (_, mname_len) =
            Name::try_from_uncompressed(&octets).map_err(|_| invalid("invalid MNAME"))?;
        let (_, rname_len) = Name::try_from_uncompressed(&octets[mname_len..])
            .map_err(|_| invalid("invalid RNAME"))?;
        let fixed = &octets[mname_len + rname_len..];
        if fixed.len() != 20 {
            return Err(invalid("wrong RDATA length"));
        }
        let minimum = u32::from_be_bytes([fixed[16], fixed[17], fixed[18], fixed[19]]);
        Ok(Ttl::from(minimum))
    } else if record.rdata.len() == 7 {
        record.rdata[6]
            .parse()
            .map_err(|_| invalid("invalid MINIMUM"))
    } else {
        Err(invalid("expected 7 fields"))
    }
}

fn parse_nsec(record: &ParsedRr) -> Result<Nsec, Error> {
    let invalid = |reason| Error::InvalidNsec {
        line: record.line,
        reason,
    };

    let (next, types) = if let Some(octets) = generic_rdata(&record.rdata) {
        let octets = octets.map_err(invalid)?;
        let (next, next_len) = Name::try_from_uncompressed(&octets)
            .map_err(|_| invalid("invalid next domain name"))?;
        let types = TypeBitmap::parse(&octets[next_len..])
            .map_err(|_| invalid("invalid type bitmap"))?;
        (next, types)
    } else {
        let (next, types) = record
            .rdata
            .split_first()
            .ok_or_else(|| invalid("missing next domain name"))?;
        let next = zone_file::parse_name_field(next, record.origin.as_deref())
            .map_err(|_| invalid("invalid next domain name"))?;
        let types = types
            .iter()
            .map(|text| text.parse::<Type>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        (next, TypeBitmap::from_types(types))
    };

    Ok(Nsec {
        next: next.to_canonical(),
        types,
    })
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const ZONE: &[u8] = b"\
. 10 IN SOA a.root-servers.net. nstld.verisign-grs.com. 1 2 3 4 60
. 2 IN NS a.root-servers.net.
. 10 IN NSEC test. NS SOA RRSIG NSEC DNSKEY
Test. 2 IN NS ns.test.
test. 3 IN NS ns2.test.
test. 2 IN DS 1 8 2 0000
test. 10 IN NSEC . NS DS RRSIG NSEC
ns.test. 2 IN A 192.0.2.1
";

    fn load(text: &[u8]) -> Result<Zone, Error> {
        Zone::load(Cursor::new(text))
    }

    #[test]
    fn load_derives_negative_ttl() {
        let zone = load(ZONE).unwrap();
        assert_eq!(zone.soa_ttl(), Ttl::from(10));
        assert_eq!(zone.soa_minimum(), Ttl::from(60));
        assert_eq!(zone.negative_ttl(), Ttl::from(10));
        assert_eq!(zone.len(), 3);
    }

    #[test]
    fn load_keeps_smallest_rrset_ttl() {
        let zone = load(ZONE).unwrap();
        let test: Name = "TEST.".parse().unwrap();
        assert_eq!(zone.ttl(&test, Type::NS), Some(Ttl::from(2)));
        assert_eq!(zone.ttl(&test, Type::DS), Some(Ttl::from(2)));
        assert_eq!(zone.ttl(&test, Type::A), None);
        assert!(!zone.contains_name(&"nonexistent.".parse().unwrap()));
    }

    #[test]
    fn load_sorts_nsec_owners() {
        let zone = load(ZONE).unwrap();
        let root = Name::root();
        let test: Name = "test.".parse().unwrap();
        assert_eq!(zone.nsec_owners(), &[root.clone(), test.clone()]);
        assert_eq!(zone.nsec(&root).unwrap().next, test);
        assert!(zone.nsec(&root).unwrap().types.contains(Type::DNSKEY));
        assert!(!zone.nsec(&test).unwrap().types.contains(Type::SOA));
        assert!(zone.nsec(&"ns.test.".parse().unwrap()).is_none());
    }

    #[test]
    fn nsec_predecessor_works() {
        let zone = load(ZONE).unwrap();
        let root = Name::root();
        let test: Name = "test.".parse().unwrap();
        for (name, expected) in [
            ("nonexistent.", &root),
            (".", &root),
            ("test.", &test),
            ("a.test.", &test),
            ("zzz.", &test),
        ] {
            let name: Name = name.parse().unwrap();
            assert_eq!(zone.nsec_predecessor(&name), Some(expected));
        }
    }

    #[test]
    fn load_accepts_generic_rdata() {
        // NSEC: next name "a." and a bitmap with NS and SOA.
        let zone = load(
            b". 5 IN SOA \\# 22 0000 00000001 00000002 00000003 00000004 00000007\n\
              . 5 IN NSEC \\# 6 016100 000122\n",
        )
        .unwrap();
        assert_eq!(zone.soa_minimum(), Ttl::from(7));
        let nsec = zone.nsec(&Name::root()).unwrap();
        assert_eq!(nsec.next, "a.".parse::<Name>().unwrap());
        assert!(nsec.types.contains(Type::NS));
        assert!(nsec.types.contains(Type::SOA));
    }

    #[test]
    fn load_rejects_bad_zones() {
        assert!(matches!(
            load(b". 1 IN NS a.\n"),
            Err(Error::MissingSoa)
        ));
        assert!(matches!(
            load(b". 1 IN SOA a. b. 1 2 3 4 5\n. 1 IN SOA a. b. 1 2 3 4 5\n"),
            Err(Error::DuplicateSoa { line: 2 })
        ));
        assert!(matches!(
            load(b"a. 1 IN SOA a. b. 1 2 3 4 5\n"),
            Err(Error::SoaNotAtApex { line: 1 })
        ));
        assert!(matches!(
            load(b". 1 IN SOA a. b. 1 2 3 4\n"),
            Err(Error::InvalidSoa { line: 1, .. })
        ));
        assert!(matches!(
            load(b". 1 CH SOA a. b. 1 2 3 4 5\n"),
            Err(Error::ClassMismatch { line: 1, .. })
        ));
        assert!(matches!(
            load(b". 1 IN SOA a. b. 1 2 3 4 5\n. 1 IN NSEC a. BOGUS\n"),
            Err(Error::InvalidNsec { line: 2, .. })
        ));
        assert!(matches!(
            load(b". 1 IN SOA a. b. 1 2 3 4 5\n. 1 IN NSEC a. NS\n. 1 IN NSEC b. NS\n"),
            Err(Error::DuplicateNsec { line: 3 })
        ));
        assert!(matches!(load(b"a. 1 IN NS (\n"), Err(Error::Parse(_))));
    }
}
