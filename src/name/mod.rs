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

//! Implementation of data structures related to domain names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ops::Index;
use std::str::FromStr;

mod builder;
mod error;
mod label;
mod wire;
pub use builder::NameBuilder;
pub use error::Error;
pub use label::Label;

/// The maximum number of labels in a domain name.
const MAX_N_LABELS: usize = 128;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// An absolute domain name.
///
/// A `Name` owns the uncompressed on-the-wire representation of the
/// name ([RFC 1035 § 3.1]) along with the offset of each label in that
/// representation, so that labels can be visited in either direction
/// without rescanning. The last label is always the null label.
///
/// `Name`s can be constructed
///
/// * through the [`FromStr`] implementation;
/// * through a [`NameBuilder`]; or
/// * from uncompressed on-the-wire names through
///   [`Name::try_from_uncompressed`].
///
/// Following [RFC 1034 § 3.1] and [RFC 4343], equality and hashing are
/// ASCII-case-insensitive, though case is preserved. The [`Ord`]
/// implementation is DNSSEC's canonical ordering, which is what the
/// NSEC chain of a zone (and thus the whole aggressive-caching
/// machinery) is built upon.
///
/// [RFC 1034 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1034#section-3.1
/// [RFC 1035 § 3.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-3.1
/// [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343
#[derive(Clone)]
pub struct Name {
    wire_repr: Box<[u8]>,
    label_offsets: Box<[u8]>,
}

/// Private construction helper.
impl Name {
    /// Wraps up an on-the-wire representation and its label offsets.
    /// Callers within this module guarantee that the two describe a
    /// valid domain name.
    fn from_parts(wire_repr: &[u8], label_offsets: &[u8]) -> Self {
        debug_assert!(!label_offsets.is_empty());
        debug_assert_eq!(wire_repr.last(), Some(&0));
        Self {
            wire_repr: wire_repr.into(),
            label_offsets: label_offsets.into(),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// NAME PUBLIC API                                                    //
////////////////////////////////////////////////////////////////////////

#[allow(clippy::len_without_is_empty)] // A domain name is never empty!
impl Name {
    /// Returns whether the `Name` is the DNS root `.`.
    pub fn is_root(&self) -> bool {
        self.len() == 1
    }

    /// Returns an iterator over labels in this `Name`, ending with the
    /// null label.
    pub fn labels(&self) -> Labels {
        Labels::new(self)
    }

    /// Returns the number of labels in this `Name`, including the
    /// terminating null label. The root therefore has length 1 and a
    /// top-level domain has length 2.
    pub fn len(&self) -> usize {
        self.label_offsets.len()
    }

    /// Makes all ASCII letters in this `Name` lowercase, putting it in
    /// the canonical form of [RFC 4034 § 6.2].
    ///
    /// [RFC 4034 § 6.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.2
    pub fn make_ascii_lowercase(&mut self) {
        // Length octets are at most 63, so they are never ASCII
        // uppercase letters and can be lowercased along with the rest.
        self.wire_repr.make_ascii_lowercase();
    }

    /// Returns a copy of this `Name` in canonical (lowercase) form.
    pub fn to_canonical(&self) -> Name {
        let mut name = self.clone();
        name.make_ascii_lowercase();
        name
    }

    /// Returns the name of the DNS root, `.`.
    pub fn root() -> Name {
        Self::from_parts(&[0], &[0])
    }

    /// Tries to parse an uncompressed name present at the start of the
    /// provided buffer. The name need not occupy the entire buffer;
    /// extra data is ignored. If the name is valid, it is returned
    /// along with its length in octets.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        wire::parse_uncompressed_name(octets)
    }

    /// Returns the (uncompressed) on-the-wire representation of the
    /// `Name`.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire_repr
    }
}

impl Index<usize> for Name {
    type Output = Label;

    fn index(&self, index: usize) -> &Self::Output {
        let offset = self.label_offsets[index] as usize;
        let len = self.wire_repr[offset] as usize;
        let start = offset + 1;
        Label::from_unchecked(&self.wire_repr[start..start + len])
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            for label in self.labels().filter(|label| !label.is_null()) {
                write!(f, "{}.", label)?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.wire_repr.eq_ignore_ascii_case(&other.wire_repr)
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The [`Ord`] implementation for `Name` employs DNSSEC's canonical
/// ordering of domain names. Per [RFC 4034 § 6.1], `Name`s are ordered
/// as strings of labels read from right to left, with each label
/// ordered as described for [`Label`]. A name sorts before all of its
/// subdomains.
///
/// [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels()
            .rev()
            .zip(other.labels().rev())
            .find_map(|(a, b)| Some(a.cmp(b)).filter(|ordering| ordering.is_ne()))
            .unwrap_or_else(|| self.len().cmp(&other.len()))
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            label.hash(state);
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ITERATION OVER A NAME'S LABELS                                     //
////////////////////////////////////////////////////////////////////////

/// An iterator over the [`Label`]s in a [`Name`].
///
/// To use this iterator, construct one from a [`Name`] using
/// [`Name::labels`].
#[derive(Clone, Debug)]
pub struct Labels<'a> {
    name: &'a Name,
    front: usize,
    back: usize,
}

impl Labels<'_> {
    fn new(name: &Name) -> Labels {
        Labels {
            name,
            front: 0,
            back: name.len(),
        }
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a Label;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let this_one = self.front;
            self.front += 1;
            Some(&self.name[this_one])
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for Labels<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back > self.front {
            self.back -= 1;
            Some(&self.name[self.back])
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Labels<'_> {}

impl FusedIterator for Labels<'_> {}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Allows for conversion of a Rust [`str`] into a [`Name`]. The passed
/// string must be strictly ASCII and fully qualified. Escape sequences
/// as defined by [RFC 4343 § 2.1] are supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root());
        }
        let mut builder = NameBuilder::new();
        builder.push_text(s)?;
        builder.finish()
    }
}

/// Parses an escape sequence. We expect `remaining_octets` to start
/// with the octet immediately *after* the backslash that introduces the
/// escape sequence. Returns the escaped value and the number of octets
/// consumed.
fn parse_escape(remaining_octets: &[u8]) -> Result<(u8, usize), Error> {
    match remaining_octets {
        [] => Err(Error::InvalidEscape),
        [first, ..] if first.is_ascii_digit() => {
            let digits = remaining_octets
                .get(0..3)
                .filter(|digits| digits.iter().all(u8::is_ascii_digit))
                .ok_or(Error::InvalidEscape)?;
            let value = digits
                .iter()
                .fold(0usize, |acc, digit| 10 * acc + (digit - b'0') as usize);
            u8::try_from(value)
                .map(|value| (value, 3))
                .or(Err(Error::InvalidEscape))
        }
        [first, ..] => Ok((*first, 1)),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_expected_characteristics() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.len(), 1);
        assert_eq!(root.wire_repr(), &[0]);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn labels_iterator_works() {
        let name: Name = "a.b.example.test.".parse().unwrap();
        let mut labels = name.labels();
        assert_eq!(labels.next(), Some(<&Label>::from(b"a")));
        assert_eq!(labels.next(), Some(<&Label>::from(b"b")));
        assert_eq!(labels.next(), Some(<&Label>::from(b"example")));
        assert_eq!(labels.next_back(), Some(Label::null()));
        assert_eq!(labels.next(), Some(<&Label>::from(b"test")));
        assert_eq!(labels.next(), None);
    }

    #[test]
    fn ord_works() {
        // This ordered list is from RFC 4034 § 6.1, which defines the
        // canonical ordering of domain names.
        let names: Vec<Name> = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "Z.a.example.",
            "zABC.a.EXAMPLE.",
            "z.example.",
            "\\001.z.example.",
            "*.z.example.",
            "\\200.z.example.",
        ]
        .into_iter()
        .map(|n| n.parse().unwrap())
        .collect();

        for (i, ni) in names.iter().enumerate() {
            for (j, nj) in names.iter().enumerate() {
                assert_eq!(i.cmp(&j), ni.cmp(nj), "{} vs. {}", ni, nj);
            }
        }
    }

    #[test]
    fn ord_sorts_root_first_and_compares_right_to_left() {
        let root = Name::root();
        let aaa: Name = "aaa.".parse().unwrap();
        let test: Name = "test.".parse().unwrap();
        let zzz_aaa: Name = "zzz.aaa.".parse().unwrap();
        assert!(root < aaa);
        assert!(aaa < zzz_aaa);
        assert!(zzz_aaa < test);
        assert!("nonexistent.".parse::<Name>().unwrap() < test);
        assert!("zzz.".parse::<Name>().unwrap() > test);
    }

    #[test]
    fn eq_and_hash_are_case_insensitive() {
        use std::collections::hash_map::DefaultHasher;

        let upper: Name = "EXAMPLE.Test.".parse().unwrap();
        let lower: Name = "example.test.".parse().unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.cmp(&lower), Ordering::Equal);

        let mut hasher = DefaultHasher::new();
        upper.hash(&mut hasher);
        let upper_hash = hasher.finish();
        let mut hasher = DefaultHasher::new();
        lower.hash(&mut hasher);
        assert_eq!(upper_hash, hasher.finish());
    }

    #[test]
    fn fromstr_works() {
        let name: Name = "example.test.".parse().unwrap();
        assert_eq!(name.wire_repr(), b"\x07example\x04test\x00");
        assert_eq!(name.len(), 3);
    }

    #[test]
    fn fromstr_rejects_bad_names() {
        assert_eq!("".parse::<Name>(), Err(Error::StrEmpty));
        assert_eq!("✈.aero.".parse::<Name>(), Err(Error::StrNotAscii));
        assert_eq!("non.fqdn".parse::<Name>(), Err(Error::NonNullTerminal));
        assert_eq!("a.b..c.".parse::<Name>(), Err(Error::NullNonTerminal));
        assert_eq!(
            "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx."
                .parse::<Name>(),
            Err(Error::LabelTooLong)
        );
    }

    #[test]
    fn fromstr_escaping_works() {
        let escaped: Name = "\\000.\\\\\\..".parse().unwrap();
        assert_eq!(escaped.wire_repr(), b"\x01\x00\x02\\.\x00");
        assert_eq!(escaped.to_string(), "\\000.\\\\\\..");
    }

    #[test]
    fn fromstr_rejects_invalid_escapes() {
        assert_eq!("\\00".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\00x.".parse::<Name>(), Err(Error::InvalidEscape));
        assert_eq!("\\256.".parse::<Name>(), Err(Error::InvalidEscape));
    }

    #[test]
    fn make_ascii_lowercase_works() {
        let mut name: Name = "UPPERCASE.Domain.Test.".parse().unwrap();
        name.make_ascii_lowercase();
        assert_eq!(name.wire_repr(), b"\x09uppercase\x06domain\x04test\x00");
    }
}
