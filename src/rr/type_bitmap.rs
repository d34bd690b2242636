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

//! The NSEC type bitmap of [RFC 4034 § 4.1.2].
//!
//! On the wire, the set of RR types present at an NSEC owner is a
//! sequence of windows. Each window covers 256 types and is written as
//! a window number, a length of one to 32 octets, and the bitmap
//! octets themselves, with the most significant bit of the first octet
//! standing for the first type of the window. Windows appear in
//! increasing order and windows without any set bits are left out.
//!
//! [`decode`] is the pure decoding function used when an NSEC answer is
//! synthesized; [`TypeBitmap`] holds a validated wire-format bitmap as
//! stored in a zone snapshot.
//!
//! [RFC 4034 § 4.1.2]: https://datatracker.ietf.org/doc/html/rfc4034#section-4.1.2

use std::collections::BTreeSet;
use std::fmt;
use std::iter::FusedIterator;

use super::Type;

/// The maximum number of bitmap octets in one window.
const MAX_WINDOW_LEN: usize = 32;

/// Decodes bitmap windows into the set of types whose bits are set.
///
/// For a set bit in window `w`, octet `i`, and bit `j` (counting from
/// the most significant bit), the type number is `w * 256 + i * 8 + j`.
pub fn decode<'a, I>(windows: I) -> BTreeSet<Type>
where
    I: IntoIterator<Item = (u8, &'a [u8])>,
{
    let mut types = BTreeSet::new();
    for (window, octets) in windows {
        for (i, octet) in octets.iter().enumerate() {
            for j in 0..8 {
                if octet & (0x80 >> j) != 0 {
                    let value = (window as usize) * 256 + i * 8 + j;
                    // Octets past the 32nd would overflow into the next
                    // window; a validated bitmap never has them.
                    if let Ok(value) = u16::try_from(value) {
                        types.insert(Type::from(value));
                    }
                }
            }
        }
    }
    types
}

////////////////////////////////////////////////////////////////////////
// TYPE BITMAP                                                        //
////////////////////////////////////////////////////////////////////////

/// A validated NSEC type bitmap in wire format.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct TypeBitmap {
    octets: Box<[u8]>,
}

impl TypeBitmap {
    /// Validates `octets` as a wire-format type bitmap.
    pub fn parse(octets: &[u8]) -> Result<Self, Error> {
        let mut remaining = octets;
        let mut previous_window: Option<u8> = None;
        while !remaining.is_empty() {
            let (window, len) = match remaining {
                [window, len, ..] => (*window, *len as usize),
                _ => return Err(Error::Truncated),
            };
            if previous_window.map_or(false, |previous| previous >= window) {
                return Err(Error::WindowsOutOfOrder);
            } else if len == 0 || len > MAX_WINDOW_LEN {
                return Err(Error::InvalidWindowLength);
            } else if remaining.len() < 2 + len {
                return Err(Error::Truncated);
            }
            previous_window = Some(window);
            remaining = &remaining[2 + len..];
        }
        Ok(Self {
            octets: octets.into(),
        })
    }

    /// Builds the bitmap that has exactly the bits of `types` set.
    pub fn from_types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = Type>,
    {
        let mut windows: Vec<(u8, [u8; MAX_WINDOW_LEN])> = Vec::new();
        for rr_type in types {
            let value = u16::from(rr_type);
            let window = (value >> 8) as u8;
            let octet = ((value & 0xff) >> 3) as usize;
            let bit = 0x80 >> (value & 0x07);
            let index = match windows.binary_search_by_key(&window, |(w, _)| *w) {
                Ok(index) => index,
                Err(index) => {
                    windows.insert(index, (window, [0; MAX_WINDOW_LEN]));
                    index
                }
            };
            windows[index].1[octet] |= bit;
        }

        let mut octets = Vec::new();
        for (window, bitmap) in windows {
            // Each window has at least one bit set, so len > 0.
            let len = bitmap.iter().rposition(|octet| *octet != 0).map_or(0, |i| i + 1);
            octets.push(window);
            octets.push(len as u8);
            octets.extend_from_slice(&bitmap[..len]);
        }
        Self {
            octets: octets.into(),
        }
    }

    /// Returns whether the bit for `rr_type` is set.
    pub fn contains(&self, rr_type: Type) -> bool {
        let value = u16::from(rr_type);
        let window = (value >> 8) as u8;
        let octet = ((value & 0xff) >> 3) as usize;
        self.windows()
            .find(|(w, _)| *w == window)
            .and_then(|(_, octets)| octets.get(octet))
            .map_or(false, |o| o & (0x80 >> (value & 0x07)) != 0)
    }

    /// Returns the wire-format octets.
    pub fn octets(&self) -> &[u8] {
        &self.octets
    }

    /// Decodes the bitmap into a set of types. See [`decode`].
    pub fn types(&self) -> BTreeSet<Type> {
        decode(self.windows())
    }

    /// Returns an iterator over the `(window, octets)` pairs of the
    /// bitmap.
    pub fn windows(&self) -> Windows {
        Windows {
            remaining: &self.octets,
        }
    }
}

impl fmt::Debug for TypeBitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.types()).finish()
    }
}

/// An iterator over the windows of a [`TypeBitmap`].
#[derive(Clone, Debug)]
pub struct Windows<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for Windows<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        // The bitmap was validated on construction.
        match self.remaining {
            [window, len, rest @ ..] => {
                let len = *len as usize;
                let item = (*window, &rest[..len]);
                self.remaining = &rest[len..];
                Some(item)
            }
            _ => None,
        }
    }
}

impl FusedIterator for Windows<'_> {}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Problems found while validating a wire-format type bitmap.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    InvalidWindowLength,
    Truncated,
    WindowsOutOfOrder,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidWindowLength => f.write_str("bitmap window length is not 1 to 32"),
            Self::Truncated => f.write_str("type bitmap is truncated"),
            Self::WindowsOutOfOrder => f.write_str("bitmap windows are not in increasing order"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_follows_window_octet_bit_numbering() {
        let types = decode([(0, &[0x40, 0x01][..]), (1, &[0x80][..])]);
        let expected: BTreeSet<Type> = [1, 15, 256].into_iter().map(Type::from).collect();
        assert_eq!(types, expected);
    }

    #[test]
    fn builder_matches_rfc4034_example() {
        // The bitmap of the example NSEC record in RFC 4034 § 4.3,
        // which has A, MX, RRSIG, NSEC, and TYPE1234.
        let bitmap = TypeBitmap::from_types(
            [Type::A, Type::MX, Type::RRSIG, Type::NSEC, Type::from(1234)].into_iter(),
        );
        assert_eq!(
            bitmap.octets(),
            b"\x00\x06\x40\x01\x00\x00\x00\x03\
              \x04\x1b\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
              \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x20"
        );
        assert_eq!(TypeBitmap::parse(bitmap.octets()), Ok(bitmap.clone()));
        assert!(bitmap.contains(Type::MX));
        assert!(bitmap.contains(Type::from(1234)));
        assert!(!bitmap.contains(Type::NS));
        assert!(!bitmap.contains(Type::from(4321)));
        assert_eq!(bitmap.types().len(), 5);
    }

    #[test]
    fn parse_rejects_malformed_bitmaps() {
        assert_eq!(TypeBitmap::parse(b"\x00"), Err(Error::Truncated));
        assert_eq!(TypeBitmap::parse(b"\x00\x02\x40"), Err(Error::Truncated));
        assert_eq!(TypeBitmap::parse(b"\x00\x00"), Err(Error::InvalidWindowLength));
        assert_eq!(
            TypeBitmap::parse(b"\x00\x21\x00"),
            Err(Error::InvalidWindowLength)
        );
        assert_eq!(
            TypeBitmap::parse(b"\x01\x01\x80\x00\x01\x80"),
            Err(Error::WindowsOutOfOrder)
        );
    }

    #[test]
    fn empty_bitmap_has_no_types() {
        let bitmap = TypeBitmap::from_types(std::iter::empty());
        assert!(bitmap.octets().is_empty());
        assert!(bitmap.types().is_empty());
    }
}
