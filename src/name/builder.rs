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

//! Implementation of the [`NameBuilder`] structure.

use arrayvec::ArrayVec;

use super::{parse_escape, Error, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// A facility to build [`Name`]s label by label.
///
/// The `NameBuilder` constructs the on-the-wire representation and
/// label offset array for a [`Name`] in fixed-size stack buffers that
/// are long enough to accomodate any valid name, so that only the
/// finished name is allocated.
///
/// A new `NameBuilder` starts with a single null label. If the build is
/// finished at this point, the name of the DNS root is constructed:
///
/// ```
/// use negsim::name::{Name, NameBuilder};
/// assert_eq!(NameBuilder::new().finish().unwrap(), Name::root());
/// ```
///
/// Octets are added to the current label using
/// [`NameBuilder::try_push`], and a new label is started with
/// [`NameBuilder::next_label`]. [`NameBuilder::push_text`] does both
/// while reading presentation-format text, so that partially qualified
/// names from zone files can be completed with
/// [`NameBuilder::finish_with_suffix`]:
///
/// ```
/// use negsim::name::{Name, NameBuilder};
/// let origin: Name = "test.".parse().unwrap();
/// let mut builder = NameBuilder::new();
/// builder.push_text("www.example").unwrap();
/// assert_eq!(
///     builder.finish_with_suffix(&origin).unwrap(),
///     "www.example.test.".parse().unwrap(),
/// );
/// ```
pub struct NameBuilder {
    wire_repr: ArrayVec<u8, MAX_WIRE_LEN>,
    label_offsets: ArrayVec<u8, MAX_N_LABELS>,
    label_start: usize,
    label_len: u8,
}

impl NameBuilder {
    /// Constructs a new `NameBuilder`, which initially contains a
    /// single null label.
    pub fn new() -> Self {
        let mut wire_repr = ArrayVec::new();
        wire_repr.push(0);
        let mut label_offsets = ArrayVec::new();
        label_offsets.push(0);
        Self {
            wire_repr,
            label_offsets,
            label_start: 0,
            label_len: 0,
        }
    }

    /// Determines whether the name currently stored in the
    /// `NameBuilder` is a fully qualified domain name, that is, whether
    /// it ends with the null label.
    pub fn is_fully_qualified(&self) -> bool {
        self.label_len == 0
    }

    /// Tries to add the given octet to the current label. This will
    /// fail if doing so would make the label or name too long. In the
    /// error case, the `NameBuilder`'s state remains unchanged.
    pub fn try_push(&mut self, octet: u8) -> Result<(), Error> {
        if self.label_len >= (MAX_LABEL_LEN as u8) {
            Err(Error::LabelTooLong)
        } else if self.wire_repr.try_push(octet).is_ok() {
            self.label_len += 1;
            Ok(())
        } else {
            Err(Error::NameTooLong)
        }
    }

    /// Reads a domain name (or a portion of one) in presentation
    /// format, processing the escape sequences of [RFC 4343 § 2.1].
    /// Each unescaped period finishes the current label. The text
    /// must be strictly ASCII.
    ///
    /// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
    pub fn push_text(&mut self, text: &str) -> Result<(), Error> {
        let mut remaining_octets = text.as_bytes();

        // NOTE: to check that the string is ASCII, it suffices to check
        // that each octet is ASCII as we go. This is because all
        // multi-byte characters start with an octet that is not ASCII.
        while let Some(&octet) = remaining_octets.first() {
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&remaining_octets[1..])?;
                self.try_push(value)?;
                remaining_octets = &remaining_octets[consumed + 1..];
            } else if octet == b'.' {
                self.next_label()?;
                remaining_octets = &remaining_octets[1..];
            } else if !octet.is_ascii() {
                return Err(Error::StrNotAscii);
            } else {
                self.try_push(octet)?;
                remaining_octets = &remaining_octets[1..];
            }
        }
        Ok(())
    }

    /// Writes out the length of the current label in the on-the-wire
    /// representation.
    fn update_label_len(&mut self) {
        self.wire_repr[self.label_start] = self.label_len;
    }

    /// Finishes the current label and starts a new one. If the current
    /// label is null, this fails, since only the last label in a domain
    /// name may be null. Likewise, if this makes the domain name too
    /// long, this fails.
    pub fn next_label(&mut self) -> Result<(), Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else if self.wire_repr.is_full() {
            Err(Error::NameTooLong)
        } else {
            self.update_label_len();
            self.label_start = self.wire_repr.len();
            self.label_len = 0;

            // Neither push can fail: wire_repr is not full, and a name
            // whose non-terminal labels are all non-null cannot have
            // more than MAX_N_LABELS labels within MAX_WIRE_LEN octets.
            self.wire_repr.push(0);
            self.label_offsets.push(self.label_start as u8);
            Ok(())
        }
    }

    /// Finishes the construction of the domain name. Since the last
    /// label of a domain name must be null, this fails if that is not
    /// the case.
    pub fn finish(self) -> Result<Name, Error> {
        if !self.is_fully_qualified() {
            Err(Error::NonNullTerminal)
        } else {
            Ok(Name::from_parts(&self.wire_repr, &self.label_offsets))
        }
    }

    /// Finishes the construction of the domain name by implicitly
    /// finishing the current label and then appending the labels of
    /// `suffix`. This fails if the current label is null or if
    /// appending `suffix` would make the name too long.
    pub fn finish_with_suffix(mut self, suffix: &Name) -> Result<Name, Error> {
        if self.is_fully_qualified() {
            Err(Error::NullNonTerminal)
        } else {
            self.update_label_len();
            let label_offset_base = self.wire_repr.len() as u8;
            self.wire_repr
                .try_extend_from_slice(suffix.wire_repr())
                .map_err(|_| Error::NameTooLong)?;
            for offset in suffix.label_offsets.iter() {
                self.label_offsets
                    .try_push(*offset + label_offset_base)
                    .map_err(|_| Error::NameTooLong)?;
            }
            Ok(Name::from_parts(&self.wire_repr, &self.label_offsets))
        }
    }
}

impl Default for NameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_names_are_not_fully_qualified() {
        let mut builder = NameBuilder::new();
        builder.push_text("www.example").unwrap();
        assert!(!builder.is_fully_qualified());
        assert_eq!(builder.finish(), Err(Error::NonNullTerminal));
    }

    #[test]
    fn finish_with_suffix_rejects_fully_qualified_names() {
        let mut builder = NameBuilder::new();
        builder.push_text("www.example.").unwrap();
        assert_eq!(
            builder.finish_with_suffix(&Name::root()),
            Err(Error::NullNonTerminal)
        );
    }

    #[test]
    fn finish_with_suffix_computes_label_offsets() {
        let suffix: Name = "bb.ccc.".parse().unwrap();
        let mut builder = NameBuilder::new();
        builder.push_text("a").unwrap();
        let name = builder.finish_with_suffix(&suffix).unwrap();
        assert_eq!(name.wire_repr(), b"\x01a\x02bb\x03ccc\x00");
        assert_eq!(name.labels().nth(2).unwrap().octets(), b"ccc");
        assert!(name.labels().nth(3).unwrap().is_null());
    }
}
