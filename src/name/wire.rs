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

//! Parsing of uncompressed on-the-wire domain names, as found in the
//! RDATA of NSEC records given in the RFC 3597 generic syntax.

use arrayvec::ArrayVec;

use super::{Error, Name, MAX_LABEL_LEN, MAX_N_LABELS, MAX_WIRE_LEN};

/// Parses an uncompressed name at the start of `octets`, returning it
/// along with its length. Any data after the name is left for the
/// caller.
pub fn parse_uncompressed_name(octets: &[u8]) -> Result<(Name, usize), Error> {
    let mut label_offsets: ArrayVec<u8, MAX_N_LABELS> = ArrayVec::new();
    let mut offset = 0;
    loop {
        let len = *octets.get(offset).ok_or(Error::UnexpectedEnd)? as usize;
        if len > MAX_LABEL_LEN {
            return Err(Error::LabelTooLong);
        }
        let next_offset = offset + 1 + len;
        if next_offset > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        } else if next_offset > octets.len() {
            return Err(Error::UnexpectedEnd);
        }

        // A name within MAX_WIRE_LEN octets has at most MAX_N_LABELS
        // labels, so this push cannot fail.
        label_offsets.push(offset as u8);
        offset = next_offset;
        if len == 0 {
            break;
        }
    }

    Ok((Name::from_parts(&octets[..offset], &label_offsets), offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        let (name, len) = parse_uncompressed_name(b"\x04test\x00extra").unwrap();
        assert_eq!(len, 6);
        assert_eq!(name, "test.".parse().unwrap());
        let (root, len) = parse_uncompressed_name(b"\x00").unwrap();
        assert_eq!(len, 1);
        assert!(root.is_root());
    }

    #[test]
    fn rejects_long_label() {
        let mut octets = vec![64];
        octets.extend_from_slice(&[b'x'; 64]);
        octets.push(0);
        assert_eq!(
            parse_uncompressed_name(&octets).map(|_| ()),
            Err(Error::LabelTooLong)
        );
    }

    #[test]
    fn rejects_long_name() {
        let mut octets = Vec::new();
        for _ in 0..5 {
            octets.push(63);
            octets.extend_from_slice(&[b'x'; 63]);
        }
        octets.push(0);
        assert_eq!(
            parse_uncompressed_name(&octets).map(|_| ()),
            Err(Error::NameTooLong)
        );
    }

    #[test]
    fn rejects_truncated_names() {
        assert_eq!(
            parse_uncompressed_name(b"\x04tes").map(|_| ()),
            Err(Error::UnexpectedEnd)
        );
        assert_eq!(
            parse_uncompressed_name(b"\x04test").map(|_| ()),
            Err(Error::UnexpectedEnd)
        );
    }
}
