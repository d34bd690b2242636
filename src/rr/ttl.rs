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

//! Provides the [`Ttl`] structure for DNS RR TTLs.

use std::fmt;
use std::str::FromStr;

/// The time to live (TTL) of a DNS record, in seconds.
///
/// [RFC 2181 § 8] clarified that TTL values are unsigned integers
/// between 0 and 2³¹ - 1, inclusive, and that a value with the most
/// significant bit set is to be treated as zero. `Ttl::from(u32)`
/// implements that rule, so every `Ttl` in the simulation is within
/// range.
///
/// [RFC 2181 § 8]: https://datatracker.ietf.org/doc/html/rfc2181#section-8
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Ttl(u32);

impl Ttl {
    /// Returns the TTL as a number of seconds.
    pub fn secs(self) -> u64 {
        self.0 as u64
    }
}

impl From<u32> for Ttl {
    fn from(raw: u32) -> Self {
        if raw > i32::MAX as u32 {
            Self(0)
        } else {
            Self(raw)
        }
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

/// Parses a TTL written as a plain number of seconds or in the BIND
/// style with unit suffixes (e.g. `1h30m`, `2D`).
impl FromStr for Ttl {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Ok(secs) = text.parse::<u32>() {
            return Ok(secs.into());
        }

        let mut total: u32 = 0;
        let mut value: Option<u32> = None;
        for c in text.chars() {
            if let Some(digit) = c.to_digit(10) {
                value = Some(
                    value
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit))
                        .ok_or("TTL is out of range")?,
                );
            } else {
                let unit = match c.to_ascii_lowercase() {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86_400,
                    'w' => 604_800,
                    _ => return Err("invalid TTL unit"),
                };
                let secs = value
                    .take()
                    .ok_or("TTL unit without a value")?
                    .checked_mul(unit)
                    .ok_or("TTL is out of range")?;
                total = total.checked_add(secs).ok_or("TTL is out of range")?;
            }
        }
        if value.is_some() || text.is_empty() {
            Err("invalid TTL")
        } else {
            Ok(total.into())
        }
    }
}

impl fmt::Debug for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_ttls_are_not_modified() {
        let i32_max = i32::MAX as u32;
        assert_eq!(u32::from(Ttl::from(0)), 0);
        assert_eq!(u32::from(Ttl::from(23)), 23);
        assert_eq!(u32::from(Ttl::from(i32_max)), i32_max);
    }

    #[test]
    fn large_ttls_become_zero() {
        assert_eq!(u32::from(Ttl::from(i32::MAX as u32 + 1)), 0);
    }

    #[test]
    fn parses_plain_and_unit_ttls() {
        assert_eq!("86400".parse::<Ttl>(), Ok(Ttl::from(86400)));
        assert_eq!("1h30m".parse::<Ttl>(), Ok(Ttl::from(5400)));
        assert_eq!("2D".parse::<Ttl>(), Ok(Ttl::from(172_800)));
        assert!("1h30".parse::<Ttl>().is_err());
        assert!("".parse::<Ttl>().is_err());
        assert!("h".parse::<Ttl>().is_err());
        assert!("1y".parse::<Ttl>().is_err());
    }
}
