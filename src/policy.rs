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

//! Negative-caching policies.

use std::fmt;
use std::str::FromStr;

use crate::util::Caseless;

/// The negative-caching policy of a simulation run.
///
/// Each policy adds one behavior to the previous one:
///
/// * [`Rfc2308`](Policy::Rfc2308) caches NXDOMAIN for the whole name and
///   NODATA per type;
/// * [`Rfc4035`](Policy::Rfc4035) additionally stores DS records that
///   arrive together with NS answers; and
/// * [`Rfc8198`](Policy::Rfc8198) additionally answers from cached NSEC
///   records, instead of caching negative answers by name.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Policy {
    Rfc2308,
    Rfc4035,
    #[default]
    Rfc8198,
}

impl Policy {
    pub const ALL: [Self; 3] = [Self::Rfc2308, Self::Rfc4035, Self::Rfc8198];

    /// Whether DS records are returned along with NS answers.
    pub fn dnssec_piggyback(self) -> bool {
        !matches!(self, Self::Rfc2308)
    }

    /// Whether negative answers carry NSEC records, which the cache
    /// then uses to prove non-existence.
    pub fn aggressive_nsec(self) -> bool {
        matches!(self, Self::Rfc8198)
    }
}

impl FromStr for Policy {
    type Err = &'static str;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| Caseless(text) == Caseless(policy.as_str()))
            .ok_or("unknown policy (expected rfc2308, rfc4035, or rfc8198)")
    }
}

impl Policy {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rfc2308 => "rfc2308",
            Self::Rfc4035 => "rfc4035",
            Self::Rfc8198 => "rfc8198",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Policy;

    #[test]
    fn flags_accumulate() {
        assert!(!Policy::Rfc2308.dnssec_piggyback());
        assert!(!Policy::Rfc2308.aggressive_nsec());
        assert!(Policy::Rfc4035.dnssec_piggyback());
        assert!(!Policy::Rfc4035.aggressive_nsec());
        assert!(Policy::Rfc8198.dnssec_piggyback());
        assert!(Policy::Rfc8198.aggressive_nsec());
    }

    #[test]
    fn parses_names() {
        for policy in Policy::ALL {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
        assert_eq!("RFC4035".parse(), Ok(Policy::Rfc4035));
        assert!("rfc1035".parse::<Policy>().is_err());
    }
}
