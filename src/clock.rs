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

//! Virtual time.
//!
//! The simulation never reads the wall clock. Time is whatever the
//! replayed trace says it is: the [`VirtualClock`] is advanced
//! explicitly before each event, and every cache expiry is computed
//! against it.

use std::fmt;

/// A point in virtual time, in whole seconds since the start of the
/// replay.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The start of the replay.
    pub const ZERO: Self = Self(0);

    /// Returns the number of seconds since the start of the replay.
    pub fn secs(self) -> u64 {
        self.0
    }

    /// Returns the timestamp `secs` seconds later.
    pub fn after(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A monotonic clock driven by the replayed trace.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Timestamp,
}

impl VirtualClock {
    /// Creates a clock reading [`Timestamp::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Sets the current time to `reltime` seconds after the start of
    /// the replay. Time may stand still but never go backwards.
    pub fn advance(&mut self, reltime: u64) -> Result<Timestamp, TimeError> {
        let attempted = Timestamp(reltime);
        if attempted < self.now {
            Err(TimeError {
                previous: self.now,
                attempted,
            })
        } else {
            self.now = attempted;
            Ok(attempted)
        }
    }
}

/// An attempt to move a [`VirtualClock`] backwards.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeError {
    pub previous: Timestamp,
    pub attempted: Timestamp,
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "time went backwards from {} to {}",
            self.previous, self.attempted
        )
    }
}

impl std::error::Error for TimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let mut clock = VirtualClock::new();
        assert_eq!(clock.now(), Timestamp::ZERO);
        assert_eq!(clock.advance(5), Ok(Timestamp::from(5)));
        assert_eq!(clock.advance(5), Ok(Timestamp::from(5)));
        assert_eq!(
            clock.advance(4),
            Err(TimeError {
                previous: Timestamp::from(5),
                attempted: Timestamp::from(4),
            })
        );
        assert_eq!(clock.now(), Timestamp::from(5));
    }

    #[test]
    fn after_saturates() {
        assert_eq!(Timestamp::from(3).after(2), Timestamp::from(5));
        assert_eq!(Timestamp::from(u64::MAX).after(1), Timestamp::from(u64::MAX));
    }
}
