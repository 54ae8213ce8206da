//! # Core Entities
//!
//! Identifiers and time values shared by the status registry and the topic
//! messaging crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::errors::EnvelopeError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

// =============================================================================
// TIMESTAMP
// =============================================================================

/// Point in time with nanosecond precision, counted from the UNIX epoch.
///
/// Commit timestamps assigned by the ordered log and listener start times
/// both use this type, so ordering comparisons never mix units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds since the epoch.
    pub seconds: u64,
    /// Sub-second nanoseconds (always `< 1_000_000_000`).
    pub nanos: u32,
}

impl Timestamp {
    /// The epoch itself.
    pub const EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_duration(elapsed)
    }

    /// Build from whole seconds and nanoseconds, normalizing overflowing nanos.
    #[must_use]
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self::from_nanos(u128::from(seconds) * NANOS_PER_SEC + u128::from(nanos))
    }

    /// Build from a duration since the epoch.
    #[must_use]
    pub fn from_duration(since_epoch: Duration) -> Self {
        Self {
            seconds: since_epoch.as_secs(),
            nanos: since_epoch.subsec_nanos(),
        }
    }

    /// Build from total nanoseconds since the epoch.
    #[must_use]
    pub fn from_nanos(total: u128) -> Self {
        let seconds = u64::try_from(total / NANOS_PER_SEC).unwrap_or(u64::MAX);
        let nanos = (total % NANOS_PER_SEC) as u32;
        Self { seconds, nanos }
    }

    /// Total nanoseconds since the epoch.
    #[must_use]
    pub fn as_nanos(&self) -> u128 {
        u128::from(self.seconds) * NANOS_PER_SEC + u128::from(self.nanos)
    }

    /// Move the timestamp back by `delta`, clamping at the epoch.
    #[must_use]
    pub fn saturating_sub(&self, delta: Duration) -> Self {
        Self::from_nanos(self.as_nanos().saturating_sub(delta.as_nanos()))
    }

    /// The smallest timestamp strictly greater than `self`.
    #[must_use]
    pub fn next(&self) -> Self {
        Self::from_nanos(self.as_nanos() + 1)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

// =============================================================================
// TOPIC ID
// =============================================================================

/// Address of a topic on the ordered log, written `shard.realm.num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TopicId {
    #[must_use]
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for TopicId {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [shard, realm, num] = parts.as_slice() else {
            return Err(EnvelopeError::Argument(format!(
                "topic id must look like shard.realm.num, got '{s}'"
            )));
        };

        let parse = |part: &str| {
            part.parse::<u64>().map_err(|_| {
                EnvelopeError::Argument(format!("topic id component '{part}' is not a number"))
            })
        };

        Ok(Self {
            shard: parse(shard)?,
            realm: parse(realm)?,
            num: parse(num)?,
        })
    }
}

// =============================================================================
// TRANSACTION ID
// =============================================================================

/// Locally generated identifier of one submission to the log.
///
/// Returned to the caller as soon as the log acknowledges the submission;
/// it says nothing about whether the message has been ordered yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// Time the transaction was created locally.
    pub valid_start: Timestamp,
    /// Random discriminator.
    pub nonce: Uuid,
}

impl TransactionId {
    /// Generate a fresh identifier stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            valid_start: Timestamp::now(),
            nonce: Uuid::new_v4(),
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.valid_start, self.nonce)
    }
}
