//! Identifier and timestamp types shared across the protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SentinelError, SentinelResult};

/// Nanoseconds per millisecond.
pub const NANOS_PER_MILLI: u64 = 1_000_000;

// Identifiers

/// Identity of a ledger account (owner, beneficiary, agent or any caller).
///
/// Accounts are opaque names such as `alice.near`. The only structural rule
/// enforced here is that a name is not blank.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Creates an `AccountId`, rejecting blank names.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the name is empty or only whitespace.
    pub fn new<S: Into<String>>(name: S) -> SentinelResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SentinelError::invalid_argument(
                "account_id",
                "account name must not be empty",
            ));
        }
        Ok(Self(name))
    }

    /// Returns the account name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = SentinelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Time

/// A ledger timestamp in nanoseconds.
///
/// Serialized as a decimal string: nanosecond timestamps exceed the 53-bit
/// integer range of JSON consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero timestamp, used as the "unset" marker for warnings.
    pub const ZERO: Self = Self(0);

    /// Creates a timestamp from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a timestamp from milliseconds, saturating at `u64::MAX` nanoseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(NANOS_PER_MILLI))
    }

    /// Returns the timestamp in nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Returns `true` for the unset marker.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_account_rejected() {
        assert!(AccountId::new("").is_err());
        assert!(AccountId::new("   ").is_err());
        assert_eq!(AccountId::new("bob.near").unwrap().as_str(), "bob.near");
    }

    #[test]
    fn test_account_deserialize_validates() {
        let ok: AccountId = serde_json::from_str("\"carol.near\"").unwrap();
        assert_eq!(ok.to_string(), "carol.near");
        assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
    }

    #[test]
    fn test_timestamp_serializes_as_decimal_string() {
        let ts = Timestamp::from_nanos(1_700_000_000_123_456_789);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000123456789\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_timestamp_from_millis() {
        assert_eq!(Timestamp::from_millis(61_000).as_nanos(), 61_000_000_000);
        assert_eq!(Timestamp::from_millis(u64::MAX).as_nanos(), u64::MAX);
    }
}
