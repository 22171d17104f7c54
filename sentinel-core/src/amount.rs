use std::ops::Deref;

use ruint::aliases::U256;
use serde::{Deserialize, Serialize};

use crate::error::{SentinelError, SentinelResult};

/// A custodied amount of value in the ledger's smallest unit.
///
/// Balances in the smallest unit routinely exceed 64 bits (one whole token is
/// often 10^24 units), so the amount is backed by a 256-bit unsigned integer and
/// every mutation is checked.
///
/// At the JSON boundary amounts are decimal strings: many consumers cannot
/// represent integers beyond 53 bits.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Hash)]
pub struct Amount(pub U256);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Outputs the amount as a base-10 string without padding.
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        self.0.to_string()
    }

    /// Attempts to parse a base-10 string as an amount.
    ///
    /// # Errors
    /// Will return `InvalidArgument` if the input is not a decimal number that fits in 256 bits.
    pub fn try_from_decimal_string(decimal: &str) -> SentinelResult<Self> {
        let decimal = decimal.trim();
        if decimal.is_empty() || !decimal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SentinelError::invalid_argument(
                "amount",
                format!("'{decimal}' is not a decimal number"),
            ));
        }
        U256::from_str_radix(decimal, 10).map(Self).map_err(|_| {
            SentinelError::invalid_argument("amount", "number does not fit in 256 bits")
        })
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds `other`, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl From<Amount> for U256 {
    fn from(val: Amount) -> Self {
        val.0
    }
}

impl From<U256> for Amount {
    fn from(val: U256) -> Self {
        Self(val)
    }
}

impl From<u128> for Amount {
    fn from(val: u128) -> Self {
        Self(U256::from(val))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl Deref for Amount {
    type Target = U256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::try_from_decimal_string(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruint::uint;

    #[test]
    fn test_to_decimal_string() {
        assert_eq!(Amount::from(1u128).to_decimal_string(), "1");
        assert_eq!(Amount::ZERO.to_decimal_string(), "0");
        // 1 NEAR in yocto units does not fit in 64 bits.
        assert_eq!(
            Amount(uint!(1000000000000000000000000_U256)).to_decimal_string(),
            "1000000000000000000000000"
        );
    }

    #[test]
    fn test_from_decimal_string() {
        assert_eq!(
            Amount::try_from_decimal_string("42").unwrap(),
            Amount::from(42u128)
        );
        assert_eq!(
            Amount::try_from_decimal_string(" 5000000000000000000000000 ").unwrap(),
            Amount(uint!(5000000000000000000000000_U256))
        );
    }

    #[test]
    fn test_invalid_decimal_string() {
        assert!(Amount::try_from_decimal_string("").is_err());
        assert!(Amount::try_from_decimal_string("-5").is_err());
        assert!(Amount::try_from_decimal_string("0x10").is_err());
        assert!(Amount::try_from_decimal_string("1.5").is_err());
        // 2^256
        assert!(Amount::try_from_decimal_string(
            "115792089237316195423570985008687907853269984665640564039457584007913129639936"
        )
        .is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Amount(U256::MAX);
        assert!(max.checked_add(Amount::from(1u128)).is_none());
        assert!(Amount::ZERO.checked_sub(Amount::from(1u128)).is_none());
        assert_eq!(
            Amount::from(10u128).checked_sub(Amount::from(4u128)),
            Some(Amount::from(6u128))
        );
    }

    #[test]
    fn test_json_serializing() {
        let json = serde_json::to_string(&Amount::from(123_456u128)).unwrap();
        assert_eq!(json, "\"123456\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Amount::from(123_456u128));
    }
}
