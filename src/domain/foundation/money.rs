//! Monetary amounts in integer minor currency units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// An amount in minor units (cents). Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Accepts zero or more minor units.
    pub fn try_new(field: &str, minor_units: i64) -> Result<Self, ValidationError> {
        if minor_units < 0 {
            return Err(ValidationError::out_of_range(field, 0, i64::MAX, minor_units));
        }
        Ok(Self(minor_units))
    }

    /// Accepts strictly positive amounts, as required for charges and refunds.
    pub fn positive(field: &str, minor_units: i64) -> Result<Self, ValidationError> {
        if minor_units <= 0 {
            return Err(ValidationError::out_of_range(field, 1, i64::MAX, minor_units));
        }
        Ok(Self(minor_units))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        if factor < 0 {
            return None;
        }
        self.0.checked_mul(factor).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Lowercase ISO-4217 currency code as the payment provider expects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn usd() -> Self {
        Self("usd".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::invalid_format(
                "currency",
                format!("'{}' is not a three-letter currency code", s),
            ));
        }
        Ok(Self(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
