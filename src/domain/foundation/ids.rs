//! Strongly-typed identifier value objects.
//!
//! Store-assigned identifiers are `i64` newtypes because they come from
//! `BIGSERIAL` columns; they still parse from strings since the payment
//! provider hands them back to us as metadata values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a store-assigned value, rejecting non-positive ids.
            pub fn new(value: i64) -> Result<Self, ValidationError> {
                if value <= 0 {
                    return Err(ValidationError::out_of_range($field, 1, i64::MAX, value));
                }
                Ok(Self(value))
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ValidationError::invalid_format($field, e.to_string()))?;
                Self::new(value)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a placed order.
    OrderId,
    "order_id"
);

numeric_id!(
    /// Identifier of a payment attempt in the transaction ledger.
    TransactionId,
    "transaction_id"
);

numeric_id!(
    /// Identifier of a catalog product.
    ProductId,
    "product_id"
);

/// User identifier (from the upstream identity gateway).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-facing order reference, e.g. `CR-20260301-7F3A09BC`.
///
/// Generated once at checkout and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "CR";

    /// Generates a fresh order number for the given creation date.
    pub fn generate(date: chrono::NaiveDate) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}-{}",
            Self::PREFIX,
            date.format("%Y%m%d"),
            suffix[..8].to_uppercase()
        ))
    }

    /// Restores a stored order number, validating its shape.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let mut parts = value.split('-');
        let well_formed = parts.next() == Some(Self::PREFIX)
            && parts
                .next()
                .is_some_and(|d| d.len() == 8 && d.chars().all(|c| c.is_ascii_digit()))
            && parts
                .next()
                .is_some_and(|s| s.len() == 8 && s.chars().all(|c| c.is_ascii_alphanumeric()))
            && parts.next().is_none();

        if !well_formed {
            return Err(ValidationError::invalid_format(
                "order_number",
                format!("expected CR-YYYYMMDD-XXXXXXXX, got '{}'", value),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn order_id_parses_from_metadata_string() {
        let id: OrderId = "1001".parse().unwrap();
        assert_eq!(id.value(), 1001);
        assert_eq!(id.to_string(), "1001");
    }

    #[test]
    fn order_id_rejects_garbage_and_non_positive_values() {
        assert!("abc".parse::<OrderId>().is_err());
        assert!("".parse::<OrderId>().is_err());
        assert!("0".parse::<OrderId>().is_err());
        assert!(OrderId::new(-5).is_err());
    }

    #[test]
    fn user_id_rejects_empty_string() {
        match UserId::new("  ") {
            Err(ValidationError::EmptyField { field }) => assert_eq!(field, "user_id"),
            other => panic!("Expected EmptyField error, got {:?}", other),
        }
    }

    #[test]
    fn generated_order_number_round_trips_through_parse() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let number = OrderNumber::generate(date);
        assert!(number.as_str().starts_with("CR-20260301-"));
        assert_eq!(OrderNumber::parse(number.as_str()).unwrap(), number);
    }

    #[test]
    fn generated_order_numbers_are_distinct() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_ne!(OrderNumber::generate(date), OrderNumber::generate(date));
    }

    #[test]
    fn order_number_parse_rejects_malformed_values() {
        assert!(OrderNumber::parse("ORD-1").is_err());
        assert!(OrderNumber::parse("CR-2026-ABCDEFGH").is_err());
        assert!(OrderNumber::parse("CR-20260301-ABCDEFGH-X").is_err());
    }
}
