//! Order identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Order identifier.
///
/// Wraps a non-empty string. Simulated marketplaces assign deterministic,
/// zero-padded identifiers so that lexicographic order matches assignment
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new `OrderId`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyOrderId` if the value is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyOrderId);
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_rejects_empty() {
        assert!(matches!(OrderId::new(""), Err(ValidationError::EmptyOrderId)));
    }

    #[test]
    fn test_order_id_display() {
        let id = OrderId::new("sim-binance-BTC-USD-00000001").unwrap();
        assert_eq!(format!("{id}"), "sim-binance-BTC-USD-00000001");
    }
}
