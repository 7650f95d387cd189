//! Market identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Exchange identifier, e.g. `binance`.
///
/// Lowercase, non-empty. Whether an exchange is actually supported is
/// decided by the connector provider, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Creates a new `ExchangeId`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidExchangeId` if the value is empty
    /// or contains non-alphanumeric characters.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidExchangeId(id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExchangeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Trading pair of base and quote currency, e.g. `BTC-USD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// Base currency (the asset being traded).
    pub base: String,
    /// Quote currency (prices and fees are denominated in it).
    pub quote: String,
}

impl TradingPair {
    /// Creates a new `TradingPair`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidTradingPair` if either side is
    /// empty or contains a separator character.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Result<Self, ValidationError> {
        let base = base.into();
        let quote = quote.into();
        if base.is_empty()
            || quote.is_empty()
            || base.contains('-')
            || quote.contains('-')
            || base.contains(':')
            || quote.contains(':')
        {
            return Err(ValidationError::InvalidTradingPair(format!(
                "{base}-{quote}"
            )));
        }
        Ok(Self { base, quote })
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for TradingPair {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('-')
            .ok_or_else(|| ValidationError::InvalidTradingPair(s.to_string()))?;
        Self::new(base, quote)
    }
}

/// A market: one trading pair on one exchange.
///
/// # Examples
///
/// ```
/// use sirocco_core::types::Market;
///
/// let market: Market = "binance:BTC-USD".parse().unwrap();
/// assert_eq!(market.to_string(), "binance:BTC-USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Market {
    /// The exchange this market lives on.
    pub exchange: ExchangeId,
    /// The traded pair.
    pub pair: TradingPair,
}

impl Market {
    /// Creates a new `Market`.
    #[must_use]
    pub fn new(exchange: ExchangeId, pair: TradingPair) -> Self {
        Self { exchange, pair }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.pair)
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exchange, pair) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidTradingPair(s.to_string()))?;
        Ok(Self::new(exchange.parse()?, pair.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_id_lowercases() {
        let id = ExchangeId::new("Binance").unwrap();
        assert_eq!(id.as_str(), "binance");
    }

    #[test]
    fn test_exchange_id_rejects_empty() {
        assert!(matches!(
            ExchangeId::new(""),
            Err(ValidationError::InvalidExchangeId(_))
        ));
    }

    #[test]
    fn test_trading_pair_rejects_separator() {
        assert!(TradingPair::new("BTC-X", "USD").is_err());
    }

    #[test]
    fn test_market_parse_roundtrip() {
        let market: Market = "kraken:ETH-EUR".parse().unwrap();
        assert_eq!(market.pair.base, "ETH");
        assert_eq!(market.pair.quote, "EUR");
        assert_eq!(market.to_string(), "kraken:ETH-EUR");
    }

    #[test]
    fn test_market_ordering_is_stable() {
        let a: Market = "binance:BTC-USD".parse().unwrap();
        let b: Market = "binance:ETH-USD".parse().unwrap();
        let c: Market = "kraken:BTC-USD".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
