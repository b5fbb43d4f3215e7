use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected coin symbol as received from the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid coin symbol: {0:?}")]
pub struct InvalidCoinSymbol(pub String);

/// A validated ticker such as `BTC`.
///
/// Only ASCII letters are accepted. The symbol is stored uppercased; the
/// lowercase form is used as the cache key and for price API coin ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoinSymbol(String);

impl CoinSymbol {
    pub fn parse(raw: &str) -> Result<Self, InvalidCoinSymbol> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(InvalidCoinSymbol(raw.to_string()));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }

    pub fn as_upper(&self) -> &str {
        &self.0
    }

    pub fn cache_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// Exchange trading pair against USDT, e.g. `BTCUSDT`.
    pub fn usdt_pair(&self) -> String {
        format!("{}USDT", self.0)
    }
}

impl fmt::Display for CoinSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CoinSymbol {
    type Error = InvalidCoinSymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CoinSymbol> for String {
    fn from(coin: CoinSymbol) -> Self {
        coin.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case() {
        let coin = CoinSymbol::parse("bTc").unwrap();
        assert_eq!(coin.as_upper(), "BTC");
        assert_eq!(coin.cache_key(), "btc");
        assert_eq!(coin.usdt_pair(), "BTCUSDT");
    }

    #[test]
    fn rejects_non_alphabetic() {
        for raw in ["", "btc1", "b-tc", "eth ", "sol/usd", "42", "ßtc"] {
            assert_eq!(
                CoinSymbol::parse(raw),
                Err(InvalidCoinSymbol(raw.to_string())),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let coin = CoinSymbol::parse("eth").unwrap();
        assert_eq!(serde_json::to_string(&coin).unwrap(), r#""ETH""#);

        let bad: Result<CoinSymbol, _> = serde_json::from_str(r#""e7h""#);
        assert!(bad.is_err());
    }
}
