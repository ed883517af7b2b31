//! Trade type (buy or sell).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Direction of a trade.
///
/// Serialized as the variant name (`"Buy"`, `"Sell"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    /// Buy trade.
    Buy,
    /// Sell trade.
    Sell,
}

impl TradeType {
    /// Variant name as emitted on the wire and stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeType {
    type Err = DomainError;

    /// Case-insensitive parse. Anything other than buy/sell is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("buy") {
            Ok(Self::Buy)
        } else if trimmed.eq_ignore_ascii_case("sell") {
            Ok(Self::Sell)
        } else {
            Err(DomainError::InvalidValue {
                field: "tradeType".to_string(),
                message: format!("unknown trade type '{s}', expected Buy or Sell"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Buy", TradeType::Buy ; "pascal buy")]
    #[test_case("buy", TradeType::Buy ; "lower buy")]
    #[test_case("BUY", TradeType::Buy ; "upper buy")]
    #[test_case(" bUy ", TradeType::Buy ; "padded mixed buy")]
    #[test_case("Sell", TradeType::Sell ; "pascal sell")]
    #[test_case("sElL", TradeType::Sell ; "mixed sell")]
    fn parses_case_insensitively(input: &str, expected: TradeType) {
        assert_eq!(input.parse::<TradeType>().unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("Hold" ; "unknown word")]
    #[test_case("0" ; "numeric")]
    #[test_case("buyy" ; "near miss")]
    fn rejects_unknown_values(input: &str) {
        let err = input.parse::<TradeType>().unwrap_err();
        assert_eq!(err.field(), "tradeType");
    }

    #[test]
    fn display_uses_variant_name() {
        assert_eq!(TradeType::Buy.to_string(), "Buy");
        assert_eq!(TradeType::Sell.to_string(), "Sell");
    }

    #[test]
    fn serde_uses_variant_name() {
        assert_eq!(serde_json::to_string(&TradeType::Sell).unwrap(), "\"Sell\"");
        let parsed: TradeType = serde_json::from_str("\"Buy\"").unwrap();
        assert_eq!(parsed, TradeType::Buy);
    }
}
