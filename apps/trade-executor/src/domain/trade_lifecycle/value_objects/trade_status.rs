//! Trade status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Lifecycle status of a trade.
///
/// Every trade starts as [`TradeStatus::Initiated`]. No transitions are
/// performed by this service; the remaining values are carried so that
/// stored records written by other systems round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TradeStatus {
    /// Trade recorded, nothing else has happened yet.
    #[default]
    Initiated,
    /// Awaiting execution.
    Pending,
    /// Executed in the market.
    Executed,
    /// Settled with the counterparty.
    Settled,
    /// Cancelled before execution.
    Cancelled,
    /// Rejected.
    Rejected,
}

impl TradeStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Initiated,
        Self::Pending,
        Self::Executed,
        Self::Settled,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// Variant name as emitted on the wire and stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initiated => "Initiated",
            Self::Pending => "Pending",
            Self::Executed => "Executed",
            Self::Settled => "Settled",
            Self::Cancelled => "Cancelled",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DomainError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown trade status '{s}'"),
            })
    }
}
