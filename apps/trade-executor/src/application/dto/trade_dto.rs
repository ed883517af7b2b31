//! Trade DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{CustomerId, DomainError, Timestamp, TradeId};
use crate::domain::trade_lifecycle::{TradeTerms, TradeType};

/// Inbound request to create or amend a trade.
///
/// `id` is absent for creation and names the target for an update. The
/// trade type is free-form text, parsed case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMutationRequest {
    /// Target trade for an update.
    #[serde(default)]
    pub id: Option<String>,
    /// Customer ID.
    pub customer_id: String,
    /// Instrument.
    pub instrument: String,
    /// Trade type ("buy", "Sell", ...).
    pub trade_type: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Price.
    pub price: Decimal,
    /// Settlement timestamp.
    #[serde(default)]
    pub settlement_timestamp: Option<Timestamp>,
    /// Currency code.
    pub currency: String,
    /// Counterparty.
    pub counterparty: String,
    /// Fees; zero when omitted.
    #[serde(default)]
    pub fees: Option<Decimal>,
}

impl TradeMutationRequest {
    /// Target trade id, if one was supplied and is not blank.
    #[must_use]
    pub fn target_id(&self) -> Option<TradeId> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(TradeId::from)
    }

    /// Parse the request into validated trade terms.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if the trade type is not buy or sell.
    pub fn to_terms(&self) -> Result<TradeTerms, DomainError> {
        let trade_type: TradeType = self.trade_type.parse()?;

        Ok(TradeTerms {
            customer_id: CustomerId::new(&self.customer_id),
            instrument: self.instrument.clone(),
            trade_type,
            quantity: self.quantity,
            price: self.price,
            settlement_timestamp: self.settlement_timestamp,
            currency: self.currency.clone(),
            counterparty: self.counterparty.clone(),
            fees: self.fees.unwrap_or(Decimal::ZERO),
        })
    }
}
