//! Trade Aggregate Root
//!
//! A trade is created once, can be amended in place any number of times and
//! is never deleted. Its id, status and execution timestamp are fixed when it
//! is created; amendments only ever touch the economic terms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{CustomerId, Timestamp, TradeId};
use crate::domain::trade_lifecycle::value_objects::{TradeStatus, TradeType};

/// The mutable terms of a trade, already parsed and validated.
///
/// Built from an inbound mutation request and applied by
/// [`Trade::open`] and [`Trade::amend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeTerms {
    /// Customer the trade was placed for.
    pub customer_id: CustomerId,
    /// Instrument being traded.
    pub instrument: String,
    /// Buy or sell.
    pub trade_type: TradeType,
    /// Traded quantity.
    pub quantity: Decimal,
    /// Price per unit.
    pub price: Decimal,
    /// Optional settlement time.
    pub settlement_timestamp: Option<Timestamp>,
    /// Currency code.
    pub currency: String,
    /// Counterparty name.
    pub counterparty: String,
    /// Fees charged; zero when the request omitted them.
    pub fees: Decimal,
}

/// Parameters for reconstituting a Trade from storage.
///
/// Used by repositories to rebuild aggregates from persisted state.
#[derive(Debug, Clone)]
pub struct ReconstitutedTradeParams {
    /// Trade identifier.
    pub id: TradeId,
    /// Stored status.
    pub status: TradeStatus,
    /// Execution timestamp recorded at creation.
    pub execution_timestamp: Timestamp,
    /// Current terms.
    pub terms: TradeTerms,
}

/// Trade Aggregate Root.
///
/// Serialized with lower-camel-case field names; this is the shape of both
/// the published event payload and the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    id: TradeId,
    customer_id: CustomerId,
    instrument: String,
    trade_type: TradeType,
    quantity: Decimal,
    price: Decimal,
    execution_timestamp: Timestamp,
    settlement_timestamp: Option<Timestamp>,
    status: TradeStatus,
    currency: String,
    counterparty: String,
    fees: Decimal,
}

impl Trade {
    /// Open a new trade with a freshly generated id.
    ///
    /// Status is [`TradeStatus::Initiated`] and the execution timestamp is now.
    #[must_use]
    pub fn open(terms: TradeTerms) -> Self {
        Self::with_id(TradeId::generate(), Timestamp::now(), terms)
    }

    fn with_id(id: TradeId, execution_timestamp: Timestamp, terms: TradeTerms) -> Self {
        Self {
            id,
            customer_id: terms.customer_id,
            instrument: terms.instrument,
            trade_type: terms.trade_type,
            quantity: terms.quantity,
            price: terms.price,
            execution_timestamp,
            settlement_timestamp: terms.settlement_timestamp,
            status: TradeStatus::Initiated,
            currency: terms.currency,
            counterparty: terms.counterparty,
            fees: terms.fees,
        }
    }

    /// Reconstitute a trade from persisted state.
    #[must_use]
    pub fn reconstitute(params: ReconstitutedTradeParams) -> Self {
        let mut trade = Self::with_id(params.id, params.execution_timestamp, params.terms);
        trade.status = params.status;
        trade
    }

    /// Replace the trade's terms.
    ///
    /// Id, status and execution timestamp are left untouched.
    pub fn amend(&mut self, terms: TradeTerms) {
        self.instrument = terms.instrument;
        self.trade_type = terms.trade_type;
        self.quantity = terms.quantity;
        self.price = terms.price;
        self.currency = terms.currency;
        self.counterparty = terms.counterparty;
        self.fees = terms.fees;
        self.settlement_timestamp = terms.settlement_timestamp;
        self.customer_id = terms.customer_id;
    }

    /// Current terms of the trade.
    #[must_use]
    pub fn terms(&self) -> TradeTerms {
        TradeTerms {
            customer_id: self.customer_id.clone(),
            instrument: self.instrument.clone(),
            trade_type: self.trade_type,
            quantity: self.quantity,
            price: self.price,
            settlement_timestamp: self.settlement_timestamp,
            currency: self.currency.clone(),
            counterparty: self.counterparty.clone(),
            fees: self.fees,
        }
    }

    /// Trade id.
    #[must_use]
    pub const fn id(&self) -> &TradeId {
        &self.id
    }

    /// Customer id.
    #[must_use]
    pub const fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Instrument.
    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Trade type.
    #[must_use]
    pub const fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    /// Quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Execution timestamp.
    #[must_use]
    pub const fn execution_timestamp(&self) -> Timestamp {
        self.execution_timestamp
    }

    /// Settlement timestamp.
    #[must_use]
    pub const fn settlement_timestamp(&self) -> Option<Timestamp> {
        self.settlement_timestamp
    }

    /// Status.
    #[must_use]
    pub const fn status(&self) -> TradeStatus {
        self.status
    }

    /// Currency.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Counterparty.
    #[must_use]
    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    /// Fees.
    #[must_use]
    pub const fn fees(&self) -> Decimal {
        self.fees
    }
}
