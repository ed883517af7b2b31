//! Trade aggregate.

mod trade;

pub use trade::{ReconstitutedTradeParams, Trade, TradeTerms};
