//! Trade lifecycle value objects.

mod trade_status;
mod trade_type;

pub use trade_status::TradeStatus;
pub use trade_type::TradeType;
