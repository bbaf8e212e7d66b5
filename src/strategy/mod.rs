//! Strategy rules: sell margin, bargain check, dividend timing and
//! trading hours. Everything here is pure; the engine owns the I/O.

pub mod dividends;
pub mod hours;
pub mod rules;

pub use dividends::dividends_soon;
pub use hours::TradingHours;
pub use rules::{should_buy, should_sell};
