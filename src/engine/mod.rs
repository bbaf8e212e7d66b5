//! Core engine: the sell → buy scan and the market-hours scheduler.

pub mod buyer;
pub mod scanner;
pub mod scheduler;
pub mod seller;

use chrono::NaiveDate;

use crate::brokerage::Brokerage;
use crate::config::{MarketDataConfig, TradingConfig};
use crate::data::MarketDataProvider;

/// Everything a screener needs for one scan: collaborators, thresholds
/// and the exchange-local date the scan runs on.
pub struct ScanContext<'a> {
    pub brokerage: &'a dyn Brokerage,
    pub market_data: &'a dyn MarketDataProvider,
    pub trading: &'a TradingConfig,
    pub feed: &'a MarketDataConfig,
    pub today: NaiveDate,
}
