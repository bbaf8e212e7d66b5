//! Market data providers.
//!
//! Defines the `MarketDataProvider` trait used by the buy screener for
//! its bargain check, and the Yahoo chart implementation.

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::PriceHistory;

/// Abstraction over a source of recent intraday prices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Price samples for `symbol` over the trailing `period` at `interval`
    /// spacing (e.g. "1mo" / "15m").
    ///
    /// Implementations report a symbol with no data as
    /// `StockwatchError::DataUnavailable`, distinct from transport failures.
    async fn get_price_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceHistory>;
}
