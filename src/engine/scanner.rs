//! Scan orchestrator.
//!
//! One scan = one account snapshot + one universe fetch, then the sell
//! screener followed by the buy screener. Sells never top up the buy
//! budget of the same scan; buys only spend the balance the snapshot
//! reported.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::buyer::{perform_buying, BuyPass};
use super::seller::{perform_selling, total_sold, SellDecision};
use super::ScanContext;
use crate::brokerage::Brokerage;
use crate::config::{MarketDataConfig, TradingConfig};
use crate::data::MarketDataProvider;

/// Summary of a complete sell → buy scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub holdings: usize,
    pub companies: usize,
    pub dividends_due: usize,
    pub balance_before: Decimal,
    pub sells: Vec<SellDecision>,
    pub buys: BuyPass,
}

impl ScanReport {
    pub fn sells_placed(&self) -> usize {
        self.sells.iter().filter(|d| d.is_sold()).count()
    }

    pub fn buys_placed(&self) -> usize {
        self.buys.orders.len()
    }

    /// Running balance left after the buy pass.
    pub fn balance_after(&self) -> Decimal {
        self.buys.balance
    }

    pub fn total_sold(&self) -> Decimal {
        total_sold(&self.sells)
    }
}

/// Runs scans against a brokerage and a market-data feed.
pub struct Scanner {
    brokerage: Arc<dyn Brokerage>,
    market_data: Arc<dyn MarketDataProvider>,
    trading: TradingConfig,
    feed: MarketDataConfig,
}

impl Scanner {
    pub fn new(
        brokerage: Arc<dyn Brokerage>,
        market_data: Arc<dyn MarketDataProvider>,
        trading: TradingConfig,
        feed: MarketDataConfig,
    ) -> Self {
        Self {
            brokerage,
            market_data,
            trading,
            feed,
        }
    }

    pub fn trading(&self) -> &TradingConfig {
        &self.trading
    }

    /// Run one scan. `today` is the exchange-local date, used for the
    /// dividend horizon.
    pub async fn scan_market(&self, today: NaiveDate) -> Result<ScanReport> {
        let started_at = Utc::now();

        let snapshot = self
            .brokerage
            .get_profile()
            .await
            .context("Failed to fetch account profile")?;
        let companies = self
            .brokerage
            .get_companies()
            .await
            .context("Failed to fetch companies")?;

        let already_invested = snapshot.invested_ids();
        info!(
            balance = format!("${:.2}", snapshot.wallet_balance),
            holdings = snapshot.holdings.len(),
            companies = companies.len(),
            dividends_due = snapshot.upcoming_dividends.len(),
            "Account snapshot taken"
        );

        let ctx = ScanContext {
            brokerage: self.brokerage.as_ref(),
            market_data: self.market_data.as_ref(),
            trading: &self.trading,
            feed: &self.feed,
            today,
        };

        // it's show time
        let sells = perform_selling(
            &ctx,
            &snapshot.holdings,
            &companies,
            &snapshot.upcoming_dividends,
        )
        .await?;
        let buys =
            perform_buying(&ctx, &companies, &already_invested, snapshot.wallet_balance).await?;

        Ok(ScanReport {
            started_at,
            holdings: snapshot.holdings.len(),
            companies: companies.len(),
            dividends_due: snapshot.upcoming_dividends.len(),
            balance_before: snapshot.wallet_balance,
            sells,
            buys,
        })
    }
}
