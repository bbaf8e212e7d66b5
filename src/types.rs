//! Shared types for the STOCKWATCH scanner.
//!
//! These types form the data model used across all modules. Brokerage
//! and market-data clients map their wire formats into them; the
//! strategy and engine modules only ever read them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A position currently owned in the brokerage account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub fund_id: String,
    /// Total cost basis of the position.
    pub contribution: Decimal,
    /// Current market value of the position.
    pub value: Decimal,
    pub shares: Decimal,
}

impl Holding {
    /// Gain (or loss) on the position in money terms.
    pub fn gain(&self) -> Decimal {
        self.value - self.contribution
    }
}

/// Fund ids with a dividend due inside the brokerage-reported horizon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingDividends(HashSet<String>);

impl UpcomingDividends {
    pub fn contains(&self, fund_id: &str) -> bool {
        self.0.contains(fund_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for UpcomingDividends {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Point-in-time view of the account. Fetched once per scan; every
/// decision in that scan reads from the same snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub wallet_balance: Decimal,
    pub holdings: Vec<Holding>,
    pub upcoming_dividends: UpcomingDividends,
}

impl AccountSnapshot {
    /// Ids of everything currently held, used to avoid double investing.
    pub fn invested_ids(&self) -> HashSet<String> {
        self.holdings.iter().map(|h| h.fund_id.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Universe
// ---------------------------------------------------------------------------

/// A declared dividend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub ex_date: NaiveDate,
    pub amount: Option<Decimal>,
}

/// A tradable instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    /// Exchange ticker, e.g. "AIR".
    pub code: String,
    pub market_price: Decimal,
    #[serde(default)]
    pub dividends: Vec<Dividend>,
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ ${:.2}", self.code, self.market_price)
    }
}

/// Resolve a fund id to its ticker code.
pub fn code_for<'a>(fund_id: &str, universe: &'a [Company]) -> Result<&'a str, StockwatchError> {
    universe
        .iter()
        .find(|c| c.id == fund_id)
        .map(|c| c.code.as_str())
        .ok_or_else(|| StockwatchError::Lookup(fund_id.to_string()))
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// A single price sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Ordered price samples over a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Highest price in the window, `None` when there is no data.
    pub fn high(&self) -> Option<Decimal> {
        self.points.iter().map(|p| p.price).max()
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Acknowledgement of an order handed to the brokerage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub order_id: String,
    pub fund_id: String,
    pub side: OrderSide,
    /// Money committed (buys) or market value sold (sells).
    pub amount: Decimal,
    /// Share quantity for sells; `None` for cost-based buys.
    pub shares: Option<Decimal>,
    pub dry_run: bool,
    pub timestamp: DateTime<Utc>,
}

impl TradeReceipt {
    /// Receipt for an order that was logged but never sent.
    pub fn dry_run(fund_id: &str, side: OrderSide, amount: Decimal, shares: Option<Decimal>) -> Self {
        Self {
            order_id: format!("dry-run-{}", uuid::Uuid::new_v4()),
            fund_id: fund_id.to_string(),
            side,
            amount,
            shares,
            dry_run: true,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for STOCKWATCH.
#[derive(Debug, thiserror::Error)]
pub enum StockwatchError {
    #[error("Authentication failed ({service}): {message}")]
    Authentication { service: String, message: String },

    #[error("No company found for fund id {0}")]
    Lookup(String),

    #[error("Insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("No price data available for {0}")]
    DataUnavailable(String),

    #[error("Network error ({service}): {message}")]
    Network { service: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
