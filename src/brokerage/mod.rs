//! Brokerage integrations.
//!
//! Defines the `Brokerage` trait and provides implementations for:
//! - Sharesies: the live account (HTTP session, cookie auth)
//! - Paper: dry-run wrapper that reads from a real brokerage but only
//!   logs orders

pub mod paper;
pub mod sharesies;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::Credentials;
use crate::types::{AccountSnapshot, Company, Holding, TradeReceipt};

/// Abstraction over a share brokerage account.
///
/// Read calls return point-in-time snapshots; order calls hand an
/// instruction to the brokerage and return its acknowledgement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Brokerage: Send + Sync {
    /// Start a session. `Ok(false)` means the credentials were rejected.
    async fn login(&self, credentials: &Credentials) -> Result<bool>;

    /// Wallet balance, holdings and upcoming dividends.
    async fn get_profile(&self) -> Result<AccountSnapshot>;

    /// Every company available to trade.
    async fn get_companies(&self) -> Result<Vec<Company>>;

    /// Sell `shares` of a holding.
    async fn sell(&self, holding: &Holding, shares: Decimal) -> Result<TradeReceipt>;

    /// Spend `amount` on a company.
    async fn buy(&self, company: &Company, amount: Decimal) -> Result<TradeReceipt>;
}
