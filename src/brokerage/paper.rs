//! Dry-run brokerage.
//!
//! Wraps a real brokerage so scans see the live account and universe,
//! but orders are only logged and acknowledged locally.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use super::Brokerage;
use crate::config::Credentials;
use crate::types::{AccountSnapshot, Company, Holding, OrderSide, TradeReceipt};

pub struct PaperBrokerage<B> {
    inner: B,
    orders: Mutex<Vec<TradeReceipt>>,
}

impl<B: Brokerage> PaperBrokerage<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Orders acknowledged so far.
    pub fn orders(&self) -> Vec<TradeReceipt> {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, receipt: TradeReceipt) -> TradeReceipt {
        self.orders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(receipt.clone());
        receipt
    }
}

#[async_trait]
impl<B: Brokerage> Brokerage for PaperBrokerage<B> {
    async fn login(&self, credentials: &Credentials) -> Result<bool> {
        self.inner.login(credentials).await
    }

    async fn get_profile(&self) -> Result<AccountSnapshot> {
        self.inner.get_profile().await
    }

    async fn get_companies(&self) -> Result<Vec<Company>> {
        self.inner.get_companies().await
    }

    async fn sell(&self, holding: &Holding, shares: Decimal) -> Result<TradeReceipt> {
        info!(
            fund_id = %holding.fund_id,
            shares = %shares,
            value = format!("${:.2}", holding.value),
            "[DRY RUN] Would sell"
        );
        Ok(self.record(TradeReceipt::dry_run(
            &holding.fund_id,
            OrderSide::Sell,
            holding.value,
            Some(shares),
        )))
    }

    async fn buy(&self, company: &Company, amount: Decimal) -> Result<TradeReceipt> {
        info!(
            code = %company.code,
            amount = format!("${:.2}", amount),
            "[DRY RUN] Would buy"
        );
        Ok(self.record(TradeReceipt::dry_run(&company.id, OrderSide::Buy, amount, None)))
    }
}
