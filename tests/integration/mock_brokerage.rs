//! In-memory brokerage and market data for integration testing.
//!
//! Deterministic `Brokerage` and `MarketDataProvider` implementations
//! that serve a fixed account and universe, record every order, and can
//! be told to fail. No network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use stockwatch::brokerage::Brokerage;
use stockwatch::config::Credentials;
use stockwatch::data::MarketDataProvider;
use stockwatch::types::*;

/// A mock brokerage account. All state is shared behind `Arc`s so a
/// clone handed to the scanner and the one kept by the test see the
/// same orders.
#[derive(Clone, Default)]
pub struct MockBrokerageAccount {
    snapshot: Arc<Mutex<AccountSnapshot>>,
    companies: Arc<Mutex<Vec<Company>>>,
    orders: Arc<Mutex<Vec<TradeReceipt>>>,
    password: Arc<Mutex<String>>,
    /// If set, all operations will return this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockBrokerageAccount {
    pub fn new(snapshot: AccountSnapshot, companies: Vec<Company>) -> Self {
        let account = Self::default();
        *account.snapshot.lock().unwrap() = snapshot;
        *account.companies.lock().unwrap() = companies;
        *account.password.lock().unwrap() = "hunter2".to_string();
        account
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    pub fn orders(&self) -> Vec<TradeReceipt> {
        self.orders.lock().unwrap().clone()
    }

    pub fn orders_of(&self, side: OrderSide) -> Vec<TradeReceipt> {
        self.orders()
            .into_iter()
            .filter(|o| o.side == side)
            .collect()
    }

    fn check_error(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(anyhow!(StockwatchError::Network {
                service: "mock".to_string(),
                message: msg.clone(),
            })),
            None => Ok(()),
        }
    }

    fn record(&self, receipt: TradeReceipt) -> TradeReceipt {
        self.orders.lock().unwrap().push(receipt.clone());
        receipt
    }
}

#[async_trait]
impl Brokerage for MockBrokerageAccount {
    async fn login(&self, credentials: &Credentials) -> Result<bool> {
        use secrecy::ExposeSecret;
        self.check_error()?;
        Ok(credentials.password.expose_secret() == &*self.password.lock().unwrap())
    }

    async fn get_profile(&self) -> Result<AccountSnapshot> {
        self.check_error()?;
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn get_companies(&self) -> Result<Vec<Company>> {
        self.check_error()?;
        Ok(self.companies.lock().unwrap().clone())
    }

    async fn sell(&self, holding: &Holding, shares: Decimal) -> Result<TradeReceipt> {
        self.check_error()?;
        let n = self.orders.lock().unwrap().len();
        Ok(self.record(TradeReceipt {
            order_id: format!("MOCK-{n}"),
            fund_id: holding.fund_id.clone(),
            side: OrderSide::Sell,
            amount: holding.value,
            shares: Some(shares),
            dry_run: false,
            timestamp: Utc::now(),
        }))
    }

    async fn buy(&self, company: &Company, amount: Decimal) -> Result<TradeReceipt> {
        self.check_error()?;
        let n = self.orders.lock().unwrap().len();
        Ok(self.record(TradeReceipt {
            order_id: format!("MOCK-{n}"),
            fund_id: company.id.clone(),
            side: OrderSide::Buy,
            amount,
            shares: None,
            dry_run: false,
            timestamp: Utc::now(),
        }))
    }
}

/// A mock price feed: one flat-ish history per symbol, plus a log of
/// which symbols were requested.
#[derive(Clone, Default)]
pub struct MockMarketData {
    highs: Arc<Mutex<HashMap<String, Decimal>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockMarketData {
    /// Serve a two-sample history peaking at `high` for `symbol`.
    pub fn with_high(self, symbol: &str, high: Decimal) -> Self {
        self.highs.lock().unwrap().insert(symbol.to_string(), high);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn get_price_history(
        &self,
        symbol: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<PriceHistory> {
        self.requests.lock().unwrap().push(symbol.to_string());
        let high = self
            .highs
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| StockwatchError::DataUnavailable(symbol.to_string()))?;

        let now = Utc::now();
        Ok(PriceHistory::new(
            symbol,
            vec![
                PricePoint {
                    timestamp: now - Duration::minutes(15),
                    price: high,
                },
                PricePoint {
                    timestamp: now,
                    price: high * Decimal::new(95, 2),
                },
            ],
        ))
    }
}
