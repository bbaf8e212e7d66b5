//! Sharesies brokerage integration.
//!
//! Session-based JSON API. Login sets a session cookie which the
//! cookie-enabled `reqwest` client replays on every later call; orders
//! additionally carry the logged-in user's id as `acting_as_id`.
//!
//! Base URL: https://app.sharesies.nz/api
//! Amounts and share quantities arrive as decimal strings.

use std::sync::RwLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Brokerage;
use crate::config::Credentials;
use crate::types::{
    AccountSnapshot, Company, Dividend, Holding, OrderSide, StockwatchError, TradeReceipt,
    UpcomingDividends,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://app.sharesies.nz/api";
const SERVICE_NAME: &str = "sharesies";

// ---------------------------------------------------------------------------
// API types (Sharesies JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    remember: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    authenticated: bool,
    #[serde(default)]
    user: Option<SharesiesUser>,
    /// Set on refusal, e.g. "identity_email_mfa_required".
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharesiesUser {
    id: String,
    #[serde(default)]
    wallet_balance: Decimal,
}

/// `/identity/check`: the whole account in one payload.
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: SharesiesUser,
    #[serde(default)]
    portfolio: Vec<SharesiesHolding>,
    #[serde(default)]
    upcoming_dividends: Vec<SharesiesUpcomingDividend>,
}

#[derive(Debug, Deserialize)]
struct SharesiesHolding {
    fund_id: String,
    contribution: Decimal,
    value: Decimal,
    shares: Decimal,
}

#[derive(Debug, Deserialize)]
struct SharesiesUpcomingDividend {
    fund_id: String,
}

#[derive(Debug, Deserialize)]
struct FundListResponse {
    #[serde(default)]
    funds: Vec<SharesiesFund>,
}

#[derive(Debug, Deserialize)]
struct SharesiesFund {
    id: String,
    code: String,
    market_price: Decimal,
    #[serde(default)]
    dividends: Vec<SharesiesDividend>,
}

#[derive(Debug, Deserialize)]
struct SharesiesDividend {
    ex_dividend_date: NaiveDate,
    #[serde(default)]
    amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct BuyRequest<'a> {
    acting_as_id: &'a str,
    fund_id: &'a str,
    amount: String,
}

#[derive(Debug, Serialize)]
struct SellRequest<'a> {
    acting_as_id: &'a str,
    fund_id: &'a str,
    shares: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Sharesies brokerage client.
pub struct SharesiesClient {
    http: Client,
    base_url: String,
    /// User id from the last successful login.
    user_id: RwLock<Option<String>>,
}

impl SharesiesClient {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .cookie_store(true)
            .user_agent("STOCKWATCH/0.1.0")
            .build()
            .context("Failed to build HTTP client for Sharesies")?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            user_id: RwLock::new(None),
        })
    }

    // -- Internal helpers ------------------------------------------------

    fn acting_as(&self) -> Result<String> {
        let guard = self.user_id.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or_else(|| {
            StockwatchError::Authentication {
                service: SERVICE_NAME.to_string(),
                message: "not logged in".to_string(),
            }
            .into()
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "Sharesies GET");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Sharesies {path} request failed"))?;
        Self::read_json(resp, path).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}/{path}", self.base_url);
        debug!(url = %url, "Sharesies POST");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Sharesies {path} request failed"))?;
        Self::read_json(resp, path).await
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response, path: &str) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StockwatchError::Network {
                service: SERVICE_NAME.to_string(),
                message: format!("{path} returned {status}: {body}"),
            }
            .into());
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Sharesies {path} response"))
    }

    // -- Conversions -----------------------------------------------------

    fn to_snapshot(profile: ProfileResponse) -> AccountSnapshot {
        AccountSnapshot {
            wallet_balance: profile.user.wallet_balance,
            holdings: profile
                .portfolio
                .into_iter()
                .map(|h| Holding {
                    fund_id: h.fund_id,
                    contribution: h.contribution,
                    value: h.value,
                    shares: h.shares,
                })
                .collect(),
            upcoming_dividends: profile
                .upcoming_dividends
                .into_iter()
                .map(|d| d.fund_id)
                .collect(),
        }
    }

    fn to_company(fund: SharesiesFund) -> Company {
        Company {
            id: fund.id,
            code: fund.code,
            market_price: fund.market_price,
            dividends: fund
                .dividends
                .into_iter()
                .map(|d| Dividend {
                    ex_date: d.ex_dividend_date,
                    amount: d.amount,
                })
                .collect(),
        }
    }

    fn receipt(
        resp: OrderResponse,
        fund_id: &str,
        side: OrderSide,
        amount: Decimal,
        shares: Option<Decimal>,
    ) -> TradeReceipt {
        TradeReceipt {
            order_id: resp.order_id.or(resp.id).unwrap_or_default(),
            fund_id: fund_id.to_string(),
            side,
            amount,
            shares,
            dry_run: false,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Brokerage trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl Brokerage for SharesiesClient {
    async fn login(&self, credentials: &Credentials) -> Result<bool> {
        info!(user = %credentials.username, "Logging in to Sharesies");

        let body = LoginRequest {
            email: &credentials.username,
            password: credentials.password.expose_secret(),
            remember: true,
        };
        let resp: LoginResponse = self.post_json("identity/login", &body).await?;

        let user = match (resp.authenticated, resp.user) {
            (true, Some(user)) => user,
            (_, _) => {
                warn!(reason = ?resp.kind, "Sharesies login refused");
                return Ok(false);
            }
        };

        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = Some(user.id);
        info!("Sharesies authentication successful");
        Ok(true)
    }

    async fn get_profile(&self) -> Result<AccountSnapshot> {
        let profile: ProfileResponse = self.get_json("identity/check").await?;
        let snapshot = Self::to_snapshot(profile);
        debug!(
            balance = %snapshot.wallet_balance,
            holdings = snapshot.holdings.len(),
            dividends_due = snapshot.upcoming_dividends.len(),
            "Profile fetched"
        );
        Ok(snapshot)
    }

    async fn get_companies(&self) -> Result<Vec<Company>> {
        let list: FundListResponse = self.get_json("fund/list").await?;
        let companies: Vec<Company> = list.funds.into_iter().map(Self::to_company).collect();
        debug!(count = companies.len(), "Companies fetched");
        Ok(companies)
    }

    async fn sell(&self, holding: &Holding, shares: Decimal) -> Result<TradeReceipt> {
        let acting_as_id = self.acting_as()?;
        let body = SellRequest {
            acting_as_id: &acting_as_id,
            fund_id: &holding.fund_id,
            shares: shares.to_string(),
        };
        let resp: OrderResponse = self.post_json("fund/sell", &body).await?;
        Ok(Self::receipt(
            resp,
            &holding.fund_id,
            OrderSide::Sell,
            holding.value,
            Some(shares),
        ))
    }

    async fn buy(&self, company: &Company, amount: Decimal) -> Result<TradeReceipt> {
        let acting_as_id = self.acting_as()?;
        let body = BuyRequest {
            acting_as_id: &acting_as_id,
            fund_id: &company.id,
            amount: amount.round_dp(2).to_string(),
        };
        let resp: OrderResponse = self.post_json("fund/buy", &body).await?;
        Ok(Self::receipt(resp, &company.id, OrderSide::Buy, amount, None))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
