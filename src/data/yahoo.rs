//! Yahoo Finance chart data provider.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{symbol}`
//! Params: `range` (trailing window, e.g. "1mo"), `interval` (e.g. "15m").
//! Auth: None required.
//!
//! Closes can be `null` for intervals with no trades; those samples are
//! dropped.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::MarketDataProvider;
use crate::types::{PriceHistory, PricePoint, StockwatchError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const SERVICE_NAME: &str = "yahoo";

// ---------------------------------------------------------------------------
// Chart API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

pub struct YahooChartClient {
    http: Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new(base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (STOCKWATCH/0.1.0)")
            .build()
            .context("Failed to build Yahoo HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        })
    }

    /// Turn a chart payload into an ordered price history.
    fn to_history(symbol: &str, resp: ChartResponse) -> Result<PriceHistory, StockwatchError> {
        if let Some(err) = resp.chart.error {
            return Err(StockwatchError::DataUnavailable(format!(
                "{symbol} ({}: {})",
                err.code, err.description
            )));
        }

        let result = resp
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| StockwatchError::DataUnavailable(symbol.to_string()))?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut points: Vec<PricePoint> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let price = Decimal::from_f64_retain(close?)?.round_dp(4);
                let timestamp = Utc.timestamp_opt(*ts, 0).single()?;
                Some(PricePoint { timestamp, price })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        Ok(PriceHistory::new(symbol, points))
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartClient {
    async fn get_price_history(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<PriceHistory> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url,
            urlencoding::encode(symbol),
            urlencoding::encode(period),
            urlencoding::encode(interval),
        );
        debug!(url = %url, "Fetching price history");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Yahoo chart request failed for {symbol}"))?;

        // Unknown symbols come back as 404 with a chart error body.
        let status = resp.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Err(StockwatchError::Network {
                service: SERVICE_NAME.to_string(),
                message: format!("chart {symbol} returned {status}: {body}"),
            }
            .into());
        }

        let chart: ChartResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Yahoo chart for {symbol}"))?;

        let history = Self::to_history(symbol, chart)?;
        debug!(symbol, samples = history.len(), "Price history fetched");
        Ok(history)
    }
}
