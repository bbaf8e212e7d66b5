//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Brokerage credentials are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::StockwatchError;

/// Longest allowed pause between scans: one day.
pub const MAX_SCAN_INTERVAL_MINS: u64 = 24 * 60;
/// Longest allowed dividend look-ahead: ten years.
pub const MAX_DIVIDEND_HORIZON_DAYS: i64 = 3650;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub trading: TradingConfig,
    pub market: MarketConfig,
    pub market_data: MarketDataConfig,
    pub brokerage: BrokerageConfig,
}

/// Decision thresholds shared by the screeners.
#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    /// Gain ratio at which a holding is sold (0.2 = +20%).
    pub sell_profit_margin: Decimal,
    /// Base amount spent per purchase. Also the floor below which the
    /// buy phase stops.
    pub buy_amount: Decimal,
    /// Companies priced below this are never bought.
    pub minimum_stock_price: Decimal,
    /// Multiplier applied to `buy_amount` when a dividend is close.
    pub dividends_bonus: Decimal,
    pub scan_interval_mins: u64,
    /// Fraction below the recent high a price must sit to count as a bargain.
    #[serde(default = "default_bargain_threshold")]
    pub bargain_threshold: Decimal,
    #[serde(default = "default_dividend_horizon_days")]
    pub dividend_horizon_days: i64,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_bargain_threshold() -> Decimal {
    dec!(0.10)
}

fn default_dividend_horizon_days() -> i64 {
    14
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            sell_profit_margin: dec!(0.20),
            buy_amount: dec!(50),
            minimum_stock_price: dec!(1),
            dividends_bonus: dec!(1.5),
            scan_interval_mins: 15,
            bargain_threshold: default_bargain_threshold(),
            dividend_horizon_days: default_dividend_horizon_days(),
            dry_run: false,
        }
    }
}

impl TradingConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_mins.saturating_mul(60))
    }
}

/// Exchange trading calendar.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// IANA timezone name of the exchange, e.g. "Pacific/Auckland".
    pub timezone: String,
    /// Local open time, "HH:MM:SS".
    pub open: NaiveTime,
    /// Local close time, "HH:MM:SS".
    pub close: NaiveTime,
    #[serde(default = "default_trading_days")]
    pub trading_days: Vec<Weekday>,
}

fn default_trading_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketDataConfig {
    pub base_url: String,
    /// Appended to company codes to form the feed symbol (".NZ" for NZX).
    #[serde(default)]
    pub symbol_suffix: String,
    /// Trailing window, e.g. "1mo".
    pub period: String,
    /// Sample spacing, e.g. "15m".
    pub interval: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerageConfig {
    pub base_url: String,
    pub username_env: String,
    pub password_env: String,
}

/// Resolved brokerage login.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the screeners cannot work with.
    pub fn validate(&self) -> Result<(), StockwatchError> {
        let t = &self.trading;
        if t.buy_amount <= Decimal::ZERO {
            return Err(StockwatchError::Config("buy_amount must be positive".into()));
        }
        if t.minimum_stock_price < Decimal::ZERO {
            return Err(StockwatchError::Config(
                "minimum_stock_price must not be negative".into(),
            ));
        }
        if t.dividends_bonus < Decimal::ONE {
            return Err(StockwatchError::Config("dividends_bonus must be >= 1".into()));
        }
        if t.bargain_threshold < Decimal::ZERO || t.bargain_threshold >= Decimal::ONE {
            return Err(StockwatchError::Config(
                "bargain_threshold must be in [0, 1)".into(),
            ));
        }
        if t.scan_interval_mins == 0 || t.scan_interval_mins > MAX_SCAN_INTERVAL_MINS {
            return Err(StockwatchError::Config(format!(
                "scan_interval_mins must be in 1..={MAX_SCAN_INTERVAL_MINS}"
            )));
        }
        if !(0..=MAX_DIVIDEND_HORIZON_DAYS).contains(&t.dividend_horizon_days) {
            return Err(StockwatchError::Config(format!(
                "dividend_horizon_days must be in 0..={MAX_DIVIDEND_HORIZON_DAYS}"
            )));
        }

        let m = &self.market;
        if m.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(StockwatchError::Config(format!(
                "unknown timezone: {}",
                m.timezone
            )));
        }
        if m.open >= m.close {
            return Err(StockwatchError::Config("market open must be before close".into()));
        }
        if m.trading_days.is_empty() {
            return Err(StockwatchError::Config("trading_days must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve brokerage credentials from the environment.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            username: Self::resolve_env(&self.brokerage.username_env)?,
            password: SecretString::new(Self::resolve_env(&self.brokerage.password_env)?),
        })
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
