//! STOCKWATCH: market-hours-aware buy/sell scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! logs in to the brokerage and runs the trade loop until Ctrl+C.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use stockwatch::brokerage::paper::PaperBrokerage;
use stockwatch::brokerage::sharesies::SharesiesClient;
use stockwatch::brokerage::Brokerage;
use stockwatch::config::AppConfig;
use stockwatch::data::yahoo::YahooChartClient;
use stockwatch::engine::scanner::Scanner;
use stockwatch::engine::scheduler::Scheduler;
use stockwatch::strategy::TradingHours;
use stockwatch::types::StockwatchError;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("STOCKWATCH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        sell_profit_margin = %cfg.trading.sell_profit_margin,
        buy_amount = %cfg.trading.buy_amount,
        minimum_stock_price = %cfg.trading.minimum_stock_price,
        dividends_bonus = %cfg.trading.dividends_bonus,
        scan_interval_mins = cfg.trading.scan_interval_mins,
        dry_run = cfg.trading.dry_run,
        "Loaded config"
    );

    // -- Initialise components -------------------------------------------

    let hours = TradingHours::from_config(&cfg.market)?;
    let credentials = cfg.credentials()?;

    let sharesies = SharesiesClient::new(Some(&cfg.brokerage.base_url))?;
    let brokerage: Arc<dyn Brokerage> = if cfg.trading.dry_run {
        warn!("Dry run enabled: orders will be logged, not placed");
        Arc::new(PaperBrokerage::new(sharesies))
    } else {
        Arc::new(sharesies)
    };

    if brokerage.login(&credentials).await? {
        info!("Connected to Sharesies");
    } else {
        let err = StockwatchError::Authentication {
            service: "sharesies".to_string(),
            message: "credentials rejected".to_string(),
        };
        error!(error = %err, "Failed to login");
        return Err(err.into());
    }

    let market_data = Arc::new(YahooChartClient::new(Some(&cfg.market_data.base_url))?);
    let scanner = Scanner::new(
        brokerage,
        market_data,
        cfg.trading.clone(),
        cfg.market_data.clone(),
    );

    // -- Main loop -------------------------------------------------------

    let mut scheduler = Scheduler::new(scanner, hours);
    let cancel = scheduler.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received.");
            cancel.cancel();
        }
    });

    info!("Entering main loop. Press Ctrl+C to stop.");
    scheduler.run().await;

    info!("STOCKWATCH shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stockwatch=info"));

    if std::env::var("STOCKWATCH_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
