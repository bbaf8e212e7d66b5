//! Trading scheduler, the main loop.
//!
//! Every iteration re-checks the trading calendar: while the market is
//! open it scans and sleeps for the scan interval, otherwise it sleeps
//! until the next open. Scan failures are logged and the loop carries
//! on. A cancellation token is checked before each iteration and raced
//! against every sleep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::scanner::{ScanReport, Scanner};
use crate::strategy::TradingHours;

/// Where the loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    WaitingForOpen,
    Scanning,
}

pub struct Scheduler {
    scanner: Scanner,
    hours: TradingHours,
    scan_interval: Duration,
    state: SchedulerState,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(scanner: Scanner, hours: TradingHours) -> Self {
        let scan_interval = scanner.trading().scan_interval();
        Self {
            scanner,
            hours,
            scan_interval,
            state: SchedulerState::WaitingForOpen,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Run until cancelled.
    pub async fn run(&mut self) {
        info!(
            interval_mins = self.scan_interval.as_secs() / 60,
            timezone = %self.hours.timezone(),
            "Entering trade loop"
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let wait = self.step(Utc::now()).await;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("Trade loop stopped");
    }

    /// One iteration at `now`: scan if the market is open. Returns how
    /// long to sleep before the next iteration.
    pub async fn step(&mut self, now: DateTime<Utc>) -> Duration {
        if !self.hours.is_open(now) {
            let minutes_till_open = self.hours.minutes_until_trading(now);
            self.state = SchedulerState::WaitingForOpen;
            info!(
                reopens_in_hours = format!("{:.2}", minutes_till_open as f64 / 60.0),
                "Market is closed, waiting till it reopens"
            );
            return Duration::from_secs(minutes_till_open.unsigned_abs() * 60);
        }

        self.state = SchedulerState::Scanning;
        info!(
            closes_in_mins = ?self.hours.minutes_until_close(now),
            "Market is currently open"
        );

        let today = now.with_timezone(&self.hours.timezone()).date_naive();
        match self.scanner.scan_market(today).await {
            Ok(report) => log_scan_report(&report),
            Err(e) => error!(error = format!("{e:#}"), "Scan failed, continuing to next cycle"),
        }

        info!(
            next_scan_mins = self.scan_interval.as_secs() / 60,
            "Scanned market"
        );
        self.scan_interval
    }
}

/// Log a human-readable scan summary.
fn log_scan_report(report: &ScanReport) {
    info!(
        holdings = report.holdings,
        companies = report.companies,
        dividends_due = report.dividends_due,
        sells = report.sells_placed(),
        sold = format!("${:.2}", report.total_sold()),
        buys = report.buys_placed(),
        committed = format!("${:.2}", report.buys.total_committed()),
        balance_before = format!("${:.2}", report.balance_before),
        balance_after = format!("${:.2}", report.balance_after()),
        stop = ?report.buys.stop,
        elapsed_ms = (Utc::now() - report.started_at).num_milliseconds(),
        "Scan complete"
    );
}
