//! Exchange trading hours.
//!
//! A fixed weekly calendar in the exchange's own timezone: trading days,
//! a local open time and a local close time. No holiday calendar.
//! Local times are resolved through the timezone for each day, so
//! daylight-saving changes shift the UTC open and close correctly.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::MarketConfig;
use crate::types::StockwatchError;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Weekly trading window of one exchange.
#[derive(Debug, Clone)]
pub struct TradingHours {
    tz: Tz,
    open: NaiveTime,
    close: NaiveTime,
    days: Vec<Weekday>,
}

impl TradingHours {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime, days: Vec<Weekday>) -> Self {
        Self {
            tz,
            open,
            close,
            days,
        }
    }

    /// New Zealand Exchange: 10:00 to 16:45 Auckland time, Monday to Friday.
    pub fn nzx() -> Self {
        Self::new(
            chrono_tz::Pacific::Auckland,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            NaiveTime::from_hms_opt(16, 45, 0).unwrap_or_default(),
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        )
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self, StockwatchError> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|_| StockwatchError::Config(format!("unknown timezone: {}", config.timezone)))?;
        Ok(Self::new(
            tz,
            config.open,
            config.close,
            config.trading_days.clone(),
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Minutes until the market next opens, or 0 while it is open.
    ///
    /// Open means `open <= local time < close` on a trading day, so at the
    /// exact close this already reports the wait until the next session.
    /// Partial minutes round up; a closed market never reports 0.
    pub fn minutes_until_trading(&self, now: DateTime<Utc>) -> i64 {
        let today = now.with_timezone(&self.tz).date_naive();

        // A week ahead always reaches the next trading day.
        for offset in 0..=7 {
            let day = today + Duration::days(offset);
            let Some((open, close)) = self.session(day) else {
                continue;
            };
            if now < open {
                return ceil_minutes(open - now);
            }
            if now < close {
                return 0;
            }
        }

        MINUTES_PER_DAY
    }

    /// Minutes left in the current session, `None` while closed.
    pub fn minutes_until_close(&self, now: DateTime<Utc>) -> Option<i64> {
        let today = now.with_timezone(&self.tz).date_naive();
        let (open, close) = self.session(today)?;
        (open <= now && now < close).then(|| ceil_minutes(close - now))
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.minutes_until_trading(now) == 0
    }

    /// UTC open and close for a local calendar day, if it trades.
    fn session(&self, day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if !self.days.contains(&day.weekday()) {
            return None;
        }
        let open = self.resolve(day, self.open)?;
        let close = self.resolve(day, self.close)?;
        Some((open, close))
    }

    fn resolve(&self, day: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

fn ceil_minutes(d: Duration) -> i64 {
    let ms = d.num_milliseconds().max(0);
    ((ms + 59_999) / 60_000).max(1)
}
