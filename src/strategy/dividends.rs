//! Dividend timing.
//!
//! Only feeds the buy-side sizing bonus. Sell deferral uses the
//! brokerage's own upcoming-dividend list, which is a separate signal.

use chrono::{Duration, NaiveDate};

use crate::types::Dividend;

/// Whether any ex-date in `schedule` falls in `[today, today + horizon_days]`.
///
/// A horizon that runs past the end of the calendar counts as no
/// dividend soon.
pub fn dividends_soon(schedule: &[Dividend], today: NaiveDate, horizon_days: i64) -> bool {
    let Some(horizon_end) =
        Duration::try_days(horizon_days).and_then(|h| today.checked_add_signed(h))
    else {
        return false;
    };
    schedule
        .iter()
        .any(|d| d.ex_date >= today && d.ex_date <= horizon_end)
}
