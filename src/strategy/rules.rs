//! Buy and sell rules.
//!
//! Pure threshold checks with no I/O. The screeners in `engine` decide
//! what to do with the answers.

use rust_decimal::Decimal;
use tracing::trace;

use crate::types::PriceHistory;

/// Whether a position has gained at least `margin` over its cost basis.
///
/// Gain ratio is `(current_value - cost_basis) / cost_basis`. A zero (or
/// negative) cost basis has no meaningful ratio and never sells.
pub fn should_sell(cost_basis: Decimal, current_value: Decimal, margin: Decimal) -> bool {
    if cost_basis <= Decimal::ZERO {
        return false;
    }
    let gain_ratio = (current_value - cost_basis) / cost_basis;
    trace!(%cost_basis, %current_value, %gain_ratio, %margin, "Sell check");
    gain_ratio >= margin
}

/// Whether `price` is a bargain against recent history.
///
/// The reference level is the highest price in the window. A bargain is a
/// price at least `bargain_threshold` below that high:
/// `price <= high * (1 - bargain_threshold)`. No history means no buy.
pub fn should_buy(price: Decimal, history: &PriceHistory, bargain_threshold: Decimal) -> bool {
    let Some(high) = history.high() else {
        return false;
    };
    let ceiling = high * (Decimal::ONE - bargain_threshold);
    trace!(symbol = %history.symbol, %price, %high, %ceiling, "Bargain check");
    price <= ceiling
}
