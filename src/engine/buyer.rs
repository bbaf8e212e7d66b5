//! Buy screener.
//!
//! Walks the universe in the order the brokerage lists it and applies,
//! in order: balance floor, already-held, price floor, dividend bonus,
//! bargain check, affordability. The running balance is threaded through
//! the pass and returned; the real wallet only moves once the brokerage
//! settles the orders.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::ScanContext;
use crate::strategy::{dividends_soon, should_buy};
use crate::types::{Company, PriceHistory, StockwatchError, TradeReceipt};

/// A purchase handed to the brokerage.
#[derive(Debug, Clone)]
pub struct BuyOrder {
    pub company_id: String,
    pub symbol: String,
    pub amount: Decimal,
    /// Whether the dividend bonus scaled this order.
    pub dividend_bonus: bool,
    pub receipt: TradeReceipt,
}

/// Why a candidate was passed over.
#[derive(Debug, Clone, PartialEq)]
pub enum BuySkip {
    AlreadyHeld,
    PennyStock { price: Decimal },
    NoPriceData,
    NotABargain { price: Decimal, high: Decimal },
}

/// Why the pass ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyStop {
    /// Every candidate was considered.
    EndOfUniverse,
    /// Running balance fell below the base buy amount.
    BalanceExhausted,
    /// A bargain was found that the running balance cannot cover.
    InsufficientFunds { needed: Decimal, available: Decimal },
}

/// Outcome of one buy pass.
#[derive(Debug, Clone)]
pub struct BuyPass {
    /// Running balance after all orders in this pass.
    pub balance: Decimal,
    pub orders: Vec<BuyOrder>,
    pub skipped: Vec<(String, BuySkip)>,
    pub stop: BuyStop,
}

impl BuyPass {
    pub fn total_committed(&self) -> Decimal {
        self.orders.iter().map(|o| o.amount).sum()
    }
}

/// Order size for a company: the base amount, scaled by the dividend
/// bonus when an ex-date is close. Always computed from the base.
pub fn buy_amount_for(ctx: &ScanContext<'_>, company: &Company) -> (Decimal, bool) {
    let base = ctx.trading.buy_amount;
    let bonus = ctx.trading.dividends_bonus;
    let soon = dividends_soon(&company.dividends, ctx.today, ctx.trading.dividend_horizon_days);
    if soon && bonus > Decimal::ONE {
        (base * bonus, true)
    } else {
        (base, false)
    }
}

async fn price_history(ctx: &ScanContext<'_>, symbol: &str) -> Result<PriceHistory> {
    let result = ctx
        .market_data
        .get_price_history(symbol, &ctx.feed.period, &ctx.feed.interval)
        .await;

    match result {
        Ok(history) => Ok(history),
        Err(e) => {
            let unavailable = matches!(
                e.downcast_ref::<StockwatchError>(),
                Some(StockwatchError::DataUnavailable(_))
            );
            if unavailable {
                debug!(symbol, error = %e, "No price data");
                Ok(PriceHistory::empty(symbol))
            } else {
                Err(e.context(format!("Price history fetch failed for {symbol}")))
            }
        }
    }
}

/// Buy bargains from `universe` until the money runs out.
pub async fn perform_buying(
    ctx: &ScanContext<'_>,
    universe: &[Company],
    already_invested: &HashSet<String>,
    balance: Decimal,
) -> Result<BuyPass> {
    let trading = ctx.trading;
    let mut pass = BuyPass {
        balance,
        orders: Vec::new(),
        skipped: Vec::new(),
        stop: BuyStop::EndOfUniverse,
    };

    for company in universe {
        if pass.balance < trading.buy_amount {
            debug!(balance = %pass.balance, "Balance below buy amount, buy pass done");
            pass.stop = BuyStop::BalanceExhausted;
            break;
        }

        // don't double invest
        if already_invested.contains(&company.id) {
            pass.skipped.push((company.id.clone(), BuySkip::AlreadyHeld));
            continue;
        }

        let price = company.market_price;
        if price < trading.minimum_stock_price {
            pass.skipped.push((company.id.clone(), BuySkip::PennyStock { price }));
            continue;
        }

        let (amount, dividend_bonus) = buy_amount_for(ctx, company);

        let symbol = format!("{}{}", company.code, ctx.feed.symbol_suffix);
        let history = price_history(ctx, &symbol).await?;

        let Some(high) = history.high() else {
            pass.skipped.push((company.id.clone(), BuySkip::NoPriceData));
            continue;
        };

        if !should_buy(price, &history, trading.bargain_threshold) {
            pass.skipped
                .push((company.id.clone(), BuySkip::NotABargain { price, high }));
            continue;
        }

        if pass.balance < amount {
            let err = StockwatchError::InsufficientFunds {
                needed: amount,
                available: pass.balance,
            };
            warn!(symbol = %symbol, error = %err, "Want to buy but not enough money in portfolio");
            pass.stop = BuyStop::InsufficientFunds {
                needed: amount,
                available: pass.balance,
            };
            break;
        }

        info!(
            symbol = %symbol,
            company = %company,
            amount = format!("${:.2}", amount),
            last = ?history.last().map(|p| p.price),
            high = %high,
            dividend_bonus,
            "Buying"
        );
        let receipt = ctx
            .brokerage
            .buy(company, amount)
            .await
            .with_context(|| format!("Buy order failed for {symbol}"))?;

        pass.balance -= amount;
        pass.orders.push(BuyOrder {
            company_id: company.id.clone(),
            symbol,
            amount,
            dividend_bonus,
            receipt,
        });
    }

    Ok(pass)
}
