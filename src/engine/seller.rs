//! Sell screener.
//!
//! Walks the holdings in snapshot order. Dividends take priority over
//! profit-taking: anything the brokerage lists as having a dividend due
//! is held regardless of gain.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::ScanContext;
use crate::strategy::should_sell;
use crate::types::{code_for, Company, Holding, TradeReceipt, UpcomingDividends};

/// What happened to one holding.
#[derive(Debug, Clone)]
pub enum SellDecision {
    Sold {
        fund_id: String,
        code: String,
        receipt: TradeReceipt,
    },
    HeldForDividend {
        fund_id: String,
    },
    BelowMargin {
        fund_id: String,
    },
}

impl SellDecision {
    pub fn is_sold(&self) -> bool {
        matches!(self, SellDecision::Sold { .. })
    }
}

/// Display label for a fund: its ticker, or the raw id when the universe
/// does not know it.
fn label(fund_id: &str, universe: &[Company]) -> String {
    match code_for(fund_id, universe) {
        Ok(code) => code.to_string(),
        Err(e) => {
            warn!(error = %e, "Falling back to fund id as label");
            fund_id.to_string()
        }
    }
}

/// Sell every holding whose gain meets the configured margin, unless a
/// dividend is due on it.
pub async fn perform_selling(
    ctx: &ScanContext<'_>,
    holdings: &[Holding],
    universe: &[Company],
    dividends_due: &UpcomingDividends,
) -> Result<Vec<SellDecision>> {
    let mut decisions = Vec::with_capacity(holdings.len());

    for holding in holdings {
        let fund_id = holding.fund_id.clone();

        if dividends_due.contains(&holding.fund_id) {
            info!(
                fund_id = %fund_id,
                code = %label(&fund_id, universe),
                "Halting sale as dividends are upcoming"
            );
            decisions.push(SellDecision::HeldForDividend { fund_id });
            continue;
        }

        if !should_sell(holding.contribution, holding.value, ctx.trading.sell_profit_margin) {
            debug!(
                fund_id = %fund_id,
                contribution = %holding.contribution,
                value = %holding.value,
                "Below sell margin"
            );
            decisions.push(SellDecision::BelowMargin { fund_id });
            continue;
        }

        let code = label(&fund_id, universe);
        info!(
            code = %code,
            value = format!("${:.2}", holding.value),
            gain = format!("${:.2}", holding.gain()),
            shares = %holding.shares,
            "Selling"
        );

        let receipt = ctx
            .brokerage
            .sell(holding, holding.shares)
            .await
            .with_context(|| format!("Sell order failed for {code}"))?;

        decisions.push(SellDecision::Sold {
            fund_id,
            code,
            receipt,
        });
    }

    Ok(decisions)
}

/// Market value of everything sold.
pub fn total_sold(decisions: &[SellDecision]) -> Decimal {
    decisions
        .iter()
        .filter_map(|d| match d {
            SellDecision::Sold { receipt, .. } => Some(receipt.amount),
            _ => None,
        })
        .sum()
}
