//! End-to-end scans against the in-memory brokerage.
//!
//! Each test builds an account snapshot and a universe, runs one full
//! sell → buy scan through `Scanner`, and checks the orders that reached
//! the brokerage.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tokio_test::{assert_err, assert_ok};

use stockwatch::brokerage::paper::PaperBrokerage;
use stockwatch::brokerage::Brokerage;
use stockwatch::config::{Credentials, MarketDataConfig, TradingConfig};
use stockwatch::engine::buyer::{BuySkip, BuyStop};
use stockwatch::engine::scanner::Scanner;
use stockwatch::engine::seller::SellDecision;
use stockwatch::types::*;

use crate::mock_brokerage::{MockBrokerageAccount, MockMarketData};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn feed() -> MarketDataConfig {
    MarketDataConfig {
        base_url: "http://localhost".into(),
        symbol_suffix: ".NZ".into(),
        period: "1mo".into(),
        interval: "15m".into(),
    }
}

fn trading(buy_amount: Decimal, min_price: Decimal, bonus: Decimal) -> TradingConfig {
    TradingConfig {
        sell_profit_margin: dec!(0.2),
        buy_amount,
        minimum_stock_price: min_price,
        dividends_bonus: bonus,
        ..TradingConfig::default()
    }
}

fn company(id: &str, code: &str, price: Decimal) -> Company {
    Company {
        id: id.into(),
        code: code.into(),
        market_price: price,
        dividends: vec![],
    }
}

fn holding(fund_id: &str, contribution: Decimal, value: Decimal, shares: Decimal) -> Holding {
    Holding {
        fund_id: fund_id.into(),
        contribution,
        value,
        shares,
    }
}

fn scanner(
    account: &MockBrokerageAccount,
    market: &MockMarketData,
    trading: TradingConfig,
) -> Scanner {
    Scanner::new(
        Arc::new(account.clone()),
        Arc::new(market.clone()),
        trading,
        feed(),
    )
}

#[tokio::test]
async fn test_profitable_holding_is_sold() {
    let snapshot = AccountSnapshot {
        wallet_balance: Decimal::ZERO,
        holdings: vec![holding("A", dec!(100), dec!(130), dec!(5))],
        upcoming_dividends: UpcomingDividends::default(),
    };
    let account = MockBrokerageAccount::new(snapshot, vec![company("A", "AIR", dec!(26))]);
    let market = MockMarketData::default();

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    let sells = account.orders_of(OrderSide::Sell);
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].fund_id, "A");
    assert_eq!(sells[0].shares, Some(dec!(5)));
    assert_eq!(report.sells_placed(), 1);
    assert_eq!(report.total_sold(), dec!(130));
}

#[tokio::test]
async fn test_upcoming_dividend_blocks_sale() {
    let snapshot = AccountSnapshot {
        wallet_balance: Decimal::ZERO,
        holdings: vec![holding("A", dec!(100), dec!(130), dec!(5))],
        upcoming_dividends: ["A"].into_iter().collect(),
    };
    let account = MockBrokerageAccount::new(snapshot, vec![company("A", "AIR", dec!(26))]);
    let market = MockMarketData::default();

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    assert!(account.orders().is_empty());
    assert_eq!(report.dividends_due, 1);
    assert!(matches!(
        report.sells.as_slice(),
        [SellDecision::HeldForDividend { fund_id }] if fund_id == "A"
    ));
}

#[tokio::test]
async fn test_budget_spent_in_universe_order() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        ..AccountSnapshot::default()
    };
    let universe = vec![
        company("1", "FPH", dec!(8)),
        company("2", "MEL", dec!(8)),
        company("3", "SPK", dec!(8)),
    ];
    let account = MockBrokerageAccount::new(snapshot, universe);
    let market = MockMarketData::default()
        .with_high("FPH.NZ", dec!(10))
        .with_high("MEL.NZ", dec!(10))
        .with_high("SPK.NZ", dec!(10));

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(500), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    let buys = account.orders_of(OrderSide::Buy);
    let ids: Vec<&str> = buys.iter().map(|o| o.fund_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(buys.iter().all(|o| o.amount == dec!(500)));
    assert_eq!(report.balance_after(), Decimal::ZERO);
    assert_eq!(report.buys.stop, BuyStop::BalanceExhausted);
    // The third candidate is never priced.
    assert_eq!(market.requests(), vec!["FPH.NZ", "MEL.NZ"]);
}

#[tokio::test]
async fn test_penny_stock_skipped_before_fetch() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        ..AccountSnapshot::default()
    };
    let account = MockBrokerageAccount::new(snapshot, vec![company("P", "PNY", dec!(5))]);
    let market = MockMarketData::default().with_high("PNY.NZ", dec!(50));

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(10), dec!(1)))
            .scan_market(today())
            .await
    );

    assert!(account.orders().is_empty());
    assert!(market.requests().is_empty());
    assert_eq!(
        report.buys.skipped,
        vec![("P".to_string(), BuySkip::PennyStock { price: dec!(5) })]
    );
}

#[tokio::test]
async fn test_held_company_not_bought_again() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        holdings: vec![holding("H", dec!(100), dec!(90), dec!(10))],
        upcoming_dividends: UpcomingDividends::default(),
    };
    let universe = vec![company("H", "HLD", dec!(8)), company("N", "NEW", dec!(8))];
    let account = MockBrokerageAccount::new(snapshot, universe);
    let market = MockMarketData::default()
        .with_high("HLD.NZ", dec!(10))
        .with_high("NEW.NZ", dec!(10));

    assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    let buys = account.orders_of(OrderSide::Buy);
    assert_eq!(buys.len(), 1);
    assert_eq!(buys[0].fund_id, "N");
    assert!(account.orders_of(OrderSide::Sell).is_empty());
}

#[tokio::test]
async fn test_dividend_bonus_scales_order() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        ..AccountSnapshot::default()
    };
    let mut payer = company("D", "DIV", dec!(8));
    payer.dividends = vec![Dividend {
        ex_date: today() + chrono::Duration::days(3),
        amount: Some(dec!(0.12)),
    }];
    let account = MockBrokerageAccount::new(snapshot, vec![payer, company("P", "PLN", dec!(8))]);
    let market = MockMarketData::default()
        .with_high("DIV.NZ", dec!(10))
        .with_high("PLN.NZ", dec!(10));

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(100), dec!(1), dec!(1.5)))
            .scan_market(today())
            .await
    );

    let amounts: Vec<Decimal> = account
        .orders_of(OrderSide::Buy)
        .iter()
        .map(|o| o.amount)
        .collect();
    assert_eq!(amounts, vec![dec!(150), dec!(100)]);
    assert!(report.buys.orders[0].dividend_bonus);
    assert!(!report.buys.orders[1].dividend_bonus);
    assert_eq!(report.balance_after(), dec!(750));
}

#[tokio::test]
async fn test_balance_never_goes_negative() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(120),
        ..AccountSnapshot::default()
    };
    let universe = (0..6)
        .map(|i| company(&format!("C{i}"), &format!("CO{i}"), dec!(8)))
        .collect();
    let account = MockBrokerageAccount::new(snapshot, universe);
    let market = (0..6).fold(MockMarketData::default(), |m, i| {
        m.with_high(&format!("CO{i}.NZ"), dec!(10))
    });

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    assert_eq!(report.buys_placed(), 2);
    assert_eq!(report.buys.total_committed(), dec!(100));
    assert_eq!(report.balance_after(), dec!(20));
    assert!(report.balance_after() >= Decimal::ZERO);
}

#[tokio::test]
async fn test_unpriced_symbol_is_skipped() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        ..AccountSnapshot::default()
    };
    let universe = vec![company("X", "GONE", dec!(8)), company("Y", "LIVE", dec!(8))];
    let account = MockBrokerageAccount::new(snapshot, universe);
    let market = MockMarketData::default().with_high("LIVE.NZ", dec!(10));

    let report = assert_ok!(
        scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)))
            .scan_market(today())
            .await
    );

    assert_eq!(
        report.buys.skipped,
        vec![("X".to_string(), BuySkip::NoPriceData)]
    );
    assert_eq!(account.orders_of(OrderSide::Buy).len(), 1);
}

#[tokio::test]
async fn test_brokerage_outage_fails_scan() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        ..AccountSnapshot::default()
    };
    let account = MockBrokerageAccount::new(snapshot, vec![company("A", "AIR", dec!(8))]);
    let market = MockMarketData::default().with_high("AIR.NZ", dec!(10));
    let scanner = scanner(&account, &market, trading(dec!(50), dec!(1), dec!(1)));

    account.set_error("connection reset");
    assert_err!(scanner.scan_market(today()).await);
    assert!(account.orders().is_empty());

    account.clear_error();
    let report = assert_ok!(scanner.scan_market(today()).await);
    assert_eq!(report.buys_placed(), 1);
}

#[tokio::test]
async fn test_paper_brokerage_places_nothing() {
    let snapshot = AccountSnapshot {
        wallet_balance: dec!(1000),
        holdings: vec![holding("A", dec!(100), dec!(130), dec!(5))],
        upcoming_dividends: UpcomingDividends::default(),
    };
    let universe = vec![company("A", "AIR", dec!(26)), company("B", "BGP", dec!(8))];
    let account = MockBrokerageAccount::new(snapshot, universe);
    let market = MockMarketData::default().with_high("BGP.NZ", dec!(10));

    let paper = Arc::new(PaperBrokerage::new(account.clone()));
    let scanner = Scanner::new(
        paper.clone(),
        Arc::new(market.clone()),
        trading(dec!(50), dec!(1), dec!(1)),
        feed(),
    );

    let report = assert_ok!(scanner.scan_market(today()).await);

    assert_eq!(report.sells_placed(), 1);
    assert_eq!(report.buys_placed(), 1);
    assert!(account.orders().is_empty());
    let recorded = paper.orders();
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|o| o.dry_run));
}

#[tokio::test]
async fn test_login_checks_password() {
    let account = MockBrokerageAccount::new(AccountSnapshot::default(), vec![]);
    let good = Credentials {
        username: "trader@example.com".into(),
        password: SecretString::new("hunter2".into()),
    };
    let bad = Credentials {
        username: "trader@example.com".into(),
        password: SecretString::new("letmein".into()),
    };

    assert!(assert_ok!(account.login(&good).await));
    assert!(!assert_ok!(account.login(&bad).await));
}
