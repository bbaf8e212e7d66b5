//! STOCKWATCH: market-hours-aware buy/sell scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod brokerage;
pub mod config;
pub mod data;
pub mod engine;
pub mod strategy;
pub mod types;
