#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod prices;
pub mod ratios;

pub use error::{AnalyticsError, Result};
pub use prices::{
    ReturnStats, ReturnStatsConfig, TRADING_DAYS_PER_YEAR, daily_returns, normalize_prices,
    return_stats, return_stats_with_config, symbol_order,
};
pub use ratios::{FinancialRatios, RatioSource, safe_ratio};
