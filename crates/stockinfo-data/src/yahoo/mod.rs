//! Yahoo Finance data providers.

pub mod fundamentals;
pub mod quotes;
pub mod session;

pub use fundamentals::{
    BalanceSheet, IncomeStatement, TickerInfo, YahooFundamentalsProvider, parse_quote_summary,
};
pub use quotes::{PriceBar, YahooQuoteProvider, quotes_to_dataframe};
pub use session::YahooSession;
