//! Ticker watchlists and curated ETF metadata.
//!
//! The built-in lists cover a small cybersecurity basket: one equity
//! (Tencent Music), Tencent's OTC listing and two cybersecurity ETFs.

pub mod etf;
pub mod lists;

pub use etf::{EtfProfile, etf_profile, profiled_symbols};
pub use lists::{Watchlist, WatchlistError};

/// A named set of ticker symbols.
pub trait Universe {
    /// Get all symbols in the universe.
    fn symbols(&self) -> Vec<String>;

    /// Check if a symbol is in the universe.
    fn contains(&self, symbol: &str) -> bool {
        self.symbols()
            .iter()
            .any(|s| s.eq_ignore_ascii_case(symbol))
    }

    /// Get the number of constituents.
    fn size(&self) -> usize {
        self.symbols().len()
    }
}

impl Universe for Watchlist {
    fn symbols(&self) -> Vec<String> {
        self.symbols().to_vec()
    }
}
