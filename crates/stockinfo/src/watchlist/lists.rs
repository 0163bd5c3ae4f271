//! Built-in and user-supplied watchlists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a watchlist.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchlistError {
    /// No symbols left after cleaning
    #[error("Watchlist {0:?} has no symbols")]
    Empty(String),

    /// Symbol contains characters Yahoo never uses
    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
}

/// An ordered, de-duplicated list of upper-case ticker symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watchlist {
    name: String,
    symbols: Vec<String>,
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-'))
}

impl Watchlist {
    /// Build a watchlist from raw symbols.
    ///
    /// Symbols are trimmed and upper-cased; blanks are dropped and repeats keep
    /// their first position.
    pub fn from_symbols<I, S>(name: impl Into<String>, symbols: I) -> Result<Self, WatchlistError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mut cleaned: Vec<String> = Vec::new();

        for raw in symbols {
            let symbol = raw.as_ref().trim().to_uppercase();
            if symbol.is_empty() {
                continue;
            }
            if !is_valid_symbol(&symbol) {
                return Err(WatchlistError::InvalidSymbol(raw.as_ref().to_string()));
            }
            if !cleaned.contains(&symbol) {
                cleaned.push(symbol);
            }
        }

        if cleaned.is_empty() {
            return Err(WatchlistError::Empty(name));
        }

        Ok(Self {
            name,
            symbols: cleaned,
        })
    }

    fn builtin(name: &str, symbols: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            symbols: symbols.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Tencent Music, Tencent (OTC) and two cybersecurity ETFs.
    pub fn cyber_security() -> Self {
        Self::builtin("cyber-security", &["TME", "TCTZF", "HACK", "IHAK"])
    }

    /// The two ETFs that have curated profiles.
    pub fn cyber_etfs() -> Self {
        Self::builtin("cyber-etfs", &["HACK", "IHAK"])
    }

    /// Watchlist name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symbols in order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed watchlist.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::cyber_security()
    }
}
