//! Hand-curated ETF metadata.
//!
//! Yahoo rarely fills the fund fields for thematic ETFs, so the handful we
//! track carry a manually maintained profile. Values are display strings as
//! published by the issuers and are not refreshed automatically.

/// Manually maintained ETF facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtfProfile {
    /// Ticker symbol
    pub symbol: &'static str,
    /// Issuer
    pub provider: &'static str,
    /// Expense ratio
    pub expense_ratio: &'static str,
    /// Assets under management (approximate)
    pub aum: &'static str,
    /// Benchmark index
    pub index_tracked: &'static str,
    /// One-line strategy
    pub strategy: &'static str,
    /// Inception date
    pub inception: &'static str,
    /// Number of holdings (approximate)
    pub holdings: &'static str,
    /// Largest positions
    pub top_holdings: &'static str,
}

static PROFILES: [EtfProfile; 2] = [
    EtfProfile {
        symbol: "HACK",
        provider: "ETFMG",
        expense_ratio: "0.60%",
        aum: "~$1.5B",
        index_tracked: "Prime Cyber Defense Index",
        strategy: "Pure-play cybersecurity companies",
        inception: "2014-11-11",
        holdings: "~60 companies",
        top_holdings: "CRWD, PANW, ZS, OKTA, CHKP",
    },
    EtfProfile {
        symbol: "IHAK",
        provider: "iShares",
        expense_ratio: "0.47%",
        aum: "~$400M",
        index_tracked: "NYSE FactSet Global Cybersecurity Index",
        strategy: "Global cybersecurity technology companies",
        inception: "2019-06-13",
        holdings: "~40 companies",
        top_holdings: "CRWD, PANW, ZS, OKTA, FTNT",
    },
];

/// Curated profile for `symbol`, case-insensitive.
pub fn etf_profile(symbol: &str) -> Option<&'static EtfProfile> {
    PROFILES
        .iter()
        .find(|p| p.symbol.eq_ignore_ascii_case(symbol.trim()))
}

/// Symbols that have a curated profile.
pub fn profiled_symbols() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.symbol)
}

impl EtfProfile {
    /// Labelled fields in display order.
    pub const fn fields(&self) -> [(&'static str, &'static str); 8] {
        [
            ("ETF Provider", self.provider),
            ("Expense Ratio", self.expense_ratio),
            ("AUM", self.aum),
            ("Index Tracked", self.index_tracked),
            ("Strategy", self.strategy),
            ("Inception", self.inception),
            ("Holdings", self.holdings),
            ("Top Holdings", self.top_holdings),
        ]
    }

    /// Owned label/value pairs, as consumed by the ETF report.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.fields()
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }
}
