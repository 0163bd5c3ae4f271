#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod watchlist;

pub use stockinfo_analytics as analytics;
pub use stockinfo_data as data;
pub use stockinfo_output as output;

pub use watchlist::{
    EtfProfile, Universe, Watchlist, WatchlistError, etf_profile, profiled_symbols,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
