//! Configuration file loading.
//!
//! The config file is optional JSON at a platform-specific location:
//! - Linux: `~/.config/stockinfo/config.json`
//! - macOS: `~/Library/Application Support/stockinfo/config.json`
//! - Windows: `%APPDATA%\stockinfo\config.json`
//!
//! Command-line flags override file values, which override built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockinfo::{Watchlist, WatchlistError};
use stockinfo_data::Period;

/// Chart written by `prices` when no path is configured.
pub(crate) const DEFAULT_CHART_PATH: &str = "normalized_performance.html";

/// Delay between Yahoo requests when no rate limit is configured.
pub(crate) const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// Explicitly requested file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    /// File could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// File is not valid config JSON.
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
    /// A configured ticker list is unusable.
    #[error("Invalid watchlist in config: {0}")]
    Watchlist(#[from] WatchlistError),
}

/// Raw contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Tickers for `prices` and `summary`
    pub watchlist: Option<Vec<String>>,
    /// Tickers for `etf`
    pub etf_tickers: Option<Vec<String>>,
    /// Default lookback period
    pub period: Option<Period>,
    /// Delay between Yahoo requests in milliseconds
    pub rate_limit_ms: Option<u64>,
    /// Where `prices` writes its chart
    pub chart_path: Option<PathBuf>,
}

/// Resolved configuration with defaults applied.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    /// Tickers for `prices` and `summary`
    pub watchlist: Watchlist,
    /// Tickers for `etf`
    pub etf_tickers: Watchlist,
    /// Default lookback period
    pub period: Period,
    /// Delay between Yahoo requests
    pub rate_limit: Duration,
    /// Where `prices` writes its chart
    pub chart_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watchlist: Watchlist::cyber_security(),
            etf_tickers: Watchlist::cyber_etfs(),
            period: Period::default(),
            rate_limit: Duration::from_millis(DEFAULT_RATE_LIMIT_MS),
            chart_path: PathBuf::from(DEFAULT_CHART_PATH),
        }
    }
}

/// Default config file path, if the platform has a config directory.
pub(crate) fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("stockinfo").join("config.json"))
}

impl FileConfig {
    /// Parse config JSON.
    pub(crate) fn from_json(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file.
    ///
    /// With `explicit` set the file must exist. Otherwise the default location
    /// is tried and a missing file yields an empty config.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => match default_config_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                return Err(ConfigError::NotFound(path));
            }
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_json(&path, &contents)
    }
}

impl AppConfig {
    /// Apply file values over the built-in defaults.
    pub(crate) fn resolve(file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let watchlist = match file.watchlist {
            Some(symbols) => Watchlist::from_symbols("Watchlist", symbols)?,
            None => defaults.watchlist,
        };
        let etf_tickers = match file.etf_tickers {
            Some(symbols) => Watchlist::from_symbols("ETFs", symbols)?,
            None => defaults.etf_tickers,
        };

        Ok(Self {
            watchlist,
            etf_tickers,
            period: file.period.unwrap_or(defaults.period),
            rate_limit: file
                .rate_limit_ms
                .map_or(defaults.rate_limit, Duration::from_millis),
            chart_path: file.chart_path.unwrap_or(defaults.chart_path),
        })
    }

    /// Tickers from the command line, or `fallback` when none were given.
    pub(crate) fn tickers_or(
        cli: &[String],
        fallback: &Watchlist,
    ) -> Result<Watchlist, ConfigError> {
        if cli.is_empty() {
            Ok(fallback.clone())
        } else {
            Ok(Watchlist::from_symbols("Command line", cli)?)
        }
    }
}
