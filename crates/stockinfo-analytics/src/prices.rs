//! Price normalization and return statistics.
//!
//! All functions take the quotes frame produced by
//! [`stockinfo_data::yahoo::quotes_to_dataframe`] (long format, one row per
//! symbol and date) and never mutate it.

use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trading sessions per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for name in columns {
        if !present.iter().any(|c| c.as_str() == *name) {
            return Err(AnalyticsError::MissingColumn((*name).to_string()));
        }
    }
    Ok(())
}

/// Rows whose `name` column holds a positive, non-NaN price.
fn usable_price(name: &str) -> Expr {
    col(name).is_not_nan().and(col(name).gt(lit(0.0)))
}

/// Distinct symbols in order of first appearance.
pub fn symbol_order(df: &DataFrame) -> Result<Vec<String>> {
    require_columns(df, &["symbol"])?;
    let mut order: Vec<String> = Vec::new();
    for symbol in df
        .column("symbol")?
        .as_materialized_series()
        .str()?
        .into_iter()
        .flatten()
    {
        if !order.iter().any(|s| s == symbol) {
            order.push(symbol.to_string());
        }
    }
    Ok(order)
}

/// Rescale each symbol's close so its first available close equals `base`.
///
/// Rows with a missing, NaN or non-positive close are dropped before the base is
/// taken. Returns columns: symbol, date, close, normalized.
pub fn normalize_prices(quotes: &DataFrame, base: f64) -> Result<DataFrame> {
    if !base.is_finite() || base <= 0.0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "normalization base must be positive, got {base}"
        )));
    }
    require_columns(quotes, &["symbol", "date", "close"])?;

    let first_close = col("close")
        .sort_by([col("date")], SortMultipleOptions::default())
        .first()
        .over([col("symbol")]);

    let df = quotes
        .clone()
        .lazy()
        .filter(usable_price("close"))
        .with_column((col("close") / first_close * lit(base)).alias("normalized"))
        .select([
            col("symbol"),
            col("date"),
            col("close"),
            col("normalized"),
        ])
        .collect()?;

    Ok(df)
}

/// Daily simple returns from adjusted closes.
///
/// Returns columns: symbol, date, returns, sorted by symbol then date. The
/// first row of each symbol has no prior close and is dropped.
pub fn daily_returns(quotes: &DataFrame) -> Result<DataFrame> {
    require_columns(quotes, &["symbol", "date", "adjusted_close"])?;

    let df = quotes
        .clone()
        .lazy()
        .filter(usable_price("adjusted_close"))
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .with_column(
            (col("adjusted_close") / col("adjusted_close").shift(lit(1)).over([col("symbol")])
                - lit(1.0))
            .alias("returns"),
        )
        .filter(col("returns").is_not_null())
        .select([col("symbol"), col("date"), col("returns")])
        .collect()?;

    Ok(df)
}

/// Configuration for [`return_stats_with_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStatsConfig {
    /// Sessions per year (default: 252)
    pub trading_days_per_year: u32,
    /// Delta degrees of freedom for the standard deviation (default: 1)
    pub ddof: u8,
}

impl Default for ReturnStatsConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            ddof: 1,
        }
    }
}

/// Return and volatility summary for one symbol over the fetched window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    /// Ticker symbol
    pub symbol: String,
    /// First session in the window
    pub start_date: Option<NaiveDate>,
    /// Last session in the window
    pub end_date: Option<NaiveDate>,
    /// First close
    pub first_close: Option<f64>,
    /// Last close
    pub last_close: Option<f64>,
    /// Total return over the window from adjusted closes (fraction)
    pub total_return: Option<f64>,
    /// Annualized standard deviation of daily returns (fraction)
    pub annualized_volatility: Option<f64>,
    /// Number of sessions with a usable adjusted close
    pub observations: usize,
}

/// Per-symbol return statistics with the default configuration.
pub fn return_stats(quotes: &DataFrame) -> Result<Vec<ReturnStats>> {
    return_stats_with_config(quotes, &ReturnStatsConfig::default())
}

/// Per-symbol return statistics, in order of first appearance.
pub fn return_stats_with_config(
    quotes: &DataFrame,
    config: &ReturnStatsConfig,
) -> Result<Vec<ReturnStats>> {
    if config.trading_days_per_year == 0 {
        return Err(AnalyticsError::InvalidParameter(
            "trading_days_per_year must be positive".to_string(),
        ));
    }
    require_columns(quotes, &["symbol", "date", "close", "adjusted_close"])?;

    let annualization = f64::from(config.trading_days_per_year).sqrt();

    let grouped = quotes
        .clone()
        .lazy()
        .filter(usable_price("adjusted_close").and(usable_price("close")))
        .sort(["symbol", "date"], SortMultipleOptions::default())
        .with_column(
            (col("adjusted_close") / col("adjusted_close").shift(lit(1)).over([col("symbol")])
                - lit(1.0))
            .alias("returns"),
        )
        .group_by([col("symbol")])
        .agg([
            col("date").first().cast(DataType::String).alias("start_date"),
            col("date").last().cast(DataType::String).alias("end_date"),
            col("close").first().alias("first_close"),
            col("close").last().alias("last_close"),
            (col("adjusted_close").last() / col("adjusted_close").first() - lit(1.0))
                .alias("total_return"),
            (col("returns").std(config.ddof) * lit(annualization)).alias("annualized_volatility"),
            col("adjusted_close")
                .count()
                .cast(DataType::Int64)
                .alias("observations"),
        ])
        .collect()?;

    let symbols = grouped.column("symbol")?.as_materialized_series().str()?;
    let start_dates = grouped.column("start_date")?.as_materialized_series().str()?;
    let end_dates = grouped.column("end_date")?.as_materialized_series().str()?;
    let first_closes = grouped.column("first_close")?.as_materialized_series().f64()?;
    let last_closes = grouped.column("last_close")?.as_materialized_series().f64()?;
    let total_returns = grouped.column("total_return")?.as_materialized_series().f64()?;
    let vols = grouped
        .column("annualized_volatility")?
        .as_materialized_series()
        .f64()?;
    let observations = grouped.column("observations")?.as_materialized_series().i64()?;

    let mut by_symbol: HashMap<String, ReturnStats> = HashMap::with_capacity(grouped.height());
    for idx in 0..grouped.height() {
        let Some(symbol) = symbols.get(idx) else {
            continue;
        };
        let stats = ReturnStats {
            symbol: symbol.to_string(),
            start_date: start_dates.get(idx).map(parse_date).transpose()?,
            end_date: end_dates.get(idx).map(parse_date).transpose()?,
            first_close: first_closes.get(idx),
            last_close: last_closes.get(idx),
            total_return: total_returns.get(idx).filter(|v| v.is_finite()),
            annualized_volatility: vols.get(idx).filter(|v| v.is_finite()),
            observations: observations.get(idx).unwrap_or(0).max(0) as usize,
        };
        by_symbol.insert(stats.symbol.clone(), stats);
    }

    Ok(symbol_order(quotes)?
        .into_iter()
        .filter_map(|symbol| by_symbol.remove(&symbol))
        .collect())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AnalyticsError::Parse(format!("date {s:?}: {e}")))
}
