//! Quote data fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    /// Unix timestamp (seconds) of the bar open.
    pub timestamp: i64,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
    /// Split and dividend adjusted close
    pub adjusted_close: f64,
}

impl From<&yahoo::Quote> for PriceBar {
    fn from(q: &yahoo::Quote) -> Self {
        Self {
            timestamp: q.timestamp,
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume,
            adjusted_close: q.adjclose,
        }
    }
}

/// Convert bars for one symbol into the quotes frame layout.
///
/// Columns: symbol, date, open, high, low, close, volume, adjusted_close.
pub fn quotes_to_dataframe(symbol: &str, bars: &[PriceBar]) -> Result<DataFrame> {
    if bars.is_empty() {
        return Err(DataError::MissingData {
            symbol: symbol.to_string(),
            reason: "No bars to convert".to_string(),
        });
    }

    let dates: Vec<i64> = bars.iter().map(|b| b.timestamp).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();
    let adj_closes: Vec<f64> = bars.iter().map(|b| b.adjusted_close).collect();

    let mut df = DataFrame::new(vec![
        Series::new("timestamp".into(), dates).into(),
        Series::new("open".into(), opens).into(),
        Series::new("high".into(), highs).into(),
        Series::new("low".into(), lows).into(),
        Series::new("close".into(), closes).into(),
        Series::new("volume".into(), volumes).into(),
        Series::new("adjusted_close".into(), adj_closes).into(),
    ])?;

    let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
    df.with_column(symbol_col)?;

    let df = df
        .lazy()
        .with_column(
            (col("timestamp") * lit(1_000_000_000))
                .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                .cast(DataType::Date)
                .alias("date"),
        )
        .select(&[
            col("symbol"),
            col("date"),
            col("open"),
            col("high"),
            col("low"),
            col("close"),
            col("volume"),
            col("adjusted_close"),
        ])
        .collect()?;

    Ok(df)
}

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a new Yahoo Finance quote provider with default rate limiting (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new Yahoo Finance quote provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
        })
    }

    /// Fetch daily OHLCV data for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "HACK")
    /// * `start` - Start date for the data
    /// * `end` - End date for the data
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, open, high, low, close, volume, adjusted_close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        debug!(symbol, %start, %end, "requesting quote history");
        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let bars: Vec<PriceBar> = quotes.iter().map(PriceBar::from).collect();
        let df = quotes_to_dataframe(symbol, &bars)?;

        sleep(self.rate_limit_delay).await;

        Ok(df)
    }

    /// Fetch daily OHLCV data for multiple symbols.
    ///
    /// Symbols that fail are logged and skipped.
    pub async fn fetch_quotes_batch(
        &self,
        symbols: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        let mut dfs = Vec::new();

        for symbol in symbols {
            match self.fetch_quotes(symbol, start, end).await {
                Ok(df) => dfs.push(df.lazy()),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "failed to fetch quotes, skipping");
                }
            }
        }

        if dfs.is_empty() {
            return Err(DataError::MissingData {
                symbol: "batch".to_string(),
                reason: "No data fetched for any symbol".to_string(),
            });
        }

        let combined = concat(dfs, UnionArgs::default())?.collect()?;

        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn bars() -> Vec<PriceBar> {
        // 2024-01-02 and 2024-01-03 14:30 UTC
        [1_704_205_800_i64, 1_704_292_200]
            .into_iter()
            .enumerate()
            .map(|(i, ts)| PriceBar {
                timestamp: ts,
                open: 10.0 + i as f64,
                high: 11.0 + i as f64,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64,
                volume: 1_000 * (i as u64 + 1),
                adjusted_close: 10.4 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_quotes_to_dataframe_layout() {
        let df = quotes_to_dataframe("HACK", &bars()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names(),
            vec![
                "symbol",
                "date",
                "open",
                "high",
                "low",
                "close",
                "volume",
                "adjusted_close"
            ]
        );
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn test_quotes_to_dataframe_dates() {
        let df = quotes_to_dataframe("HACK", &bars()).unwrap();
        let dates = df
            .column("date")
            .unwrap()
            .cast(&DataType::String)
            .unwrap();
        let dates: Vec<Option<&str>> = dates
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(dates, vec![Some("2024-01-02"), Some("2024-01-03")]);
    }

    #[test]
    fn test_quotes_to_dataframe_empty() {
        let result = quotes_to_dataframe("HACK", &[]);
        assert!(matches!(result, Err(DataError::MissingData { .. })));
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let start = Utc::now();
        let end = start - ChronoDuration::days(30);

        let result = provider.fetch_quotes("HACK", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);

        let result = provider.fetch_quotes("", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_quotes_live() {
        let provider = YahooQuoteProvider::new().unwrap();
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);

        let df = provider.fetch_quotes("HACK", start, end).await.unwrap();
        assert!(df.height() > 0);
    }

    #[test]
    fn test_price_bar_from_quote() {
        let quote = yahoo::Quote {
            timestamp: 1_704_205_800,
            open: 10.0,
            high: 11.0,
            low: 9.5,
            volume: 2_500,
            close: 10.8,
            adjclose: 10.7,
        };
        let bar = PriceBar::from(&quote);

        assert_eq!(bar.timestamp, 1_704_205_800);
        assert_eq!(bar.volume, 2_500);
        assert_eq!(bar.close, 10.8);
        assert_eq!(bar.adjusted_close, 10.7);
    }

    #[tokio::test]
    async fn test_batch_skips_failed_symbols() {
        let provider = YahooQuoteProvider::with_rate_limit(Duration::ZERO).unwrap();
        let end = Utc::now();
        let start = end - ChronoDuration::days(5);

        let result = provider
            .fetch_quotes_batch(&[String::new()], start, end)
            .await;

        assert!(matches!(
            result,
            Err(DataError::MissingData { symbol, .. }) if symbol == "batch"
        ));
    }
}
