//! Concurrent fetch pipeline.
//!
//! Runs per-ticker Yahoo requests through a bounded stream, reports failures
//! and hands results back in watchlist order so that tables and charts are
//! stable between runs.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use polars::prelude::*;
use std::future::Future;
use stockinfo_analytics::{FinancialRatios, return_stats};
use stockinfo_data::DataError;
use stockinfo_data::yahoo::{TickerInfo, YahooFundamentalsProvider, YahooQuoteProvider};
use stockinfo_output::{SummaryRow, SummaryTable};
use tracing::warn;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Every ticker failed.
    #[error("No price data fetched for any of: {0}")]
    NoData(String),
    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    /// Analytics error.
    #[error("Analytics error: {0}")]
    Analytics(#[from] stockinfo_analytics::AnalyticsError),
}

/// Number of tickers fetched at once.
pub(crate) const DEFAULT_CONCURRENCY: usize = 4;

/// Everything fetched for one ticker by `summary`.
#[derive(Debug)]
pub(crate) struct TickerData {
    /// Ticker symbol
    pub symbol: String,
    /// Price history, if it could be fetched
    pub quotes: Option<DataFrame>,
    /// Quote summary, if it could be fetched
    pub info: Option<TickerInfo>,
}

fn report_failure(progress: Option<&ProgressBar>, symbol: &str, what: &str, error: &DataError) {
    match progress {
        Some(pb) => pb.suspend(|| {
            warn!(symbol, error = %error, "failed to fetch {what}, skipping");
        }),
        None => warn!(symbol, error = %error, "failed to fetch {what}, skipping"),
    }
}

/// Run `fetch` for every symbol with bounded concurrency.
///
/// Results come back in the order of `symbols`, whatever order the requests
/// complete in.
pub(crate) async fn fetch_all<T, F, Fut>(
    symbols: &[String],
    progress: Option<&ProgressBar>,
    fetch: F,
) -> Vec<(String, T)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = T>,
{
    if let Some(pb) = progress {
        pb.set_length(symbols.len() as u64);
        pb.set_message(format!(
            "Fetching {} symbols ({} concurrent)...",
            symbols.len(),
            DEFAULT_CONCURRENCY
        ));
    }

    let mut results: Vec<(usize, String, T)> = Vec::with_capacity(symbols.len());

    stream::iter(symbols.iter().cloned().enumerate())
        .map(|(idx, symbol)| {
            let request = fetch(symbol.clone());
            async move { (idx, symbol, request.await) }
        })
        .buffer_unordered(DEFAULT_CONCURRENCY)
        .for_each(|result| {
            if let Some(pb) = progress {
                pb.inc(1);
            }
            results.push(result);
            futures::future::ready(())
        })
        .await;

    results.sort_by_key(|(idx, _, _)| *idx);
    results
        .into_iter()
        .map(|(_, symbol, value)| (symbol, value))
        .collect()
}

/// Fetch price history for each symbol; failures are logged and dropped.
pub(crate) async fn fetch_prices(
    provider: &YahooQuoteProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    progress: Option<&ProgressBar>,
) -> Vec<(String, DataFrame)> {
    let results = fetch_all(symbols, progress, |symbol| async move {
        provider.fetch_quotes(&symbol, start, end).await
    })
    .await;

    results
        .into_iter()
        .filter_map(|(symbol, result)| match result {
            Ok(df) => Some((symbol, df)),
            Err(e) => {
                report_failure(progress, &symbol, "quotes", &e);
                None
            }
        })
        .collect()
}

/// Fetch quote summaries, keeping failures so callers can report them inline.
pub(crate) async fn fetch_fundamentals(
    provider: &YahooFundamentalsProvider,
    symbols: &[String],
    progress: Option<&ProgressBar>,
) -> Vec<(String, Result<TickerInfo, DataError>)> {
    fetch_all(symbols, progress, |symbol| async move {
        provider.fetch_fundamentals(&symbol).await
    })
    .await
}

/// Fetch prices and fundamentals for each symbol.
pub(crate) async fn fetch_ticker_data(
    quotes: &YahooQuoteProvider,
    fundamentals: &YahooFundamentalsProvider,
    symbols: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    progress: Option<&ProgressBar>,
) -> Vec<TickerData> {
    let results = fetch_all(symbols, progress, |symbol| async move {
        tokio::join!(
            quotes.fetch_quotes(&symbol, start, end),
            fundamentals.fetch_fundamentals(&symbol)
        )
    })
    .await;

    results
        .into_iter()
        .map(|(symbol, (prices, info))| {
            let quotes = prices
                .map_err(|e| report_failure(progress, &symbol, "quotes", &e))
                .ok();
            let info = info
                .map_err(|e| report_failure(progress, &symbol, "fundamentals", &e))
                .ok();
            TickerData {
                symbol,
                quotes,
                info,
            }
        })
        .collect()
}

/// Stack per-symbol price frames into one long frame.
pub(crate) fn combine_quotes(
    requested: &[String],
    frames: Vec<(String, DataFrame)>,
) -> Result<DataFrame, PipelineError> {
    if frames.is_empty() {
        return Err(PipelineError::NoData(requested.join(", ")));
    }

    let lazy: Vec<LazyFrame> = frames.into_iter().map(|(_, df)| df.lazy()).collect();
    Ok(concat(lazy, UnionArgs::default())?.collect()?)
}

/// Last row of each symbol, in order of first appearance.
pub(crate) fn latest_per_symbol(df: &DataFrame) -> Result<DataFrame, PipelineError> {
    let by_date = |name: &str| {
        col(name)
            .sort_by([col("date")], SortMultipleOptions::default())
            .last()
    };

    let value_columns: Vec<Expr> = df
        .get_column_names()
        .into_iter()
        .filter(|c| c.as_str() != "symbol")
        .map(|c| by_date(c.as_str()))
        .collect();

    Ok(df
        .clone()
        .lazy()
        .group_by_stable([col("symbol")])
        .agg(value_columns)
        .collect()?)
}

/// Build the summary table; tickers with neither prices nor fundamentals are skipped.
pub(crate) fn build_summary(
    title: &str,
    data: &[TickerData],
) -> Result<SummaryTable, PipelineError> {
    let mut rows = Vec::with_capacity(data.len());

    for ticker in data {
        if ticker.quotes.is_none() && ticker.info.is_none() {
            continue;
        }

        let stats = match &ticker.quotes {
            Some(df) => return_stats(df)?.into_iter().next(),
            None => None,
        };
        let ratios = ticker.info.as_ref().map(FinancialRatios::from_info);

        rows.push(SummaryRow::from_parts(
            &ticker.symbol,
            stats.as_ref(),
            ticker.info.as_ref(),
            ratios.as_ref(),
        ));
    }

    if rows.is_empty() {
        let symbols: Vec<&str> = data.iter().map(|t| t.symbol.as_str()).collect();
        return Err(PipelineError::NoData(symbols.join(", ")));
    }

    Ok(SummaryTable::new(title, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;
    use stockinfo_data::yahoo::{IncomeStatement, PriceBar, quotes_to_dataframe};

    const DAY0: i64 = 1_704_153_600; // 2024-01-02 00:00 UTC

    fn frame(symbol: &str, closes: &[f64]) -> DataFrame {
        let bars: Vec<PriceBar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: DAY0 + i as i64 * 86_400,
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
                adjusted_close: close,
            })
            .collect();
        quotes_to_dataframe(symbol, &bars).unwrap()
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_input_order() {
        let input = symbols(&["A", "B", "C", "D", "E", "F"]);

        // Earlier symbols sleep longer so they complete last.
        let results = fetch_all(&input, None, |symbol| async move {
            let delay = 70 - u64::from(symbol.as_bytes()[0] - b'A') * 10;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            symbol.to_lowercase()
        })
        .await;

        let order: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C", "D", "E", "F"]);
        assert_eq!(results[2].1, "c");
    }

    #[tokio::test]
    async fn test_fetch_all_progress() {
        let input = symbols(&["A", "B", "C"]);
        let pb = ProgressBar::hidden();

        let _ = fetch_all(&input, Some(&pb), |s| async move { s }).await;

        assert_eq!(pb.length(), Some(3));
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn test_combine_quotes() {
        let frames = vec![
            ("TME".to_string(), frame("TME", &[10.0, 11.0])),
            ("HACK".to_string(), frame("HACK", &[50.0, 51.0, 52.0])),
        ];
        let df = combine_quotes(&symbols(&["TME", "HACK"]), frames).unwrap();
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn test_combine_quotes_empty() {
        let err = combine_quotes(&symbols(&["ZZZZ", "YYYY"]), Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No price data fetched for any of: ZZZZ, YYYY"
        );
    }

    #[test]
    fn test_latest_per_symbol() {
        let frames = vec![
            ("TME".to_string(), frame("TME", &[10.0, 11.0])),
            ("HACK".to_string(), frame("HACK", &[50.0, 51.0, 52.0])),
        ];
        let df = combine_quotes(&symbols(&["TME", "HACK"]), frames).unwrap();
        let latest = latest_per_symbol(&df).unwrap();

        assert_eq!(latest.height(), 2);
        let syms: Vec<&str> = latest
            .column("symbol")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(syms, vec!["TME", "HACK"]);

        let closes = latest
            .column("close")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(closes.get(0), Some(11.0));
        assert_eq!(closes.get(1), Some(52.0));
    }

    fn ticker(symbol: &str, quotes: bool, info: bool) -> TickerData {
        TickerData {
            symbol: symbol.to_string(),
            quotes: quotes.then(|| frame(symbol, &[10.0, 12.0])),
            info: info.then(|| TickerInfo {
                symbol: symbol.to_string(),
                short_name: Some(format!("{symbol} Inc")),
                income_statements: vec![IncomeStatement {
                    total_revenue: Some(200.0),
                    net_income: Some(20.0),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }
    }

    #[rstest]
    #[case(true, true, Some(12.0), Some(0.1))]
    #[case(true, false, Some(12.0), None)]
    #[case(false, true, None, Some(0.1))]
    fn test_build_summary_partial_data(
        #[case] quotes: bool,
        #[case] info: bool,
        #[case] last_close: Option<f64>,
        #[case] net_margin: Option<f64>,
    ) {
        let table = build_summary("t", &[ticker("TME", quotes, info)]).unwrap();
        let row = &table.rows[0];

        assert_eq!(row.symbol, "TME");
        assert_eq!(row.last_close, last_close);
        assert_eq!(row.net_margin, net_margin);
    }

    #[test]
    fn test_build_summary_skips_failed_tickers() {
        let data = vec![
            ticker("TME", true, true),
            ticker("ZZZZ", false, false),
            ticker("HACK", true, false),
        ];
        let table = build_summary("Cyber basket", &data).unwrap();

        let order: Vec<&str> = table.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["TME", "HACK"]);
        assert_eq!(table.rows[0].name.as_deref(), Some("TME Inc"));
    }

    #[test]
    fn test_build_summary_nothing_fetched() {
        let data = vec![ticker("ZZZZ", false, false)];
        assert!(matches!(
            build_summary("t", &data),
            Err(PipelineError::NoData(s)) if s == "ZZZZ"
        ));
    }
}
