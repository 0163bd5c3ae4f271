//! stockinfo CLI binary.
//!
//! Price history, fundamentals and ETF snapshots for a small watchlist,
//! fetched from Yahoo Finance.

mod integration;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use integration::config::{AppConfig, FileConfig, default_config_path};
use integration::logging::{DEFAULT_LOG_LEVEL, init_logging};
use integration::pipeline::{
    build_summary, combine_quotes, fetch_fundamentals, fetch_prices, fetch_ticker_data,
    latest_per_symbol,
};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration as StdDuration;
use stockinfo::{EtfProfile, Universe, etf_profile, profiled_symbols};
use stockinfo_analytics::normalize_prices;
use stockinfo_data::Period;
use stockinfo_data::yahoo::{YahooFundamentalsProvider, YahooQuoteProvider};
use stockinfo_output::{
    EtfReport, ExportFormat, Exporter, SummaryTable, chart_title, normalized_chart,
    summary_to_json_string, write_chart,
};

#[derive(Parser)]
#[command(name = "stockinfo")]
#[command(about = "stockinfo: prices, fundamentals and ETF data from Yahoo Finance", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Config file (default: <config dir>/stockinfo/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch price history, normalize it and chart it
    Prices {
        /// Ticker symbols (default: configured watchlist)
        tickers: Vec<String>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, ytd, max
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,

        /// Value every series starts at
        #[arg(long, default_value = "100")]
        base: f64,

        /// Chart output path
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Skip writing the chart
        #[arg(long)]
        no_chart: bool,

        /// Rows of the combined price table to print
        #[arg(long, default_value = "5")]
        rows: usize,
    },

    /// Enhanced ETF report with curated metadata
    Etf {
        /// Ticker symbols (default: configured ETF tickers)
        tickers: Vec<String>,
    },

    /// Returns, volatility and financial ratios per ticker
    Summary {
        /// Ticker symbols (default: configured watchlist)
        tickers: Vec<String>,

        /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, ytd, max
        #[arg(long, value_parser = parse_period)]
        period: Option<Period>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also export the table to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format: csv, json or pretty-json (default: from the file extension)
        #[arg(long, requires = "export", value_parser = parse_export_format)]
        export_format: Option<ExportFormat>,
    },

    /// Show the configured watchlist and curated ETF profiles
    Watchlist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

fn parse_period(s: &str) -> Result<Period, String> {
    s.parse().map_err(|e: stockinfo_data::DataError| e.to_string())
}

fn parse_export_format(s: &str) -> Result<ExportFormat, String> {
    s.parse()
        .map_err(|e: stockinfo_output::ExportError| e.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = AppConfig::resolve(FileConfig::load(cli.config.as_deref())?)?;

    match cli.command {
        Commands::Prices {
            tickers,
            period,
            base,
            chart,
            no_chart,
            rows,
        } => {
            let chart = (!no_chart).then(|| chart.unwrap_or_else(|| config.chart_path.clone()));
            show_prices(&config, &tickers, period, base, chart.as_deref(), rows).await?;
        }
        Commands::Etf { tickers } => {
            show_etfs(&config, &tickers).await?;
        }
        Commands::Summary {
            tickers,
            period,
            format,
            export,
            export_format,
        } => {
            show_summary(&config, &tickers, period, format, export, export_format).await?;
        }
        Commands::Watchlist => show_watchlist(&config),
    }

    Ok(())
}

fn progress_bar(len: usize) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    Ok(pb)
}

fn print_header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

async fn show_prices(
    config: &AppConfig,
    tickers: &[String],
    period: Option<Period>,
    base: f64,
    chart: Option<&Path>,
    rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let watchlist = AppConfig::tickers_or(tickers, &config.watchlist)?;
    let period = period.unwrap_or(config.period);
    let (start, end) = period.range(Utc::now());

    print_header(&format!("PRICE HISTORY ({})", period));
    println!("Tickers: {}", watchlist.symbols().join(", "));
    println!(
        "Window:  {} to {}\n",
        start.date_naive(),
        end.date_naive()
    );

    let provider = YahooQuoteProvider::with_rate_limit(config.rate_limit)?;
    let pb = progress_bar(watchlist.len())?;
    let frames = fetch_prices(&provider, watchlist.symbols(), start, end, Some(&pb)).await;
    pb.finish_with_message(format!(
        "Fetched {}/{} tickers",
        frames.len(),
        watchlist.len()
    ));

    let quotes = combine_quotes(watchlist.symbols(), frames)?;
    println!("\nCombined price data (first {} rows):", rows);
    println!("{}", quotes.head(Some(rows)));

    let normalized = normalize_prices(&quotes, base)?;
    println!("\nNormalized prices (Base={}), latest per ticker:", base);
    println!("{}", latest_per_symbol(&normalized)?);

    if let Some(path) = chart {
        let plot = normalized_chart(&normalized, &chart_title(base))?;
        write_chart(&plot, path)?;
        println!("\nChart written to {}", path.display());
    }

    Ok(())
}

async fn show_etfs(config: &AppConfig, tickers: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let watchlist = AppConfig::tickers_or(tickers, &config.etf_tickers)?;
    let provider = YahooFundamentalsProvider::with_rate_limit(config.rate_limit)?;

    let results = fetch_fundamentals(&provider, watchlist.symbols(), None).await;
    for (symbol, result) in results {
        let report = match result {
            Ok(info) => {
                let enrichment = etf_profile(&symbol)
                    .map(EtfProfile::to_pairs)
                    .unwrap_or_default();
                EtfReport::new(&symbol, &info, enrichment)
            }
            Err(e) => {
                tracing::warn!(symbol = %symbol, error = %e, "failed to fetch ETF data");
                EtfReport::failed(&symbol, e)
            }
        };
        print!("{}", report.to_text());
    }

    Ok(())
}

async fn show_summary(
    config: &AppConfig,
    tickers: &[String],
    period: Option<Period>,
    format: OutputFormat,
    export: Option<PathBuf>,
    export_format: Option<ExportFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let watchlist = AppConfig::tickers_or(tickers, &config.watchlist)?;
    let period = period.unwrap_or(config.period);
    let (start, end) = period.range(Utc::now());

    let quotes = YahooQuoteProvider::with_rate_limit(config.rate_limit)?;
    let fundamentals = YahooFundamentalsProvider::with_rate_limit(config.rate_limit)?;

    let pb = progress_bar(watchlist.len())?;
    let data = fetch_ticker_data(
        &quotes,
        &fundamentals,
        watchlist.symbols(),
        start,
        end,
        Some(&pb),
    )
    .await;
    pb.finish_and_clear();

    let title = format!("{} ({})", watchlist.name(), period);
    let table: SummaryTable = build_summary(&title, &data)?;

    match format {
        OutputFormat::Text => print!("{}", table.to_ascii_table()),
        OutputFormat::Json => println!("{}", summary_to_json_string(&table, true)?),
        OutputFormat::Markdown => print!("{}", table.to_markdown()),
    }

    if let Some(path) = export {
        let export_format = export_format
            .or_else(|| ExportFormat::from_path(&path))
            .unwrap_or_default();
        table.export_to_file(&path, export_format)?;
        eprintln!("Exported {} rows to {}", table.rows.len(), path.display());
    }

    Ok(())
}

fn show_watchlist(config: &AppConfig) {
    println!("{} ({} tickers)", config.watchlist.name(), config.watchlist.size());
    println!("=========================\n");
    for symbol in config.watchlist.symbols() {
        let marker = if etf_profile(symbol).is_some() {
            " (curated ETF profile)"
        } else {
            ""
        };
        println!("  {}{}", symbol, marker);
    }

    println!("\nETF tickers: {}", config.etf_tickers.symbols().join(", "));
    println!(
        "Curated profiles: {}",
        profiled_symbols().collect::<Vec<_>>().join(", ")
    );
    println!("Default period: {}", config.period);
    if let Some(path) = default_config_path() {
        println!("Config file: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prices_defaults() {
        let cli = Cli::try_parse_from(["stockinfo", "prices"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Commands::Prices {
                tickers,
                period,
                base,
                chart,
                no_chart,
                rows,
            } => {
                assert!(tickers.is_empty());
                assert_eq!(period, None);
                assert_eq!(base, 100.0);
                assert_eq!(chart, None);
                assert!(!no_chart);
                assert_eq!(rows, 5);
            }
            _ => panic!("expected prices"),
        }
    }

    #[test]
    fn test_summary_arguments() {
        let cli = Cli::try_parse_from([
            "stockinfo",
            "--log-level",
            "debug",
            "summary",
            "TME",
            "HACK",
            "--period",
            "1y",
            "--format",
            "markdown",
            "--export",
            "out.json",
            "--export-format",
            "pretty-json",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Summary {
                tickers,
                period,
                format,
                export,
                export_format,
            } => {
                assert_eq!(tickers, vec!["TME", "HACK"]);
                assert_eq!(period, Some(Period::OneYear));
                assert_eq!(format, OutputFormat::Markdown);
                assert_eq!(export, Some(PathBuf::from("out.json")));
                assert_eq!(export_format, Some(ExportFormat::PrettyJson));
            }
            _ => panic!("expected summary"),
        }
    }

    #[rstest]
    #[case(&["stockinfo", "prices", "--period", "7w"])]
    #[case(&["stockinfo", "summary", "--export-format", "csv"])]
    #[case(&["stockinfo", "summary", "--export", "x", "--export-format", "xlsx"])]
    #[case(&["stockinfo", "summary", "--format", "html"])]
    fn test_rejected_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args).is_err());
    }
}
