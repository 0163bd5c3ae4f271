//! Fundamental data fetching from Yahoo Finance.
//!
//! Everything comes from the quote-summary endpoint, one request per symbol.
//! Yahoo is inconsistent about which fields it fills (funds rarely carry
//! `financialData`, OTC listings often lack statements), so every field is
//! optional and falls back across modules where the same figure appears twice.

use crate::error::{DataError, Result};
use crate::yahoo::session::{DEFAULT_USER_AGENT, YahooSession};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Quote-summary modules requested for every symbol.
pub const MODULES: &[&str] = &[
    "price",
    "summaryDetail",
    "defaultKeyStatistics",
    "financialData",
    "fundProfile",
    "quoteType",
    "incomeStatementHistory",
    "balanceSheetHistory",
];

/// Annual income statement line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Fiscal period end
    pub end_date: Option<NaiveDate>,
    /// Total revenue
    pub total_revenue: Option<f64>,
    /// Cost of revenue
    pub cost_of_revenue: Option<f64>,
    /// Gross profit
    pub gross_profit: Option<f64>,
    /// Operating income
    pub operating_income: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
}

/// Annual balance sheet line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Fiscal period end
    pub end_date: Option<NaiveDate>,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Total liabilities
    pub total_liabilities: Option<f64>,
    /// Stockholders equity
    pub stockholders_equity: Option<f64>,
    /// Long-term debt
    pub long_term_debt: Option<f64>,
    /// Current portion of long-term debt
    pub short_term_debt: Option<f64>,
    /// Cash and equivalents
    pub cash: Option<f64>,
}

/// Per-ticker scalars from the quote-summary endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    /// Ticker symbol as requested
    pub symbol: String,
    /// Long display name
    pub long_name: Option<String>,
    /// Short display name
    pub short_name: Option<String>,
    /// EQUITY, ETF, MUTUALFUND, ...
    pub quote_type: Option<String>,
    /// Trading currency
    pub currency: Option<String>,
    /// Exchange name
    pub exchange: Option<String>,

    /// Current price
    pub current_price: Option<f64>,
    /// Previous close
    pub previous_close: Option<f64>,
    /// Latest session volume
    pub volume: Option<u64>,
    /// Market capitalization
    pub market_cap: Option<f64>,
    /// 52-week high
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low
    pub fifty_two_week_low: Option<f64>,
    /// Beta
    pub beta: Option<f64>,
    /// Trailing P/E ratio
    pub trailing_pe: Option<f64>,

    /// Fund net assets
    pub total_assets: Option<f64>,
    /// Annual report expense ratio (fraction)
    pub expense_ratio: Option<f64>,
    /// Year-to-date return (fraction)
    pub ytd_return: Option<f64>,
    /// Fund family
    pub fund_family: Option<String>,
    /// Fund category
    pub category: Option<String>,

    /// Reported gross margin (fraction)
    pub gross_margins: Option<f64>,
    /// Reported operating margin (fraction)
    pub operating_margins: Option<f64>,
    /// Reported net profit margin (fraction)
    pub profit_margins: Option<f64>,
    /// Reported return on equity (fraction)
    pub return_on_equity: Option<f64>,
    /// Reported return on assets (fraction)
    pub return_on_assets: Option<f64>,
    /// Reported current ratio
    pub current_ratio: Option<f64>,
    /// Reported debt to equity, in percent (150.0 means 1.5x)
    pub debt_to_equity: Option<f64>,

    /// Revenue (TTM)
    pub total_revenue: Option<f64>,
    /// Gross profit (TTM)
    pub gross_profits: Option<f64>,
    /// EBITDA (TTM)
    pub ebitda: Option<f64>,
    /// Total debt
    pub total_debt: Option<f64>,
    /// Total cash
    pub total_cash: Option<f64>,
    /// Operating cash flow (TTM)
    pub operating_cashflow: Option<f64>,
    /// Free cash flow (TTM)
    pub free_cashflow: Option<f64>,

    /// Annual income statements, newest first
    pub income_statements: Vec<IncomeStatement>,
    /// Annual balance sheets, newest first
    pub balance_sheets: Vec<BalanceSheet>,
}

impl TickerInfo {
    /// Best display name available.
    pub fn display_name(&self) -> Option<&str> {
        self.long_name.as_deref().or(self.short_name.as_deref())
    }

    /// Newest annual income statement.
    pub fn latest_income_statement(&self) -> Option<&IncomeStatement> {
        self.income_statements.first()
    }

    /// Newest annual balance sheet.
    pub fn latest_balance_sheet(&self) -> Option<&BalanceSheet> {
        self.balance_sheets.first()
    }
}

/// Read a number that Yahoo may send bare or as `{"raw": n, "fmt": "..."}`.
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::Object(map) => map.get("raw").and_then(Value::as_f64),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn count(value: Option<&Value>) -> Option<u64> {
    number(value).filter(|n| *n >= 0.0).map(|n| n as u64)
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn date(value: Option<&Value>) -> Option<NaiveDate> {
    number(value)
        .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
        .map(|dt| dt.date_naive())
}

fn parse_income_statement(item: &Value) -> IncomeStatement {
    IncomeStatement {
        end_date: date(item.get("endDate")),
        total_revenue: number(item.get("totalRevenue")),
        cost_of_revenue: number(item.get("costOfRevenue")),
        gross_profit: number(item.get("grossProfit")),
        operating_income: number(item.get("operatingIncome")),
        net_income: number(item.get("netIncome")),
    }
}

fn parse_balance_sheet(item: &Value) -> BalanceSheet {
    BalanceSheet {
        end_date: date(item.get("endDate")),
        total_assets: number(item.get("totalAssets")),
        total_liabilities: number(item.get("totalLiab")),
        stockholders_equity: number(item.get("totalStockholderEquity")),
        long_term_debt: number(item.get("longTermDebt")),
        short_term_debt: number(item.get("shortLongTermDebt")),
        cash: number(item.get("cash")),
    }
}

fn statements<T>(module: Option<&Value>, key: &str, parse: fn(&Value) -> T) -> Vec<T> {
    module
        .and_then(|m| m.get(key))
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse).collect())
        .unwrap_or_default()
}

/// Parse a quote-summary response body into a [`TickerInfo`].
pub fn parse_quote_summary(symbol: &str, body: &Value) -> Result<TickerInfo> {
    let summary = body
        .get("quoteSummary")
        .ok_or_else(|| DataError::Parse(format!("{symbol}: missing quoteSummary")))?;

    if let Some(error) = summary.get("error").filter(|e| !e.is_null()) {
        let code = text(error.get("code")).unwrap_or_default();
        let description = text(error.get("description")).unwrap_or_else(|| code.clone());
        return Err(if code.eq_ignore_ascii_case("Not Found") {
            DataError::InvalidSymbol(format!("{symbol}: {description}"))
        } else {
            DataError::YahooApi(description)
        });
    }

    let result = summary
        .get("result")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
        .ok_or_else(|| DataError::MissingData {
            symbol: symbol.to_string(),
            reason: "empty quoteSummary result".to_string(),
        })?;

    let price = result.get("price");
    let detail = result.get("summaryDetail");
    let stats = result.get("defaultKeyStatistics");
    let financial = result.get("financialData");
    let profile = result.get("fundProfile");
    let quote_type = result.get("quoteType");

    let p = |key: &str| price.and_then(|m| m.get(key));
    let d = |key: &str| detail.and_then(|m| m.get(key));
    let s = |key: &str| stats.and_then(|m| m.get(key));
    let f = |key: &str| financial.and_then(|m| m.get(key));
    let q = |key: &str| quote_type.and_then(|m| m.get(key));

    let fund_expense = profile
        .and_then(|m| m.get("feesExpensesInvestment"))
        .and_then(|m| m.get("annualReportExpenseRatio"));

    let mut income_statements = statements(
        result.get("incomeStatementHistory"),
        "incomeStatementHistory",
        parse_income_statement,
    );
    income_statements.sort_by(|a, b| b.end_date.cmp(&a.end_date));

    let mut balance_sheets = statements(
        result.get("balanceSheetHistory"),
        "balanceSheetStatements",
        parse_balance_sheet,
    );
    balance_sheets.sort_by(|a, b| b.end_date.cmp(&a.end_date));

    Ok(TickerInfo {
        symbol: text(p("symbol")).unwrap_or_else(|| symbol.to_string()),
        long_name: text(p("longName")).or_else(|| text(q("longName"))),
        short_name: text(p("shortName")).or_else(|| text(q("shortName"))),
        quote_type: text(p("quoteType")).or_else(|| text(q("quoteType"))),
        currency: text(p("currency")).or_else(|| text(d("currency"))),
        exchange: text(p("exchangeName")).or_else(|| text(q("exchange"))),

        current_price: number(f("currentPrice")).or_else(|| number(p("regularMarketPrice"))),
        previous_close: number(d("previousClose"))
            .or_else(|| number(p("regularMarketPreviousClose"))),
        volume: count(d("volume")).or_else(|| count(p("regularMarketVolume"))),
        market_cap: number(p("marketCap")).or_else(|| number(d("marketCap"))),
        fifty_two_week_high: number(d("fiftyTwoWeekHigh")),
        fifty_two_week_low: number(d("fiftyTwoWeekLow")),
        beta: number(d("beta")).or_else(|| number(s("beta3Year"))),
        trailing_pe: number(d("trailingPE")),

        total_assets: number(s("totalAssets")).or_else(|| number(d("totalAssets"))),
        expense_ratio: number(s("annualReportExpenseRatio")).or_else(|| number(fund_expense)),
        ytd_return: number(s("ytdReturn")).or_else(|| number(d("ytdReturn"))),
        fund_family: text(s("fundFamily")).or_else(|| text(profile.and_then(|m| m.get("family")))),
        category: text(s("category"))
            .or_else(|| text(profile.and_then(|m| m.get("categoryName")))),

        gross_margins: number(f("grossMargins")),
        operating_margins: number(f("operatingMargins")),
        profit_margins: number(f("profitMargins")),
        return_on_equity: number(f("returnOnEquity")),
        return_on_assets: number(f("returnOnAssets")),
        current_ratio: number(f("currentRatio")),
        debt_to_equity: number(f("debtToEquity")),

        total_revenue: number(f("totalRevenue")),
        gross_profits: number(f("grossProfits")),
        ebitda: number(f("ebitda")),
        total_debt: number(f("totalDebt")),
        total_cash: number(f("totalCash")),
        operating_cashflow: number(f("operatingCashflow")),
        free_cashflow: number(f("freeCashflow")),

        income_statements,
        balance_sheets,
    })
}

/// Yahoo Finance fundamentals provider.
#[derive(Debug)]
pub struct YahooFundamentalsProvider {
    session: YahooSession,
    rate_limit_delay: Duration,
}

impl YahooFundamentalsProvider {
    /// Create a new Yahoo Finance fundamentals provider (1 req/sec).
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(1000))
    }

    /// Create a new provider with custom rate limiting.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            session: YahooSession::new(DEFAULT_USER_AGENT)?,
            rate_limit_delay,
        })
    }

    /// Fetch quote-summary data for a single symbol.
    pub async fn fetch_fundamentals(&self, symbol: &str) -> Result<TickerInfo> {
        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        let modules = MODULES.join(",");
        debug!(symbol, "requesting quote summary");

        let body = self
            .session
            .get_json(&url, &[("modules", modules.as_str())])
            .await;

        sleep(self.rate_limit_delay).await;

        parse_quote_summary(symbol, &body?)
    }

    /// Fetch fundamental data for multiple symbols, skipping failures.
    pub async fn fetch_fundamentals_batch(&self, symbols: &[String]) -> Vec<TickerInfo> {
        let mut fundamentals = Vec::new();

        for symbol in symbols {
            match self.fetch_fundamentals(symbol).await {
                Ok(data) => fundamentals.push(data),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "failed to fetch fundamentals, skipping");
                }
            }
        }

        fundamentals
    }

    /// Convert ticker info to a Polars DataFrame with one row per symbol.
    pub fn to_dataframe(data: &[TickerInfo]) -> Result<DataFrame> {
        if data.is_empty() {
            return Err(DataError::MissingData {
                symbol: "batch".to_string(),
                reason: "No fundamental data provided".to_string(),
            });
        }

        let symbols: Vec<&str> = data.iter().map(|d| d.symbol.as_str()).collect();
        let names: Vec<Option<&str>> = data.iter().map(TickerInfo::display_name).collect();
        let quote_types: Vec<Option<&str>> =
            data.iter().map(|d| d.quote_type.as_deref()).collect();
        let prices: Vec<Option<f64>> = data.iter().map(|d| d.current_price).collect();
        let market_caps: Vec<Option<f64>> = data.iter().map(|d| d.market_cap).collect();
        let total_assets: Vec<Option<f64>> = data.iter().map(|d| d.total_assets).collect();
        let expense_ratios: Vec<Option<f64>> = data.iter().map(|d| d.expense_ratio).collect();
        let ytd_returns: Vec<Option<f64>> = data.iter().map(|d| d.ytd_return).collect();
        let revenues: Vec<Option<f64>> = data.iter().map(|d| d.total_revenue).collect();
        let debt_to_equity: Vec<Option<f64>> = data.iter().map(|d| d.debt_to_equity).collect();

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("name".into(), names).into(),
            Series::new("quote_type".into(), quote_types).into(),
            Series::new("current_price".into(), prices).into(),
            Series::new("market_cap".into(), market_caps).into(),
            Series::new("total_assets".into(), total_assets).into(),
            Series::new("expense_ratio".into(), expense_ratios).into(),
            Series::new("ytd_return".into(), ytd_returns).into(),
            Series::new("total_revenue".into(), revenues).into(),
            Series::new("debt_to_equity".into(), debt_to_equity).into(),
        ])?;

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn etf_body() -> Value {
        json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "symbol": "HACK",
                        "longName": "Amplify Cybersecurity ETF",
                        "quoteType": "ETF",
                        "currency": "USD",
                        "regularMarketPrice": {"raw": 71.25, "fmt": "71.25"},
                        "regularMarketVolume": {"raw": 123456, "fmt": "123.46k"},
                        "marketCap": {}
                    },
                    "summaryDetail": {
                        "previousClose": {"raw": 70.5, "fmt": "70.50"},
                        "fiftyTwoWeekHigh": {"raw": 75.0},
                        "fiftyTwoWeekLow": {"raw": 52.1},
                        "totalAssets": {"raw": 1.6e9}
                    },
                    "defaultKeyStatistics": {
                        "ytdReturn": {"raw": 0.1234},
                        "fundFamily": "Amplify ETFs",
                        "category": ""
                    },
                    "fundProfile": {
                        "categoryName": "Technology",
                        "feesExpensesInvestment": {
                            "annualReportExpenseRatio": {"raw": 0.006}
                        }
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_parse_etf_fallbacks() {
        let info = parse_quote_summary("HACK", &etf_body()).unwrap();

        assert_eq!(info.symbol, "HACK");
        assert_eq!(info.display_name(), Some("Amplify Cybersecurity ETF"));
        assert_eq!(info.quote_type.as_deref(), Some("ETF"));
        assert_relative_eq!(info.current_price.unwrap(), 71.25);
        assert_relative_eq!(info.previous_close.unwrap(), 70.5);
        assert_eq!(info.volume, Some(123_456));
        assert_eq!(info.market_cap, None);
        assert_relative_eq!(info.total_assets.unwrap(), 1.6e9);
        assert_relative_eq!(info.expense_ratio.unwrap(), 0.006);
        assert_relative_eq!(info.ytd_return.unwrap(), 0.1234);
        assert_eq!(info.fund_family.as_deref(), Some("Amplify ETFs"));
        // Blank category falls through to fundProfile
        assert_eq!(info.category.as_deref(), Some("Technology"));
        assert!(info.income_statements.is_empty());
    }

    #[test]
    fn test_parse_equity_statements_sorted_newest_first() {
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "price": {"symbol": "TME", "shortName": "Tencent Music"},
                    "financialData": {
                        "currentPrice": 11.2,
                        "grossMargins": {"raw": 0.42},
                        "debtToEquity": {"raw": 8.5}
                    },
                    "incomeStatementHistory": {
                        "incomeStatementHistory": [
                            {"endDate": {"raw": 1_672_444_800}, "totalRevenue": {"raw": 100.0}},
                            {"endDate": {"raw": 1_703_980_800}, "totalRevenue": {"raw": 120.0},
                             "grossProfit": {"raw": 50.0}, "netIncome": {"raw": 20.0}}
                        ]
                    },
                    "balanceSheetHistory": {
                        "balanceSheetStatements": [
                            {"endDate": {"raw": 1_703_980_800},
                             "totalStockholderEquity": {"raw": 400.0},
                             "totalLiab": {"raw": 150.0},
                             "longTermDebt": {"raw": 30.0}}
                        ]
                    }
                }],
                "error": null
            }
        });

        let info = parse_quote_summary("TME", &body).unwrap();
        assert_eq!(info.display_name(), Some("Tencent Music"));
        assert_relative_eq!(info.current_price.unwrap(), 11.2);
        assert_relative_eq!(info.gross_margins.unwrap(), 0.42);

        let latest = info.latest_income_statement().unwrap();
        assert_eq!(latest.end_date, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(latest.total_revenue, Some(120.0));
        assert_eq!(info.income_statements.len(), 2);

        let sheet = info.latest_balance_sheet().unwrap();
        assert_eq!(sheet.stockholders_equity, Some(400.0));
        assert_eq!(sheet.total_liabilities, Some(150.0));
        assert_eq!(sheet.short_term_debt, None);
    }

    #[test]
    fn test_parse_not_found() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}
            }
        });
        let result = parse_quote_summary("ZZZZ", &body);
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[test]
    fn test_parse_other_error() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Unauthorized", "description": "Invalid Crumb"}
            }
        });
        let result = parse_quote_summary("HACK", &body);
        assert!(matches!(result, Err(DataError::YahooApi(msg)) if msg == "Invalid Crumb"));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = json!({"quoteSummary": {"result": [], "error": null}});
        let result = parse_quote_summary("HACK", &body);
        assert!(matches!(result, Err(DataError::MissingData { .. })));
    }

    #[test]
    fn test_parse_missing_envelope() {
        let result = parse_quote_summary("HACK", &Value::Null);
        assert!(matches!(result, Err(DataError::Parse(_))));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooFundamentalsProvider::with_rate_limit(Duration::ZERO).unwrap();
        let result = provider.fetch_fundamentals("").await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }

    #[test]
    fn test_to_dataframe() {
        let info = parse_quote_summary("HACK", &etf_body()).unwrap();
        let df = YahooFundamentalsProvider::to_dataframe(&[info]).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 10);
    }

    #[test]
    fn test_to_dataframe_empty() {
        assert!(YahooFundamentalsProvider::to_dataframe(&[]).is_err());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_fetch_fundamentals_live() {
        let provider = YahooFundamentalsProvider::new().unwrap();
        let info = provider.fetch_fundamentals("IHAK").await.unwrap();
        assert_eq!(info.symbol, "IHAK");
    }

    #[tokio::test]
    async fn test_batch_skips_failed_symbols() {
        let provider = YahooFundamentalsProvider::with_rate_limit(Duration::ZERO).unwrap();
        let fetched = provider
            .fetch_fundamentals_batch(&[String::new(), String::new()])
            .await;
        assert!(fetched.is_empty());
    }
}
