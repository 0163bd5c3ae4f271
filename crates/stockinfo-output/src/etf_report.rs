//! Enhanced ETF report: Yahoo data plus manual enrichment.

use crate::format::{format_count, format_money, format_percent, format_price, NOT_AVAILABLE};
use serde::{Deserialize, Serialize};
use stockinfo_data::yahoo::TickerInfo;

const BANNER_WIDTH: usize = 70;
const RULE_WIDTH: usize = 40;

/// Report for one ETF, ready to print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfReport {
    /// Ticker symbol
    pub symbol: String,
    /// Basic quote fields as label/value pairs
    pub basic: Vec<(String, String)>,
    /// Fund fields; `None` when Yahoo did not supply the value
    pub fund: Vec<(String, Option<String>)>,
    /// Hand-curated label/value pairs
    pub enrichment: Vec<(String, String)>,
    /// Error that prevented fetching, if any
    pub error: Option<String>,
}

impl EtfReport {
    /// Build a report from fetched data and optional curated fields.
    pub fn new(symbol: &str, info: &TickerInfo, enrichment: Vec<(String, String)>) -> Self {
        let basic = vec![
            ("Name", info.long_name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            ("Symbol", info.symbol.clone()),
            ("Current Price", format_price(info.current_price)),
            ("Previous Close", format_price(info.previous_close)),
            ("Volume", format_count(info.volume)),
            ("Market Cap", format_money(info.market_cap)),
            ("52W High", format_price(info.fifty_two_week_high)),
            ("52W Low", format_price(info.fifty_two_week_low)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let fund = vec![
            ("Total Assets", info.total_assets.map(|v| format_money(Some(v)))),
            ("Expense Ratio", info.expense_ratio.map(|v| format_percent(Some(v)))),
            ("YTD Return", info.ytd_return.map(|v| format_percent(Some(v)))),
            ("Fund Family", info.fund_family.clone()),
            ("Category", info.category.clone()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            symbol: symbol.to_string(),
            basic,
            fund,
            enrichment,
            error: None,
        }
    }

    /// Report for a symbol whose fetch failed.
    pub fn failed(symbol: &str, error: impl ToString) -> Self {
        Self {
            symbol: symbol.to_string(),
            basic: Vec::new(),
            fund: Vec::new(),
            enrichment: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    /// Render as plain text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(&"=".repeat(BANNER_WIDTH));
        output.push('\n');
        output.push_str(&format!("ENHANCED ETF DATA FOR {}\n", self.symbol));
        output.push_str(&"=".repeat(BANNER_WIDTH));
        output.push('\n');

        if let Some(error) = &self.error {
            output.push_str(&format!("Error: {error}\n"));
            return output;
        }

        output.push_str("FROM YAHOO FINANCE:\n");
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');
        for (label, value) in &self.basic {
            output.push_str(&format!("{label}: {value}\n"));
        }

        output.push_str("\nETF-SPECIFIC DATA (often limited on Yahoo Finance):\n");
        for (label, value) in &self.fund {
            match value {
                Some(v) => output.push_str(&format!("{label}: {v}\n")),
                None => output.push_str(&format!("{label}: NOT AVAILABLE from Yahoo Finance\n")),
            }
        }

        output.push_str("\nMANUAL ENRICHMENT:\n");
        for (label, value) in &self.enrichment {
            output.push_str(&format!("{label}: {value}\n"));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> TickerInfo {
        TickerInfo {
            symbol: "HACK".to_string(),
            long_name: Some("Amplify Cybersecurity ETF".to_string()),
            current_price: Some(71.25),
            previous_close: Some(70.5),
            volume: Some(123_456),
            fifty_two_week_high: Some(75.0),
            fifty_two_week_low: Some(52.1),
            total_assets: Some(1.6e9),
            expense_ratio: Some(0.006),
            fund_family: Some("Amplify ETFs".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_section() {
        let text = EtfReport::new("HACK", &info(), Vec::new()).to_text();

        assert!(text.contains("ENHANCED ETF DATA FOR HACK"));
        assert!(text.contains(&"=".repeat(70)));
        assert!(text.contains("Name: Amplify Cybersecurity ETF\n"));
        assert!(text.contains("Current Price: $71.25\n"));
        assert!(text.contains("Volume: 123,456\n"));
        assert!(text.contains("Market Cap: N/A\n"));
        assert!(text.contains("52W Low: $52.10\n"));
    }

    #[test]
    fn test_fund_section_placeholders() {
        let text = EtfReport::new("HACK", &info(), Vec::new()).to_text();

        assert!(text.contains("Total Assets: $1,600,000,000\n"));
        assert!(text.contains("Expense Ratio: 0.60%\n"));
        assert!(text.contains("YTD Return: NOT AVAILABLE from Yahoo Finance\n"));
        assert!(text.contains("Fund Family: Amplify ETFs\n"));
        assert!(text.contains("Category: NOT AVAILABLE from Yahoo Finance\n"));
    }

    #[test]
    fn test_enrichment_section_order() {
        let enrichment = vec![
            ("ETF Provider".to_string(), "ETFMG".to_string()),
            ("AUM".to_string(), "~$1.5B".to_string()),
        ];
        let text = EtfReport::new("HACK", &info(), enrichment).to_text();

        let manual = text.find("MANUAL ENRICHMENT:").unwrap();
        let provider = text.find("ETF Provider: ETFMG").unwrap();
        let aum = text.find("AUM: ~$1.5B").unwrap();
        assert!(manual < provider && provider < aum);
    }

    #[test]
    fn test_failed_report() {
        let text = EtfReport::failed("ZZZZ", "Invalid symbol: ZZZZ").to_text();
        assert!(text.contains("ENHANCED ETF DATA FOR ZZZZ"));
        assert!(text.ends_with("Error: Invalid symbol: ZZZZ\n"));
        assert!(!text.contains("FROM YAHOO FINANCE"));
    }
}
