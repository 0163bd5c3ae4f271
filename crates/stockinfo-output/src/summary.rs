//! Per-ticker summary table combining return statistics and ratios.

use crate::format::{NOT_AVAILABLE, format_percent, format_price, format_ratio};
use serde::{Deserialize, Serialize};
use stockinfo_analytics::{FinancialRatios, ReturnStats};
use stockinfo_data::yahoo::TickerInfo;

/// One row of the summary table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Ticker symbol
    pub symbol: String,
    /// Display name
    pub name: Option<String>,
    /// Last close in the window
    pub last_close: Option<f64>,
    /// Total return over the window (fraction)
    pub total_return: Option<f64>,
    /// Annualized volatility (fraction)
    pub annualized_volatility: Option<f64>,
    /// Gross margin (fraction)
    pub gross_margin: Option<f64>,
    /// Operating margin (fraction)
    pub operating_margin: Option<f64>,
    /// Net margin (fraction)
    pub net_margin: Option<f64>,
    /// Debt to equity (x)
    pub debt_to_equity: Option<f64>,
    /// Return on equity (fraction)
    pub return_on_equity: Option<f64>,
}

impl SummaryRow {
    /// Assemble a row from whatever was fetched for `symbol`.
    pub fn from_parts(
        symbol: &str,
        stats: Option<&ReturnStats>,
        info: Option<&TickerInfo>,
        ratios: Option<&FinancialRatios>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: info.and_then(|i| i.display_name()).map(str::to_string),
            last_close: stats.and_then(|s| s.last_close),
            total_return: stats.and_then(|s| s.total_return),
            annualized_volatility: stats.and_then(|s| s.annualized_volatility),
            gross_margin: ratios.and_then(|r| r.gross_margin),
            operating_margin: ratios.and_then(|r| r.operating_margin),
            net_margin: ratios.and_then(|r| r.net_margin),
            debt_to_equity: ratios.and_then(|r| r.debt_to_equity),
            return_on_equity: ratios.and_then(|r| r.return_on_equity),
        }
    }
}

/// Titled collection of summary rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// Table title
    pub title: String,
    /// Rows in watchlist order
    pub rows: Vec<SummaryRow>,
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}

impl SummaryTable {
    /// Create a table.
    pub fn new(title: impl Into<String>, rows: Vec<SummaryRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    /// Render as a fixed-width text table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();
        let width = 124;

        output.push_str(&format!("\n{}\n", self.title));
        output.push_str(&"=".repeat(width));
        output.push('\n');

        output.push_str(&format!(
            "{:<8} {:<24} {:>10} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8} {:>9}\n",
            "Symbol", "Name", "Last", "Return", "Vol(ann)", "Gross", "Oper", "Net", "D/E", "ROE"
        ));
        output.push_str(&"-".repeat(width));
        output.push('\n');

        for row in &self.rows {
            output.push_str(&format!(
                "{:<8} {:<24} {:>10} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8} {:>9}\n",
                row.symbol,
                truncate(row.name.as_deref().unwrap_or(NOT_AVAILABLE), 24),
                format_price(row.last_close),
                format_percent(row.total_return),
                format_percent(row.annualized_volatility),
                format_percent(row.gross_margin),
                format_percent(row.operating_margin),
                format_percent(row.net_margin),
                format_ratio(row.debt_to_equity),
                format_percent(row.return_on_equity),
            ));
        }

        output.push_str(&"=".repeat(width));
        output.push('\n');
        output
    }

    /// Render as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# {}\n\n", self.title));
        output.push_str(
            "| Symbol | Name | Last | Return | Vol (ann.) | Gross Margin | Operating Margin | Net Margin | D/E | ROE |\n",
        );
        output.push_str("|---|---|---|---|---|---|---|---|---|---|\n");

        for row in &self.rows {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                row.symbol,
                row.name.as_deref().unwrap_or(NOT_AVAILABLE).replace('|', "\\|"),
                format_price(row.last_close),
                format_percent(row.total_return),
                format_percent(row.annualized_volatility),
                format_percent(row.gross_margin),
                format_percent(row.operating_margin),
                format_percent(row.net_margin),
                format_ratio(row.debt_to_equity),
                format_percent(row.return_on_equity),
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SummaryTable {
        SummaryTable::new(
            "Cyber basket, 6mo",
            vec![
                SummaryRow {
                    symbol: "TME".to_string(),
                    name: Some("Tencent Music Entertainment Group".to_string()),
                    last_close: Some(11.2),
                    total_return: Some(0.21),
                    annualized_volatility: Some(0.45),
                    gross_margin: Some(0.4),
                    debt_to_equity: Some(0.5),
                    ..Default::default()
                },
                SummaryRow {
                    symbol: "HACK".to_string(),
                    ..Default::default()
                },
            ],
        )
    }

    #[test]
    fn test_ascii_table() {
        let ascii = table().to_ascii_table();
        assert!(ascii.contains("Cyber basket, 6mo"));
        assert!(ascii.contains("Symbol"));
        assert!(ascii.contains("Tencent Music Entertain~"));
        assert!(ascii.contains("$11.20"));
        assert!(ascii.contains("21.00%"));
        assert!(ascii.contains("0.50"));

        let hack_line = ascii.lines().find(|l| l.starts_with("HACK")).unwrap();
        assert_eq!(hack_line.matches("N/A").count(), 9);
    }

    #[test]
    fn test_markdown() {
        let md = table().to_markdown();
        assert!(md.starts_with("# Cyber basket, 6mo"));
        assert!(md.contains("| TME | Tencent Music Entertainment Group | $11.20 | 21.00% |"));
        assert_eq!(md.lines().filter(|l| l.starts_with("| ")).count(), 3);
    }

    #[test]
    fn test_from_parts_without_data() {
        let row = SummaryRow::from_parts("IHAK", None, None, None);
        assert_eq!(row.symbol, "IHAK");
        assert_eq!(row, SummaryRow {
            symbol: "IHAK".to_string(),
            ..Default::default()
        });
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd~");
    }
}
