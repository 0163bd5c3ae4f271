//! Financial ratios from statement line items.

use serde::{Deserialize, Serialize};
use std::fmt;
use stockinfo_data::yahoo::TickerInfo;

/// Divide two optional amounts.
///
/// `None` when either side is missing or non-finite, or the denominator is zero.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if !n.is_finite() || !d.is_finite() || d == 0.0 {
        return None;
    }
    Some(n / d)
}

/// Where the ratios of a [`FinancialRatios`] came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioSource {
    /// Computed from annual statement line items
    Statements,
    /// Taken from the ratios Yahoo reports
    Reported,
    /// Some of each
    Mixed,
    /// Nothing available
    #[default]
    Unavailable,
}

impl fmt::Display for RatioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Statements => "statements",
            Self::Reported => "reported",
            Self::Mixed => "mixed",
            Self::Unavailable => "unavailable",
        })
    }
}

/// Profitability and leverage ratios for one ticker. All values are plain
/// fractions (0.25 is 25%, a debt-to-equity of 1.5 is 1.5x).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    /// Gross profit / revenue
    pub gross_margin: Option<f64>,
    /// Operating income / revenue
    pub operating_margin: Option<f64>,
    /// Net income / revenue
    pub net_margin: Option<f64>,
    /// Interest-bearing debt / stockholders equity
    pub debt_to_equity: Option<f64>,
    /// Net income / stockholders equity
    pub return_on_equity: Option<f64>,
    /// Net income / total assets
    pub return_on_assets: Option<f64>,
    /// Current assets / current liabilities (reported only)
    pub current_ratio: Option<f64>,
    /// Provenance of the values above
    pub source: RatioSource,
}

#[derive(Default)]
struct Provenance {
    statements: bool,
    reported: bool,
}

impl Provenance {
    fn pick(&mut self, computed: Option<f64>, reported: Option<f64>) -> Option<f64> {
        if computed.is_some() {
            self.statements = true;
            return computed;
        }
        let reported = reported.filter(|v| v.is_finite());
        if reported.is_some() {
            self.reported = true;
        }
        reported
    }

    const fn source(&self) -> RatioSource {
        match (self.statements, self.reported) {
            (true, true) => RatioSource::Mixed,
            (true, false) => RatioSource::Statements,
            (false, true) => RatioSource::Reported,
            (false, false) => RatioSource::Unavailable,
        }
    }
}

impl FinancialRatios {
    /// Compute ratios for a ticker.
    ///
    /// The newest annual statements win; any ratio they cannot produce falls
    /// back to the value Yahoo reports in `financialData`.
    pub fn from_info(info: &TickerInfo) -> Self {
        let income = info.latest_income_statement();
        let sheet = info.latest_balance_sheet();

        let revenue = income.and_then(|i| i.total_revenue);
        let gross_profit = income.and_then(|i| {
            i.gross_profit.or_else(|| match (i.total_revenue, i.cost_of_revenue) {
                (Some(r), Some(c)) => Some(r - c),
                _ => None,
            })
        });
        let operating_income = income.and_then(|i| i.operating_income);
        let net_income = income.and_then(|i| i.net_income);

        let equity = sheet
            .and_then(|s| s.stockholders_equity)
            .filter(|e| *e > 0.0);
        let assets = sheet.and_then(|s| s.total_assets);
        let debt = sheet.and_then(|s| match (s.long_term_debt, s.short_term_debt) {
            (None, None) => None,
            (long, short) => Some(long.unwrap_or(0.0) + short.unwrap_or(0.0)),
        });

        let mut provenance = Provenance::default();
        let gross_margin = provenance.pick(safe_ratio(gross_profit, revenue), info.gross_margins);
        let operating_margin = provenance.pick(
            safe_ratio(operating_income, revenue),
            info.operating_margins,
        );
        let net_margin = provenance.pick(safe_ratio(net_income, revenue), info.profit_margins);
        let debt_to_equity = provenance.pick(
            safe_ratio(debt, equity),
            info.debt_to_equity.map(|pct| pct / 100.0),
        );
        let return_on_equity =
            provenance.pick(safe_ratio(net_income, equity), info.return_on_equity);
        let return_on_assets =
            provenance.pick(safe_ratio(net_income, assets), info.return_on_assets);
        let current_ratio = provenance.pick(None, info.current_ratio);

        Self {
            gross_margin,
            operating_margin,
            net_margin,
            debt_to_equity,
            return_on_equity,
            return_on_assets,
            current_ratio,
            source: provenance.source(),
        }
    }
}
