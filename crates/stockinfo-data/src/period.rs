//! Lookback periods for price history requests.

use crate::error::DataError;
use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback window for a price download, ending now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    /// One calendar month.
    OneMonth,
    /// Three calendar months.
    ThreeMonths,
    /// Six calendar months.
    #[default]
    SixMonths,
    /// One calendar year.
    OneYear,
    /// Two calendar years.
    TwoYears,
    /// Five calendar years.
    FiveYears,
    /// Since January 1st of the current year.
    YearToDate,
    /// Everything Yahoo has.
    Max,
}

impl Period {
    /// All periods, shortest first.
    pub const fn all() -> [Self; 8] {
        [
            Self::OneMonth,
            Self::ThreeMonths,
            Self::SixMonths,
            Self::OneYear,
            Self::TwoYears,
            Self::FiveYears,
            Self::YearToDate,
            Self::Max,
        ]
    }

    /// Short code used on the command line (`6mo`, `1y`, ...).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::YearToDate => "ytd",
            Self::Max => "max",
        }
    }

    const fn months(&self) -> Option<u32> {
        match self {
            Self::OneMonth => Some(1),
            Self::ThreeMonths => Some(3),
            Self::SixMonths => Some(6),
            Self::OneYear => Some(12),
            Self::TwoYears => Some(24),
            Self::FiveYears => Some(60),
            Self::YearToDate | Self::Max => None,
        }
    }

    /// Start and end of the window ending at `now`.
    pub fn range(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let epoch = DateTime::from_timestamp(86_400, 0).unwrap_or(DateTime::UNIX_EPOCH);

        let start = match self {
            Self::YearToDate => Utc
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(epoch),
            Self::Max => epoch,
            _ => self
                .months()
                .and_then(|m| now.checked_sub_months(Months::new(m)))
                .unwrap_or(epoch),
        };

        (start, now)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Period {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|p| p.code() == normalized)
            .ok_or_else(|| DataError::InvalidPeriod(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.code().to_string()
    }
}
