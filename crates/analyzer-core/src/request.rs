//! Request model: data categories, time periods, and the resolved request

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A distinct type of financial data that can be downloaded and exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Price and volume history
    History,
    /// Annual financial statements
    Financials,
    /// Quarterly financial statements
    QuarterlyFinancials,
    /// Annual balance sheet
    BalanceSheet,
    /// Quarterly balance sheet
    QuarterlyBalanceSheet,
    /// Annual cash flow
    Cashflow,
    /// Quarterly cash flow
    QuarterlyCashflow,
    /// Dividend history
    Dividends,
    /// Stock split history
    Splits,
    /// Company information
    Info,
}

impl DataCategory {
    /// All categories, in menu and export order
    pub const ALL: [DataCategory; 10] = [
        DataCategory::History,
        DataCategory::Financials,
        DataCategory::QuarterlyFinancials,
        DataCategory::BalanceSheet,
        DataCategory::QuarterlyBalanceSheet,
        DataCategory::Cashflow,
        DataCategory::QuarterlyCashflow,
        DataCategory::Dividends,
        DataCategory::Splits,
        DataCategory::Info,
    ];

    /// Stable identifier used in file names and the configuration file
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::History => "history",
            DataCategory::Financials => "financials",
            DataCategory::QuarterlyFinancials => "quarterly_financials",
            DataCategory::BalanceSheet => "balance_sheet",
            DataCategory::QuarterlyBalanceSheet => "quarterly_balance_sheet",
            DataCategory::Cashflow => "cashflow",
            DataCategory::QuarterlyCashflow => "quarterly_cashflow",
            DataCategory::Dividends => "dividends",
            DataCategory::Splits => "splits",
            DataCategory::Info => "info",
        }
    }

    /// Human-readable description shown in the interactive menu
    pub fn description(&self) -> &'static str {
        match self {
            DataCategory::History => "Price and volume history",
            DataCategory::Financials => "Annual financial statements",
            DataCategory::QuarterlyFinancials => "Quarterly financial statements",
            DataCategory::BalanceSheet => "Annual balance sheet",
            DataCategory::QuarterlyBalanceSheet => "Quarterly balance sheet",
            DataCategory::Cashflow => "Annual cash flow",
            DataCategory::QuarterlyCashflow => "Quarterly cash flow",
            DataCategory::Dividends => "Dividend history",
            DataCategory::Splits => "Stock split history",
            DataCategory::Info => "Company information",
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataCategory {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataCategory::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| AnalyzerError::Config(format!("unknown data category: {s}")))
    }
}

/// Requested historical time span, passed through to the data provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// All valid periods, shortest first
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    /// The provider's range string for this period
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Period::ALL
            .iter()
            .find(|p| p.as_str() == normalized)
            .copied()
            .ok_or_else(|| AnalyzerError::InvalidPeriod(s.to_string()))
    }
}

/// A fully resolved download request.
///
/// Invariant: `tickers` and `categories` are never empty. The resolver
/// (interactive or argument-driven) enforces this before construction.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Upper-cased ticker symbols, in user order
    pub tickers: Vec<String>,
    /// Selected data categories
    pub categories: Vec<DataCategory>,
    /// Historical time span for price data
    pub period: Period,
    /// Root directory for per-ticker output folders
    pub output_dir: PathBuf,
    /// Whether to render candlestick charts
    pub generate_plots: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse_roundtrip() {
        for period in Period::ALL {
            let parsed: Period = period.as_str().parse().unwrap();
            assert_eq!(parsed, period);
        }
    }

    #[test]
    fn test_period_parse_case_insensitive() {
        assert_eq!("YTD".parse::<Period>().unwrap(), Period::YearToDate);
        assert_eq!(" Max ".parse::<Period>().unwrap(), Period::Max);
    }

    #[test]
    fn test_period_parse_rejects_malformed() {
        assert!("1w".parse::<Period>().is_err());
        assert!("".parse::<Period>().is_err());
        assert!("yesterday".parse::<Period>().is_err());
    }

    #[test]
    fn test_category_parse_roundtrip() {
        for category in DataCategory::ALL {
            let parsed: DataCategory = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_category_descriptions_nonempty() {
        for category in DataCategory::ALL {
            assert!(!category.description().is_empty());
        }
    }
}
