//! Spreadsheet export
//!
//! One workbook per fetched category per ticker, plus a summary workbook
//! aggregating statistics and every successfully fetched category.

pub mod excel;

use crate::api::{
    BalanceSheet, CashflowStatement, CompanyProfile, DividendEvent, IncomeStatement, PriceBar,
    SplitEvent,
};

pub use excel::{write_category_workbook, write_summary_workbook};

/// Successfully fetched data for one (ticker, category) pair
#[derive(Debug, Clone)]
pub enum CategoryData {
    History(Vec<PriceBar>),
    IncomeStatements(Vec<IncomeStatement>),
    BalanceSheets(Vec<BalanceSheet>),
    CashflowStatements(Vec<CashflowStatement>),
    Dividends(Vec<DividendEvent>),
    Splits(Vec<SplitEvent>),
    Info(CompanyProfile),
}

impl CategoryData {
    /// The price bars, if this is history data
    pub fn as_history(&self) -> Option<&[PriceBar]> {
        match self {
            CategoryData::History(bars) => Some(bars),
            _ => None,
        }
    }
}
