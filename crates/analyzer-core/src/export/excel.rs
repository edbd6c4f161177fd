//! Workbook writers
//!
//! Dates are written as `YYYY-MM-DD` strings so workbooks open identically
//! everywhere; statements put line items in rows and fiscal periods in
//! columns, newest first, the way financial sites print them.

use super::CategoryData;
use crate::api::{
    BalanceSheet, CashflowStatement, CompanyProfile, DividendEvent, IncomeStatement, PriceBar,
    SplitEvent,
};
use crate::error::Result;
use crate::request::DataCategory;
use crate::stats::PriceSummary;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// Excel's hard limit on sheet name length
const MAX_SHEET_NAME: usize = 31;

/// A financial statement that can be laid out as a period column
trait StatementTable {
    fn end_date(&self) -> NaiveDate;
    fn line_items(&self) -> Vec<(&'static str, Option<f64>)>;
}

impl StatementTable for IncomeStatement {
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
    fn line_items(&self) -> Vec<(&'static str, Option<f64>)> {
        IncomeStatement::line_items(self)
    }
}

impl StatementTable for BalanceSheet {
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
    fn line_items(&self) -> Vec<(&'static str, Option<f64>)> {
        BalanceSheet::line_items(self)
    }
}

impl StatementTable for CashflowStatement {
    fn end_date(&self) -> NaiveDate {
        self.end_date
    }
    fn line_items(&self) -> Vec<(&'static str, Option<f64>)> {
        CashflowStatement::line_items(self)
    }
}

fn header_format() -> Format {
    Format::new().set_bold()
}

/// Truncate a sheet name to Excel's 31-character limit
fn sheet_name(name: &str) -> String {
    name.chars().take(MAX_SHEET_NAME).collect()
}

fn write_history_sheet(worksheet: &mut Worksheet, bars: &[PriceBar]) -> Result<()> {
    let bold = header_format();
    let headers = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    worksheet.set_column_width(0, 12)?;

    for (i, bar) in bars.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, bar.timestamp.format("%Y-%m-%d").to_string())?;
        worksheet.write_number(row, 1, bar.open)?;
        worksheet.write_number(row, 2, bar.high)?;
        worksheet.write_number(row, 3, bar.low)?;
        worksheet.write_number(row, 4, bar.close)?;
        worksheet.write_number(row, 5, bar.adjclose)?;
        worksheet.write_number(row, 6, bar.volume as f64)?;
    }
    Ok(())
}

fn write_statement_sheet<T: StatementTable>(
    worksheet: &mut Worksheet,
    statements: &[T],
) -> Result<()> {
    let bold = header_format();
    worksheet.set_column_width(0, 32)?;

    // One column per fiscal period, newest first
    for (i, statement) in statements.iter().enumerate() {
        let col = (i + 1) as u16;
        worksheet.write_string_with_format(
            0,
            col,
            statement.end_date().format("%Y-%m-%d").to_string(),
            &bold,
        )?;
        worksheet.set_column_width(col, 16)?;
    }

    if let Some(first) = statements.first() {
        for (row_idx, (label, _)) in first.line_items().iter().enumerate() {
            worksheet.write_string_with_format((row_idx + 1) as u32, 0, *label, &bold)?;
        }
    }

    for (i, statement) in statements.iter().enumerate() {
        let col = (i + 1) as u16;
        for (row_idx, (_, value)) in statement.line_items().iter().enumerate() {
            if let Some(value) = value {
                worksheet.write_number((row_idx + 1) as u32, col, *value)?;
            }
        }
    }
    Ok(())
}

fn write_dividends_sheet(worksheet: &mut Worksheet, events: &[DividendEvent]) -> Result<()> {
    let bold = header_format();
    worksheet.write_string_with_format(0, 0, "Date", &bold)?;
    worksheet.write_string_with_format(0, 1, "Dividend", &bold)?;
    worksheet.set_column_width(0, 12)?;

    for (i, event) in events.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, event.date.format("%Y-%m-%d").to_string())?;
        worksheet.write_number(row, 1, event.amount)?;
    }
    Ok(())
}

fn write_splits_sheet(worksheet: &mut Worksheet, events: &[SplitEvent]) -> Result<()> {
    let bold = header_format();
    let headers = ["Date", "Numerator", "Denominator"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }
    worksheet.set_column_width(0, 12)?;

    for (i, event) in events.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, event.date.format("%Y-%m-%d").to_string())?;
        worksheet.write_number(row, 1, event.numerator)?;
        worksheet.write_number(row, 2, event.denominator)?;
    }
    Ok(())
}

fn write_info_sheet(worksheet: &mut Worksheet, profile: &CompanyProfile) -> Result<()> {
    let bold = header_format();
    worksheet.write_string_with_format(0, 0, "Field", &bold)?;
    worksheet.write_string_with_format(0, 1, "Value", &bold)?;
    worksheet.set_column_width(0, 24)?;
    worksheet.set_column_width(1, 48)?;

    for (i, (label, value)) in profile.rows().iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, *label)?;
        worksheet.write_string(row, 1, value)?;
    }
    Ok(())
}

fn write_data_sheet(worksheet: &mut Worksheet, data: &CategoryData) -> Result<()> {
    match data {
        CategoryData::History(bars) => write_history_sheet(worksheet, bars),
        CategoryData::IncomeStatements(statements) => {
            write_statement_sheet(worksheet, statements)
        }
        CategoryData::BalanceSheets(sheets) => write_statement_sheet(worksheet, sheets),
        CategoryData::CashflowStatements(statements) => {
            write_statement_sheet(worksheet, statements)
        }
        CategoryData::Dividends(events) => write_dividends_sheet(worksheet, events),
        CategoryData::Splits(events) => write_splits_sheet(worksheet, events),
        CategoryData::Info(profile) => write_info_sheet(worksheet, profile),
    }
}

/// Write one category's data as a single-sheet workbook
pub fn write_category_workbook(
    path: &Path,
    category: DataCategory,
    data: &CategoryData,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(category.as_str()))?;
    write_data_sheet(worksheet, data)?;
    workbook.save(path)?;
    Ok(())
}

/// Write the per-ticker summary workbook.
///
/// The `Summary` sheet holds key statistics when history was fetched; each
/// successfully fetched category gets its own sheet. Failed categories are
/// simply absent.
pub fn write_summary_workbook(
    path: &Path,
    summary: Option<&PriceSummary>,
    fetched: &[(DataCategory, CategoryData)],
) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = header_format();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Summary")?;
    worksheet.write_string_with_format(0, 0, "Metric", &bold)?;
    worksheet.write_string_with_format(0, 1, "Value", &bold)?;
    worksheet.set_column_width(0, 24)?;
    if let Some(summary) = summary {
        for (i, (metric, value)) in summary.rows().iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_string(row, 0, *metric)?;
            worksheet.write_string(row, 1, value)?;
        }
    }

    for (category, data) in fetched {
        let name = match category {
            DataCategory::History => "Historical Data".to_string(),
            other => sheet_name(other.as_str()),
        };
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_data_sheet(worksheet, data)?;
    }

    workbook.save(path)?;
    Ok(())
}
