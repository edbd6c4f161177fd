//! API clients for market data
//!
//! The orchestrator consumes the [`MarketData`] trait rather than the
//! concrete clients, so fetch behavior can be mocked in tests.

pub mod fundamentals;
pub mod yahoo;

use crate::error::Result;
use crate::request::Period;
use async_trait::async_trait;
use std::time::Duration;

pub use fundamentals::{
    BalanceSheet, CashflowStatement, CompanyProfile, IncomeStatement, QuoteSummaryClient,
};
pub use yahoo::{DividendEvent, PriceBar, SplitEvent, YahooHistoryClient};

/// Everything the orchestrator needs from a market-data provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Daily price history over the requested period
    async fn history(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>>;

    /// Dividend events over the requested period
    async fn dividends(&self, symbol: &str, period: Period) -> Result<Vec<DividendEvent>>;

    /// Split events over the requested period
    async fn splits(&self, symbol: &str, period: Period) -> Result<Vec<SplitEvent>>;

    /// Income statements, annual or quarterly
    async fn income_statements(
        &self,
        symbol: &str,
        quarterly: bool,
    ) -> Result<Vec<IncomeStatement>>;

    /// Balance sheets, annual or quarterly
    async fn balance_sheets(&self, symbol: &str, quarterly: bool) -> Result<Vec<BalanceSheet>>;

    /// Cash flow statements, annual or quarterly
    async fn cashflow_statements(
        &self,
        symbol: &str,
        quarterly: bool,
    ) -> Result<Vec<CashflowStatement>>;

    /// Company information
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile>;
}

/// Production [`MarketData`] source backed by Yahoo Finance
pub struct YahooMarketData {
    history: YahooHistoryClient,
    fundamentals: QuoteSummaryClient,
}

impl YahooMarketData {
    /// Create a new source with the given per-request timeout
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            history: YahooHistoryClient::new()?,
            fundamentals: QuoteSummaryClient::new(request_timeout)?,
        })
    }
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn history(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>> {
        self.history.history(symbol, period).await
    }

    async fn dividends(&self, symbol: &str, period: Period) -> Result<Vec<DividendEvent>> {
        self.history.dividends(symbol, period).await
    }

    async fn splits(&self, symbol: &str, period: Period) -> Result<Vec<SplitEvent>> {
        self.history.splits(symbol, period).await
    }

    async fn income_statements(
        &self,
        symbol: &str,
        quarterly: bool,
    ) -> Result<Vec<IncomeStatement>> {
        self.fundamentals.income_statements(symbol, quarterly).await
    }

    async fn balance_sheets(&self, symbol: &str, quarterly: bool) -> Result<Vec<BalanceSheet>> {
        self.fundamentals.balance_sheets(symbol, quarterly).await
    }

    async fn cashflow_statements(
        &self,
        symbol: &str,
        quarterly: bool,
    ) -> Result<Vec<CashflowStatement>> {
        self.fundamentals
            .cashflow_statements(symbol, quarterly)
            .await
    }

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        self.fundamentals.company_profile(symbol).await
    }
}
