//! Yahoo Finance history client
//!
//! Price bars, dividends, and splits come from the chart endpoint via the
//! `yahoo_finance_api` crate. Statements and company info live in
//! [`crate::api::fundamentals`].

use crate::error::{AnalyzerError, Result};
use crate::request::Period;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

/// A dividend payment event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendEvent {
    pub date: DateTime<Utc>,
    pub amount: f64,
}

/// A stock split event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitEvent {
    pub date: DateTime<Utc>,
    pub numerator: f64,
    pub denominator: f64,
}

/// Client for historical price data
pub struct YahooHistoryClient {
    connector: yahoo::YahooConnector,
}

fn map_yahoo_error(symbol: &str, err: yahoo::YahooError) -> AnalyzerError {
    match err {
        yahoo::YahooError::NoResult | yahoo::YahooError::NoQuotes => AnalyzerError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "provider returned an empty data set".to_string(),
        },
        other => AnalyzerError::YahooFinance(other.to_string()),
    }
}

impl YahooHistoryClient {
    /// Create a new history client
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| AnalyzerError::YahooFinance(e.to_string()))?;
        Ok(Self { connector })
    }

    async fn quote_range(&self, symbol: &str, period: Period) -> Result<yahoo::YResponse> {
        self.connector
            .get_quote_range(symbol, "1d", period.as_str())
            .await
            .map_err(|e| map_yahoo_error(symbol, e))
    }

    /// Daily price history for a symbol over the requested period
    pub async fn history(&self, symbol: &str, period: Period) -> Result<Vec<PriceBar>> {
        let response = self.quote_range(symbol, period).await?;
        let quotes = response
            .quotes()
            .map_err(|e| map_yahoo_error(symbol, e))?;

        if quotes.is_empty() {
            return Err(AnalyzerError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no historical data for period {period}"),
            });
        }

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                timestamp: DateTime::from_timestamp(q.timestamp as i64, 0)
                    .unwrap_or_else(Utc::now),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
                adjclose: q.adjclose,
            })
            .collect())
    }

    /// Dividend events over the requested period
    pub async fn dividends(&self, symbol: &str, period: Period) -> Result<Vec<DividendEvent>> {
        let response = self.quote_range(symbol, period).await?;
        let dividends = response
            .dividends()
            .map_err(|e| map_yahoo_error(symbol, e))?;

        Ok(dividends
            .iter()
            .map(|d| DividendEvent {
                date: DateTime::from_timestamp(d.date as i64, 0).unwrap_or_else(Utc::now),
                amount: d.amount,
            })
            .collect())
    }

    /// Split events over the requested period
    pub async fn splits(&self, symbol: &str, period: Period) -> Result<Vec<SplitEvent>> {
        let response = self.quote_range(symbol, period).await?;
        let splits = response
            .splits()
            .map_err(|e| map_yahoo_error(symbol, e))?;

        Ok(splits
            .iter()
            .map(|s| SplitEvent {
                date: DateTime::from_timestamp(s.date as i64, 0).unwrap_or_else(Utc::now),
                numerator: s.numerator,
                denominator: s.denominator,
            })
            .collect())
    }
}
