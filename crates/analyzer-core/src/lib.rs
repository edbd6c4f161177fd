//! Stock market data download and export
//!
//! This crate is the core of the `stock-analyzer` tool. It downloads
//! publicly available market data for user-specified ticker symbols,
//! computes summary statistics, renders candlestick charts, and exports
//! everything as spreadsheet workbooks, one folder per ticker. It includes:
//!
//! - Price history, dividends, and splits via Yahoo Finance
//! - Financial statements and company info via the quote-summary endpoint
//! - Bounded retry with exponential backoff around every fetch
//! - Per-category spreadsheet workbooks plus an aggregate summary workbook
//! - Candlestick chart rendering with a volume sub-panel
//!
//! # Example
//!
//! ```rust,ignore
//! use analyzer_core::{AnalysisRequest, AnalyzerConfig, Orchestrator, YahooMarketData};
//! use analyzer_core::request::{DataCategory, Period};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnalyzerConfig::default();
//!     let source = Arc::new(YahooMarketData::new(config.request_timeout)?);
//!
//!     let request = AnalysisRequest {
//!         tickers: vec!["AAPL".to_string()],
//!         categories: DataCategory::ALL.to_vec(),
//!         period: Period::OneYear,
//!         output_dir: "Analysis".into(),
//!         generate_plots: true,
//!     };
//!
//!     let report = Orchestrator::new(config, source).run(&request).await;
//!     assert!(!report.any_full_failure());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod request;
pub mod retry;
pub mod stats;

// Re-export main types for convenience
pub use api::{MarketData, YahooMarketData};
pub use config::{AnalyzerConfig, ChartSettings};
pub use error::{AnalyzerError, Result};
pub use orchestrator::{Orchestrator, RunReport, TickerOutcome, TickerReport};
pub use request::{AnalysisRequest, DataCategory, Period};
pub use retry::RetryPolicy;
pub use stats::PriceSummary;
