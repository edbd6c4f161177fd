//! Fetch-and-export orchestration
//!
//! Tickers are processed one at a time; within a ticker, every selected
//! category is fetched through the retry policy and exported on its own.
//! A failing category never aborts the other categories, and a failing
//! ticker never aborts the run. Per ticker the flow is
//! pending -> fetching -> {full, partial, failed} -> exported, and the
//! export step only disappears when every category failed.

use crate::api::MarketData;
use crate::chart;
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, Result};
use crate::export::{self, CategoryData};
use crate::request::{AnalysisRequest, DataCategory, Period};
use crate::retry::RetryPolicy;
use crate::stats::PriceSummary;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Terminal state of one (ticker, category) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStatus {
    /// Fetched and written to disk
    Exported,
    /// Fetch or write failed; carries the user-facing reason
    Failed(String),
}

/// Terminal state of one ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerOutcome {
    /// Every selected category was exported
    FullSuccess,
    /// At least one category was exported, at least one failed
    PartialSuccess,
    /// No category could be exported; no output folder is created
    FullFailure,
}

/// Report for one processed ticker
#[derive(Debug, Clone)]
pub struct TickerReport {
    pub symbol: String,
    pub outcome: TickerOutcome,
    pub statuses: Vec<(DataCategory, CategoryStatus)>,
    /// The ticker's output folder, if anything was written
    pub output_dir: Option<PathBuf>,
    /// The rendered chart, if any
    pub chart_path: Option<PathBuf>,
}

/// Report for a whole run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tickers: Vec<TickerReport>,
}

impl RunReport {
    /// Whether any ticker failed on every category.
    ///
    /// Drives the process exit status: full failures make the run non-zero.
    pub fn any_full_failure(&self) -> bool {
        self.tickers
            .iter()
            .any(|t| t.outcome == TickerOutcome::FullFailure)
    }
}

/// Sequential fetch-and-export driver
pub struct Orchestrator {
    config: AnalyzerConfig,
    source: Arc<dyn MarketData>,
    retry: RetryPolicy,
}

impl Orchestrator {
    /// Create a new orchestrator over a market-data source
    pub fn new(config: AnalyzerConfig, source: Arc<dyn MarketData>) -> Self {
        let retry = config.retry_policy();
        Self {
            config,
            source,
            retry,
        }
    }

    /// Process every ticker in the request, in order
    pub async fn run(&self, request: &AnalysisRequest) -> RunReport {
        let mut report = RunReport::default();

        for (i, symbol) in request.tickers.iter().enumerate() {
            info!(
                "[{}/{}] Analyzing {symbol}...",
                i + 1,
                request.tickers.len()
            );
            report.tickers.push(self.process_ticker(request, symbol).await);
        }

        report
    }

    async fn fetch_category(
        &self,
        symbol: &str,
        category: DataCategory,
        period: Period,
    ) -> Result<CategoryData> {
        let name = format!("{symbol}/{category}");
        let symbol = symbol.to_string();
        let source = Arc::clone(&self.source);

        // Each retry attempt gets an owned future
        self.retry
            .execute(&name, move || {
                let source = Arc::clone(&source);
                let symbol = symbol.clone();
                async move {
                    match category {
                        DataCategory::History => source
                            .history(&symbol, period)
                            .await
                            .map(CategoryData::History),
                        DataCategory::Financials => source
                            .income_statements(&symbol, false)
                            .await
                            .map(CategoryData::IncomeStatements),
                        DataCategory::QuarterlyFinancials => source
                            .income_statements(&symbol, true)
                            .await
                            .map(CategoryData::IncomeStatements),
                        DataCategory::BalanceSheet => source
                            .balance_sheets(&symbol, false)
                            .await
                            .map(CategoryData::BalanceSheets),
                        DataCategory::QuarterlyBalanceSheet => source
                            .balance_sheets(&symbol, true)
                            .await
                            .map(CategoryData::BalanceSheets),
                        DataCategory::Cashflow => source
                            .cashflow_statements(&symbol, false)
                            .await
                            .map(CategoryData::CashflowStatements),
                        DataCategory::QuarterlyCashflow => source
                            .cashflow_statements(&symbol, true)
                            .await
                            .map(CategoryData::CashflowStatements),
                        DataCategory::Dividends => source
                            .dividends(&symbol, period)
                            .await
                            .map(CategoryData::Dividends),
                        DataCategory::Splits => source
                            .splits(&symbol, period)
                            .await
                            .map(CategoryData::Splits),
                        DataCategory::Info => source
                            .company_profile(&symbol)
                            .await
                            .map(CategoryData::Info),
                    }
                }
            })
            .await
    }

    async fn process_ticker(&self, request: &AnalysisRequest, symbol: &str) -> TickerReport {
        let mut statuses: Vec<(DataCategory, CategoryStatus)> = Vec::new();
        let mut fetched: Vec<(DataCategory, CategoryData)> = Vec::new();

        for &category in &request.categories {
            match self.fetch_category(symbol, category, request.period).await {
                Ok(data) => fetched.push((category, data)),
                Err(e) => {
                    warn!("{symbol}: {category} failed: {e}");
                    statuses.push((category, CategoryStatus::Failed(e.to_string())));
                }
            }
        }

        if fetched.is_empty() {
            // Nothing to write; the ticker folder is never created
            error!("{symbol}: every category failed");
            return TickerReport {
                symbol: symbol.to_string(),
                outcome: TickerOutcome::FullFailure,
                statuses,
                output_dir: None,
                chart_path: None,
            };
        }

        let ticker_dir = request.output_dir.join(symbol);
        if let Err(e) = std::fs::create_dir_all(&ticker_dir) {
            let err = AnalyzerError::io(&ticker_dir, e);
            error!("{symbol}: {err}");
            for (category, _) in fetched {
                statuses.push((category, CategoryStatus::Failed(err.to_string())));
            }
            return TickerReport {
                symbol: symbol.to_string(),
                outcome: TickerOutcome::FullFailure,
                statuses,
                output_dir: None,
                chart_path: None,
            };
        }

        let timestamp = Utc::now().format("%Y%m%d");
        let mut exported_any = false;

        for (category, data) in &fetched {
            let filename = format!("{symbol}_{category}_{timestamp}.xlsx");
            let path = ticker_dir.join(&filename);
            match export::write_category_workbook(&path, *category, data) {
                Ok(()) => {
                    info!("{symbol}: wrote {filename}");
                    exported_any = true;
                    statuses.push((*category, CategoryStatus::Exported));
                }
                Err(e) => {
                    error!("{symbol}: writing {} failed: {e}", path.display());
                    statuses.push((*category, CategoryStatus::Failed(e.to_string())));
                }
            }
        }

        if self.config.generate_summary && exported_any {
            let summary = fetched
                .iter()
                .find_map(|(_, data)| data.as_history())
                .and_then(PriceSummary::from_bars);
            let path = ticker_dir.join(format!("{symbol}_summary_{timestamp}.xlsx"));
            match export::write_summary_workbook(&path, summary.as_ref(), &fetched) {
                Ok(()) => info!("{symbol}: wrote summary workbook"),
                Err(e) => error!("{symbol}: summary workbook failed: {e}"),
            }
        }

        let mut chart_path = None;
        if request.generate_plots {
            if let Some(bars) = fetched.iter().find_map(|(_, data)| data.as_history()) {
                let path = ticker_dir.join(format!("{symbol}_chart_{timestamp}.png"));
                match chart::render_candlestick(bars, symbol, &path, &self.config.chart) {
                    Ok(()) => {
                        info!("{symbol}: wrote chart");
                        chart_path = Some(path);
                    }
                    Err(e) => error!("{symbol}: chart rendering failed: {e}"),
                }
            }
        }

        let failed_any = statuses
            .iter()
            .any(|(_, s)| matches!(s, CategoryStatus::Failed(_)));
        let outcome = match (exported_any, failed_any) {
            (true, false) => TickerOutcome::FullSuccess,
            (true, true) => TickerOutcome::PartialSuccess,
            (false, _) => TickerOutcome::FullFailure,
        };

        TickerReport {
            symbol: symbol.to_string(),
            outcome,
            statuses,
            output_dir: Some(ticker_dir),
            chart_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DividendEvent, MockMarketData, PriceBar};
    use crate::request::Period;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::path::Path;
    use std::time::Duration;

    fn sample_bars() -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        (0..10)
            .map(|i| PriceBar {
                timestamp: start + ChronoDuration::days(i),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1_000,
                adjclose: 100.5,
            })
            .collect()
    }

    fn test_config() -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .max_retries(3)
            .retry_backoff_base(Duration::from_millis(1))
            .build()
            .unwrap()
    }

    fn test_request(dir: &Path, categories: Vec<DataCategory>) -> AnalysisRequest {
        AnalysisRequest {
            tickers: vec!["AAPL".to_string()],
            categories,
            period: Period::OneYear,
            output_dir: dir.to_path_buf(),
            generate_plots: false,
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("analyzer-orch-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn test_full_success_creates_folder_per_ticker() {
        let dir = temp_dir("full-success");
        let mut mock = MockMarketData::new();
        mock.expect_history()
            .returning(|_, _| Ok(sample_bars()));
        mock.expect_dividends().returning(|_, _| {
            Ok(vec![DividendEvent {
                date: Utc.with_ymd_and_hms(2024, 2, 9, 0, 0, 0).unwrap(),
                amount: 0.24,
            }])
        });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let request = test_request(&dir, vec![DataCategory::History, DataCategory::Dividends]);
        let report = orchestrator.run(&request).await;

        assert_eq!(report.tickers.len(), 1);
        assert_eq!(report.tickers[0].outcome, TickerOutcome::FullSuccess);
        assert!(!report.any_full_failure());

        let ticker_dir = dir.join("AAPL");
        assert!(ticker_dir.is_dir());
        let files: Vec<String> = std::fs::read_dir(&ticker_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(files.iter().any(|f| f.contains("_history_")));
        assert!(files.iter().any(|f| f.contains("_dividends_")));
        assert!(files.iter().any(|f| f.contains("_summary_")));
        // Plots disabled: no image
        assert!(!files.iter().any(|f| f.ends_with(".png")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_failed_category_does_not_abort_others() {
        let dir = temp_dir("partial");
        let mut mock = MockMarketData::new();
        mock.expect_history().returning(|_, _| {
            Err(AnalyzerError::DataUnavailable {
                symbol: "AAPL".to_string(),
                reason: "no data".to_string(),
            })
        });
        mock.expect_dividends().returning(|_, _| {
            Ok(vec![DividendEvent {
                date: Utc.with_ymd_and_hms(2024, 2, 9, 0, 0, 0).unwrap(),
                amount: 0.24,
            }])
        });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let request = test_request(&dir, vec![DataCategory::History, DataCategory::Dividends]);
        let report = orchestrator.run(&request).await;

        let ticker = &report.tickers[0];
        assert_eq!(ticker.outcome, TickerOutcome::PartialSuccess);
        assert!(
            ticker
                .statuses
                .iter()
                .any(|(c, s)| *c == DataCategory::History
                    && matches!(s, CategoryStatus::Failed(_)))
        );
        assert!(
            ticker
                .statuses
                .iter()
                .any(|(c, s)| *c == DataCategory::Dividends && *s == CategoryStatus::Exported)
        );

        let ticker_dir = dir.join("AAPL");
        let files: Vec<String> = std::fs::read_dir(&ticker_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        // No workbook for the failed category
        assert!(!files.iter().any(|f| f.contains("_history_")));
        assert!(files.iter().any(|f| f.contains("_dividends_")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_full_failure_creates_no_folder() {
        let dir = temp_dir("full-failure");
        let mut mock = MockMarketData::new();
        mock.expect_history().returning(|_, _| {
            Err(AnalyzerError::DataUnavailable {
                symbol: "BADTICKER".to_string(),
                reason: "unknown symbol".to_string(),
            })
        });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let mut request = test_request(&dir, vec![DataCategory::History]);
        request.tickers = vec!["BADTICKER".to_string()];
        let report = orchestrator.run(&request).await;

        assert_eq!(report.tickers[0].outcome, TickerOutcome::FullFailure);
        assert!(report.any_full_failure());
        assert!(report.tickers[0].output_dir.is_none());
        assert!(!dir.join("BADTICKER").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_to_exhaustion() {
        let dir = temp_dir("retry");
        let mut mock = MockMarketData::new();
        mock.expect_history()
            .times(3) // max_retries attempts, then give up
            .returning(|_, _| {
                Err(AnalyzerError::RateLimited {
                    provider: "yahoo".to_string(),
                })
            });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let request = test_request(&dir, vec![DataCategory::History]);
        let report = orchestrator.run(&request).await;

        assert_eq!(report.tickers[0].outcome, TickerOutcome::FullFailure);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let dir = temp_dir("no-retry");
        let mut mock = MockMarketData::new();
        mock.expect_history()
            .times(1)
            .returning(|_, _| {
                Err(AnalyzerError::DataUnavailable {
                    symbol: "BTC-USD".to_string(),
                    reason: "balanceSheetHistory not available for this instrument".to_string(),
                })
            });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let mut request = test_request(&dir, vec![DataCategory::History]);
        request.tickers = vec!["BTC-USD".to_string()];
        orchestrator.run(&request).await;

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_bad_ticker_does_not_stop_good_ticker() {
        let dir = temp_dir("mixed");
        let mut mock = MockMarketData::new();
        mock.expect_history().returning(|symbol, _| {
            if symbol == "AAPL" {
                Ok(sample_bars())
            } else {
                Err(AnalyzerError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "unknown symbol".to_string(),
                })
            }
        });

        let orchestrator = Orchestrator::new(test_config(), Arc::new(mock));
        let mut request = test_request(&dir, vec![DataCategory::History]);
        request.tickers = vec!["BADTICKER".to_string(), "AAPL".to_string()];
        let report = orchestrator.run(&request).await;

        assert_eq!(report.tickers[0].outcome, TickerOutcome::FullFailure);
        assert_eq!(report.tickers[1].outcome, TickerOutcome::FullSuccess);
        assert!(report.any_full_failure());
        assert!(dir.join("AAPL").is_dir());
        assert!(!dir.join("BADTICKER").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
