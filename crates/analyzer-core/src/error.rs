//! Error types for market data download and export operations

use std::path::PathBuf;
use thiserror::Error;

/// Analyzer specific errors
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Invalid period string provided
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable {
        symbol: String,
        reason: String,
    },

    /// Rate limit exceeded for the data provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimited {
        provider: String,
    },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet writing error
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Chart rendering error
    #[error("Chart error: {0}")]
    Chart(String),

    /// File-system error, carrying the offending path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Run exceeded the configured timeout
    #[error("Operation timed out")]
    Timeout,
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

impl AnalyzerError {
    /// Whether a retry may succeed.
    ///
    /// Network failures and rate limits are transient; unknown symbols,
    /// missing data, and local errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            AnalyzerError::Network(_) | AnalyzerError::RateLimited { .. } => true,
            // The Yahoo client folds HTTP failures into its own error type,
            // so treat them as transient unless the symbol itself is bad.
            AnalyzerError::YahooFinance(_) => true,
            _ => false,
        }
    }

    /// Build an I/O error carrying the offending path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalyzerError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for AnalyzerError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        AnalyzerError::Workbook(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyzerError::InvalidPeriod("1w".to_string());
        assert_eq!(err.to_string(), "Invalid period: 1w");

        let err = AnalyzerError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
    }

    #[test]
    fn test_transient_classification() {
        assert!(AnalyzerError::RateLimited {
            provider: "yahoo".to_string()
        }
        .is_transient());
        assert!(AnalyzerError::YahooFinance("HTTP 503".to_string()).is_transient());

        assert!(!AnalyzerError::InvalidPeriod("1w".to_string()).is_transient());
        assert!(
            !AnalyzerError::DataUnavailable {
                symbol: "BTC-USD".to_string(),
                reason: "no balance sheet".to_string(),
            }
            .is_transient()
        );
        assert!(!AnalyzerError::Config("bad".to_string()).is_transient());
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = AnalyzerError::io(
            "/tmp/out/AAPL",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out/AAPL"));
        assert!(!err.is_transient());
    }
}
