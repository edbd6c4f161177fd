//! Configuration for download and export runs
//!
//! Defaults can be overridden by an optional JSON configuration file in the
//! working directory. The config is built once at startup and passed by
//! value into the resolver and orchestrator; there is no ambient state.

use crate::error::{AnalyzerError, Result};
use crate::request::{DataCategory, Period};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Well-known configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Candlestick chart appearance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Up-candle color, `#rrggbb`
    pub up_color: String,
    /// Down-candle color, `#rrggbb`
    pub down_color: String,
    /// Canvas background color, `#rrggbb`
    pub background: String,
    /// Grid line color, `#rrggbb`
    pub grid_color: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 1000,
            up_color: "#2ecc71".to_string(),
            down_color: "#e74c3c".to_string(),
            background: "#1e1e1e".to_string(),
            grid_color: "#404040".to_string(),
        }
    }
}

/// Configuration for a download-and-export run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Period used when the user accepts the default
    pub default_period: Period,

    /// Root output directory used when the user accepts the default
    pub output_dir: PathBuf,

    /// Whether to render candlestick charts
    pub generate_plots: bool,

    /// Whether to write the per-ticker summary workbook
    pub generate_summary: bool,

    /// Categories preselected in the interactive menu
    pub default_categories: Vec<DataCategory>,

    /// Maximum number of attempts for a single fetch
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Timeout for the whole run
    pub run_timeout: Duration,

    /// Chart appearance
    pub chart: ChartSettings,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_period: Period::TwoYears,
            output_dir: PathBuf::from("Analysis"),
            generate_plots: true,
            generate_summary: true,
            default_categories: DataCategory::ALL.to_vec(),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            run_timeout: Duration::from_secs(300),
            chart: ChartSettings::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::default()
    }

    /// Load configuration from a JSON file, failing on any error
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| AnalyzerError::io(path, e))?;
        let config: AnalyzerConfig = serde_json::from_str(&contents)
            .map_err(|e| AnalyzerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional explicit path, or from the
    /// well-known location.
    ///
    /// An explicit path must load cleanly. The well-known file is optional:
    /// absent or malformed files fall back to built-in defaults with a
    /// warning rather than aborting.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let well_known = Path::new(DEFAULT_CONFIG_FILE);
        if !well_known.exists() {
            return Ok(Self::default());
        }

        match Self::load(well_known) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("Ignoring malformed {}: {e}", well_known.display());
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(AnalyzerError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.default_categories.is_empty() {
            return Err(AnalyzerError::Config(
                "default_categories must not be empty".to_string(),
            ));
        }

        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(AnalyzerError::Config(
                "chart dimensions must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The retry policy implied by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.retry_backoff_base,
            Duration::from_secs(10),
            2.0,
        )
    }
}

/// Builder for AnalyzerConfig
#[derive(Debug, Default)]
pub struct AnalyzerConfigBuilder {
    default_period: Option<Period>,
    output_dir: Option<PathBuf>,
    generate_plots: Option<bool>,
    generate_summary: Option<bool>,
    default_categories: Option<Vec<DataCategory>>,
    max_retries: Option<u32>,
    retry_backoff_base: Option<Duration>,
    request_timeout: Option<Duration>,
    run_timeout: Option<Duration>,
    chart: Option<ChartSettings>,
}

impl AnalyzerConfigBuilder {
    /// Set the default period
    pub fn default_period(mut self, period: Period) -> Self {
        self.default_period = Some(period);
        self
    }

    /// Set the default output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Enable or disable chart generation
    pub fn generate_plots(mut self, enabled: bool) -> Self {
        self.generate_plots = Some(enabled);
        self
    }

    /// Enable or disable the summary workbook
    pub fn generate_summary(mut self, enabled: bool) -> Self {
        self.generate_summary = Some(enabled);
        self
    }

    /// Set the preselected categories
    pub fn default_categories(mut self, categories: Vec<DataCategory>) -> Self {
        self.default_categories = Some(categories);
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set retry backoff base duration
    pub fn retry_backoff_base(mut self, duration: Duration) -> Self {
        self.retry_backoff_base = Some(duration);
        self
    }

    /// Set per-request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set whole-run timeout
    pub fn run_timeout(mut self, duration: Duration) -> Self {
        self.run_timeout = Some(duration);
        self
    }

    /// Set chart appearance
    pub fn chart(mut self, settings: ChartSettings) -> Self {
        self.chart = Some(settings);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalyzerConfig> {
        let defaults = AnalyzerConfig::default();

        let config = AnalyzerConfig {
            default_period: self.default_period.unwrap_or(defaults.default_period),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            generate_plots: self.generate_plots.unwrap_or(defaults.generate_plots),
            generate_summary: self.generate_summary.unwrap_or(defaults.generate_summary),
            default_categories: self
                .default_categories
                .unwrap_or(defaults.default_categories),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff_base: self
                .retry_backoff_base
                .unwrap_or(defaults.retry_backoff_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            run_timeout: self.run_timeout.unwrap_or(defaults.run_timeout),
            chart: self.chart.unwrap_or(defaults.chart),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.default_period, Period::TwoYears);
        assert_eq!(config.max_retries, 3);
        assert!(config.generate_plots);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AnalyzerConfig::builder()
            .default_period(Period::OneYear)
            .max_retries(5)
            .generate_plots(false)
            .output_dir("/tmp/out")
            .build()
            .unwrap();

        assert_eq!(config.default_period, Period::OneYear);
        assert_eq!(config.max_retries, 5);
        assert!(!config.generate_plots);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let result = AnalyzerConfig::builder().max_retries(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_categories() {
        let result = AnalyzerConfig::builder()
            .default_categories(Vec::new())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = AnalyzerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnalyzerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.default_period, config.default_period);
        assert_eq!(parsed.default_categories, config.default_categories);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let parsed: AnalyzerConfig =
            serde_json::from_str(r#"{"default_period": "1y", "generate_plots": false}"#)
                .unwrap();
        assert_eq!(parsed.default_period, Period::OneYear);
        assert!(!parsed.generate_plots);
        // Unspecified fields fall back to defaults
        assert_eq!(parsed.max_retries, 3);
        assert!(parsed.generate_summary);
    }

    #[test]
    fn test_load_or_default_with_missing_explicit_path_errors() {
        let result =
            AnalyzerConfig::load_or_default(Some(Path::new("/nonexistent/config.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = AnalyzerConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_secs(1));
    }
}
