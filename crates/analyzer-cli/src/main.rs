//! Stock Market Data Analyzer CLI
//!
//! An interactive command-line tool that downloads market data for
//! user-specified tickers, renders candlestick charts, and exports
//! spreadsheet workbooks into one folder per ticker.
//!
//! # Usage
//!
//! ```bash
//! # Fully interactive
//! stock-analyzer
//!
//! # Tickers from the command line, category menu still interactive
//! stock-analyzer AAPL MSFT --period 1y --output ./Analysis --no-plots
//! ```

use analyzer_core::request::Period;
use analyzer_core::{AnalyzerConfig, Orchestrator, TickerOutcome, YahooMarketData};
use anyhow::Context;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

mod prompt;

#[derive(Parser, Debug)]
#[command(name = "stock-analyzer")]
#[command(about = "Download and analyze stock market data", long_about = None)]
struct Args {
    /// Ticker symbols to analyze
    tickers: Vec<String>,

    /// Time period (1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)
    #[arg(short, long, value_parser = parse_period)]
    period: Option<Period>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable chart generation
    #[arg(long = "no-plots", action = clap::ArgAction::SetFalse)]
    generate_plots: bool,

    /// Path to a configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_period(s: &str) -> Result<Period, String> {
    s.parse().map_err(|_| {
        format!("invalid period '{s}' (expected one of: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")
    })
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,analyzer_core=info".to_string()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    info!("Starting stock-analyzer");

    let config = AnalyzerConfig::load_or_default(args.config.as_deref())?;

    println!("\n=== Stock Market Data Analyzer ===");
    println!("This tool downloads and analyzes financial data for any publicly traded stock");

    let arg_values = prompt::ArgValues {
        tickers: args.tickers,
        period: args.period,
        output: args.output,
        generate_plots: args.generate_plots,
    };

    let stdin = io::stdin();
    let resolution = prompt::resolve(arg_values, &config, &mut stdin.lock(), &mut io::stdout())?;

    let request = match resolution {
        prompt::Resolution::Aborted => {
            println!("\nExiting Stock Market Data Analyzer. Goodbye!");
            return Ok(ExitCode::SUCCESS);
        }
        prompt::Resolution::Request(request) => request,
    };

    println!("\nProcessing {} ticker(s)...", request.tickers.len());
    println!("This may take a few minutes depending on the amount of data requested.");

    let source = Arc::new(YahooMarketData::new(config.request_timeout)?);
    let run_timeout = config.run_timeout;
    let output_dir = request.output_dir.clone();
    let orchestrator = Orchestrator::new(config, source);

    let report = tokio::time::timeout(run_timeout, orchestrator.run(&request))
        .await
        .map_err(|_| analyzer_core::AnalyzerError::Timeout)
        .with_context(|| format!("run timed out after {} seconds", run_timeout.as_secs()))?;

    println!("\n=== Analysis Complete! ===");
    println!("Data has been saved to: {}", output_dir.display());
    for ticker in &report.tickers {
        match ticker.outcome {
            TickerOutcome::FullSuccess => println!("  \u{2713} {}", ticker.symbol),
            TickerOutcome::PartialSuccess => {
                println!("  \u{2713} {} (some categories failed)", ticker.symbol);
            }
            TickerOutcome::FullFailure => {
                println!("  \u{2717} {}: no data could be fetched", ticker.symbol);
            }
        }
    }

    if report.any_full_failure() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
