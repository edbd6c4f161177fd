//! Interactive request resolution
//!
//! Turns command-line arguments plus interactive prompts into a fully
//! resolved [`AnalysisRequest`]. Prompting is an explicit state machine:
//! each state re-prompts until it gets valid input, and the reserved `exit`
//! keyword aborts from any prompt. Input comes from any [`BufRead`] so the
//! whole flow is testable without a terminal.

use analyzer_core::config::AnalyzerConfig;
use analyzer_core::request::{AnalysisRequest, DataCategory, Period};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Reserved keyword that aborts the program from any prompt
const EXIT_KEYWORD: &str = "exit";

/// Values already supplied on the command line
#[derive(Debug, Default)]
pub struct ArgValues {
    pub tickers: Vec<String>,
    pub period: Option<Period>,
    pub output: Option<PathBuf>,
    pub generate_plots: bool,
}

/// Outcome of the resolution flow
#[derive(Debug)]
pub enum Resolution {
    /// All fields resolved; ready to fetch
    Request(AnalysisRequest),
    /// The user typed the exit keyword (or closed stdin)
    Aborted,
}

/// Prompting states, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitingCategories,
    AwaitingTickers,
    AwaitingPeriod,
    AwaitingOutputDir,
    Resolved,
    Aborted,
}

/// One line of user input, or an abort signal
enum Line {
    Value(String),
    Exit,
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Line> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        // EOF behaves like the exit keyword
        return Ok(Line::Exit);
    }
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case(EXIT_KEYWORD) {
        return Ok(Line::Exit);
    }
    Ok(Line::Value(trimmed.to_string()))
}

/// Split ticker input on commas and whitespace, upper-cased
fn parse_tickers(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Parse a category menu selection like `1,3,5` against the fixed menu.
///
/// Returns `None` for anything out of range or unparseable; empty input and
/// `0` select the default set.
fn parse_category_selection(raw: &str, defaults: &[DataCategory]) -> Option<Vec<DataCategory>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "0" {
        return Some(defaults.to_vec());
    }

    let mut selected = Vec::new();
    for part in trimmed.split(',') {
        let index: usize = part.trim().parse().ok()?;
        if index == 0 || index > DataCategory::ALL.len() {
            return None;
        }
        let category = DataCategory::ALL[index - 1];
        if !selected.contains(&category) {
            selected.push(category);
        }
    }
    if selected.is_empty() { None } else { Some(selected) }
}

fn print_category_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\nAvailable data types:")?;
    writeln!(out, "0. ALL - Download all available data")?;
    for (i, category) in DataCategory::ALL.iter().enumerate() {
        writeln!(out, "{}. {} ({})", i + 1, category.description(), category)?;
    }
    writeln!(out, "Type 'exit' at any prompt to quit.")
}

/// Resolve a complete request from arguments and interactive prompts.
///
/// Category selection is always prompted; tickers, period, and output
/// directory are prompted only when absent from the arguments.
pub fn resolve<R: BufRead, W: Write>(
    args: ArgValues,
    config: &AnalyzerConfig,
    input: &mut R,
    out: &mut W,
) -> io::Result<Resolution> {
    let mut stage = Stage::AwaitingCategories;

    let mut categories: Vec<DataCategory> = Vec::new();
    let mut tickers: Vec<String> = args
        .tickers
        .iter()
        .flat_map(|t| parse_tickers(t))
        .collect();
    let mut period = args.period;
    let mut output_dir = args.output.clone();

    while stage != Stage::Resolved && stage != Stage::Aborted {
        match stage {
            Stage::AwaitingCategories => {
                writeln!(out, "\nSTEP 1: Select Data Types")?;
                print_category_menu(out)?;
                write!(out, "\nEnter numbers (e.g., '1,3,5' or '0' for all): ")?;
                out.flush()?;

                match read_line(input)? {
                    Line::Exit => stage = Stage::Aborted,
                    Line::Value(raw) => {
                        match parse_category_selection(&raw, &config.default_categories) {
                            Some(selection) => {
                                let names: Vec<&str> =
                                    selection.iter().map(|c| c.as_str()).collect();
                                writeln!(out, "Selected: {}", names.join(", "))?;
                                categories = selection;
                                stage = Stage::AwaitingTickers;
                            }
                            None => {
                                writeln!(out, "Invalid selection, please try again.")?;
                            }
                        }
                    }
                }
            }
            Stage::AwaitingTickers => {
                if !tickers.is_empty() {
                    stage = Stage::AwaitingPeriod;
                    continue;
                }
                writeln!(out, "\nSTEP 2: Enter Stock Symbols")?;
                writeln!(
                    out,
                    "Enter one or more ticker symbols exactly as they appear on exchanges."
                )?;
                writeln!(out, "Examples: AAPL, MSFT, TSCO.L, BTC-USD")?;
                write!(out, "\nEnter tickers (separated by spaces or commas): ")?;
                out.flush()?;

                match read_line(input)? {
                    Line::Exit => stage = Stage::Aborted,
                    Line::Value(raw) => {
                        let parsed = parse_tickers(&raw);
                        if parsed.is_empty() {
                            writeln!(out, "Please enter at least one ticker symbol.")?;
                        } else {
                            tickers = parsed;
                            stage = Stage::AwaitingPeriod;
                        }
                    }
                }
            }
            Stage::AwaitingPeriod => {
                if period.is_some() {
                    stage = Stage::AwaitingOutputDir;
                    continue;
                }
                writeln!(out, "\nSTEP 3: Select Time Period")?;
                let all: Vec<&str> = Period::ALL.iter().map(|p| p.as_str()).collect();
                writeln!(out, "Available periods: {}", all.join(", "))?;
                write!(out, "\nEnter time period [{}]: ", config.default_period)?;
                out.flush()?;

                match read_line(input)? {
                    Line::Exit => stage = Stage::Aborted,
                    Line::Value(raw) => {
                        if raw.is_empty() {
                            period = Some(config.default_period);
                            stage = Stage::AwaitingOutputDir;
                        } else {
                            match raw.parse::<Period>() {
                                Ok(parsed) => {
                                    period = Some(parsed);
                                    stage = Stage::AwaitingOutputDir;
                                }
                                Err(_) => {
                                    writeln!(out, "Invalid period '{raw}', please try again.")?;
                                }
                            }
                        }
                    }
                }
            }
            Stage::AwaitingOutputDir => {
                if output_dir.is_some() {
                    stage = Stage::Resolved;
                    continue;
                }
                writeln!(out, "\nSTEP 4: Select Output Directory")?;
                write!(
                    out,
                    "Enter output directory to save results [{}]: ",
                    config.output_dir.display()
                )?;
                out.flush()?;

                match read_line(input)? {
                    Line::Exit => stage = Stage::Aborted,
                    Line::Value(raw) => {
                        output_dir = if raw.is_empty() {
                            Some(config.output_dir.clone())
                        } else {
                            Some(PathBuf::from(raw))
                        };
                        stage = Stage::Resolved;
                    }
                }
            }
            Stage::Resolved | Stage::Aborted => unreachable!("loop exits on terminal stages"),
        }
    }

    if stage == Stage::Aborted {
        return Ok(Resolution::Aborted);
    }

    Ok(Resolution::Request(AnalysisRequest {
        tickers,
        categories,
        // Both defaulted above before reaching Resolved
        period: period.unwrap_or(config.default_period),
        output_dir: output_dir.unwrap_or_else(|| config.output_dir.clone()),
        generate_plots: args.generate_plots && config.generate_plots,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn args_with_everything() -> ArgValues {
        ArgValues {
            tickers: vec!["aapl".to_string(), "msft".to_string()],
            period: Some(Period::OneYear),
            output: Some(PathBuf::from("/tmp/out")),
            generate_plots: true,
        }
    }

    fn resolve_with(input: &str, args: ArgValues) -> Resolution {
        let config = AnalyzerConfig::default();
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut out = Vec::new();
        resolve(args, &config, &mut reader, &mut out).unwrap()
    }

    #[test]
    fn test_full_argv_mode_only_prompts_categories() {
        let resolution = resolve_with("0\n", args_with_everything());
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(request.period, Period::OneYear);
        assert_eq!(request.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(request.categories, DataCategory::ALL.to_vec());
    }

    #[test]
    fn test_category_subset_selection() {
        let resolution = resolve_with("1,8\n", args_with_everything());
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(
            request.categories,
            vec![DataCategory::History, DataCategory::Dividends]
        );
    }

    #[test]
    fn test_invalid_category_selection_reprompts() {
        // "99" is out of range, "abc" unparseable; third line succeeds
        let resolution = resolve_with("99\nabc\n1\n", args_with_everything());
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.categories, vec![DataCategory::History]);
    }

    #[test]
    fn test_exit_keyword_at_first_prompt_aborts() {
        let resolution = resolve_with("exit\n", args_with_everything());
        assert!(matches!(resolution, Resolution::Aborted));
    }

    #[test]
    fn test_exit_keyword_is_case_insensitive() {
        let resolution = resolve_with("EXIT\n", args_with_everything());
        assert!(matches!(resolution, Resolution::Aborted));
    }

    #[test]
    fn test_eof_aborts() {
        let resolution = resolve_with("", args_with_everything());
        assert!(matches!(resolution, Resolution::Aborted));
    }

    #[test]
    fn test_interactive_ticker_loop_rejects_empty() {
        let args = ArgValues {
            tickers: Vec::new(),
            period: Some(Period::OneYear),
            output: Some(PathBuf::from("/tmp/out")),
            generate_plots: true,
        };
        // Categories, then a blank ticker line, then a real one
        let resolution = resolve_with("0\n\naapl goog\n", args);
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.tickers, vec!["AAPL", "GOOG"]);
    }

    #[test]
    fn test_malformed_period_reprompts_then_default_accepted() {
        let args = ArgValues {
            tickers: vec!["AAPL".to_string()],
            period: None,
            output: Some(PathBuf::from("/tmp/out")),
            generate_plots: true,
        };
        // Categories, bad period, then empty input accepting the default
        let resolution = resolve_with("0\n1w\n\n", args);
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.period, AnalyzerConfig::default().default_period);
    }

    #[test]
    fn test_output_dir_prompt_accepts_default() {
        let args = ArgValues {
            tickers: vec!["AAPL".to_string()],
            period: Some(Period::OneYear),
            output: None,
            generate_plots: true,
        };
        let resolution = resolve_with("0\n\n", args);
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.output_dir, AnalyzerConfig::default().output_dir);
    }

    #[test]
    fn test_exit_at_later_prompt_aborts() {
        let args = ArgValues {
            tickers: Vec::new(),
            period: None,
            output: None,
            generate_plots: true,
        };
        let resolution = resolve_with("0\nAAPL\nexit\n", args);
        assert!(matches!(resolution, Resolution::Aborted));
    }

    #[test]
    fn test_no_plots_flag_carries_through() {
        let mut args = args_with_everything();
        args.generate_plots = false;
        let resolution = resolve_with("0\n", args);
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert!(!request.generate_plots);
    }

    #[test]
    fn test_comma_separated_argv_tickers() {
        let args = ArgValues {
            tickers: vec!["aapl,msft".to_string()],
            period: Some(Period::OneYear),
            output: Some(PathBuf::from("/tmp/out")),
            generate_plots: true,
        };
        let resolution = resolve_with("0\n", args);
        let Resolution::Request(request) = resolution else {
            panic!("expected a resolved request");
        };
        assert_eq!(request.tickers, vec!["AAPL", "MSFT"]);
    }
}
