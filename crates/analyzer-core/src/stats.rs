//! Key statistics over fetched price history

use crate::api::PriceBar;
use chrono::Datelike;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Trading days in a year, used for the 52-week window and volatility scaling
const TRADING_DAYS_PER_YEAR: usize = 252;

/// Trading days in a month, used for the 1-month return
const TRADING_DAYS_PER_MONTH: usize = 21;

/// Summary statistics for one ticker's price history.
///
/// Statistics whose lookback exceeds the available history degrade to `None`
/// instead of erroring; the summary sheet prints those as `n/a`.
#[derive(Debug, Clone)]
pub struct PriceSummary {
    pub latest_close: f64,
    pub high_52w: f64,
    pub low_52w: f64,
    /// Percent distance of the latest close below the 52-week high
    pub pct_from_high: f64,
    /// Percent distance of the latest close above the 52-week low
    pub pct_from_low: f64,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    /// Annualized standard deviation of daily returns, in percent
    pub annualized_volatility: Option<f64>,
    pub return_1m: Option<f64>,
    pub return_ytd: Option<f64>,
    /// Percent change over the whole requested period
    pub period_change: Option<f64>,
}

fn sma_last(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    let mut last = 0.0;
    for &close in closes {
        last = sma.next(close);
    }
    Some(last)
}

fn daily_return_volatility(closes: &[f64]) -> Option<f64> {
    if closes.len() < 3 {
        return None;
    }
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    Some(variance.sqrt() * (TRADING_DAYS_PER_YEAR as f64).sqrt() * 100.0)
}

impl PriceSummary {
    /// Compute summary statistics from price history, oldest bar first.
    ///
    /// Returns `None` for an empty series.
    pub fn from_bars(bars: &[PriceBar]) -> Option<Self> {
        let last = bars.last()?;
        let latest_close = last.close;

        let window_start = bars.len().saturating_sub(TRADING_DAYS_PER_YEAR);
        let window = &bars[window_start..];
        let high_52w = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let low_52w = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let return_1m = (bars.len() > TRADING_DAYS_PER_MONTH).then(|| {
            let prior = closes[closes.len() - 1 - TRADING_DAYS_PER_MONTH];
            (latest_close / prior - 1.0) * 100.0
        });

        let current_year = last.timestamp.year();
        let return_ytd = bars
            .iter()
            .find(|b| b.timestamp.year() == current_year)
            .filter(|first| first.close != 0.0 && first.timestamp < last.timestamp)
            .map(|first| (latest_close / first.close - 1.0) * 100.0);

        let period_change = bars
            .first()
            .filter(|first| first.close != 0.0 && bars.len() > 1)
            .map(|first| (latest_close / first.close - 1.0) * 100.0);

        Some(Self {
            latest_close,
            high_52w,
            low_52w,
            pct_from_high: (latest_close / high_52w - 1.0) * 100.0,
            pct_from_low: (latest_close / low_52w - 1.0) * 100.0,
            ma_50: sma_last(&closes, 50),
            ma_200: sma_last(&closes, 200),
            annualized_volatility: daily_return_volatility(&closes),
            return_1m,
            return_ytd,
            period_change,
        })
    }

    /// Metric/value pairs for the summary sheet
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        fn price(v: f64) -> String {
            format!("{v:.2}")
        }
        fn pct(v: Option<f64>) -> String {
            v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}%"))
        }
        fn opt_price(v: Option<f64>) -> String {
            v.map_or_else(|| "n/a".to_string(), price)
        }

        vec![
            ("Current Price", price(self.latest_close)),
            ("52-Week High", price(self.high_52w)),
            ("52-Week Low", price(self.low_52w)),
            ("Distance from 52w High", pct(Some(self.pct_from_high))),
            ("Distance from 52w Low", pct(Some(self.pct_from_low))),
            ("50-Day MA", opt_price(self.ma_50)),
            ("200-Day MA", opt_price(self.ma_200)),
            ("Volatility (Annualized)", pct(self.annualized_volatility)),
            ("Return (1-Month)", pct(self.return_1m)),
            ("Return (YTD)", pct(self.return_ytd)),
            ("Return (Period)", pct(self.period_change)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close * 1.02,
                low: close * 0.98,
                close,
                volume: 1_000,
                adjclose: close,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_yields_none() {
        assert!(PriceSummary::from_bars(&[]).is_none());
    }

    #[test]
    fn test_latest_close_and_extremes() {
        let bars = bars_from_closes(&[100.0, 110.0, 105.0]);
        let summary = PriceSummary::from_bars(&bars).unwrap();

        assert_eq!(summary.latest_close, 105.0);
        assert_eq!(summary.high_52w, 110.0 * 1.02);
        assert_eq!(summary.low_52w, 100.0 * 0.98);
        assert!(summary.pct_from_high < 0.0);
        assert!(summary.pct_from_low > 0.0);
    }

    #[test]
    fn test_short_series_degrades_to_none() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        let summary = PriceSummary::from_bars(&bars).unwrap();

        assert!(summary.ma_50.is_none());
        assert!(summary.ma_200.is_none());
        assert!(summary.return_1m.is_none());
        // Volatility only needs three bars
        assert!(summary.annualized_volatility.is_some());
    }

    #[test]
    fn test_moving_average_on_constant_series() {
        let closes = vec![50.0; 250];
        let bars = bars_from_closes(&closes);
        let summary = PriceSummary::from_bars(&bars).unwrap();

        assert!((summary.ma_50.unwrap() - 50.0).abs() < 1e-9);
        assert!((summary.ma_200.unwrap() - 50.0).abs() < 1e-9);
        assert!((summary.annualized_volatility.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_period_change() {
        let bars = bars_from_closes(&[100.0, 150.0]);
        let summary = PriceSummary::from_bars(&bars).unwrap();
        assert!((summary.period_change.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_month_return() {
        let mut closes = vec![100.0; 30];
        let n = closes.len();
        closes[n - 1] = 110.0;
        let bars = bars_from_closes(&closes);
        let summary = PriceSummary::from_bars(&bars).unwrap();
        assert!((summary.return_1m.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_format() {
        let bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        let summary = PriceSummary::from_bars(&bars).unwrap();
        let rows = summary.rows();

        assert_eq!(rows[0].0, "Current Price");
        assert_eq!(rows[0].1, "102.00");
        // Missing statistics print as n/a rather than disappearing
        assert!(rows.iter().any(|(_, v)| v == "n/a"));
    }
}
