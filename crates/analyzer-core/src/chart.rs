//! Candlestick chart rendering
//!
//! Draws a PNG with a price panel of up/down-colored candles and a volume
//! panel underneath, colored by candle direction. Appearance comes from
//! [`ChartSettings`]; the font is resolved from the system at render time.

use crate::api::PriceBar;
use crate::config::ChartSettings;
use crate::error::{AnalyzerError, Result};
use ab_glyph::{FontArc, PxScale};
use font_kit::family_name::FamilyName;
use font_kit::properties::{Properties, Weight};
use font_kit::source::SystemSource;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::Path;

const MARGIN: u32 = 60;
const TITLE_HEIGHT: u32 = 40;
const PANEL_GAP: u32 = 20;
const GRID_LINES: u32 = 5;
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Parse a `#rrggbb` color string
fn parse_color(hex: &str) -> Result<Rgba<u8>> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(AnalyzerError::Chart(format!("invalid color: #{hex}")));
    }
    let value = u32::from_str_radix(hex, 16)
        .map_err(|_| AnalyzerError::Chart(format!("invalid color: #{hex}")))?;
    Ok(Rgba([
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
        255,
    ]))
}

/// Maps a value range onto a vertical pixel span, top of range at `top`
#[derive(Debug, Clone, Copy)]
struct VerticalScale {
    min: f64,
    max: f64,
    top: f32,
    bottom: f32,
}

impl VerticalScale {
    fn new(min: f64, max: f64, top: u32, bottom: u32) -> Self {
        // Guard against a flat series, which would divide by zero
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        Self {
            min,
            max,
            top: top as f32,
            bottom: bottom as f32,
        }
    }

    fn y(&self, value: f64) -> f32 {
        let fraction = ((value - self.min) / (self.max - self.min)) as f32;
        self.bottom - fraction * (self.bottom - self.top)
    }
}

fn load_font() -> Result<FontArc> {
    let source = SystemSource::new();

    let handle = source
        .select_best_match(
            &[FamilyName::SansSerif],
            &Properties::new().weight(Weight::BOLD),
        )
        .map_err(|e| AnalyzerError::Chart(format!("failed to find system font: {e}")))?;

    let font = handle
        .load()
        .map_err(|e| AnalyzerError::Chart(format!("failed to load font: {e}")))?;

    let font_data = font
        .copy_font_data()
        .ok_or_else(|| AnalyzerError::Chart("failed to copy font data".to_string()))?
        .to_vec();

    FontArc::try_from_vec(font_data)
        .map_err(|_| AnalyzerError::Chart("failed to build font".to_string()))
}

fn draw_centered_text(
    img: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    scale: PxScale,
    x: u32,
    width: u32,
    y: u32,
    color: Rgba<u8>,
) {
    let (tw, th) = text_size(scale, font, text);
    let offset_x = x as i32 + ((width as i32 - tw as i32) / 2);
    draw_text_mut(img, color, offset_x, y as i32 + th as i32, scale, font, text);
}

/// Render a candlestick chart with a volume sub-panel to a PNG file.
///
/// `bars` must be non-empty and ordered oldest first.
pub fn render_candlestick(
    bars: &[PriceBar],
    symbol: &str,
    path: &Path,
    settings: &ChartSettings,
) -> Result<()> {
    if bars.is_empty() {
        return Err(AnalyzerError::Chart(format!(
            "no price data to chart for {symbol}"
        )));
    }

    let up = parse_color(&settings.up_color)?;
    let down = parse_color(&settings.down_color)?;
    let background = parse_color(&settings.background)?;
    let grid = parse_color(&settings.grid_color)?;
    let font = load_font()?;

    let width = settings.width;
    let height = settings.height;
    let mut img = RgbaImage::from_pixel(width, height, background);

    // Price panel takes two thirds of the plot area, volume one third
    let plot_top = MARGIN + TITLE_HEIGHT;
    let plot_bottom = height - MARGIN;
    let plot_height = plot_bottom - plot_top;
    let price_bottom = plot_top + plot_height * 2 / 3;
    let volume_top = price_bottom + PANEL_GAP;

    let plot_left = MARGIN;
    let plot_right = width - MARGIN;
    let plot_width = plot_right - plot_left;

    let min_price = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let max_price = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let max_volume = bars.iter().map(|b| b.volume).max().unwrap_or(1).max(1);

    let price_scale = VerticalScale::new(min_price, max_price, plot_top, price_bottom);
    let volume_scale = VerticalScale::new(0.0, max_volume as f64, volume_top, plot_bottom);

    // Horizontal grid with price labels
    let label_scale = PxScale::from(18.0);
    for i in 0..=GRID_LINES {
        let value = price_scale.min
            + (price_scale.max - price_scale.min) * f64::from(i) / f64::from(GRID_LINES);
        let y = price_scale.y(value);
        draw_line_segment_mut(&mut img, (plot_left as f32, y), (plot_right as f32, y), grid);
        draw_text_mut(
            &mut img,
            TEXT_COLOR,
            4,
            y as i32 - 8,
            label_scale,
            &font,
            &format!("{value:.2}"),
        );
    }

    // Candles and volume bars
    let slot = plot_width as f32 / bars.len() as f32;
    let body_width = (slot * 0.7).max(1.0) as u32;

    for (i, bar) in bars.iter().enumerate() {
        let center_x = plot_left as f32 + slot * (i as f32 + 0.5);
        let body_left = (center_x - body_width as f32 / 2.0) as i32;
        let color = if bar.close >= bar.open { up } else { down };

        // Wick
        draw_line_segment_mut(
            &mut img,
            (center_x, price_scale.y(bar.high)),
            (center_x, price_scale.y(bar.low)),
            color,
        );

        // Body
        let body_top = price_scale.y(bar.open.max(bar.close));
        let body_bottom = price_scale.y(bar.open.min(bar.close));
        let body_height = ((body_bottom - body_top) as u32).max(1);
        draw_filled_rect_mut(
            &mut img,
            Rect::at(body_left, body_top as i32).of_size(body_width, body_height),
            color,
        );

        // Volume
        let vol_top = volume_scale.y(bar.volume as f64);
        let vol_height = ((plot_bottom as f32 - vol_top) as u32).max(1);
        draw_filled_rect_mut(
            &mut img,
            Rect::at(body_left, vol_top as i32).of_size(body_width, vol_height),
            color,
        );
    }

    // Title and date range
    let title = format!("{symbol} Stock Analysis");
    draw_centered_text(
        &mut img,
        &font,
        &title,
        PxScale::from(32.0),
        0,
        width,
        MARGIN / 2,
        TEXT_COLOR,
    );

    let first = bars[0].timestamp.format("%Y-%m-%d").to_string();
    let last = bars[bars.len() - 1].timestamp.format("%Y-%m-%d").to_string();
    draw_text_mut(
        &mut img,
        TEXT_COLOR,
        plot_left as i32,
        (height - MARGIN / 2) as i32,
        label_scale,
        &font,
        &first,
    );
    let (tw, _) = text_size(label_scale, &font, &last);
    draw_text_mut(
        &mut img,
        TEXT_COLOR,
        plot_right as i32 - tw as i32,
        (height - MARGIN / 2) as i32,
        label_scale,
        &font,
        &last,
    );

    img.save(path)
        .map_err(|e| AnalyzerError::Chart(format!("failed to save {}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        let color = parse_color("#2ecc71").unwrap();
        assert_eq!(color, Rgba([0x2e, 0xcc, 0x71, 255]));

        assert!(parse_color("#12345").is_err());
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn test_vertical_scale_maps_range_endpoints() {
        let scale = VerticalScale::new(100.0, 200.0, 50, 350);
        assert!((scale.y(200.0) - 50.0).abs() < 0.001);
        assert!((scale.y(100.0) - 350.0).abs() < 0.001);
        assert!((scale.y(150.0) - 200.0).abs() < 0.001);
    }

    #[test]
    fn test_vertical_scale_flat_series() {
        // A flat series must not divide by zero
        let scale = VerticalScale::new(100.0, 100.0, 0, 100);
        let y = scale.y(100.0);
        assert!(y.is_finite());
        assert!((0.0..=100.0).contains(&y));
    }

    #[test]
    fn test_render_rejects_empty_bars() {
        let settings = ChartSettings::default();
        let result = render_candlestick(&[], "AAPL", Path::new("/tmp/unused.png"), &settings);
        assert!(matches!(result, Err(AnalyzerError::Chart(_))));
    }
}
