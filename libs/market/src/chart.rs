use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Error, Result, ensure};
use charming::{
    Chart, ImageFormat, ImageRenderer,
    component::{Axis, Title},
    element::{AxisLabel, AxisType, LineStyle, SplitLine, Symbol, TextStyle},
    series::Line,
};
use tracing::debug;

use crate::price_client::{Bar, PriceClient, Range};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;

/// Render a close-price line chart for `bars` as PNG bytes.
pub fn render_chart(symbol: &str, bars: &[Bar], range: Range) -> Result<Vec<u8>, Error> {
    ensure!(!bars.is_empty(), "no bars to chart for {symbol}");

    let dates: Vec<String> = bars
        .iter()
        .map(|b| b.timestamp.format("%m-%d").to_string())
        .collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let label_interval = match range {
        Range::Week1 => 0,
        _ => 9,
    };

    let chart = Chart::new()
        .background_color("#ffffff")
        .title(
            Title::new()
                .text(format!(
                    "{} - {} Chart",
                    symbol.to_uppercase(),
                    range.label()
                ))
                .left("center")
                .top("2%")
                .text_style(TextStyle::new().color("#333333").font_size(14)),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(dates)
                .axis_label(
                    AxisLabel::new()
                        .rotate(45)
                        .interval(label_interval)
                        .color("#666666"),
                )
                .split_line(SplitLine::new().line_style(LineStyle::new().color("#dddddd"))),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .scale(true)
                .axis_label(AxisLabel::new().color("#666666"))
                .split_line(SplitLine::new().line_style(LineStyle::new().color("#dddddd"))),
        )
        .series(
            Line::new()
                .name("Close")
                .data(closes)
                .symbol(Symbol::None)
                .line_style(LineStyle::new().width(2).color("#0064FF")),
        );

    let mut renderer = ImageRenderer::new(WIDTH, HEIGHT);
    let png_bytes = renderer.render_format(ImageFormat::Png, &chart)?;
    Ok(png_bytes)
}

/// Produces transient chart files next to the process, one per symbol.
pub struct ChartWriter {
    prices: Arc<PriceClient>,
    out_dir: PathBuf,
}

impl ChartWriter {
    pub fn new(prices: Arc<PriceClient>, out_dir: PathBuf) -> Self {
        Self { prices, out_dir }
    }

    /// Fetch history over `range`, render it, and write
    /// `<symbol>_chart.png`. No history means no chart, not an error.
    pub async fn create(&self, symbol: &str, range: Range) -> Result<Option<PathBuf>> {
        let bars = self.prices.fetch_history(symbol, range).await?;
        if bars.is_empty() {
            debug!(symbol, "no history, skipping chart");
            return Ok(None);
        }

        let owned_symbol = symbol.to_string();
        let png =
            tokio::task::spawn_blocking(move || render_chart(&owned_symbol, &bars, range)).await??;

        let path = self.out_dir.join(format!("{symbol}_chart.png"));
        tokio::fs::write(&path, &png).await?;
        debug!(symbol, path = %path.display(), bytes = png.len(), "chart written");
        Ok(Some(path))
    }
}
