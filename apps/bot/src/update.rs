use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use market::{BriefingClient, ChartWriter, DailyQuote, NO_BRIEFING, PriceClient, Range};
use tracing::{error, info, instrument, warn};

use crate::config::Config;

/// Fallback text when every briefing lookup for a symbol errs outright.
const BRIEFING_UNAVAILABLE: &str = "Briefing unavailable";

#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Most recent daily quote; `Ok(None)` means the provider had no rows
    /// for the trading day, which is not an error.
    async fn daily_quote(&self, symbol: &str) -> Result<Option<DailyQuote>>;
}

#[async_trait]
pub trait BriefingSource: Send + Sync {
    async fn briefing(&self, symbol: &str) -> Result<String>;
}

#[async_trait]
pub trait ChartSource: Send + Sync {
    /// Produce a chart file for the symbol, `Ok(None)` when there is no
    /// history to plot.
    async fn chart(&self, symbol: &str, lookback: Range) -> Result<Option<PathBuf>>;
}

#[async_trait]
pub trait Sender: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
    async fn send_image(&self, path: &Path) -> Result<()>;
}

#[async_trait]
impl QuoteSource for PriceClient {
    async fn daily_quote(&self, symbol: &str) -> Result<Option<DailyQuote>> {
        self.fetch_daily(symbol).await
    }
}

#[async_trait]
impl BriefingSource for BriefingClient {
    async fn briefing(&self, symbol: &str) -> Result<String> {
        self.fetch(symbol).await
    }
}

#[async_trait]
impl ChartSource for ChartWriter {
    async fn chart(&self, symbol: &str, lookback: Range) -> Result<Option<PathBuf>> {
        self.create(symbol, lookback).await
    }
}

/// The text report, assembled symbol by symbol in configured order.
struct Report {
    body: String,
}

impl Report {
    fn new(header: &str) -> Self {
        Self {
            body: format!("{header}\n\n"),
        }
    }

    fn push_entry(&mut self, symbol: &str, quote: &DailyQuote, briefing: &str) {
        self.body.push_str(&format!(
            "{}: ${:.2} ({:+.2}%)\n{}\n\n",
            symbol, quote.price, quote.change_pct, briefing
        ));
    }

    fn push_unavailable(&mut self, symbol: &str) {
        self.body.push_str(&format!("{symbol}: Data unavailable\n\n"));
    }

    fn into_message(self) -> String {
        self.body.trim_end().to_string()
    }
}

/// One full update: quote, briefing and chart per symbol, strictly in
/// configured order, then the accumulated report as a single message. Any
/// one external call failing degrades only that symbol's contribution or
/// that one send.
#[instrument(skip_all, fields(symbols = config.symbols.len()))]
pub async fn run_update(
    config: &Config,
    quotes: &dyn QuoteSource,
    briefings: &dyn BriefingSource,
    charts: &dyn ChartSource,
    sender: &dyn Sender,
) -> Result<()> {
    info!("starting update");

    let mut report = Report::new(&config.report_header);

    for symbol in &config.symbols {
        update_symbol(symbol, config, quotes, briefings, charts, sender, &mut report).await;
    }

    let message = report.into_message();
    info!(chars = message.len(), "sending report");
    if let Err(e) = sender.send_text(&message).await {
        error!(error = ?e, "sending report failed");
    }

    info!("update completed");
    Ok(())
}

#[instrument(skip_all, fields(symbol = %symbol))]
async fn update_symbol(
    symbol: &str,
    config: &Config,
    quotes: &dyn QuoteSource,
    briefings: &dyn BriefingSource,
    charts: &dyn ChartSource,
    sender: &dyn Sender,
    report: &mut Report,
) {
    let quote = match quotes.daily_quote(symbol).await {
        Ok(Some(q)) => q,
        Ok(None) => {
            warn!("no data available");
            report.push_unavailable(symbol);
            return;
        }
        Err(e) => {
            warn!(error = ?e, "quote fetch failed");
            report.push_unavailable(symbol);
            return;
        }
    };
    info!(price = quote.price, change_pct = quote.change_pct, "quote fetched");

    let briefing = lookup_briefing(symbol, config, briefings).await;
    report.push_entry(symbol, &quote, &briefing);

    let chart = match charts.chart(symbol, config.lookback).await {
        Ok(Some(path)) => path,
        Ok(None) => {
            warn!("no chart data");
            return;
        }
        Err(e) => {
            warn!(error = ?e, "chart failed");
            return;
        }
    };

    if let Err(e) = sender.send_image(&chart).await {
        warn!(error = ?e, path = %chart.display(), "sending chart failed");
    }

    if config.cleanup_charts
        && let Err(e) = std::fs::remove_file(&chart)
    {
        warn!(error = ?e, path = %chart.display(), "removing chart file failed");
    }
}

/// Try the symbol's briefing candidates in order until one yields content
/// that is not the no-content sentinel. The candidate list is the symbol
/// itself, then its configured proxy symbol, if any.
async fn lookup_briefing(
    symbol: &str,
    config: &Config,
    briefings: &dyn BriefingSource,
) -> String {
    let mut result = NO_BRIEFING.to_string();

    for candidate in briefing_candidates(symbol, config) {
        match briefings.briefing(&candidate).await {
            Ok(text) if text != NO_BRIEFING => return text,
            Ok(text) => result = text,
            Err(e) => {
                warn!(error = ?e, candidate = %candidate, "briefing fetch failed");
                result = BRIEFING_UNAVAILABLE.to_string();
            }
        }
    }

    result
}

fn briefing_candidates(symbol: &str, config: &Config) -> Vec<String> {
    let mut candidates = vec![symbol.to_string()];
    if let Some(proxy) = config.briefing_proxies.get(symbol) {
        candidates.push(proxy.clone());
    }
    candidates
}
