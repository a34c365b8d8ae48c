use anyhow::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Deserialize;

/// History window requested from the quote provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Day1,
    Week1,
    Month6,
}

impl Range {
    pub fn as_str(&self) -> &'static str {
        match self {
            Range::Day1 => "1d",
            Range::Week1 => "7d",
            Range::Month6 => "6mo",
        }
    }

    /// Human form used in chart titles.
    pub fn label(&self) -> &'static str {
        match self {
            Range::Day1 => "1 Day",
            Range::Week1 => "7 Day",
            Range::Month6 => "6 Month",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub close: f64,
}

/// Most recent daily close and intraday change, derived from the last bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyQuote {
    pub price: f64,
    pub change_pct: f64,
}

#[derive(Clone)]
pub struct PriceClient {
    client: Client,
    base_api: String,
}

impl PriceClient {
    pub fn new(base_api: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 (compatible; briefing-bot)"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_api })
    }

    /// Daily bars over `range`. A symbol the provider does not know, or a
    /// day with no rows, comes back as an empty Vec rather than an error.
    pub async fn fetch_history(&self, symbol: &str, range: Range) -> Result<Vec<Bar>, Error> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_api.trim_end_matches('/'),
            symbol
        );

        let res = self
            .client
            .get(url)
            .query(&[("range", range.as_str()), ("interval", "1d")])
            .send()
            .await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let res: ChartResponse = res.error_for_status()?.json().await?;
        Ok(bars_from_response(res))
    }

    /// Most recent daily quote, or None when the provider has no rows for
    /// the trading day.
    pub async fn fetch_daily(&self, symbol: &str) -> Result<Option<DailyQuote>, Error> {
        let bars = self.fetch_history(symbol, Range::Day1).await?;
        Ok(quote_from_bars(&bars))
    }
}

fn quote_from_bars(bars: &[Bar]) -> Option<DailyQuote> {
    let last = bars.last()?;
    Some(DailyQuote {
        price: last.close,
        change_pct: (last.close - last.open) / last.open * 100.0,
    })
}

fn bars_from_response(res: ChartResponse) -> Vec<Bar> {
    let Some(series) = res
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
    else {
        return Vec::new();
    };

    let Some(quote) = series.indicators.quote.into_iter().next() else {
        return Vec::new();
    };

    series
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            // rows with a null open or close are holes, not data
            let open = quote.open.get(i).copied().flatten()?;
            let close = quote.close.get(i).copied().flatten()?;
            let timestamp = DateTime::from_timestamp(ts, 0)?;
            Some(Bar {
                timestamp,
                open,
                close,
            })
        })
        .collect()
}

//
// Match the provider's v8 chart JSON
//
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartSeries>>,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}
