use std::collections::{HashMap, HashSet};
use std::env::var;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context as _, Result, anyhow, bail};
use chrono_tz::Tz;
use market::Range;

const DEFAULT_SYMBOLS: &str = "IGV,SOXL,IVZ,BLK,BRKU,BTC-USD,ETH-USD";
const DEFAULT_FUND_SYMBOLS: &str = "IGV,SOXL,IVZ,BLK,BRKU";
const DEFAULT_QUOTE_API_BASE: &str = "https://query1.finance.yahoo.com";
const DEFAULT_BRIEFING_BASE_URL: &str = "https://invest.zum.com";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REPORT_HEADER: &str = "\u{1f31e} Good Morning!";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: i64,
    /// Ordered; drives report order and image send order.
    pub symbols: Vec<String>,
    /// Symbols whose briefing page lives under the fund path.
    pub fund_symbols: HashSet<String>,
    /// Related symbol consulted when a briefing comes back empty.
    pub briefing_proxies: HashMap<String, String>,
    pub lookback: Range,
    /// When set, triggers outside this hour (in `timezone`) are ignored.
    pub run_hour: Option<u32>,
    pub timezone: Tz,
    pub cleanup_charts: bool,
    pub chart_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub quote_api_base: String,
    pub briefing_base_url: String,
    pub report_header: String,
}

impl Config {
    /// Read configuration from the environment. BOT_TOKEN and CHAT_ID are
    /// required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let bot_token = required("BOT_TOKEN")?;
        let chat_id = required("CHAT_ID")?
            .parse::<i64>()
            .context("CHAT_ID must be a numeric chat identifier")?;

        let symbols = parse_symbols(&var_or("SYMBOLS", DEFAULT_SYMBOLS));
        if symbols.is_empty() {
            bail!("SYMBOLS must name at least one symbol");
        }
        let fund_symbols = parse_symbols(&var_or("FUND_SYMBOLS", DEFAULT_FUND_SYMBOLS))
            .into_iter()
            .collect();
        let briefing_proxies = parse_proxies(&var_or("BRIEFING_PROXIES", ""))?;

        let lookback = parse_lookback(&var_or("CHART_LOOKBACK", "6mo"))?;
        let run_hour = match var("RUN_HOUR") {
            Ok(v) => Some(parse_hour(&v)?),
            Err(_) => None,
        };
        let timezone = match var("TIMEZONE") {
            Ok(v) => v
                .parse::<Tz>()
                .map_err(|e| anyhow!("unknown TIMEZONE {v:?}: {e}"))?,
            Err(_) => chrono_tz::Asia::Seoul,
        };

        let cleanup_charts = parse_bool(&var_or("CLEANUP_CHARTS", "false"));
        let chart_dir = PathBuf::from(var_or("CHART_DIR", "."));
        let listen_addr = var_or("LISTEN_ADDR", DEFAULT_LISTEN_ADDR)
            .parse::<SocketAddr>()
            .context("LISTEN_ADDR must be host:port")?;

        Ok(Self {
            bot_token,
            chat_id,
            symbols,
            fund_symbols,
            briefing_proxies,
            lookback,
            run_hour,
            timezone,
            cleanup_charts,
            chart_dir,
            listen_addr,
            quote_api_base: var_or("QUOTE_API_BASE", DEFAULT_QUOTE_API_BASE),
            briefing_base_url: var_or("BRIEFING_BASE_URL", DEFAULT_BRIEFING_BASE_URL),
            report_header: var_or("REPORT_HEADER", DEFAULT_REPORT_HEADER),
        })
    }
}

fn required(name: &str) -> Result<String> {
    var(name).map_err(|_| anyhow!("{name} is not set"))
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_proxies(raw: &str) -> Result<HashMap<String, String>> {
    let mut proxies = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, proxy) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("BRIEFING_PROXIES entry {entry:?} is not SYMBOL=PROXY"))?;
        proxies.insert(symbol.trim().to_uppercase(), proxy.trim().to_uppercase());
    }
    Ok(proxies)
}

fn parse_lookback(raw: &str) -> Result<Range> {
    match raw.trim() {
        "7d" => Ok(Range::Week1),
        "6mo" => Ok(Range::Month6),
        other => bail!("CHART_LOOKBACK must be 7d or 6mo, got {other:?}"),
    }
}

fn parse_hour(raw: &str) -> Result<u32> {
    let hour = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("RUN_HOUR {raw:?} is not a number"))?;
    if hour > 23 {
        bail!("RUN_HOUR must be 0-23, got {hour}");
    }
    Ok(hour)
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_trimmed_uppercased_and_ordered() {
        assert_eq!(
            parse_symbols(" igv, BTC-usd ,,eth-usd"),
            vec!["IGV", "BTC-USD", "ETH-USD"]
        );
    }

    #[test]
    fn proxies_parse_pairs() {
        let proxies = parse_proxies("btc-usd=coin, ETH-USD = COIN").unwrap();
        assert_eq!(proxies.get("BTC-USD").map(String::as_str), Some("COIN"));
        assert_eq!(proxies.get("ETH-USD").map(String::as_str), Some("COIN"));
        assert!(parse_proxies("").unwrap().is_empty());
    }

    #[test]
    fn malformed_proxy_entry_is_rejected() {
        assert!(parse_proxies("BTC-USD").is_err());
    }

    #[test]
    fn lookback_accepts_both_windows() {
        assert_eq!(parse_lookback("7d").unwrap(), Range::Week1);
        assert_eq!(parse_lookback("6mo").unwrap(), Range::Month6);
        assert!(parse_lookback("1y").is_err());
    }

    #[test]
    fn run_hour_is_bounded() {
        assert_eq!(parse_hour("23").unwrap(), 23);
        assert!(parse_hour("24").is_err());
        assert!(parse_hour("soon").is_err());
    }

    #[test]
    fn bool_flags() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
