use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;

/// Sentinel returned when the page loads but carries no briefing block.
pub const NO_BRIEFING: &str = "No daily briefing available.";

const FUND_BRIEFING_CLASS: &str = "styles_briefingInner__WBq3C";
const EQUITY_BRIEFING_CLASS: &str = "styles_briefingInner__1kI5J";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageKind {
    Fund,
    Equity,
}

impl PageKind {
    fn path(&self) -> &'static str {
        match self {
            PageKind::Fund => "etf",
            PageKind::Equity => "stock",
        }
    }

    fn briefing_class(&self) -> &'static str {
        match self {
            PageKind::Fund => FUND_BRIEFING_CLASS,
            PageKind::Equity => EQUITY_BRIEFING_CLASS,
        }
    }
}

pub struct BriefingClient {
    client: Client,
    base_url: String,
    fund_symbols: HashSet<String>,
}

impl BriefingClient {
    pub fn new(base_url: String, fund_symbols: HashSet<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url,
            fund_symbols,
        })
    }

    /// Fetch the symbol's briefing page and pull out the labeled text block.
    /// A reachable page without the block yields [`NO_BRIEFING`]; transport
    /// and HTTP errors stay errors so the caller can tell the two apart.
    pub async fn fetch(&self, symbol: &str) -> Result<String> {
        let kind = self.page_kind(symbol);
        let url = format!(
            "{}/{}/{}/",
            self.base_url.trim_end_matches('/'),
            kind.path(),
            symbol
        );

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match extract_briefing(&html, kind.briefing_class()) {
            Some(text) => Ok(text),
            None => {
                warn!(symbol, url, "briefing block not found on page");
                Ok(NO_BRIEFING.to_string())
            }
        }
    }

    fn page_kind(&self, symbol: &str) -> PageKind {
        if self.fund_symbols.contains(symbol) {
            PageKind::Fund
        } else {
            PageKind::Equity
        }
    }
}

/// First text block matching the given class, joined and trimmed.
fn extract_briefing(html: &str, class: &str) -> Option<String> {
    let selector = Selector::parse(&format!("div.{class}")).ok()?;
    let document = Html::parse_document(html);

    let node = document.select(&selector).next()?;
    let text = node.text().collect::<String>().trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_matching_block() {
        let html = format!(
            r#"<html><body>
                <div class="{FUND_BRIEFING_CLASS}">  Software ETFs rallied on earnings.  </div>
                <div class="{FUND_BRIEFING_CLASS}">second block</div>
            </body></html>"#
        );
        assert_eq!(
            extract_briefing(&html, FUND_BRIEFING_CLASS).as_deref(),
            Some("Software ETFs rallied on earnings.")
        );
    }

    #[test]
    fn joins_nested_text() {
        let html = format!(
            r#"<div class="{EQUITY_BRIEFING_CLASS}"><span>Shares fell</span> after guidance.</div>"#
        );
        assert_eq!(
            extract_briefing(&html, EQUITY_BRIEFING_CLASS).as_deref(),
            Some("Shares fell after guidance.")
        );
    }

    #[test]
    fn missing_block_is_none() {
        let html = r#"<div class="something_else">no briefing here</div>"#;
        assert_eq!(extract_briefing(html, FUND_BRIEFING_CLASS), None);
    }

    #[test]
    fn empty_block_is_none() {
        let html = format!(r#"<div class="{FUND_BRIEFING_CLASS}">   </div>"#);
        assert_eq!(extract_briefing(&html, FUND_BRIEFING_CLASS), None);
    }
}
