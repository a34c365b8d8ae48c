use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Timelike;
use tracing::{error, info};

use crate::AppState;
use crate::update::run_update;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(trigger_update))
        .with_state(state)
}

/// The one trigger endpoint. Gate on the configured hour, then on the
/// debounce window, then run the whole update inside the request.
async fn trigger_update(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    let now = chrono::Utc::now().with_timezone(&state.config.timezone);
    info!(time = %now.format("%H:%M"), "trigger received");

    if !hour_gate(state.config.run_hour, now.hour()) {
        info!(run_hour = ?state.config.run_hour, "outside scheduled hour, skipping");
        return (StatusCode::OK, "Not the scheduled hour!");
    }

    if !state.throttle.try_acquire() {
        info!("ignoring trigger: too soon since last run");
        return (StatusCode::OK, "Update already sent recently!");
    }

    match run_update(
        &state.config,
        state.quotes.as_ref(),
        state.briefings.as_ref(),
        state.charts.as_ref(),
        state.sender.as_ref(),
    )
    .await
    {
        Ok(()) => (StatusCode::OK, "Update sent!"),
        Err(e) => {
            error!(error = ?e, "update failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn hour_gate(run_hour: Option<u32>, current_hour: u32) -> bool {
    run_hour.is_none_or(|h| h == current_hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use market::{DailyQuote, Range};

    use crate::config::Config;
    use crate::throttle::Throttle;
    use crate::update::{BriefingSource, ChartSource, QuoteSource, Sender};

    /// Counts quote lookups so external-call activity is observable.
    #[derive(Default)]
    struct CountingQuotes {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl QuoteSource for CountingQuotes {
        async fn daily_quote(&self, _symbol: &str) -> Result<Option<DailyQuote>> {
            *self.calls.lock().unwrap() += 1;
            Ok(None)
        }
    }

    struct NullBriefings;

    #[async_trait]
    impl BriefingSource for NullBriefings {
        async fn briefing(&self, _symbol: &str) -> Result<String> {
            Ok(market::NO_BRIEFING.to_string())
        }
    }

    struct NullCharts;

    #[async_trait]
    impl ChartSource for NullCharts {
        async fn chart(&self, _symbol: &str, _lookback: Range) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    struct NullSender;

    #[async_trait]
    impl Sender for NullSender {
        async fn send_text(&self, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn send_image(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn state_with(run_hour: Option<u32>, quotes: Arc<CountingQuotes>) -> Arc<AppState> {
        let config = Config {
            bot_token: "token".into(),
            chat_id: 1,
            symbols: vec!["IGV".into()],
            fund_symbols: HashSet::new(),
            briefing_proxies: HashMap::new(),
            lookback: Range::Month6,
            run_hour,
            timezone: chrono_tz::Asia::Seoul,
            cleanup_charts: false,
            chart_dir: std::env::temp_dir(),
            listen_addr: "127.0.0.1:3000".parse().unwrap(),
            quote_api_base: String::new(),
            briefing_base_url: String::new(),
            report_header: "header".into(),
        };

        Arc::new(AppState {
            config,
            throttle: Throttle::new(Duration::from_secs(60)),
            quotes,
            briefings: Arc::new(NullBriefings),
            charts: Arc::new(NullCharts),
            sender: Arc::new(NullSender),
        })
    }

    #[test]
    fn hour_gate_open_when_unset() {
        assert!(hour_gate(None, 7));
        assert!(hour_gate(Some(7), 7));
        assert!(!hour_gate(Some(7), 8));
    }

    #[tokio::test]
    async fn second_trigger_inside_window_is_debounced() {
        let quotes = Arc::new(CountingQuotes::default());
        let state = state_with(None, Arc::clone(&quotes));

        let (status, body) = trigger_update(State(Arc::clone(&state))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Update sent!");
        assert_eq!(*quotes.calls.lock().unwrap(), 1);

        let (status, body) = trigger_update(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Update already sent recently!");
        // no further external calls
        assert_eq!(*quotes.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn off_hour_trigger_does_nothing() {
        let now_hour = chrono::Utc::now()
            .with_timezone(&chrono_tz::Asia::Seoul)
            .hour();
        let quotes = Arc::new(CountingQuotes::default());
        let state = state_with(Some((now_hour + 12) % 24), Arc::clone(&quotes));

        let (status, body) = trigger_update(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Not the scheduled hour!");
        assert_eq!(*quotes.calls.lock().unwrap(), 0);
    }
}
