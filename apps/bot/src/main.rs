use std::{sync::Arc, time::Duration};

use anyhow::Result;
use bot::{AppState, config::Config, server, telegram::TelegramSender, throttle::Throttle};
use market::{BriefingClient, ChartWriter, PriceClient};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEBOUNCE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    info!(
        symbols = config.symbols.len(),
        chat_id = config.chat_id,
        "configuration loaded"
    );

    let prices = Arc::new(PriceClient::new(config.quote_api_base.clone())?);
    let briefings = Arc::new(BriefingClient::new(
        config.briefing_base_url.clone(),
        config.fund_symbols.clone(),
    )?);
    let charts = Arc::new(ChartWriter::new(
        Arc::clone(&prices),
        config.chart_dir.clone(),
    ));
    let sender = Arc::new(TelegramSender::new(&config.bot_token, config.chat_id));

    let addr = config.listen_addr;
    let state = Arc::new(AppState {
        throttle: Throttle::new(DEBOUNCE),
        quotes: prices,
        briefings,
        charts,
        sender,
        config,
    });

    let app = server::router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete.");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
