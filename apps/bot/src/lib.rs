use std::sync::Arc;

pub mod config;
pub mod server;
pub mod telegram;
pub mod throttle;
pub mod update;

use config::Config;
use throttle::Throttle;
use update::{BriefingSource, ChartSource, QuoteSource, Sender};

/// Shared state behind the trigger endpoint. Collaborators sit behind
/// trait objects so the handler and orchestrator can be exercised with
/// in-memory fakes.
pub struct AppState {
    pub config: Config,
    pub throttle: Throttle,
    pub quotes: Arc<dyn QuoteSource>,
    pub briefings: Arc<dyn BriefingSource>,
    pub charts: Arc<dyn ChartSource>,
    pub sender: Arc<dyn Sender>,
}
