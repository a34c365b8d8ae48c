mod briefing;
mod chart;
mod price_client;

pub use briefing::{BriefingClient, NO_BRIEFING};
pub use chart::{ChartWriter, render_chart};
pub use price_client::{Bar, DailyQuote, PriceClient, Range};
