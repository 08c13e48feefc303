//! Tickoo — single-session analytics pipeline over a CSV export of
//! ticket-sale transactions.
//!
//! Data flows strictly forward: Schema Normalizer → Outlier Filter →
//! Filter Engine → Aggregation Engine → Signal Engine. Normalization and
//! outlier filtering run once per uploaded file and are cached by content
//! hash; only filtering and aggregation re-run on a filter change.

pub mod analytics;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod session;

// Re-export the types the presentation layer interacts with
pub use analytics::aggregates::{AggregateView, EventParams};
pub use analytics::filter::FilterSelection;
pub use analytics::signals::MarketSignal;
pub use config::{PipelineConfig, ZeroQuantityPolicy, ZoneSeriesStyle};
pub use ingest::errors::TicketDataError;
pub use ingest::structs::{TicketDataset, TicketRecord};
pub use session::{AnalyticsSession, DatasetSummary};
