pub mod aggregates;
pub mod filter;
pub mod rolling;
pub mod signals;

// Re-export commonly used types for convenience
pub use aggregates::{compute_aggregates, AggregateView, EventParams};
pub use filter::{apply_filters, FilterSelection};
pub use rolling::RollingMean;
pub use signals::{derive_signals, MarketSignal};
