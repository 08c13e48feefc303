pub mod errors;
pub mod normalizer;
pub mod outliers;
pub mod structs;

// Re-export commonly used types for convenience
pub use errors::TicketDataError;
pub use normalizer::{normalize_csv, NormalizedRows};
pub use outliers::{price_bounds, remove_price_outliers, PriceBounds};
pub use structs::{TicketDataset, TicketRecord};
