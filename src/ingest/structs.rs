use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::outliers::PriceBounds;

/// Exact input column names, punctuation included. Lookups are literal
/// string matches against the CSV header.
pub mod columns {
    pub const QTY: &str = "Qty";
    pub const PRICE: &str = "Price";
    pub const SALE_TIME: &str = "Date/Time (EDT)";
    pub const SECTION: &str = "Section";
    pub const ZONE: &str = "Zone";
}

/// One input row after normalization. Unparseable fields are missing, never
/// defaulted; downstream aggregates skip missing values instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
    /// Derived from `timestamp` once at normalization.
    pub date: Option<NaiveDate>,
    pub section: Option<String>,
    pub zone: Option<String>,
}

impl TicketRecord {
    pub fn has_price(&self) -> bool {
        self.price.is_some()
    }

    pub fn tickets(&self) -> u64 {
        self.quantity.map(u64::from).unwrap_or(0)
    }
}

/// The normalized, outlier-filtered, timestamp-sorted record set for one
/// uploaded file, plus the layout metadata needed for faithful re-export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDataset {
    pub records: Vec<TicketRecord>,
    /// Whether the source carried a `Section` column.
    pub has_section: bool,
    /// Whether the source carried a `Zone` column. When false every zone
    /// aggregate is silently empty.
    pub has_zone: bool,
    /// SHA-256 of the uploaded bytes; cache identity for the session.
    pub content_hash: String,
    pub rows_read: usize,
    pub rows_after_validity: usize,
    pub rows_after_outliers: usize,
    /// IQR bounds used by the outlier pass, when any price was measurable.
    pub price_bounds: Option<PriceBounds>,
}
