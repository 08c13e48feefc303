//! Outlier Filter: IQR rule on price, nothing else.
//!
//! Quartiles are recomputed over the currently loaded set on every load, not
//! fixed thresholds. The filter runs exactly once per file, before any user
//! filtering.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::structs::TicketRecord;

/// Multiplier on the interquartile range for the retain bounds.
const IQR_MULTIPLIER: f64 = 1.5;

/// Quartiles and the derived retain bounds for one loaded set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl PriceBounds {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Linear-interpolated quantile over an ascending-sorted slice.
pub fn interpolate_quantile(sorted: &[f64], percentile: f64) -> f64 {
    let index = percentile * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Compute the IQR retain bounds over the non-missing prices of `records`.
/// `None` when no record carries a price.
pub fn price_bounds(records: &[TicketRecord]) -> Option<PriceBounds> {
    let mut prices: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    if prices.is_empty() {
        return None;
    }
    prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = interpolate_quantile(&prices, 0.25);
    let q3 = interpolate_quantile(&prices, 0.75);
    let iqr = q3 - q1;
    Some(PriceBounds {
        q1,
        q3,
        lower: q1 - IQR_MULTIPLIER * iqr,
        upper: q3 + IQR_MULTIPLIER * iqr,
    })
}

/// Retain records whose price is present and inside the IQR bounds. Records
/// with a missing price never pass; when no price is measurable at all the
/// whole set is dropped.
pub fn remove_price_outliers(
    records: Vec<TicketRecord>,
) -> (Vec<TicketRecord>, Option<PriceBounds>) {
    let Some(bounds) = price_bounds(&records) else {
        if !records.is_empty() {
            debug!("No measurable prices; dropping all {} records", records.len());
        }
        return (Vec::new(), None);
    };

    let before = records.len();
    let kept: Vec<TicketRecord> = records
        .into_iter()
        .filter(|r| matches!(r.price, Some(p) if bounds.contains(p)))
        .collect();

    info!(
        "🧹 Outlier filter retained {}/{} records (price bounds {:.2}..{:.2})",
        kept.len(),
        before,
        bounds.lower,
        bounds.upper
    );
    (kept, Some(bounds))
}
