//! Schema Normalizer: raw CSV rows → typed, sorted `TicketRecord`s.
//!
//! Coercion degrades per field — an unparseable quantity, price, or
//! timestamp becomes missing on that record without aborting the load. The
//! zero-quantity correction and the validity filter are configuration flags
//! (the observed pipeline variants disagreed on both).

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::config::{PipelineConfig, ZeroQuantityPolicy};

use super::errors::TicketDataError;
use super::structs::{columns, TicketRecord};

/// Accepted layouts for the sale-time column. Anything else is a missing
/// timestamp. No timezone conversion is performed.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%y %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, normalized to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Normalizer output: typed records plus which optional columns the source
/// actually carried.
#[derive(Debug, Clone)]
pub struct NormalizedRows {
    pub records: Vec<TicketRecord>,
    pub has_section: bool,
    pub has_zone: bool,
    pub rows_read: usize,
}

/// Parse a CSV export into typed records, apply the zero-quantity policy and
/// the validity filter, and sort by timestamp ascending (missing timestamps
/// last). This is the single normalization pass: `date` is derived here and
/// never re-computed downstream.
pub fn normalize_csv<R: Read>(
    reader: R,
    config: &PipelineConfig,
) -> Result<NormalizedRows, TicketDataError> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let qty_idx = column(columns::QTY)
        .ok_or_else(|| TicketDataError::MissingColumn(columns::QTY.to_string()))?;
    let price_idx = column(columns::PRICE)
        .ok_or_else(|| TicketDataError::MissingColumn(columns::PRICE.to_string()))?;
    let time_idx = column(columns::SALE_TIME)
        .ok_or_else(|| TicketDataError::MissingColumn(columns::SALE_TIME.to_string()))?;
    let section_idx = column(columns::SECTION);
    let zone_idx = column(columns::ZONE);

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    for result in csv_reader.records() {
        let row = result?;
        rows_read += 1;

        let timestamp = row.get(time_idx).and_then(parse_sale_time);
        records.push(TicketRecord {
            quantity: row.get(qty_idx).and_then(parse_quantity),
            price: row.get(price_idx).and_then(parse_price),
            timestamp,
            date: timestamp.map(|ts| ts.date()),
            section: section_idx.and_then(|i| row.get(i)).and_then(non_empty),
            zone: zone_idx.and_then(|i| row.get(i)).and_then(non_empty),
        });
    }

    // Correction rule runs before the validity filter so remapped rows survive it
    if let ZeroQuantityPolicy::Remap(value) = config.zero_quantity_policy {
        let mut remapped = 0usize;
        for record in &mut records {
            if record.quantity == Some(0) {
                record.quantity = Some(value);
                remapped += 1;
            }
        }
        if remapped > 0 {
            info!("🔧 Remapped {} zero-quantity rows to {}", remapped, value);
        }
    }

    if config.drop_invalid_quantity {
        let before = records.len();
        records.retain(|r| matches!(r.quantity, Some(q) if q > 0));
        debug!("Validity filter removed {} rows", before - records.len());
    }

    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    info!(
        "📥 Normalized {} of {} rows (section column: {}, zone column: {})",
        records.len(),
        rows_read,
        section_idx.is_some(),
        zone_idx.is_some()
    );

    Ok(NormalizedRows {
        records,
        has_section: section_idx.is_some(),
        has_zone: zone_idx.is_some(),
        rows_read,
    })
}

/// Integer ≥ 0, tolerating float renderings like "2.0". Anything else is
/// missing.
fn parse_quantity(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(quantity) = trimmed.parse::<u32>() {
        return Some(quantity);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Some(v as u32),
        _ => None,
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_sale_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(ts);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
