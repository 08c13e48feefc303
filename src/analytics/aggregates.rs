//! Aggregation Engine: pure functions of the filtered record set.
//!
//! Every aggregate has a defined degraded result for an empty subset —
//! undefined ratios, empty tables, empty series — so a filter that matches
//! nothing never errors.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ZoneSeriesStyle;
use crate::ingest::structs::TicketRecord;

use super::rolling::RollingMean;
use super::signals::MarketSignal;

/// Rolling price window, fixed by the source dashboards.
pub const ROLLING_PRICE_WINDOW: usize = 5;
/// Zone series are limited to this many zones, ranked by record frequency
/// (not ticket quantity — a deliberate ranking choice).
pub const TOP_ZONE_COUNT: usize = 5;
/// Section count table is limited to this many sections by record frequency.
pub const TOP_SECTION_COUNT: usize = 10;

/// Event parameters supplied by the presentation layer per session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventParams {
    pub event_date: Option<NaiveDate>,
    pub presale_date: Option<NaiveDate>,
    pub public_sale_date: Option<NaiveDate>,
    pub tickets_available: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Sum of quantities over the subset.
    pub total_tickets: u64,
    /// Mean of non-missing prices, rounded to 2 decimal places.
    pub average_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionPriceRange {
    pub section: String,
    /// Empty range (both `None`) when the section has no non-missing price.
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub tickets: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPricePoint {
    pub timestamp: NaiveDateTime,
    /// Undefined for the first `ROLLING_PRICE_WINDOW - 1` observations.
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSeries {
    pub zone: String,
    pub points: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBreakdown {
    pub style: ZoneSeriesStyle,
    pub series: Vec<ZoneSeries>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SalePhaseSplit {
    pub presale_sold: u64,
    pub general_sale_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCount {
    pub section: String,
    pub records: u64,
    pub tickets: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityBucket {
    pub quantity: u32,
    pub records: u64,
}

/// Everything the presentation layer needs for one recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateView {
    pub kpis: Kpis,
    pub section_price_ranges: Vec<SectionPriceRange>,
    /// Chronological; gap days are absent, never zero-filled.
    pub daily_counts: Vec<DailyCount>,
    pub rolling_prices: Vec<RollingPricePoint>,
    pub peak_day: Option<DailyCount>,
    /// Absent unless both sale-phase cutoffs are supplied.
    pub sale_phase: Option<SalePhaseSplit>,
    /// Absent unless `tickets_available > 0`.
    pub sell_through_pct: Option<f64>,
    pub zones: ZoneBreakdown,
    pub top_sections: Vec<SectionCount>,
    pub quantity_distribution: Vec<QuantityBucket>,
    /// Filled by the Signal Engine after aggregation.
    pub signals: Vec<MarketSignal>,
}

/// Compute the full view for a filtered subset. Signals are derived
/// separately, downstream of this function.
pub fn compute_aggregates(
    records: &[TicketRecord],
    params: &EventParams,
    zone_style: ZoneSeriesStyle,
) -> AggregateView {
    let kpis = compute_kpis(records);
    let daily_counts = daily_ticket_counts(records);
    let peak = peak_day(&daily_counts);

    debug!(
        "📊 Aggregated {} records: {} tickets across {} days",
        records.len(),
        kpis.total_tickets,
        daily_counts.len()
    );

    AggregateView {
        section_price_ranges: section_price_ranges(records),
        rolling_prices: rolling_price_series(records),
        peak_day: peak,
        sale_phase: sale_phase_split(records, params.presale_date, params.public_sale_date),
        sell_through_pct: sell_through_pct(kpis.total_tickets, params.tickets_available),
        zones: zone_breakdown(records, zone_style),
        top_sections: top_section_counts(records),
        quantity_distribution: quantity_distribution(records),
        signals: Vec::new(),
        kpis,
        daily_counts,
    }
}

pub fn compute_kpis(records: &[TicketRecord]) -> Kpis {
    let total_tickets = records.iter().map(TicketRecord::tickets).sum();
    let prices: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    let average_price = if prices.is_empty() {
        None
    } else {
        Some(round2(prices.iter().sum::<f64>() / prices.len() as f64))
    };
    let max_price = prices
        .iter()
        .copied()
        .fold(None, |max: Option<f64>, p| Some(max.map_or(p, |m| m.max(p))));

    Kpis { total_tickets, average_price, max_price }
}

/// Per-section `(min, max)` price table, sections sorted by name. Records
/// without a section label are excluded from the grouping.
pub fn section_price_ranges(records: &[TicketRecord]) -> Vec<SectionPriceRange> {
    let mut ranges: BTreeMap<&str, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for record in records {
        let Some(section) = record.section.as_deref() else {
            continue;
        };
        let entry = ranges.entry(section).or_insert((None, None));
        if let Some(price) = record.price {
            entry.0 = Some(entry.0.map_or(price, |m: f64| m.min(price)));
            entry.1 = Some(entry.1.map_or(price, |m: f64| m.max(price)));
        }
    }
    ranges
        .into_iter()
        .map(|(section, (min_price, max_price))| SectionPriceRange {
            section: section.to_string(),
            min_price,
            max_price,
        })
        .collect()
}

/// Per-day quantity sums in chronological order. Only days present in the
/// data appear; records without a date are excluded.
pub fn daily_ticket_counts(records: &[TicketRecord]) -> Vec<DailyCount> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        if let (Some(date), Some(quantity)) = (record.date, record.quantity) {
            *per_day.entry(date).or_insert(0) += u64::from(quantity);
        }
    }
    per_day
        .into_iter()
        .map(|(date, tickets)| DailyCount { date, tickets })
        .collect()
}

/// Trailing moving average of price over records sorted by timestamp.
/// Normalization already established the sort order; the filtered subset
/// preserves it.
pub fn rolling_price_series(records: &[TicketRecord]) -> Vec<RollingPricePoint> {
    let mut rolling = RollingMean::new(ROLLING_PRICE_WINDOW);
    let mut series = Vec::new();
    for record in records {
        if let (Some(timestamp), Some(price)) = (record.timestamp, record.price) {
            series.push(RollingPricePoint {
                timestamp,
                average: rolling.update(price),
            });
        }
    }
    series
}

/// The day with the maximum summed quantity; ties break to the first
/// occurrence in chronological order.
pub fn peak_day(daily_counts: &[DailyCount]) -> Option<DailyCount> {
    let mut best: Option<DailyCount> = None;
    for day in daily_counts {
        let replace = match best {
            None => true,
            Some(current) => day.tickets > current.tickets,
        };
        if replace {
            best = Some(*day);
        }
    }
    best
}

/// Presale vs general-sale quantity split. Both cutoffs are required; when
/// either is unset the split is simply not computed. `public_sale_date` is
/// assumed ≥ `presale_date` — no ordering correction is performed.
pub fn sale_phase_split(
    records: &[TicketRecord],
    presale_date: Option<NaiveDate>,
    public_sale_date: Option<NaiveDate>,
) -> Option<SalePhaseSplit> {
    let (presale, public) = match (presale_date, public_sale_date) {
        (Some(presale), Some(public)) => (presale, public),
        _ => return None,
    };
    let presale_start = presale.and_hms_opt(0, 0, 0)?;
    let public_start = public.and_hms_opt(0, 0, 0)?;

    let mut split = SalePhaseSplit::default();
    for record in records {
        let (Some(timestamp), Some(quantity)) = (record.timestamp, record.quantity) else {
            continue;
        };
        if timestamp >= public_start {
            split.general_sale_sold += u64::from(quantity);
        } else if timestamp >= presale_start {
            split.presale_sold += u64::from(quantity);
        }
    }
    Some(split)
}

/// Percentage of available inventory sold; omitted (not zero) when
/// `tickets_available` is unset or zero.
pub fn sell_through_pct(total_sold: u64, tickets_available: Option<u64>) -> Option<f64> {
    match tickets_available {
        Some(available) if available > 0 => {
            Some(total_sold as f64 / available as f64 * 100.0)
        }
        _ => None,
    }
}

/// Price-over-time series for the top zones by record frequency. Count ties
/// break by zone name for deterministic output.
pub fn zone_breakdown(records: &[TicketRecord], style: ZoneSeriesStyle) -> ZoneBreakdown {
    let mut counts: FxHashMap<&str, u64> = FxHashMap::default();
    for record in records {
        if let Some(zone) = record.zone.as_deref() {
            *counts.entry(zone).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_ZONE_COUNT);

    let series = ranked
        .into_iter()
        .map(|(zone, _)| ZoneSeries {
            zone: zone.to_string(),
            points: records
                .iter()
                .filter(|r| r.zone.as_deref() == Some(zone))
                .filter_map(|r| match (r.timestamp, r.price) {
                    (Some(timestamp), Some(price)) => Some(PricePoint { timestamp, price }),
                    _ => None,
                })
                .collect(),
        })
        .collect();

    ZoneBreakdown { style, series }
}

/// Record and ticket counts for the top sections by record frequency.
pub fn top_section_counts(records: &[TicketRecord]) -> Vec<SectionCount> {
    let mut counts: FxHashMap<&str, (u64, u64)> = FxHashMap::default();
    for record in records {
        if let Some(section) = record.section.as_deref() {
            let entry = counts.entry(section).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += record.tickets();
        }
    }

    let mut ranked: Vec<(&str, (u64, u64))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_SECTION_COUNT);

    ranked
        .into_iter()
        .map(|(section, (records, tickets))| SectionCount {
            section: section.to_string(),
            records,
            tickets,
        })
        .collect()
}

/// Count of records per distinct quantity value, ordered by quantity.
pub fn quantity_distribution(records: &[TicketRecord]) -> Vec<QuantityBucket> {
    let mut buckets: BTreeMap<u32, u64> = BTreeMap::new();
    for record in records {
        if let Some(quantity) = record.quantity {
            *buckets.entry(quantity).or_insert(0) += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(quantity, records)| QuantityBucket { quantity, records })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        quantity: Option<u32>,
        price: Option<f64>,
        timestamp: &str,
        section: Option<&str>,
        zone: Option<&str>,
    ) -> TicketRecord {
        let timestamp =
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").ok();
        TicketRecord {
            quantity,
            price,
            timestamp,
            date: timestamp.map(|ts| ts.date()),
            section: section.map(str::to_string),
            zone: zone.map(str::to_string),
        }
    }

    #[test]
    fn test_kpis_skip_missing_values() {
        let records = vec![
            record(Some(2), Some(100.0), "2025-09-01 10:00:00", None, None),
            record(Some(3), None, "2025-09-01 11:00:00", None, None),
            record(None, Some(200.0), "2025-09-01 12:00:00", None, None),
        ];
        let kpis = compute_kpis(&records);
        assert_eq!(kpis.total_tickets, 5);
        assert_eq!(kpis.average_price, Some(150.0));
        assert_eq!(kpis.max_price, Some(200.0));
    }

    #[test]
    fn test_kpis_on_empty_subset_degrade() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis.total_tickets, 0);
        assert_eq!(kpis.average_price, None);
        assert_eq!(kpis.max_price, None);
    }

    #[test]
    fn test_average_price_rounds_to_two_decimals() {
        let records = vec![
            record(Some(1), Some(10.0), "2025-09-01 10:00:00", None, None),
            record(Some(1), Some(10.004), "2025-09-01 11:00:00", None, None),
        ];
        assert_eq!(compute_kpis(&records).average_price, Some(10.0));
    }

    #[test]
    fn test_section_without_price_has_empty_range() {
        let records = vec![
            record(Some(1), Some(80.0), "2025-09-01 10:00:00", Some("A"), None),
            record(Some(1), Some(120.0), "2025-09-01 11:00:00", Some("A"), None),
            record(Some(1), None, "2025-09-01 12:00:00", Some("B"), None),
        ];
        let ranges = section_price_ranges(&records);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].section, "A");
        assert_eq!(ranges[0].min_price, Some(80.0));
        assert_eq!(ranges[0].max_price, Some(120.0));
        assert_eq!(ranges[1].section, "B");
        assert_eq!(ranges[1].min_price, None);
        assert_eq!(ranges[1].max_price, None);
    }

    #[test]
    fn test_daily_counts_skip_gap_days_and_sum_conserves() {
        let records = vec![
            record(Some(5), Some(10.0), "2025-09-01 10:00:00", None, None),
            record(Some(3), Some(10.0), "2025-09-01 18:00:00", None, None),
            // no sales on 09-02
            record(Some(7), Some(10.0), "2025-09-03 09:00:00", None, None),
        ];
        let daily = daily_ticket_counts(&records);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].tickets, 8);
        assert_eq!(daily[1].tickets, 7);

        let total: u64 = daily.iter().map(|d| d.tickets).sum();
        assert_eq!(total, compute_kpis(&records).total_tickets);
    }

    #[test]
    fn test_rolling_series_first_positions_undefined() {
        let records: Vec<TicketRecord> = (0..5)
            .map(|i| {
                record(
                    Some(1),
                    Some(10.0 * (i + 1) as f64),
                    &format!("2025-09-01 1{}:00:00", i),
                    None,
                    None,
                )
            })
            .collect();

        let four = rolling_price_series(&records[..4]);
        assert_eq!(four.len(), 4);
        assert!(four.iter().all(|p| p.average.is_none()));

        let five = rolling_price_series(&records);
        assert!(five[..4].iter().all(|p| p.average.is_none()));
        assert_eq!(five[4].average, Some(30.0)); // mean of 10..=50
    }

    #[test]
    fn test_peak_day_tie_breaks_to_first_chronological() {
        let daily = vec![
            DailyCount { date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), tickets: 7 },
            DailyCount { date: NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(), tickets: 7 },
            DailyCount { date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(), tickets: 3 },
        ];
        let peak = peak_day(&daily).unwrap();
        assert_eq!(peak.date, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }

    #[test]
    fn test_sale_phase_split_worked_example() {
        let records = vec![
            record(Some(5), Some(10.0), "2025-09-01 10:00:00", None, None),
            record(Some(3), Some(10.0), "2025-09-02 10:00:00", None, None),
            record(Some(7), Some(10.0), "2025-09-03 10:00:00", None, None),
        ];
        let split = sale_phase_split(
            &records,
            NaiveDate::from_ymd_opt(2025, 9, 1),
            NaiveDate::from_ymd_opt(2025, 9, 3),
        )
        .unwrap();
        assert_eq!(split.presale_sold, 8);
        assert_eq!(split.general_sale_sold, 7);
    }

    #[test]
    fn test_sale_phase_requires_both_cutoffs() {
        let records = vec![record(Some(5), Some(10.0), "2025-09-01 10:00:00", None, None)];
        assert!(sale_phase_split(&records, NaiveDate::from_ymd_opt(2025, 9, 1), None).is_none());
        assert!(sale_phase_split(&records, None, NaiveDate::from_ymd_opt(2025, 9, 3)).is_none());
    }

    #[test]
    fn test_sell_through_omitted_without_inventory() {
        assert_eq!(sell_through_pct(10, None), None);
        assert_eq!(sell_through_pct(10, Some(0)), None);
        let pct = sell_through_pct(25, Some(100)).unwrap();
        assert!((pct - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_zone_breakdown_top_five_by_frequency() {
        let mut records = Vec::new();
        // zone names chosen so frequency ranking differs from name order
        for (zone, count) in [("F", 6u32), ("E", 5), ("D", 4), ("C", 3), ("B", 2), ("A", 1)] {
            for i in 0..count {
                records.push(record(
                    Some(10), // high quantity on rare zones must not matter
                    Some(50.0),
                    &format!("2025-09-0{} 10:00:00", (i % 7) + 1),
                    None,
                    Some(zone),
                ));
            }
        }
        let breakdown = zone_breakdown(&records, ZoneSeriesStyle::Separate);
        let zones: Vec<&str> = breakdown.series.iter().map(|s| s.zone.as_str()).collect();
        assert_eq!(zones, vec!["F", "E", "D", "C", "B"]);
        assert_eq!(breakdown.series[0].points.len(), 6);
    }

    #[test]
    fn test_no_zone_labels_yield_empty_breakdown() {
        let records = vec![record(Some(1), Some(10.0), "2025-09-01 10:00:00", Some("A"), None)];
        let breakdown = zone_breakdown(&records, ZoneSeriesStyle::Overlaid);
        assert!(breakdown.series.is_empty());
        assert_eq!(breakdown.style, ZoneSeriesStyle::Overlaid);
    }

    #[test]
    fn test_quantity_distribution_is_ordered() {
        let records = vec![
            record(Some(4), Some(10.0), "2025-09-01 10:00:00", None, None),
            record(Some(2), Some(10.0), "2025-09-01 11:00:00", None, None),
            record(Some(2), Some(10.0), "2025-09-01 12:00:00", None, None),
        ];
        let buckets = quantity_distribution(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].quantity, 2);
        assert_eq!(buckets[0].records, 2);
        assert_eq!(buckets[1].quantity, 4);
    }
}
