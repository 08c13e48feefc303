//! Signal Engine: threshold-based market-condition flags derived from the
//! aggregates. Thresholds are fixed constants, matching the source
//! dashboards; exposing them as configuration was deliberately not done.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregates::AggregateView;

/// Trailing calendar-day window for demand acceleration.
pub const DEMAND_WINDOW_DAYS: i64 = 3;
/// Remaining-inventory ratio below which low-inventory fires.
pub const LOW_INVENTORY_RATIO: f64 = 0.5;
/// Sold ratio above which near-sell-out risk fires.
pub const SELL_OUT_RISK_RATIO: f64 = 0.3;

/// Labeled market-condition flags. Inventory signals are independent and may
/// co-fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketSignal {
    AcceleratingDemand {
        recent_daily_avg: f64,
        overall_daily_avg: f64,
    },
    LowInventory {
        remaining_ratio: f64,
    },
    NearSellOutRisk {
        sold_ratio: f64,
    },
    Stable,
}

impl std::fmt::Display for MarketSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketSignal::AcceleratingDemand { recent_daily_avg, overall_daily_avg } => write!(
                f,
                "accelerating demand ({:.1}/day recently vs {:.1}/day overall)",
                recent_daily_avg, overall_daily_avg
            ),
            MarketSignal::LowInventory { remaining_ratio } => {
                write!(f, "low inventory ({:.0}% remaining)", remaining_ratio * 100.0)
            }
            MarketSignal::NearSellOutRisk { sold_ratio } => {
                write!(f, "near sell-out risk ({:.0}% of inventory sold)", sold_ratio * 100.0)
            }
            MarketSignal::Stable => write!(f, "stable"),
        }
    }
}

/// Derive signals from an aggregate view. When `tickets_available` is unset
/// or zero, no signals fire and the engine reports stable.
pub fn derive_signals(view: &AggregateView, tickets_available: Option<u64>) -> Vec<MarketSignal> {
    let available = match tickets_available {
        Some(available) if available > 0 => available,
        _ => {
            debug!("No inventory figure supplied; reporting stable");
            return vec![MarketSignal::Stable];
        }
    };

    let mut signals = Vec::new();

    if let Some(acceleration) = demand_acceleration(view) {
        signals.push(acceleration);
    }

    let sold = view.kpis.total_tickets as f64;
    let available = available as f64;
    let remaining_ratio = (available - sold) / available;
    if remaining_ratio < LOW_INVENTORY_RATIO {
        signals.push(MarketSignal::LowInventory { remaining_ratio });
    }
    let sold_ratio = sold / available;
    if sold_ratio > SELL_OUT_RISK_RATIO {
        signals.push(MarketSignal::NearSellOutRisk { sold_ratio });
    }

    if signals.is_empty() {
        signals.push(MarketSignal::Stable);
    }
    signals
}

/// Average daily quantity over the trailing window (relative to the latest
/// day present) against the overall per-day average; fires only on a strict
/// increase. Divisors count distinct days present, so gap days do not skew
/// either figure.
fn demand_acceleration(view: &AggregateView) -> Option<MarketSignal> {
    let daily = &view.daily_counts;
    let last_date = daily.last()?.date;
    let window_start = last_date - Duration::days(DEMAND_WINDOW_DAYS - 1);

    let (recent_days, recent_total) = daily
        .iter()
        .filter(|day| day.date >= window_start)
        .fold((0u64, 0u64), |(days, total), day| (days + 1, total + day.tickets));
    if recent_days == 0 {
        return None;
    }

    let overall_total: u64 = daily.iter().map(|day| day.tickets).sum();
    let overall_daily_avg = overall_total as f64 / daily.len() as f64;
    let recent_daily_avg = recent_total as f64 / recent_days as f64;

    if recent_daily_avg > overall_daily_avg {
        Some(MarketSignal::AcceleratingDemand { recent_daily_avg, overall_daily_avg })
    } else {
        None
    }
}
