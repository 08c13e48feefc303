//! Filter Engine: user-selected equality filters over the outlier-filtered
//! set. Predicates compose with AND; a default field is a no-op, not a
//! predicate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingest::structs::TicketRecord;

/// Active filter state. `None` on a field means no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub date: Option<NaiveDate>,
    pub section: Option<String>,
    pub zone: Option<String>,
}

impl FilterSelection {
    pub fn is_unrestricted(&self) -> bool {
        self.date.is_none() && self.section.is_none() && self.zone.is_none()
    }

    /// A record with a missing field never matches a concrete value for that
    /// field.
    pub fn matches(&self, record: &TicketRecord) -> bool {
        if let Some(date) = self.date {
            if record.date != Some(date) {
                return false;
            }
        }
        if let Some(section) = &self.section {
            if record.section.as_deref() != Some(section.as_str()) {
                return false;
            }
        }
        if let Some(zone) = &self.zone {
            if record.zone.as_deref() != Some(zone.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Return the matching subset. An empty result is a valid state — downstream
/// aggregates degrade rather than error.
pub fn apply_filters(records: &[TicketRecord], selection: &FilterSelection) -> Vec<TicketRecord> {
    let subset: Vec<TicketRecord> = records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect();
    debug!(
        "🔍 Filter matched {}/{} records (date: {:?}, section: {:?}, zone: {:?})",
        subset.len(),
        records.len(),
        selection.date,
        selection.section,
        selection.zone
    );
    subset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, section: Option<&str>, zone: Option<&str>) -> TicketRecord {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok();
        TicketRecord {
            quantity: Some(1),
            price: Some(100.0),
            timestamp: date.and_then(|d| d.and_hms_opt(12, 0, 0)),
            date,
            section: section.map(str::to_string),
            zone: zone.map(str::to_string),
        }
    }

    fn sample() -> Vec<TicketRecord> {
        vec![
            record("2025-09-01", Some("A"), Some("Lower")),
            record("2025-09-01", Some("B"), Some("Upper")),
            record("2025-09-02", Some("A"), None),
            record("bad", None, Some("Lower")),
        ]
    }

    #[test]
    fn test_default_selection_is_a_no_op() {
        let records = sample();
        let subset = apply_filters(&records, &FilterSelection::default());
        assert_eq!(subset.len(), records.len());
    }

    #[test]
    fn test_predicates_compose_with_and() {
        let records = sample();
        let selection = FilterSelection {
            date: NaiveDate::from_ymd_opt(2025, 9, 1),
            section: Some("A".to_string()),
            zone: None,
        };
        let subset = apply_filters(&records, &selection);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].zone.as_deref(), Some("Lower"));
    }

    #[test]
    fn test_missing_field_never_matches_concrete_value() {
        let records = sample();
        let selection = FilterSelection {
            section: Some("A".to_string()),
            ..FilterSelection::default()
        };
        // The record without a section is excluded even though others match
        let subset = apply_filters(&records, &selection);
        assert_eq!(subset.len(), 2);
    }

    #[test]
    fn test_no_match_yields_empty_subset_not_error() {
        let records = sample();
        let selection = FilterSelection {
            zone: Some("Mezzanine".to_string()),
            ..FilterSelection::default()
        };
        assert!(apply_filters(&records, &selection).is_empty());
    }

    #[test]
    fn test_composition_equals_intersection_of_single_field_filters() {
        let records = sample();
        let combined = FilterSelection {
            date: NaiveDate::from_ymd_opt(2025, 9, 1),
            section: Some("A".to_string()),
            zone: Some("Lower".to_string()),
        };
        let composed = apply_filters(&records, &combined);

        let by_date = apply_filters(
            &records,
            &FilterSelection { date: combined.date, ..FilterSelection::default() },
        );
        let by_section = apply_filters(
            &by_date,
            &FilterSelection { section: combined.section.clone(), ..FilterSelection::default() },
        );
        let sequential = apply_filters(
            &by_section,
            &FilterSelection { zone: combined.zone.clone(), ..FilterSelection::default() },
        );
        assert_eq!(composed, sequential);
    }
}
