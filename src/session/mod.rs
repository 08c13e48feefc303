//! Session context: the explicit object that replaces ambient mutable state.
//!
//! Normalization and outlier filtering run once per distinct uploaded file;
//! the result is cached keyed on a content hash of the bytes. Filter changes
//! only re-run the Filter Engine and everything downstream of it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::analytics::aggregates::{compute_aggregates, AggregateView, EventParams};
use crate::analytics::filter::{apply_filters, FilterSelection};
use crate::analytics::signals::derive_signals;
use crate::config::PipelineConfig;
use crate::export::write_filtered_csv;
use crate::ingest::errors::TicketDataError;
use crate::ingest::normalizer::normalize_csv;
use crate::ingest::outliers::remove_price_outliers;
use crate::ingest::structs::{TicketDataset, TicketRecord};

/// Per-session pipeline context. Owns the cached dataset, the behavior
/// flags, and the event parameters supplied by the presentation layer.
pub struct AnalyticsSession {
    config: PipelineConfig,
    params: EventParams,
    dataset: Option<TicketDataset>,
}

/// Load summary for the presentation layer: stage counts plus the distinct
/// values that populate the filter widgets.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub content_hash: String,
    pub rows_read: usize,
    pub rows_after_validity: usize,
    pub rows_after_outliers: usize,
    pub has_zone: bool,
    pub available_dates: Vec<NaiveDate>,
    pub available_sections: Vec<String>,
    pub available_zones: Vec<String>,
    /// True when the uploaded bytes matched the cached dataset.
    pub cache_hit: bool,
}

impl AnalyticsSession {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            params: EventParams::default(),
            dataset: None,
        }
    }

    pub fn set_event_params(&mut self, params: EventParams) {
        self.params = params;
    }

    pub fn event_params(&self) -> &EventParams {
        &self.params
    }

    pub fn dataset(&self) -> Option<&TicketDataset> {
        self.dataset.as_ref()
    }

    /// Load (or reuse) a CSV export. Identical bytes hit the cache and skip
    /// both re-parsing and re-running the outlier pass.
    pub fn load_csv(&mut self, bytes: &[u8]) -> Result<DatasetSummary, TicketDataError> {
        let content_hash = content_hash(bytes);
        if let Some(dataset) = &self.dataset {
            if dataset.content_hash == content_hash {
                info!("♻️ Reusing cached dataset {}", &content_hash[..12]);
                return Ok(summarize(dataset, true));
            }
        }

        let normalized = normalize_csv(bytes, &self.config)?;
        let rows_after_validity = normalized.records.len();
        let (records, price_bounds) = remove_price_outliers(normalized.records);

        let dataset = TicketDataset {
            rows_after_outliers: records.len(),
            records,
            has_section: normalized.has_section,
            has_zone: normalized.has_zone,
            content_hash,
            rows_read: normalized.rows_read,
            rows_after_validity,
            price_bounds,
        };
        info!(
            "📦 Dataset {} ready: {} records retained of {} read",
            &dataset.content_hash[..12],
            dataset.rows_after_outliers,
            dataset.rows_read
        );
        let summary = summarize(&dataset, false);
        self.dataset = Some(dataset);
        Ok(summary)
    }

    /// Run Filter Engine → Aggregation Engine → Signal Engine for the given
    /// selection.
    pub fn recompute(&self, selection: &FilterSelection) -> Result<AggregateView, TicketDataError> {
        let dataset = self.dataset.as_ref().ok_or(TicketDataError::NoDataset)?;
        let subset = apply_filters(&dataset.records, selection);
        let mut view = compute_aggregates(&subset, &self.params, self.config.zone_series_style);
        view.signals = derive_signals(&view, self.params.tickets_available);
        Ok(view)
    }

    /// The currently filtered record set, for re-export.
    pub fn filtered_records(
        &self,
        selection: &FilterSelection,
    ) -> Result<Vec<TicketRecord>, TicketDataError> {
        let dataset = self.dataset.as_ref().ok_or(TicketDataError::NoDataset)?;
        Ok(apply_filters(&dataset.records, selection))
    }

    /// Write the currently filtered set as a CSV with the input's column
    /// layout and a timestamp-suffixed filename.
    pub fn export_filtered(
        &self,
        selection: &FilterSelection,
        dir: &Path,
        base_name: &str,
    ) -> Result<PathBuf, TicketDataError> {
        let dataset = self.dataset.as_ref().ok_or(TicketDataError::NoDataset)?;
        let records = apply_filters(&dataset.records, selection);
        write_filtered_csv(&records, dataset.has_section, dataset.has_zone, dir, base_name)
    }
}

fn summarize(dataset: &TicketDataset, cache_hit: bool) -> DatasetSummary {
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut sections: BTreeSet<&str> = BTreeSet::new();
    let mut zones: BTreeSet<&str> = BTreeSet::new();
    for record in &dataset.records {
        if let Some(date) = record.date {
            dates.insert(date);
        }
        if let Some(section) = record.section.as_deref() {
            sections.insert(section);
        }
        if let Some(zone) = record.zone.as_deref() {
            zones.insert(zone);
        }
    }

    DatasetSummary {
        content_hash: dataset.content_hash.clone(),
        rows_read: dataset.rows_read,
        rows_after_validity: dataset.rows_after_validity,
        rows_after_outliers: dataset.rows_after_outliers,
        has_zone: dataset.has_zone,
        available_dates: dates.into_iter().collect(),
        available_sections: sections.into_iter().map(str::to_string).collect(),
        available_zones: zones.into_iter().map(str::to_string).collect(),
        cache_hit,
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Qty,Price,Date/Time (EDT),Section,Zone\n\
                       2,100.0,2025-09-01 10:00:00,A,Lower\n\
                       1,110.0,2025-09-02 11:00:00,B,Upper\n\
                       3,105.0,2025-09-02 12:00:00,A,Lower\n";

    #[test]
    fn test_second_identical_load_hits_cache() {
        let mut session = AnalyticsSession::new(PipelineConfig::default());
        let first = session.load_csv(CSV.as_bytes()).unwrap();
        assert!(!first.cache_hit);
        let second = session.load_csv(CSV.as_bytes()).unwrap();
        assert!(second.cache_hit);
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[test]
    fn test_different_bytes_replace_the_cached_dataset() {
        let mut session = AnalyticsSession::new(PipelineConfig::default());
        let first = session.load_csv(CSV.as_bytes()).unwrap();
        let other = CSV.replace("110.0", "120.0");
        let second = session.load_csv(other.as_bytes()).unwrap();
        assert!(!second.cache_hit);
        assert_ne!(first.content_hash, second.content_hash);
    }

    #[test]
    fn test_summary_lists_filter_widget_domains() {
        let mut session = AnalyticsSession::new(PipelineConfig::default());
        let summary = session.load_csv(CSV.as_bytes()).unwrap();
        assert_eq!(summary.available_sections, vec!["A", "B"]);
        assert_eq!(summary.available_zones, vec!["Lower", "Upper"]);
        assert_eq!(summary.available_dates.len(), 2);
        assert!(summary.has_zone);
    }

    #[test]
    fn test_recompute_without_dataset_is_an_error() {
        let session = AnalyticsSession::new(PipelineConfig::default());
        let err = session.recompute(&FilterSelection::default()).unwrap_err();
        assert!(matches!(err, TicketDataError::NoDataset));
    }

    #[test]
    fn test_recompute_runs_the_downstream_engines() {
        let mut session = AnalyticsSession::new(PipelineConfig::default());
        session.load_csv(CSV.as_bytes()).unwrap();
        session.set_event_params(EventParams {
            tickets_available: Some(10),
            ..EventParams::default()
        });

        let view = session.recompute(&FilterSelection::default()).unwrap();
        assert_eq!(view.kpis.total_tickets, 6);
        assert!(!view.signals.is_empty());

        let filtered = session
            .recompute(&FilterSelection {
                section: Some("A".to_string()),
                ..FilterSelection::default()
            })
            .unwrap();
        assert_eq!(filtered.kpis.total_tickets, 5);
    }
}
