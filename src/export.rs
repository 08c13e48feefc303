//! Presentation-boundary output: CSV re-export of the filtered record set
//! and JSON rendering of the aggregate view.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::analytics::aggregates::AggregateView;
use crate::ingest::errors::TicketDataError;
use crate::ingest::structs::{columns, TicketRecord};

/// Suffix appended to the caller-supplied base filename.
const FILENAME_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
/// Timestamp layout used inside the exported file.
const EXPORT_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Write `records` as UTF-8 CSV under `dir`, using the same column layout as
/// the input (optional columns appear only when the source carried them).
/// Missing fields are written as empty cells. Returns the generated path.
pub fn write_filtered_csv(
    records: &[TicketRecord],
    has_section: bool,
    has_zone: bool,
    dir: &Path,
    base_name: &str,
) -> Result<PathBuf, TicketDataError> {
    let file_name = format!("{}_{}.csv", base_name, Utc::now().format(FILENAME_TIMESTAMP));
    let path = dir.join(file_name);

    let mut writer = csv::Writer::from_path(&path)?;
    let mut header = vec![columns::QTY, columns::PRICE, columns::SALE_TIME];
    if has_section {
        header.push(columns::SECTION);
    }
    if has_zone {
        header.push(columns::ZONE);
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.quantity.map(|q| q.to_string()).unwrap_or_default(),
            record.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
            record
                .timestamp
                .map(|ts| ts.format(EXPORT_TIMESTAMP).to_string())
                .unwrap_or_default(),
        ];
        if has_section {
            row.push(record.section.clone().unwrap_or_default());
        }
        if has_zone {
            row.push(record.zone.clone().unwrap_or_default());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!("💾 Exported {} filtered records to {}", records.len(), path.display());
    Ok(path)
}

/// Render the aggregate view for a UI host.
pub fn view_to_json(view: &AggregateView) -> Result<String, TicketDataError> {
    serde_json::to_string_pretty(view).map_err(|e| TicketDataError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(zone: Option<&str>) -> TicketRecord {
        let timestamp = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        TicketRecord {
            quantity: Some(2),
            price: Some(99.5),
            timestamp: Some(timestamp),
            date: Some(timestamp.date()),
            section: Some("Floor A".to_string()),
            zone: zone.map(str::to_string),
        }
    }

    #[test]
    fn test_export_preserves_input_column_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path =
            write_filtered_csv(&[record(Some("Lower"))], true, true, dir.path(), "tickets")
                .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("Qty,Price,Date/Time (EDT),Section,Zone"));
        assert_eq!(
            lines.next(),
            Some("2,99.50,2025-09-01 10:30:00,Floor A,Lower")
        );
    }

    #[test]
    fn test_export_omits_absent_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_filtered_csv(&[record(None)], false, false, dir.path(), "tickets")
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Qty,Price,Date/Time (EDT)\n"));
        assert!(!contents.contains("Zone"));
    }

    #[test]
    fn test_filename_carries_base_and_timestamp_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_filtered_csv(&[], false, false, dir.path(), "floor_a").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("floor_a_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_missing_fields_become_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut sparse = record(None);
        sparse.price = None;
        sparse.timestamp = None;
        let path = write_filtered_csv(&[sparse], true, false, dir.path(), "tickets").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert_eq!(data_line, "2,,,Floor A");
    }
}
