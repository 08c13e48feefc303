//! Pipeline configuration
//!
//! The observed pipeline variants diverged on zero-quantity handling and
//! zone-series rendering. Both behaviors are explicit, named flags here
//! rather than one variant's rules being silently baked in.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::filter::FilterSelection;
use crate::ingest::errors::TicketDataError;
use crate::logging::LoggingConfig;

/// What to do with `quantity == 0` rows before the validity filter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroQuantityPolicy {
    /// Leave zero quantities in place; the validity filter (when enabled)
    /// removes them.
    Drop,
    /// Rewrite zero quantities to the given value (documented data-correction
    /// rule, not a parsing default).
    Remap(u32),
}

/// How the presentation layer should render the per-zone price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSeriesStyle {
    /// One chart per zone.
    Separate,
    /// All zones overlaid on a single chart.
    Overlaid,
}

/// Behavior flags for the cleaning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub zero_quantity_policy: ZeroQuantityPolicy,
    /// When true, records whose quantity is missing or ≤ 0 are removed after
    /// coercion. Two observed variants kept such rows, two dropped them.
    pub drop_invalid_quantity: bool,
    pub zone_series_style: ZoneSeriesStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            zero_quantity_policy: ZeroQuantityPolicy::Drop,
            drop_invalid_quantity: true,
            zone_series_style: ZoneSeriesStyle::Separate,
        }
    }
}

/// Runner configuration loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub application: ApplicationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub filter: FilterSelection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Application section of `config.toml`. Dates are quoted ISO strings
/// (e.g. `"2025-09-01"`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    pub csv_path: String,
    pub export_dir: Option<String>,
    pub export_basename: Option<String>,
    pub event_date: Option<chrono::NaiveDate>,
    pub presale_date: Option<chrono::NaiveDate>,
    pub public_sale_date: Option<chrono::NaiveDate>,
    pub tickets_available: Option<u64>,
}

impl ApplicationConfig {
    /// Event parameters the presentation layer would supply per session.
    pub fn event_params(&self) -> crate::analytics::aggregates::EventParams {
        crate::analytics::aggregates::EventParams {
            event_date: self.event_date,
            presale_date: self.presale_date,
            public_sale_date: self.public_sale_date,
            tickets_available: self.tickets_available,
        }
    }
}

/// Load and parse the runner configuration file.
pub fn load_runner_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, TicketDataError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    toml::from_str(&raw).map_err(|e| TicketDataError::Config(e.to_string()))
}
