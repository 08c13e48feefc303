//! Logging configuration for the pipeline
//!
//! Console-only tracing output; the pipeline is a short-lived, synchronous
//! session so no file rotation is needed.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Logging configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tickoo=debug")
    pub level_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: "info,tickoo=info".to_string(),
        }
    }
}

/// Initialize console logging with an env-filter fallback chain:
/// `RUST_LOG` wins when set, otherwise the configured level filter applies.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()?;

    tracing::info!("🖥️ Console logging initialized");
    Ok(())
}

/// Best-effort init for tests; repeated calls are harmless.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
