use thiserror::Error;

/// Structural pipeline failures. Field-level parse problems are not errors:
/// the record survives with the field marked missing.
#[derive(Error, Debug)]
pub enum TicketDataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("No dataset loaded")]
    NoDataset,
}
