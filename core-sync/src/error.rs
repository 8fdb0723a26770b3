use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Export failed for audit {audit_id} ({format})")]
    ExportFailed { audit_id: String, format: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid cursor value: {0}")]
    InvalidCursor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
