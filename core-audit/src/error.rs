use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Unknown item type: {0}")]
    UnknownItemType(String),

    #[error("Unknown document format: {0}")]
    UnknownDocumentFormat(String),
}

pub type Result<T> = std::result::Result<T, AuditError>;
