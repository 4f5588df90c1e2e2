use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("no input file name")]
    MissingInput,

    #[error("no output directory")]
    MissingOutput,

    #[error("failed to read input file at {0}")]
    InputRead(PathBuf),

    #[error("failed to parse records: {0}")]
    InputParse(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid archive identifier: {0}")]
    InvalidArchiveId(String),

    #[error("archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("catalog returned status {status}: {message}")]
    CatalogStatus { status: u16, message: String },

    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("failed writing audit log: {0}")]
    #[diagnostic(help("the audit trail is incomplete; check the log location and disk space"))]
    AuditWrite(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl HarvestError {
    /// Local resource failures abort the run; remote and per-record ones are logged and skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            HarvestError::ArchiveHttp(_)
                | HarvestError::ArchiveStatus { .. }
                | HarvestError::CatalogHttp(_)
                | HarvestError::CatalogStatus { .. }
                | HarvestError::MetadataUnavailable(_)
                | HarvestError::InvalidArchiveId(_)
        )
    }
}
