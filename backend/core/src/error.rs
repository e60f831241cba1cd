use thiserror::Error;

/// Top-level error type for the archiver runtime.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("File size ({size}) exceeds limit ({limit})")]
    SizeLimitExceeded { size: String, limit: String },

    #[error("Download failed: {0}")]
    TransferFailed(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
