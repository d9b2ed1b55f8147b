//! Error types for EGRUL ingestion
//!
//! Record-level failures ([`DecodeError`]) and sink failures ([`SinkError`])
//! are recovered from by the chunk worker; [`IngestError`] covers everything
//! that can stop an entry, a chunk, or the run before dispatch.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Main error type for the ingest pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    /// Configuration rejected before any work was dispatched
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The archive or one of its entries could not be opened or read
    #[error("Archive read failed for '{target}': {reason}")]
    ArchiveRead { target: String, reason: String },

    /// An entry was read but is not a JSON array of records
    #[error("Entry '{entry}' is not a JSON array of records: {source}")]
    EntryDecode {
        entry: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A blocking chunk task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl IngestError {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an archive read error for an archive path or entry name
    pub fn archive_read(target: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ArchiveRead {
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// A raw JSON object does not satisfy the company record schema
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("record is not a JSON object")]
    NotAnObject,

    /// Missing or ill-typed required field, or a malformed nested section
    #[error("record does not match schema: {0}")]
    Schema(#[from] serde_json::Error),
}

/// A row could not be persisted
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Failed to prepare destination table: {0}")]
    Setup(#[source] sqlx::Error),

    #[error("Failed to insert row for INN {inn}: {source}")]
    Write {
        inn: String,
        #[source]
        source: sqlx::Error,
    },

    /// Rejection reported by a non-database sink
    #[error("Row rejected for INN {inn}: {reason}")]
    Rejected { inn: String, reason: String },
}
