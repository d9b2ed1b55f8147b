//! Ingestion configuration
//!
//! Everything the run needs is carried in [`IngestConfig`] and handed to the
//! orchestrator at startup. Values come from defaults, then environment
//! variables (a `.env` file is honoured), then CLI flags.

use egrul_common::logging::{LogConfig, LogOutput};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{IngestError, Result};
use crate::planner::DEFAULT_CHUNK_SIZE;

// ============================================================================
// Defaults
// ============================================================================

/// Archive read when no path is given
pub const DEFAULT_ARCHIVE_PATH: &str = "egrul.json.zip";

/// Primary activity prefix selecting software development companies
pub const DEFAULT_INDUSTRY_PREFIX: &str = "62";

/// Destination table for matching companies
pub const DEFAULT_TABLE: &str = "egrul62";

/// Default database URL for local development
pub const DEFAULT_DATABASE_URL: &str = "postgresql://postgres@localhost:5432/postgres";

/// Longest identifier PostgreSQL keeps without truncation
const MAX_IDENTIFIER_LEN: usize = 63;

/// Destination database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub database_url: String,
    /// Table name, optionally schema-qualified (`schema.table`)
    pub table: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// Configuration for one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub archive_path: PathBuf,
    /// Archive entries per chunk
    pub chunk_size: usize,
    /// Number of chunks processed concurrently
    pub workers: usize,
    /// Activity code prefix a record must have to be kept
    pub industry_prefix: String,
    pub sink: SinkConfig,
    pub log: LogConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: default_workers(),
            industry_prefix: DEFAULT_INDUSTRY_PREFIX.to_string(),
            sink: SinkConfig::default(),
            log: LogConfig::builder()
                .output(LogOutput::Both)
                .filter_directives("sqlx=warn")
                .build(),
        }
    }
}

/// One worker per available CPU
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}

impl IngestConfig {
    /// Load configuration from environment variables over the defaults
    ///
    /// Environment variables:
    /// - `EGRUL_ARCHIVE`: archive path
    /// - `EGRUL_CHUNK_SIZE`: entries per chunk
    /// - `EGRUL_WORKERS`: concurrent chunks
    /// - `EGRUL_INDUSTRY_PREFIX`: activity code prefix
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `EGRUL_TABLE`: destination table
    /// - `LOG_*`: see [`LogConfig::from_env`]
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(path) = std::env::var("EGRUL_ARCHIVE") {
            config.archive_path = PathBuf::from(path);
        }
        if let Some(chunk_size) = env_parse("EGRUL_CHUNK_SIZE")? {
            config.chunk_size = chunk_size;
        }
        if let Some(workers) = env_parse("EGRUL_WORKERS")? {
            config.workers = workers;
        }
        if let Ok(prefix) = std::env::var("EGRUL_INDUSTRY_PREFIX") {
            config.industry_prefix = prefix;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.sink.database_url = url;
        }
        if let Ok(table) = std::env::var("EGRUL_TABLE") {
            config.sink.table = table;
        }

        config.log = config.log.merge_env()?;

        Ok(config)
    }

    /// Reject settings that would make the run meaningless
    ///
    /// Called before any chunk is dispatched.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(IngestError::invalid_config("chunk size must be greater than 0"));
        }

        if self.workers == 0 {
            return Err(IngestError::invalid_config("worker count must be greater than 0"));
        }

        if self.archive_path.as_os_str().is_empty() {
            return Err(IngestError::invalid_config("archive path cannot be empty"));
        }

        if self.industry_prefix.is_empty() {
            return Err(IngestError::invalid_config("industry prefix cannot be empty"));
        }

        if self.sink.database_url.is_empty() {
            return Err(IngestError::invalid_config("database URL cannot be empty"));
        }

        if !is_valid_table_name(&self.sink.table) {
            return Err(IngestError::invalid_config(format!(
                "table name '{}' is not a plain SQL identifier",
                self.sink.table
            )));
        }

        Ok(())
    }
}

fn env_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        Err(_) => Ok(None),
    }
}

/// `table` or `schema.table`, each part an unquoted identifier
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| is_identifier(part))
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    part.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
