//! Row sinks
//!
//! A sink receives one [`CompanyRow`] per matching record. Inserts are
//! independent units of work: a failed insert is reported to the caller and
//! never affects other rows.

use async_trait::async_trait;
use sqlx::{Connection, PgConnection};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::config::{is_valid_table_name, SinkConfig};
use crate::error::{IngestError, SinkError};
use crate::record::CompanyRow;

/// Destination for matching company rows
#[async_trait]
pub trait RowSink: Send + Sync {
    /// Persist one row or report why it could not be written
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

/// PostgreSQL sink
///
/// Opens a connection for every insert and closes it afterwards, so workers
/// never share a connection or a transaction.
pub struct PgSink {
    database_url: String,
    table: String,
    insert_sql: String,
}

impl PgSink {
    pub fn new(config: &SinkConfig) -> Result<Self, IngestError> {
        if !is_valid_table_name(&config.table) {
            return Err(IngestError::invalid_config(format!(
                "table name '{}' is not a plain SQL identifier",
                config.table
            )));
        }

        Ok(Self {
            database_url: config.database_url.clone(),
            table: config.table.clone(),
            insert_sql: format!(
                "INSERT INTO {} (name, full_name, okved, inn, kpp, adres) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                config.table
            ),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn insert_statement(&self) -> &str {
        &self.insert_sql
    }

    /// DDL for the destination table
    pub fn create_table_statement(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id BIGSERIAL PRIMARY KEY, \
             name TEXT NOT NULL, \
             full_name TEXT NOT NULL, \
             okved TEXT NOT NULL, \
             inn TEXT NOT NULL, \
             kpp TEXT NOT NULL, \
             adres TEXT NOT NULL)",
            self.table
        )
    }

    /// Create the destination table if it does not exist yet
    pub async fn ensure_table(&self) -> Result<(), SinkError> {
        let mut conn = self.connect().await?;
        let sql = self.create_table_statement();
        let result = sqlx::query(&sql).execute(&mut conn).await;
        close_quietly(conn).await;

        result.map_err(SinkError::Setup)?;
        info!(table = %self.table, "Destination table ready");
        Ok(())
    }

    async fn connect(&self) -> Result<PgConnection, SinkError> {
        PgConnection::connect(&self.database_url)
            .await
            .map_err(SinkError::Connect)
    }
}

async fn close_quietly(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        debug!(error = %e, "Failed to close database connection cleanly");
    }
}

#[async_trait]
impl RowSink for PgSink {
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError> {
        let mut conn = self.connect().await?;

        let result = sqlx::query(&self.insert_sql)
            .bind(&row.name)
            .bind(&row.full_name)
            .bind(&row.okved)
            .bind(&row.inn)
            .bind(&row.kpp)
            .bind(&row.address)
            .execute(&mut conn)
            .await;

        close_quietly(conn).await;

        result.map(|_| ()).map_err(|source| SinkError::Write {
            inn: row.inn.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("postgres table {}", self.table)
    }
}

/// Sink that only logs rows, for runs without a database
#[derive(Debug, Default)]
pub struct DryRunSink {
    rows: AtomicU64,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows received so far
    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RowSink for DryRunSink {
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError> {
        self.rows.fetch_add(1, Ordering::Relaxed);
        info!(
            inn = %row.inn,
            kpp = %row.kpp,
            okved = %row.okved,
            name = %row.name,
            address = %row.address,
            "Matched company (dry run)"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "dry run (log only)".to_string()
    }
}
