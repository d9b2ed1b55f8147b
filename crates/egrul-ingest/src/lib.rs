//! EGRUL Ingest
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Extracts companies of one industry from a zipped EGRUL registry dump and
//! writes them to a relational table.
//!
//! A run opens the archive once to list its entries, splits the entries into
//! fixed-size chunks and processes the chunks concurrently. Each chunk opens
//! its own handle to the archive, decodes every entry as a JSON array of
//! company objects and keeps the records whose primary activity code starts
//! with the configured prefix and whose region is consistent with a federal
//! district. Kept records are flattened into [`CompanyRow`]s and handed to a
//! [`RowSink`] one at a time.
//!
//! # Modules
//!
//! - [`archive`]: entry listing and whole-entry reads
//! - [`planner`]: chunk planning
//! - [`record`]: record schema, filter predicates and address assembly
//! - [`districts`]: the federal district reference table
//! - [`worker`]: per-chunk processing
//! - [`orchestrator`]: bounded concurrent dispatch of chunks
//! - [`sink`]: PostgreSQL and dry-run sinks
//! - [`config`]: run configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use egrul_ingest::{IngestConfig, Orchestrator, PgSink};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = IngestConfig::from_env()?;
//! let sink = Arc::new(PgSink::new(&config.sink)?);
//! let summary = Orchestrator::new(config, sink).run().await?;
//! println!("inserted {} rows", summary.inserted);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod districts;
pub mod error;
pub mod orchestrator;
pub mod planner;
pub mod record;
pub mod sink;
pub mod worker;

pub use archive::{ArchiveSource, ZipArchiveSource};
pub use config::{IngestConfig, SinkConfig};
pub use districts::{DistrictTable, FederalDistrict};
pub use error::{DecodeError, IngestError, Result, SinkError};
pub use orchestrator::{Orchestrator, RunSummary};
pub use planner::{plan, Chunk, DEFAULT_CHUNK_SIZE};
pub use record::{CompanyRow, Record};
pub use sink::{DryRunSink, PgSink, RowSink};
pub use worker::{ChunkReport, ChunkWorker};
