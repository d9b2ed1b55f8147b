//! Run orchestration
//!
//! Enumerates the archive once, plans chunks, and runs every chunk as an
//! independent unit of work with at most `workers` chunks in flight. Chunks
//! never talk to each other; a failed chunk is logged and the run goes on.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::archive::{ArchiveSource, ZipArchiveSource};
use crate::config::IngestConfig;
use crate::districts::DistrictTable;
use crate::error::{IngestError, Result};
use crate::planner::{plan, Chunk};
use crate::sink::RowSink;
use crate::worker::{ChunkReport, ChunkWorker};

/// Totals over all chunks of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks_planned: usize,
    pub chunks_completed: usize,
    pub chunks_failed: usize,
    pub entries_read: usize,
    pub entries_failed: usize,
    pub records_seen: usize,
    pub decode_failures: usize,
    pub matched: usize,
    pub inserted: usize,
    pub insert_failures: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn absorb(&mut self, report: &ChunkReport) {
        self.chunks_completed += 1;
        self.entries_read += report.entries_read;
        self.entries_failed += report.entries_failed;
        self.records_seen += report.records_seen;
        self.decode_failures += report.decode_failures;
        self.matched += report.matched;
        self.inserted += report.inserted;
        self.insert_failures += report.insert_failures;
    }
}

/// Drives one ingestion run
pub struct Orchestrator {
    config: IngestConfig,
    sink: Arc<dyn RowSink>,
    districts: DistrictTable,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(config: IngestConfig, sink: Arc<dyn RowSink>) -> Self {
        Self {
            config,
            sink,
            districts: DistrictTable::standard(),
            show_progress: false,
        }
    }

    /// Use a different district table
    pub fn with_districts(mut self, districts: DistrictTable) -> Self {
        self.districts = districts;
        self
    }

    /// Draw a progress bar over completed chunks
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Open the archive once, list its entries and split them into chunks
    pub async fn plan_chunks(&self) -> Result<Vec<Chunk>> {
        self.config.validate()?;

        let path = self.config.archive_path.clone();
        let entries = tokio::task::spawn_blocking(move || {
            ZipArchiveSource::open(&path).map(|archive| archive.list_entries())
        })
        .await
        .map_err(|e| IngestError::Worker(e.to_string()))??;

        info!(
            archive = %self.config.archive_path.display(),
            entries = entries.len(),
            "Opened archive"
        );

        let chunks = plan(&entries, self.config.chunk_size)?;
        info!(
            chunks = chunks.len(),
            chunk_size = self.config.chunk_size,
            "Chunks generated"
        );

        Ok(chunks)
    }

    /// Process the whole archive.
    ///
    /// Fails only before dispatch: invalid configuration or an archive that
    /// cannot be enumerated. Once chunks are running, failures are logged and
    /// counted in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            archive = %self.config.archive_path.display(),
            workers = self.config.workers,
            sink = %self.sink.describe(),
            "Start"
        );

        let chunks = self.plan_chunks().await?;
        let worker = ChunkWorker::new(
            self.config.archive_path.clone(),
            self.config.industry_prefix.clone(),
            Arc::clone(&self.sink),
        )
        .with_districts(self.districts);

        let progress = self.progress_bar(chunks.len() as u64);

        let outcomes: Vec<Option<ChunkReport>> = stream::iter(chunks.iter())
            .map(|chunk| {
                let worker = &worker;
                let progress = &progress;
                async move {
                    let outcome = match worker.process_chunk(chunk).await {
                        Ok(report) => Some(report),
                        Err(e) => {
                            error!(chunk = chunk.index, entries = chunk.len(), error = %e, "Chunk failed");
                            None
                        },
                    };
                    progress.inc(1);
                    outcome
                }
            })
            .buffer_unordered(self.config.workers)
            .collect()
            .await;

        progress.finish_and_clear();

        let mut summary = RunSummary {
            chunks_planned: chunks.len(),
            ..Default::default()
        };
        for outcome in &outcomes {
            match outcome {
                Some(report) => summary.absorb(report),
                None => summary.chunks_failed += 1,
            }
        }
        summary.elapsed = started.elapsed();

        if summary.chunks_failed > 0 {
            warn!(
                failed = summary.chunks_failed,
                planned = summary.chunks_planned,
                "Some chunks failed"
            );
        }

        info!(
            chunks = summary.chunks_completed,
            entries = summary.entries_read,
            records = summary.records_seen,
            matched = summary.matched,
            inserted = summary.inserted,
            insert_failures = summary.insert_failures,
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Executed"
        );

        Ok(summary)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} chunks ({eta})")
        {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => warn!(error = %e, "Invalid progress bar template"),
        }
        bar
    }
}
