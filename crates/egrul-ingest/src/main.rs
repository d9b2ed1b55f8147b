//! EGRUL Ingest - registry extraction tool

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use egrul_common::logging::{init_logging, LogLevel};
use egrul_ingest::{DryRunSink, IngestConfig, Orchestrator, PgSink, RowSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "egrul-ingest")]
#[command(author, version, about = "Extract one industry from an EGRUL archive into PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process the archive and insert matching companies
    Run {
        #[command(flatten)]
        archive: ArchiveArgs,

        /// Number of chunks processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Primary activity code prefix to keep
        #[arg(long)]
        industry_prefix: Option<String>,

        #[command(flatten)]
        database: DatabaseArgs,

        /// Log matching companies instead of inserting them
        #[arg(long)]
        dry_run: bool,

        /// Create the destination table before processing
        #[arg(long, conflicts_with = "dry_run")]
        create_table: bool,
    },

    /// Create the destination table
    InitDb {
        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Show how the archive would be split into chunks
    Plan {
        #[command(flatten)]
        archive: ArchiveArgs,
    },
}

#[derive(Args, Debug)]
struct ArchiveArgs {
    /// Path to the zipped registry extract
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Archive entries per chunk
    #[arg(short, long)]
    chunk_size: Option<usize>,
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long)]
    database_url: Option<String>,

    /// Destination table, optionally schema-qualified
    #[arg(short, long)]
    table: Option<String>,
}

impl ArchiveArgs {
    fn apply(self, config: &mut IngestConfig) {
        if let Some(archive) = self.archive {
            config.archive_path = archive;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
    }
}

impl DatabaseArgs {
    fn apply(self, config: &mut IngestConfig) {
        if let Some(url) = self.database_url {
            config.sink.database_url = url;
        }
        if let Some(table) = self.table {
            config.sink.table = table;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = IngestConfig::from_env().context("Failed to load configuration")?;
    if cli.verbose {
        config.log.level = LogLevel::Debug;
    }

    let _guard = init_logging(&config.log)?;

    match cli.command {
        Command::Run {
            archive,
            workers,
            industry_prefix,
            database,
            dry_run,
            create_table,
        } => {
            archive.apply(&mut config);
            database.apply(&mut config);
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(prefix) = industry_prefix {
                config.industry_prefix = prefix;
            }
            config.validate()?;

            let sink: Arc<dyn RowSink> = if dry_run {
                Arc::new(DryRunSink::new())
            } else {
                let sink = PgSink::new(&config.sink)?;
                if create_table {
                    sink.ensure_table().await?;
                }
                Arc::new(sink)
            };

            let summary = Orchestrator::new(config, sink)
                .with_progress(true)
                .run()
                .await?;

            info!(
                inserted = summary.inserted,
                failed_chunks = summary.chunks_failed,
                "Ingestion complete"
            );
        },
        Command::InitDb { database } => {
            database.apply(&mut config);
            let sink = PgSink::new(&config.sink)?;
            sink.ensure_table().await?;
            info!(table = sink.table(), "Database initialized");
        },
        Command::Plan { archive } => {
            archive.apply(&mut config);
            let orchestrator = Orchestrator::new(config, Arc::new(DryRunSink::new()));
            let chunks = orchestrator.plan_chunks().await?;

            for chunk in &chunks {
                let first = chunk.entries.first().map(String::as_str).unwrap_or("-");
                println!("chunk {:>4}: {:>3} entries (starting at {})", chunk.index, chunk.len(), first);
            }
            println!(
                "{} chunks of up to {} entries from {}",
                chunks.len(),
                orchestrator.config().chunk_size,
                orchestrator.config().archive_path.display()
            );
        },
    }

    Ok(())
}
