//! End-to-end tests for the chunked ingestion pipeline
//!
//! Archives are built in a temp directory; rows are collected by in-memory
//! sinks so no database is needed.

use async_trait::async_trait;
use egrul_ingest::{
    ArchiveSource, Chunk, ChunkWorker, CompanyRow, IngestConfig, IngestError, Orchestrator,
    RowSink, SinkError,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// ============================================================================
// Helpers
// ============================================================================

/// Sink that keeps every row it receives
#[derive(Default)]
struct RecordingSink {
    rows: Mutex<Vec<CompanyRow>>,
}

impl RecordingSink {
    fn inns(&self) -> Vec<String> {
        let mut inns: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.inn.clone())
            .collect();
        inns.sort();
        inns
    }
}

#[async_trait]
impl RowSink for RecordingSink {
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

/// Sink that rejects rows with the given INNs and records the rest
struct RejectingSink {
    reject: Vec<String>,
    accepted: RecordingSink,
}

#[async_trait]
impl RowSink for RejectingSink {
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError> {
        if self.reject.contains(&row.inn) {
            return Err(SinkError::Rejected {
                inn: row.inn.clone(),
                reason: "constraint violation".to_string(),
            });
        }
        self.accepted.insert_row(row).await
    }

    fn describe(&self) -> String {
        "rejecting".to_string()
    }
}

/// Sink that deletes the archive on its first insert, so later chunks
/// cannot open it
struct ArchiveRemovingSink {
    archive: PathBuf,
    accepted: RecordingSink,
}

#[async_trait]
impl RowSink for ArchiveRemovingSink {
    async fn insert_row(&self, row: &CompanyRow) -> Result<(), SinkError> {
        if self.archive.exists() {
            std::fs::remove_file(&self.archive).unwrap();
        }
        self.accepted.insert_row(row).await
    }

    fn describe(&self) -> String {
        "archive-removing".to_string()
    }
}

/// In-memory archive
struct MemoryArchive {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveSource for MemoryArchive {
    fn list_entries(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_entry(&mut self, name: &str) -> egrul_ingest::Result<Vec<u8>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| IngestError::archive_read(name, "no such entry"))
    }
}

fn company(inn: &str, okved: &str, region: &str, code: &str) -> Value {
    json!({
        "name": format!("ООО {}", inn),
        "full_name": format!("Общество с ограниченной ответственностью {}", inn),
        "inn": inn,
        "kpp": "770101001",
        "data": {
            "СвОКВЭД": { "СвОКВЭДОсн": { "КодОКВЭД": okved } },
            "СвАдресЮЛ": {
                "АдресРФ": {
                    "Индекс": "123456",
                    "Регион": { "НаимРегион": region, "ТипРегион": "г." },
                    "КодРегион": code,
                    "Город": { "НаимГород": "Москва", "ТипГород": "г." },
                    "Улица": { "НаимУлица": "Тверская", "ТипУлица": "ул." },
                    "Дом": "Д.1"
                }
            }
        }
    })
}

fn write_archive(dir: &Path, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let path = dir.join("egrul.json.zip");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ZipWriter::new(file);
    for (name, bytes) in entries {
        writer.start_file(name.as_str(), SimpleFileOptions::default()).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn entry(name: &str, companies: Value) -> (String, Vec<u8>) {
    (name.to_string(), serde_json::to_vec(&companies).unwrap())
}

fn config_for(path: PathBuf, chunk_size: usize, workers: usize) -> IngestConfig {
    IngestConfig {
        archive_path: path,
        chunk_size,
        workers,
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_run_inserts_only_matching_companies() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        &[
            entry(
                "part_001.json",
                json!([
                    company("7701000001", "62.01", "МОСКВА", "77"),
                    company("7701000002", "47.11", "МОСКВА", "77")
                ]),
            ),
            entry(
                "part_002.json",
                json!([
                    company("7801000003", "62.02", "Санкт-Петербург", "78"),
                    company("7801000004", "62.09", "САНКТ-ПЕТЕРБУРГ", "77")
                ]),
            ),
        ],
    );

    let sink = Arc::new(RecordingSink::default());
    let summary = Orchestrator::new(config_for(path, 1, 2), sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(sink.inns(), vec!["7701000001", "7801000003"]);
    assert_eq!(summary.chunks_planned, 2);
    assert_eq!(summary.chunks_completed, 2);
    assert_eq!(summary.chunks_failed, 0);
    assert_eq!(summary.records_seen, 4);
    assert_eq!(summary.matched, 2);
    assert_eq!(summary.inserted, 2);

    let rows = sink.rows.lock().unwrap();
    let moscow = rows.iter().find(|r| r.inn == "7701000001").unwrap();
    assert_eq!(moscow.okved, "62.01");
    assert_eq!(moscow.address, "123456, г. МОСКВА, г.Москва, ул.Тверская, Д.1");
}

#[tokio::test]
async fn test_every_entry_processed_exactly_once() {
    let dir = TempDir::new().unwrap();
    let entries: Vec<(String, Vec<u8>)> = (0..45)
        .map(|i| {
            let inn = format!("77{:08}", i);
            entry(
                &format!("part_{:03}.json", i),
                json!([company(&inn, "62.01", "МОСКВА", "77")]),
            )
        })
        .collect();
    let path = write_archive(dir.path(), &entries);

    let sink = Arc::new(RecordingSink::default());
    let summary = Orchestrator::new(config_for(path, 20, 3), sink.clone())
        .run()
        .await
        .unwrap();

    let expected: Vec<String> = (0..45).map(|i| format!("77{:08}", i)).collect();
    assert_eq!(summary.chunks_planned, 3);
    assert_eq!(summary.entries_read, 45);
    assert_eq!(sink.inns(), expected);
}

#[tokio::test]
async fn test_bad_entry_does_not_stop_its_chunk() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        &[
            ("broken.json".to_string(), b"[{\"name\": \"cut".to_vec()),
            entry(
                "good.json",
                json!([
                    { "name": "missing identity" },
                    company("7701000010", "62.01", "МОСКВА", "77")
                ]),
            ),
        ],
    );

    let sink = Arc::new(RecordingSink::default());
    let summary = Orchestrator::new(config_for(path, 20, 1), sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.entries_failed, 1);
    assert_eq!(summary.entries_read, 1);
    assert_eq!(summary.decode_failures, 1);
    assert_eq!(sink.inns(), vec!["7701000010"]);
}

#[tokio::test]
async fn test_sink_failure_does_not_stop_other_rows() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        &[entry(
            "part.json",
            json!([
                company("7701000021", "62.01", "МОСКВА", "77"),
                company("7701000022", "62.01", "МОСКВА", "77"),
                company("7701000023", "62.01", "МОСКВА", "77")
            ]),
        )],
    );

    let sink = Arc::new(RejectingSink {
        reject: vec!["7701000022".to_string()],
        accepted: RecordingSink::default(),
    });
    let summary = Orchestrator::new(config_for(path, 20, 1), sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.matched, 3);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.insert_failures, 1);
    assert_eq!(sink.accepted.inns(), vec!["7701000021", "7701000023"]);
}

#[tokio::test]
async fn test_chunk_that_cannot_open_archive_does_not_stop_run() {
    let dir = TempDir::new().unwrap();
    let entries: Vec<(String, Vec<u8>)> = (0..3)
        .map(|i| {
            entry(
                &format!("part_{}.json", i),
                json!([company(&i.to_string(), "62.01", "МОСКВА", "77")]),
            )
        })
        .collect();
    let path = write_archive(dir.path(), &entries);

    let sink = Arc::new(ArchiveRemovingSink {
        archive: path.clone(),
        accepted: RecordingSink::default(),
    });
    let summary = Orchestrator::new(config_for(path.clone(), 1, 1), sink.clone())
        .run()
        .await
        .unwrap();

    assert!(!path.exists());
    assert_eq!(summary.chunks_planned, 3);
    assert_eq!(summary.chunks_completed, 1);
    assert_eq!(summary.chunks_failed, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(sink.accepted.inns(), vec!["0"]);
}

#[tokio::test]
async fn test_zero_workers_rejected_before_any_insert() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(
        dir.path(),
        &[entry("part.json", json!([company("7701000031", "62.01", "МОСКВА", "77")]))],
    );

    let sink = Arc::new(RecordingSink::default());
    let err = Orchestrator::new(config_for(path, 20, 0), sink.clone())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::InvalidConfig(_)));
    assert!(sink.inns().is_empty());
}

#[tokio::test]
async fn test_empty_archive_runs_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write_archive(dir.path(), &[]);

    let sink = Arc::new(RecordingSink::default());
    let summary = Orchestrator::new(config_for(path, 20, 4), sink.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.chunks_planned, 0);
    assert_eq!(summary.inserted, 0);
}

#[tokio::test]
async fn test_plan_chunks_lists_archive_in_order() {
    let dir = TempDir::new().unwrap();
    let entries: Vec<(String, Vec<u8>)> = (0..5)
        .map(|i| entry(&format!("p{}.json", i), json!([])))
        .collect();
    let path = write_archive(dir.path(), &entries);

    let orchestrator =
        Orchestrator::new(config_for(path, 2, 1), Arc::new(RecordingSink::default()));
    let chunks = orchestrator.plan_chunks().await.unwrap();
    assert_eq!(orchestrator.config().chunk_size, 2);

    let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(chunks[0].entries, vec!["p0.json", "p1.json"]);
    assert_eq!(chunks[2].entries, vec!["p4.json"]);
}

#[tokio::test]
async fn test_worker_over_memory_archive() {
    let archive = MemoryArchive {
        entries: vec![
            entry("a.json", json!([company("2301000041", "62.03", "КРАСНОДАРСКИЙ", "23")])),
            entry("b.json", json!([company("2301000042", "62.03", "КРАСНОДАРСКИЙ", "77")])),
        ],
    };
    let chunk = Chunk {
        index: 7,
        entries: vec!["a.json".to_string(), "b.json".to_string(), "missing.json".to_string()],
    };

    let sink = Arc::new(RecordingSink::default());
    let worker = ChunkWorker::new("unused.zip", "62", sink.clone());
    let report = worker.process_with(archive, &chunk).await.unwrap();

    assert_eq!(report.chunk_index, 7);
    assert_eq!(report.entries_read, 2);
    assert_eq!(report.entries_failed, 1);
    assert_eq!(report.matched, 1);
    assert_eq!(sink.inns(), vec!["2301000041"]);

    let by_inn: HashMap<String, CompanyRow> = sink
        .rows
        .lock()
        .unwrap()
        .iter()
        .map(|r| (r.inn.clone(), r.clone()))
        .collect();
    assert_eq!(
        by_inn["2301000041"].address,
        "123456, г. КРАСНОДАРСКИЙ, г.Москва, ул.Тверская, Д.1"
    );
}
