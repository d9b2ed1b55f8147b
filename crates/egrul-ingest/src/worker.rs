//! Chunk worker
//!
//! Processes one chunk of archive entries: every entry is read whole, decoded
//! as a JSON array of company objects and filtered; matching rows go to the
//! sink one insert at a time. Failures stay local: a bad record skips that
//! record, a bad entry skips that entry, a failed insert skips that row.

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveSource, ZipArchiveSource};
use crate::districts::DistrictTable;
use crate::error::{IngestError, Result};
use crate::planner::Chunk;
use crate::record::{self, CompanyRow};
use crate::sink::RowSink;

/// Outcome of filtering one archive entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryScan {
    /// JSON objects found in the entry
    pub records_seen: usize,
    /// Objects that did not satisfy the record schema
    pub decode_failures: usize,
    /// Rows for records passing both predicates, in entry order
    pub rows: Vec<CompanyRow>,
}

/// Counters for one processed chunk, used for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    pub chunk_index: usize,
    pub entries_read: usize,
    pub entries_failed: usize,
    pub records_seen: usize,
    pub decode_failures: usize,
    pub matched: usize,
    pub inserted: usize,
    pub insert_failures: usize,
}

impl ChunkReport {
    fn new(chunk_index: usize) -> Self {
        Self {
            chunk_index,
            ..Default::default()
        }
    }
}

/// Decode and filter the raw bytes of one entry.
///
/// Fails only when the bytes are not a JSON array; objects inside the array
/// that do not decode are counted and skipped.
pub fn scan_entry(
    entry: &str,
    bytes: &[u8],
    industry_prefix: &str,
    districts: &DistrictTable,
) -> Result<EntryScan> {
    let companies: Vec<Value> =
        serde_json::from_slice(bytes).map_err(|source| IngestError::EntryDecode {
            entry: entry.to_string(),
            source,
        })?;

    let mut scan = EntryScan {
        records_seen: companies.len(),
        ..Default::default()
    };

    for (position, raw) in companies.iter().enumerate() {
        let company = match record::decode(raw) {
            Ok(company) => company,
            Err(e) => {
                scan.decode_failures += 1;
                debug!(entry, position, error = %e, "Skipping undecodable record");
                continue;
            },
        };

        if !record::matches_industry(&company, industry_prefix)
            || !record::matches_district(&company, districts)
        {
            continue;
        }

        if let Some(row) = company.to_row() {
            scan.rows.push(row);
        }
    }

    Ok(scan)
}

/// Processes chunks against one archive file and one sink
#[derive(Clone)]
pub struct ChunkWorker {
    archive_path: PathBuf,
    industry_prefix: String,
    districts: DistrictTable,
    sink: Arc<dyn RowSink>,
}

impl ChunkWorker {
    pub fn new(
        archive_path: impl Into<PathBuf>,
        industry_prefix: impl Into<String>,
        sink: Arc<dyn RowSink>,
    ) -> Self {
        Self {
            archive_path: archive_path.into(),
            industry_prefix: industry_prefix.into(),
            districts: DistrictTable::standard(),
            sink,
        }
    }

    /// Use a different district table
    pub fn with_districts(mut self, districts: DistrictTable) -> Self {
        self.districts = districts;
        self
    }

    /// Open the archive independently of other chunks and process `chunk`.
    ///
    /// Returns an error only when the archive cannot be opened or a blocking
    /// task dies; entry, record and insert failures are counted in the report.
    pub async fn process_chunk(&self, chunk: &Chunk) -> Result<ChunkReport> {
        let path = self.archive_path.clone();
        let archive = tokio::task::spawn_blocking(move || ZipArchiveSource::open(path))
            .await
            .map_err(|e| IngestError::Worker(format!("chunk {}: {}", chunk.index, e)))??;
        debug!(chunk = chunk.index, archive = %archive.path().display(), "Chunk opened archive");

        self.process_with(archive, chunk).await
    }

    /// Process `chunk` against an already opened archive
    pub async fn process_with<A>(&self, mut archive: A, chunk: &Chunk) -> Result<ChunkReport>
    where
        A: ArchiveSource + Send + 'static,
    {
        let mut report = ChunkReport::new(chunk.index);

        for entry in &chunk.entries {
            let name = entry.clone();
            let prefix = self.industry_prefix.clone();
            let districts = self.districts;

            // Reading and decoding are blocking; the archive is moved into the
            // blocking pool and handed back for the next entry.
            let (returned, scanned) = tokio::task::spawn_blocking(move || {
                let scanned = archive
                    .read_entry(&name)
                    .and_then(|bytes| scan_entry(&name, &bytes, &prefix, &districts));
                (archive, scanned)
            })
            .await
            .map_err(|e| IngestError::Worker(format!("chunk {}: {}", chunk.index, e)))?;
            archive = returned;

            let scan = match scanned {
                Ok(scan) => scan,
                Err(e) => {
                    report.entries_failed += 1;
                    warn!(chunk = chunk.index, entry = %entry, error = %e, "Skipping entry");
                    continue;
                },
            };

            report.entries_read += 1;
            report.records_seen += scan.records_seen;
            report.decode_failures += scan.decode_failures;
            report.matched += scan.rows.len();

            for row in &scan.rows {
                match self.sink.insert_row(row).await {
                    Ok(()) => report.inserted += 1,
                    Err(e) => {
                        report.insert_failures += 1;
                        warn!(chunk = chunk.index, entry = %entry, inn = %row.inn, error = %e, "Insert failed");
                    },
                }
            }
        }

        info!(
            chunk = chunk.index,
            entries = report.entries_read,
            failed_entries = report.entries_failed,
            records = report.records_seen,
            matched = report.matched,
            inserted = report.inserted,
            "Chunk has been parsed"
        );

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn company(inn: &str, okved: &str, region: &str, code: &str) -> Value {
        json!({
            "name": format!("Company {}", inn),
            "full_name": format!("Company {} LLC", inn),
            "inn": inn,
            "kpp": "770101001",
            "data": {
                "СвОКВЭД": { "СвОКВЭДОсн": { "КодОКВЭД": okved } },
                "СвАдресЮЛ": {
                    "АдресРФ": {
                        "Регион": { "НаимРегион": region, "ТипРегион": "г." },
                        "КодРегион": code,
                        "Индекс": "101000"
                    }
                }
            }
        })
    }

    fn scan(companies: Value) -> EntryScan {
        let bytes = serde_json::to_vec(&companies).unwrap();
        scan_entry("part.json", &bytes, "62", &DistrictTable::standard()).unwrap()
    }

    #[test]
    fn test_scan_entry_filters_by_both_predicates() {
        let result = scan(json!([
            company("1", "62.01", "МОСКВА", "77"),
            company("2", "47.11", "МОСКВА", "77"),
            company("3", "62.02", "САНКТ-ПЕТЕРБУРГ", "77"),
            company("4", "62.09", "Санкт-Петербург", "78")
        ]));

        assert_eq!(result.records_seen, 4);
        assert_eq!(result.decode_failures, 0);
        let inns: Vec<&str> = result.rows.iter().map(|r| r.inn.as_str()).collect();
        assert_eq!(inns, vec!["1", "4"]);
        assert_eq!(result.rows[0].address, "101000, г. МОСКВА, ");
    }

    #[test]
    fn test_scan_entry_skips_undecodable_siblings() {
        let result = scan(json!([
            { "name": "no inn", "full_name": "x", "kpp": "1" },
            company("5", "62.01", "МОСКВА", "77"),
            42
        ]));

        assert_eq!(result.records_seen, 3);
        assert_eq!(result.decode_failures, 2);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].inn, "5");
    }

    #[test]
    fn test_scan_entry_rejects_non_array() {
        let err = scan_entry("bad.json", b"{\"name\": 1}", "62", &DistrictTable::standard())
            .unwrap_err();
        assert!(matches!(err, IngestError::EntryDecode { ref entry, .. } if entry == "bad.json"));

        let err = scan_entry("cut.json", b"[{\"name\":", "62", &DistrictTable::standard())
            .unwrap_err();
        assert!(matches!(err, IngestError::EntryDecode { .. }));
    }

    #[tokio::test]
    async fn test_process_chunk_missing_archive() {
        let worker = ChunkWorker::new(
            "/nonexistent/egrul.json.zip",
            "62",
            Arc::new(crate::sink::DryRunSink::new()),
        );
        let chunk = Chunk {
            index: 3,
            entries: vec!["part.json".to_string()],
        };

        let err = worker.process_chunk(&chunk).await.unwrap_err();
        assert!(matches!(
            err,
            IngestError::ArchiveRead { ref target, .. } if target == "/nonexistent/egrul.json.zip"
        ));
    }

    #[test]
    fn test_scan_entry_uses_configured_prefix() {
        let bytes = serde_json::to_vec(&json!([
            company("1", "62.01", "МОСКВА", "77"),
            company("2", "63.11", "МОСКВА", "77")
        ]))
        .unwrap();

        let result = scan_entry("p.json", &bytes, "63", &DistrictTable::standard()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].okved, "63.11");
    }
}
