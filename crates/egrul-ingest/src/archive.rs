//! Archive access
//!
//! The registry extract ships as a ZIP file whose members are JSON arrays of
//! company records. Workers only need two operations on it, expressed by
//! [`ArchiveSource`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// Read-only container of named byte blobs
pub trait ArchiveSource {
    /// Entry names in archive order
    fn list_entries(&self) -> Vec<String>;

    /// Fully materialize one entry
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>>;
}

/// [`ArchiveSource`] over a ZIP file on disk
pub struct ZipArchiveSource {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ZipArchiveSource {
    /// Open the archive and read its central directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let target = path.display().to_string();

        let file = File::open(&path).map_err(|e| IngestError::archive_read(&target, e))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| IngestError::archive_read(&target, e))?;

        debug!(archive = %target, entries = archive.len(), "Opened archive");
        Ok(Self { path, archive })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl ArchiveSource for ZipArchiveSource {
    fn list_entries(&self) -> Vec<String> {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect()
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|e| IngestError::archive_read(name, e))?;

        let mut contents = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut contents)
            .map_err(|e| IngestError::archive_read(name, e))?;

        debug!(entry = name, bytes = contents.len(), "Read archive entry");
        Ok(contents)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_archive(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let path = dir.join("egrul.json.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_list_and_read_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), &[("b.json", b"[]"), ("a.json", b"[{}]")]);

        let mut archive = ZipArchiveSource::open(&path).unwrap();
        assert_eq!(archive.len(), 2);

        let mut names = archive.list_entries();
        names.sort();
        assert_eq!(names, vec!["a.json", "b.json"]);
        assert_eq!(archive.read_entry("a.json").unwrap(), b"[{}]");
    }

    #[test]
    fn test_directories_are_not_listed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.zip");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer
            .add_directory("part1/", SimpleFileOptions::default())
            .unwrap();
        writer
            .start_file("part1/x.json", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"[]").unwrap();
        writer.finish().unwrap();

        let archive = ZipArchiveSource::open(&path).unwrap();
        assert_eq!(archive.list_entries(), vec!["part1/x.json"]);
    }

    #[test]
    fn test_missing_entry_is_archive_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), &[("a.json", b"[]")]);

        let mut archive = ZipArchiveSource::open(&path).unwrap();
        assert_eq!(archive.path(), path.as_path());
        let err = archive.read_entry("missing.json").unwrap_err();
        assert!(matches!(err, IngestError::ArchiveRead { ref target, .. } if target == "missing.json"));
    }

    #[test]
    fn test_open_failures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ZipArchiveSource::open(dir.path().join("absent.zip")),
            Err(IngestError::ArchiveRead { .. })
        ));

        let not_zip = dir.path().join("plain.zip");
        std::fs::write(&not_zip, b"definitely not a zip").unwrap();
        assert!(matches!(
            ZipArchiveSource::open(&not_zip),
            Err(IngestError::ArchiveRead { .. })
        ));
    }
}
