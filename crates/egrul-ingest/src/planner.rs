//! Chunk planning
//!
//! Splits the archive's entry names into fixed-size groups. Each group is
//! the unit of work handed to one worker task.

use crate::error::{IngestError, Result};

/// Entries processed per chunk when nothing else is configured
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// An ordered group of archive entry names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the plan, starting at 0
    pub index: usize,
    pub entries: Vec<String>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split `entry_names` into contiguous chunks of `chunk_size`.
///
/// Order is preserved and no name is dropped or duplicated; only the last
/// chunk may be shorter. A zero chunk size is rejected.
pub fn plan<S: AsRef<str>>(entry_names: &[S], chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(IngestError::invalid_config("chunk size must be greater than 0"));
    }

    Ok(entry_names
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, names)| Chunk {
            index,
            entries: names.iter().map(|n| n.as_ref().to_string()).collect(),
        })
        .collect())
}
