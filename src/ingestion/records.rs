//! Persisted filing records.
//!
//! Each extracted filing becomes one plain-text record: `key: value` cover
//! metadata lines followed by `Section <id>:` blocks. Records are named by a
//! fixed prefix plus a 1-based sequence index (`filing_1.txt`, `filing_2.txt`,
//! ...) so downstream stages can rediscover them by convention alone.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::types::PipelineError;

/// Reads and writes filing records under a directory, by naming convention.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
    prefix: String,
}

/// A record rediscovered from disk.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    /// 1-based sequence index parsed from the filename.
    pub index: usize,
    /// Record identifier, the filename stem (`filing_3`).
    pub record_id: String,
    pub path: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a record with the given 1-based index is stored at.
    pub fn record_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}{}.txt", self.prefix, index))
    }

    /// Serializes and persists one filing's extracted content.
    ///
    /// The record is self-contained: metadata first, then each section
    /// labeled by its identifier, in deterministic key order.
    pub async fn write(
        &self,
        index: usize,
        metadata: &BTreeMap<String, String>,
        sections: &BTreeMap<String, String>,
    ) -> Result<PathBuf, PipelineError> {
        let mut body = String::new();
        for (key, value) in metadata {
            body.push_str(key);
            body.push_str(": ");
            body.push_str(value);
            body.push('\n');
        }
        for (section, text) in sections {
            body.push_str("\nSection ");
            body.push_str(section);
            body.push_str(":\n");
            body.push_str(text);
            body.push('\n');
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.record_path(index);
        fs::write(&path, &body).await?;
        debug!(path = %path.display(), bytes = body.len(), "filing record written");
        Ok(path)
    }

    /// Lists records matching the naming convention, sorted by index.
    ///
    /// Files with the right prefix but an unparsable index are ignored.
    pub async fn list(&self) -> Result<Vec<StoredRecord>, PipelineError> {
        let mut records = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(records),
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stem) = name.strip_suffix(".txt") else {
                continue;
            };
            let Some(index_part) = stem.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            let Ok(index) = index_part.parse::<usize>() else {
                continue;
            };
            records.push(StoredRecord {
                index,
                record_id: stem.to_string(),
                path,
            });
        }
        records.sort_by_key(|record| record.index);
        Ok(records)
    }

    /// Reads a record's full text; `None` when the file vanished or is empty.
    pub async fn read(&self, record: &StoredRecord) -> Result<Option<String>, PipelineError> {
        match fs::read_to_string(&record.path).await {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
