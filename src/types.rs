//! Shared error type and core data model for the filing pipeline.

use std::collections::BTreeMap;

use url::Url;
use uuid::Uuid;

/// Unified error type surfaced by every pipeline stage.
///
/// Per-item failures (one filing, one section, one chunk, one question) are
/// caught and recorded by the batch layer; only [`PipelineError::Auth`] and a
/// run with no discovered filings abort the whole pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("filing discovery failed: {0}")]
    Discovery(String),

    #[error("section extraction failed: {0}")]
    Extraction(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("answer generation failed: {0}")]
    Generation(String),

    #[error("invalid filing record: {0}")]
    InvalidRecord(String),

    #[error("vector store failure: {0}")]
    Storage(String),
}

/// One regulatory filing after section extraction.
///
/// Immutable once persisted through the record store; the `id` is derived
/// from the accession-numbered directory the raw submission was found in.
#[derive(Debug, Clone)]
pub struct Filing {
    /// Accession-derived identifier (separators stripped).
    pub id: String,
    /// URL of the primary filing document.
    pub url: Url,
    /// Cover-page metadata, field -> value.
    pub metadata: BTreeMap<String, String>,
    /// Successfully extracted sections, section id -> text.
    pub sections: BTreeMap<String, String>,
}

/// A bounded slice of one filing's concatenated text.
///
/// Chunks always carry the identifier of the record they were cut from so
/// retrieval hits stay traceable to their source filing.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Unique identifier for this chunk.
    pub id: Uuid,
    /// Identifier of the originating filing record.
    pub filing_id: String,
    /// Zero-based position of this chunk within its record.
    pub chunk_index: usize,
    /// Chunk body, at most `chunk_size` characters with the configured
    /// overlap repeated from the previous chunk.
    pub content: String,
}

impl Chunk {
    /// Creates a chunk for the given record position.
    pub fn new(filing_id: impl Into<String>, chunk_index: usize, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filing_id: filing_id.into(),
            chunk_index,
            content: content.into(),
        }
    }
}
