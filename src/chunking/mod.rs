//! Character-based splitting of persisted filing records.
//!
//! Records are split on blank lines and accumulated into chunks of at most
//! `chunk_size` characters. Every chunk after the first repeats the trailing
//! `chunk_overlap` characters of its predecessor so retrieval hits keep their
//! cross-boundary context. Units longer than `chunk_size` are hard-split on
//! the same size/overlap schedule.

use tracing::{debug, info};

use crate::config::ChunkingConfig;
use crate::ingestion::records::RecordStore;
use crate::types::{Chunk, PipelineError};

/// Splits text into bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct CharacterSplitter {
    config: ChunkingConfig,
}

impl CharacterSplitter {
    /// Creates a splitter. The overlap must be smaller than the chunk size;
    /// anything else cannot make forward progress and is rejected.
    pub fn new(config: ChunkingConfig) -> Result<Self, PipelineError> {
        if config.chunk_overlap >= config.chunk_size {
            return Err(PipelineError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    /// Splits `text` into chunks of at most `chunk_size` characters.
    ///
    /// Guarantees that whenever a chunk has at least `chunk_overlap`
    /// characters, the next chunk begins with exactly those trailing
    /// characters. Empty input yields no chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let sep = self.config.separator.as_str();
        let max = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let sep_chars = sep.chars().count();

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for unit in text.split(sep) {
            if current.is_empty() {
                current.push_str(unit);
            } else {
                let projected = char_count(&current) + sep_chars + char_count(unit);
                if projected <= max {
                    current.push_str(sep);
                    current.push_str(unit);
                } else {
                    let carry = char_tail(&current, overlap);
                    chunks.push(std::mem::take(&mut current));
                    current = carry;
                    current.push_str(sep);
                    current.push_str(unit);
                }
            }

            // A single unit (or carry + unit) can exceed the limit on its own.
            while char_count(&current) > max {
                let cut = char_byte_index(&current, max);
                let head = current[..cut].to_string();
                let restart = char_byte_index(&head, max - overlap);
                current = current[restart..].to_string();
                chunks.push(head);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}

/// Loads every persisted record and splits it, attaching provenance.
///
/// Empty or vanished records are skipped with a diagnostic; the output is a
/// flat sequence ordered by record index, each chunk tagged with the record
/// identifier it was cut from.
pub async fn chunk_records(
    store: &RecordStore,
    splitter: &CharacterSplitter,
) -> Result<Vec<Chunk>, PipelineError> {
    let mut chunks = Vec::new();
    for record in store.list().await? {
        let Some(text) = store.read(&record).await? else {
            debug!(record = %record.record_id, "skipping empty or missing record");
            continue;
        };
        for (index, piece) in splitter.split_text(&text).into_iter().enumerate() {
            chunks.push(Chunk::new(&record.record_id, index, piece));
        }
    }
    info!(total = chunks.len(), "total chunks of text");
    Ok(chunks)
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `n`-th character, or the string length past the end.
fn char_byte_index(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// The last `n` characters of `s`, or all of it when shorter.
fn char_tail(s: &str, n: usize) -> String {
    let total = char_count(s);
    if total <= n {
        return s.to_string();
    }
    s[char_byte_index(s, total - n)..].to_string()
}
