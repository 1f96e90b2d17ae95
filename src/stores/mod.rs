//! Vector storage for chunk embeddings.
//!
//! [`VectorBackend`] is the seam between the pipeline and whatever holds the
//! vectors; [`memory::MemoryVectorIndex`] is the shipped implementation, an
//! append-only in-process index searched by cosine similarity. The index for
//! a run is ephemeral: it lives exactly as long as the question batch it
//! serves.

pub mod memory;

use async_trait::async_trait;

use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, PipelineError};

pub use memory::MemoryVectorIndex;

/// A retrieval hit: a chunk and its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Storage holding (chunk, embedding) entries and answering nearest-neighbor
/// queries. Inserts are append-only; a chunk id can be stored at most once.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Adds one entry. Duplicate chunk ids are rejected.
    async fn insert(&self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), PipelineError>;

    /// The `top_k` entries nearest to `query_embedding`, most similar first.
    /// Ties rank by insertion order. An empty index returns no hits.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError>;

    /// Number of entries stored.
    async fn count(&self) -> usize;
}

/// Outcome of embedding and inserting a chunk batch.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Chunks embedded and stored.
    pub indexed: usize,
    /// Chunks excluded because embedding them failed.
    pub skipped: usize,
}

const EMBED_BATCH_SIZE: usize = 32;

/// Embeds `chunks` and inserts them into `index`.
///
/// Chunks are embedded in batches; when a whole batch fails the chunks are
/// retried one by one so a single poisoned input only costs itself. Failed
/// chunks are logged and counted in the report, never fatal. Building from
/// zero chunks succeeds and leaves the index empty.
pub async fn build_index<B>(
    embedder: &dyn EmbeddingProvider,
    chunks: Vec<Chunk>,
    index: &B,
) -> IndexReport
where
    B: VectorBackend,
{
    let mut report = IndexReport::default();

    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
        match embedder.embed_batch(&texts).await {
            Ok(vectors) => {
                for (chunk, embedding) in batch.iter().zip(vectors) {
                    insert_one(index, chunk.clone(), embedding, &mut report).await;
                }
            }
            Err(err) => {
                tracing::warn!(%err, size = batch.len(), "batch embedding failed, retrying per chunk");
                for chunk in batch {
                    match embedder.embed(&chunk.content).await {
                        Ok(embedding) => {
                            insert_one(index, chunk.clone(), embedding, &mut report).await;
                        }
                        Err(err) => {
                            tracing::warn!(
                                chunk = %chunk.id,
                                filing = %chunk.filing_id,
                                %err,
                                "chunk excluded from index"
                            );
                            report.skipped += 1;
                        }
                    }
                }
            }
        }
    }

    report
}

async fn insert_one<B: VectorBackend>(
    index: &B,
    chunk: Chunk,
    embedding: Vec<f32>,
    report: &mut IndexReport,
) {
    let chunk_id = chunk.id;
    match index.insert(chunk, embedding).await {
        Ok(()) => report.indexed += 1,
        Err(err) => {
            tracing::warn!(chunk = %chunk_id, %err, "chunk excluded from index");
            report.skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::ScriptedEmbeddingProvider;

    #[tokio::test]
    async fn chunk_that_fails_to_embed_is_skipped_not_fatal() {
        let embedder = ScriptedEmbeddingProvider::new().failing_on("unembeddable");
        let chunks = vec![
            Chunk::new("filing_1", 0, "Revenue grew year over year."),
            Chunk::new("filing_1", 1, "unembeddable garbage"),
            Chunk::new("filing_2", 0, "Risk factors were restated."),
        ];

        let index = MemoryVectorIndex::new();
        let report = build_index(&embedder, chunks, &index).await;

        // The poisoned chunk fails its whole batch, the per-chunk retry
        // rescues its siblings and skips only the offender.
        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(index.count().await, 2);

        let query = embedder.embed("Revenue grew year over year.").await.unwrap();
        let hits = index.search(&query, 3).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| !hit.chunk.content.contains("unembeddable")));
    }
}
