//! In-memory vector index searched by cosine similarity.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{ScoredChunk, VectorBackend};
use crate::types::{Chunk, PipelineError};

struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Append-only in-process index. Concurrent inserts are serialized through
/// the lock, so parallel builders cannot corrupt or duplicate entries.
#[derive(Default)]
pub struct MemoryVectorIndex {
    entries: RwLock<Vec<IndexEntry>>,
    seen: RwLock<HashSet<Uuid>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl VectorBackend for MemoryVectorIndex {
    async fn insert(&self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), PipelineError> {
        if embedding.is_empty() {
            return Err(PipelineError::Storage(format!(
                "chunk {} has an empty embedding",
                chunk.id
            )));
        }
        {
            let mut seen = self.seen.write();
            if !seen.insert(chunk.id) {
                return Err(PipelineError::Storage(format!(
                    "chunk {} is already indexed",
                    chunk.id
                )));
            }
        }
        self.entries.write().push(IndexEntry { chunk, embedding });
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let entries = self.entries.read();
        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();
        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: entries[position].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> usize {
        self.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EmbeddingProvider, MockEmbeddingProvider};
    use crate::stores::build_index;

    fn chunk(filing: &str, index: usize, content: &str) -> Chunk {
        Chunk::new(filing, index, content)
    }

    #[tokio::test]
    async fn empty_index_returns_no_results() {
        let index = MemoryVectorIndex::new();
        assert_eq!(index.count().await, 0);
        let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn self_retrieval_ranks_exact_text_first() {
        let embedder = MockEmbeddingProvider::default();
        let index = MemoryVectorIndex::new();
        let chunks = vec![
            chunk("filing_1", 0, "Revenue grew due to vehicle deliveries."),
            chunk("filing_1", 1, "Risk factors include supply chain constraints."),
            chunk("filing_2", 0, "Competitive strategy relies on vertical integration."),
        ];
        let report = build_index(&embedder, chunks.clone(), &index).await;
        assert_eq!(report.indexed, 3);
        assert_eq!(report.skipped, 0);

        let query = embedder
            .embed("Risk factors include supply chain constraints.")
            .await
            .unwrap();
        let hits = index.search(&query, 2).await.unwrap();
        assert_eq!(hits[0].chunk.content, chunks[1].content);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn ties_rank_by_insertion_order() {
        let index = MemoryVectorIndex::new();
        let first = chunk("filing_1", 0, "alpha");
        let second = chunk("filing_1", 1, "beta");
        // Parallel vectors score identically against any query.
        index.insert(first.clone(), vec![1.0, 0.0]).await.unwrap();
        index.insert(second, vec![2.0, 0.0]).await.unwrap();

        let hits = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].chunk.id, first.id);
    }

    #[tokio::test]
    async fn duplicate_chunk_ids_are_rejected() {
        let index = MemoryVectorIndex::new();
        let one = chunk("filing_1", 0, "alpha");
        index.insert(one.clone(), vec![1.0]).await.unwrap();
        let err = index.insert(one, vec![1.0]).await.unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
        assert_eq!(index.count().await, 1);
    }

    #[tokio::test]
    async fn build_index_from_zero_chunks_is_valid() {
        let embedder = MockEmbeddingProvider::default();
        let index = MemoryVectorIndex::new();
        let report = build_index(&embedder, Vec::new(), &index).await;
        assert_eq!(report.indexed, 0);
        assert_eq!(report.skipped, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn cosine_handles_zero_and_mismatched_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
