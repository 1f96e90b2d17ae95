//! Capability interfaces for the external services the pipeline consumes.
//!
//! Every remote collaborator sits behind one narrow trait so backends can be
//! swapped through configuration instead of touching pipeline code:
//!
//! * [`FilingDataApi`] — structured metadata and per-section text extraction.
//! * [`EmbeddingProvider`] — text to fixed-length vectors, deterministic for
//!   identical input.
//! * [`AnswerGenerator`] — (question, context) to a natural-language answer.
//!
//! HTTP-backed implementations live in the sibling modules; deterministic
//! mock implementations for tests live in [`mock`] and
//! [`embeddings::MockEmbeddingProvider`].

pub mod embeddings;
pub mod generation;
pub mod mock;
pub mod secapi;

use std::collections::BTreeMap;

use async_trait::async_trait;
use url::Url;

use crate::types::PipelineError;

pub use embeddings::{HttpEmbeddingProvider, MockEmbeddingProvider};
pub use generation::ChatCompletionGenerator;
pub use secapi::SecApiClient;

/// Cover metadata as returned by the extraction service: namespace -> field -> value.
pub type FilingMetadata = BTreeMap<String, BTreeMap<String, String>>;

/// Remote filing-extraction capabilities.
#[async_trait]
pub trait FilingDataApi: Send + Sync {
    /// Structured cover-page/XBRL metadata for the document at `document_url`.
    async fn cover_metadata(&self, document_url: &Url) -> Result<FilingMetadata, PipelineError>;

    /// Plain text of one section of the document at `document_url`.
    async fn section_text(
        &self,
        document_url: &Url,
        section: &str,
    ) -> Result<String, PipelineError>;
}

/// Text embedding capability. Identical input must yield identical vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Length of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let input = [text.to_string()];
        let mut vectors = self.embed_batch(&input).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::Embedding("provider returned no vector".to_string()))
    }
}

/// Answer-generation capability.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produces a natural-language answer to `question` grounded in `context`.
    async fn generate(&self, question: &str, context: &str) -> Result<String, PipelineError>;
}
