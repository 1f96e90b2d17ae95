//! Scripted in-process implementations of the provider traits.
//!
//! Used by the integration suite to exercise the pipeline without a network.
//! Responses are keyed by document URL and section id; individual keys can be
//! marked as failing to drive the failure-isolation tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::{
    AnswerGenerator, EmbeddingProvider, FilingDataApi, FilingMetadata, MockEmbeddingProvider,
};
use crate::types::PipelineError;

/// Filing API with canned responses and injectable failures.
#[derive(Debug, Default)]
pub struct ScriptedFilingApi {
    metadata: HashMap<String, FilingMetadata>,
    sections: HashMap<(String, String), String>,
    failing_metadata: HashSet<String>,
    failing_sections: HashSet<(String, String)>,
}

impl ScriptedFilingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one cover-metadata field for a document.
    pub fn with_cover_field(
        mut self,
        url: &str,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.metadata
            .entry(url.to_string())
            .or_default()
            .entry("CoverPage".to_string())
            .or_insert_with(BTreeMap::new)
            .insert(field.into(), value.into());
        self
    }

    /// Adds the text returned for one (document, section) pair.
    pub fn with_section(
        mut self,
        url: &str,
        section: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.sections
            .insert((url.to_string(), section.into()), text.into());
        self
    }

    /// Makes every metadata request for `url` fail.
    pub fn failing_metadata(mut self, url: &str) -> Self {
        self.failing_metadata.insert(url.to_string());
        self
    }

    /// Makes one (document, section) request fail.
    pub fn failing_section(mut self, url: &str, section: impl Into<String>) -> Self {
        self.failing_sections.insert((url.to_string(), section.into()));
        self
    }
}

#[async_trait]
impl FilingDataApi for ScriptedFilingApi {
    async fn cover_metadata(&self, document_url: &Url) -> Result<FilingMetadata, PipelineError> {
        let key = document_url.as_str();
        if self.failing_metadata.contains(key) {
            return Err(PipelineError::Extraction(format!(
                "scripted metadata failure for {key}"
            )));
        }
        Ok(self.metadata.get(key).cloned().unwrap_or_default())
    }

    async fn section_text(
        &self,
        document_url: &Url,
        section: &str,
    ) -> Result<String, PipelineError> {
        let key = (document_url.as_str().to_string(), section.to_string());
        if self.failing_sections.contains(&key) {
            return Err(PipelineError::Extraction(format!(
                "scripted section failure for {section} of {document_url}"
            )));
        }
        self.sections.get(&key).cloned().ok_or_else(|| {
            PipelineError::Extraction(format!("no scripted section {section} for {document_url}"))
        })
    }
}

/// Embedding provider with injectable per-text failures.
///
/// Delegates to the deterministic hash embedder; any text containing the
/// configured marker fails, whether embedded alone or inside a batch.
#[derive(Debug, Default)]
pub struct ScriptedEmbeddingProvider {
    inner: MockEmbeddingProvider,
    fail_marker: Option<String>,
}

impl ScriptedEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts containing `marker` will return an embedding error.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if let Some(marker) = &self.fail_marker
            && let Some(text) = texts.iter().find(|t| t.contains(marker.as_str()))
        {
            return Err(PipelineError::Embedding(format!(
                "scripted embedding failure for '{text}'"
            )));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Generator that replies with a deterministic digest of its inputs.
///
/// Records every (question, context) pair it was handed so tests can assert
/// on the retrieved context. Questions containing a configured marker fail.
#[derive(Debug, Default)]
pub struct ScriptedAnswerGenerator {
    fail_marker: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedAnswerGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Questions containing `marker` will return a generation error.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// The (question, context) pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedAnswerGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, PipelineError> {
        if let Some(marker) = &self.fail_marker
            && question.contains(marker.as_str())
        {
            return Err(PipelineError::Generation(format!(
                "scripted generation failure for '{question}'"
            )));
        }
        self.calls
            .lock()
            .push((question.to_string(), context.to_string()));
        Ok(format!(
            "answer to '{question}' from {} context chars",
            context.chars().count()
        ))
    }
}
