//! Batch policy and end-to-end orchestration.
//!
//! The pipeline processes collections item by item and records a per-item
//! outcome instead of letting one failure unwind the batch. Only two
//! conditions abort a run: authentication failure and a root directory that
//! yields no filings at all.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chunking::{CharacterSplitter, chunk_records};
use crate::config::PipelineConfig;
use crate::ingestion::extract::SectionExtractor;
use crate::ingestion::locate::FilingLocator;
use crate::ingestion::records::RecordStore;
use crate::providers::{AnswerGenerator, EmbeddingProvider, FilingDataApi};
use crate::qa::{QaOutcome, RetrievalQa};
use crate::stores::{MemoryVectorIndex, build_index};
use crate::types::PipelineError;

/// Outcome of processing one batch item.
#[derive(Debug)]
pub struct ItemOutcome {
    /// Identifier of the item (filing id, chunk id, question text).
    pub id: String,
    pub result: Result<(), PipelineError>,
}

/// Per-item results aggregated over a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn push_ok(&mut self, id: impl Into<String>) {
        self.outcomes.push(ItemOutcome {
            id: id.into(),
            result: Ok(()),
        });
    }

    pub fn push_err(&mut self, id: impl Into<String>, err: PipelineError) {
        self.outcomes.push(ItemOutcome {
            id: id.into(),
            result: Err(err),
        });
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Iterates over the failed items with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(()) => None,
            Err(err) => Some((o.id.as_str(), err)),
        })
    }
}

/// Summary of one full pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub filings_located: usize,
    pub extraction: BatchReport,
    pub chunks_produced: usize,
    pub chunks_indexed: usize,
    pub chunks_skipped: usize,
    pub answers: Vec<QaOutcome>,
}

/// Wires the stages together and runs them sequentially.
pub struct FilingPipeline {
    config: PipelineConfig,
    filing_api: Arc<dyn FilingDataApi>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
}

impl FilingPipeline {
    pub fn new(
        config: PipelineConfig,
        filing_api: Arc<dyn FilingDataApi>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            config,
            filing_api,
            embedder,
            generator,
        }
    }

    /// Runs locate -> extract -> chunk -> index -> answer.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let locator = FilingLocator::new(self.config.archive_base_url.clone());
        let located = locator.locate(&self.config.filings_root).await?;
        if located.is_empty() {
            return Err(PipelineError::Discovery(format!(
                "no filings found under {}",
                self.config.filings_root.display()
            )));
        }
        info!(count = located.len(), "filings located");

        let store = RecordStore::new(&self.config.records_dir, &self.config.record_prefix);
        let extractor = SectionExtractor::new(
            Arc::clone(&self.filing_api),
            store.clone(),
            self.config.sections.clone(),
        );
        let extraction = extractor.extract_and_persist(&located).await?;
        for (id, err) in extraction.report.failures() {
            warn!(filing = id, %err, "filing failed extraction");
        }

        let splitter = CharacterSplitter::new(self.config.chunking.clone())?;
        let chunks = chunk_records(&store, &splitter).await?;
        info!(count = chunks.len(), "chunks produced");
        let chunks_produced = chunks.len();

        let index = MemoryVectorIndex::new();
        let index_report = build_index(self.embedder.as_ref(), chunks, &index).await;
        info!(
            indexed = index_report.indexed,
            skipped = index_report.skipped,
            "vector index built"
        );

        let qa = RetrievalQa::new(
            Arc::clone(&self.embedder),
            Arc::clone(&self.generator),
            self.config.retrieval.top_k,
        );
        let answers = qa.answer_all(&index, &self.config.questions).await;

        Ok(RunSummary {
            filings_located: located.len(),
            extraction: extraction.report,
            chunks_produced,
            chunks_indexed: index_report.indexed,
            chunks_skipped: index_report.skipped,
            answers,
        })
    }
}
