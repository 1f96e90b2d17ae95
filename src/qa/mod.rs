//! Retrieval-augmented question answering.
//!
//! Each question is embedded with the same model the index was built with,
//! the nearest chunks are concatenated into a context block, and the pair is
//! handed to the answer-generation service. Questions fail independently;
//! answers are reported in question order.

use std::sync::Arc;

use tracing::{error, info};

use crate::providers::{AnswerGenerator, EmbeddingProvider};
use crate::stores::VectorBackend;
use crate::types::PipelineError;

/// Separator between context chunks in the generation prompt.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Result of answering one question.
#[derive(Debug)]
pub struct QaOutcome {
    pub question: String,
    pub result: Result<String, PipelineError>,
}

/// Answers questions against a built vector index.
pub struct RetrievalQa {
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
}

impl RetrievalQa {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn AnswerGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            generator,
            top_k,
        }
    }

    /// Retrieves the top-k chunks for `question` and generates an answer.
    pub async fn answer<B: VectorBackend>(
        &self,
        index: &B,
        question: &str,
    ) -> Result<String, PipelineError> {
        let query = self.embedder.embed(question).await?;
        let hits = index.search(&query, self.top_k).await?;
        let context = hits
            .iter()
            .map(|hit| hit.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        self.generator.generate(question, &context).await
    }

    /// Answers every question, isolating per-question failures.
    pub async fn answer_all<B: VectorBackend>(
        &self,
        index: &B,
        questions: &[String],
    ) -> Vec<QaOutcome> {
        let mut outcomes = Vec::with_capacity(questions.len());
        for question in questions {
            match self.answer(index, question).await {
                Ok(answer) => {
                    info!(%question, "question answered");
                    outcomes.push(QaOutcome {
                        question: question.clone(),
                        result: Ok(answer),
                    });
                }
                Err(err) => {
                    error!(%question, %err, "error processing question");
                    outcomes.push(QaOutcome {
                        question: question.clone(),
                        result: Err(err),
                    });
                }
            }
        }
        outcomes
    }
}
