//! End-to-end pipeline tests with scripted providers.
//!
//! Exercise the full locate -> extract -> chunk -> index -> answer flow
//! against a temporary filing hierarchy, deterministic mock embeddings, and
//! scripted extraction/generation services.

use std::path::Path;
use std::sync::Arc;

use tempfile::{TempDir, tempdir};

use filing_qa::config::PipelineConfig;
use filing_qa::ingestion::RecordStore;
use filing_qa::pipeline::FilingPipeline;
use filing_qa::providers::MockEmbeddingProvider;
use filing_qa::providers::mock::{ScriptedAnswerGenerator, ScriptedFilingApi};
use filing_qa::types::PipelineError;

const BASE_URL: &str = "https://sec.example/data/";

struct Fixture {
    _filings_root: TempDir,
    _records_dir: TempDir,
    config: PipelineConfig,
}

async fn write_submission(root: &Path, dir_name: &str, document: &str) {
    let dir = root.join(dir_name);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(
        dir.join("full-submission.txt"),
        format!("<SEC-DOCUMENT>\n<FILENAME>{document}</FILENAME>\nraw body"),
    )
    .await
    .unwrap();
}

/// Lays out `count` filings named `000-0N` with documents `docN.htm`.
async fn fixture(count: usize, questions: Vec<String>) -> Fixture {
    let filings_root = tempdir().unwrap();
    let records_dir = tempdir().unwrap();

    for n in 1..=count {
        write_submission(filings_root.path(), &format!("000-0{n}"), &format!("doc{n}.htm")).await;
    }

    let mut config = PipelineConfig::default();
    config.archive_base_url = BASE_URL.to_string();
    config.filings_root = filings_root.path().to_path_buf();
    config.records_dir = records_dir.path().to_path_buf();
    config.sections = vec!["1A".to_string()];
    config.questions = questions;
    config.retrieval.top_k = 2;

    Fixture {
        _filings_root: filings_root,
        _records_dir: records_dir,
        config,
    }
}

/// Document URL the locator derives for filing `n` in the fixture layout.
fn document_url(n: usize) -> String {
    format!("{BASE_URL}0000{n}/doc{n}.htm")
}

/// Record body the extractor writes for a cover-less filing with one section.
fn expected_record_body(section_text: &str) -> String {
    format!("\nSection 1A:\n{section_text}\n")
}

#[tokio::test]
async fn two_small_filings_yield_two_chunks_and_exact_retrieval() {
    let text_one = "Operational challenges centered on production ramp and logistics.";
    let text_two = "The competitive strategy relies on vertical integration and scale.";

    // Property 6: querying with record 1's text verbatim must rank its chunk
    // first, so the question is the exact record body.
    let question = expected_record_body(text_one);
    let fx = fixture(2, vec![question.clone()]).await;

    let api = ScriptedFilingApi::new()
        .with_section(&document_url(1), "1A", text_one)
        .with_section(&document_url(2), "1A", text_two);
    let generator = Arc::new(ScriptedAnswerGenerator::new());

    let pipeline = FilingPipeline::new(
        fx.config.clone(),
        Arc::new(api),
        Arc::new(MockEmbeddingProvider::default()),
        Arc::clone(&generator) as Arc<dyn filing_qa::providers::AnswerGenerator>,
    );
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.filings_located, 2);
    assert_eq!(summary.extraction.succeeded(), 2);
    // Each record fits in one chunk: no overlap applies.
    assert_eq!(summary.chunks_produced, 2);
    assert_eq!(summary.chunks_indexed, 2);
    assert_eq!(summary.chunks_skipped, 0);

    assert_eq!(summary.answers.len(), 1);
    assert!(summary.answers[0].result.is_ok());

    // Record 1's chunk leads the retrieved context.
    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0].1.starts_with(&expected_record_body(text_one)),
        "context should lead with record 1's chunk"
    );
}

#[tokio::test]
async fn filing_failure_leaves_other_records_intact() {
    let fx = fixture(5, Vec::new()).await;

    let mut api = ScriptedFilingApi::new();
    for n in 1..=5 {
        api = api.with_section(&document_url(n), "1A", &format!("Section text for filing {n}."));
    }
    // Filing 3's metadata request fails; its siblings must be unaffected.
    let api = api.failing_metadata(&document_url(3));

    let pipeline = FilingPipeline::new(
        fx.config.clone(),
        Arc::new(api),
        Arc::new(MockEmbeddingProvider::default()),
        Arc::new(ScriptedAnswerGenerator::new()),
    );
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.extraction.succeeded(), 4);
    assert_eq!(summary.extraction.failed(), 1);

    let store = RecordStore::new(&fx.config.records_dir, &fx.config.record_prefix);
    let indices: Vec<usize> = store.list().await.unwrap().iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![1, 2, 4, 5]);
}

#[tokio::test]
async fn generation_failures_are_isolated_per_question() {
    let fx = fixture(
        1,
        vec![
            "fine question".to_string(),
            "broken question".to_string(),
            "another fine question".to_string(),
        ],
    )
    .await;

    let api = ScriptedFilingApi::new().with_section(&document_url(1), "1A", "Some section text.");
    let generator = ScriptedAnswerGenerator::new().failing_on("broken");

    let pipeline = FilingPipeline::new(
        fx.config.clone(),
        Arc::new(api),
        Arc::new(MockEmbeddingProvider::default()),
        Arc::new(generator),
    );
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.answers.len(), 3);
    assert!(summary.answers[0].result.is_ok());
    assert!(summary.answers[1].result.is_err());
    assert!(summary.answers[2].result.is_ok());
}

#[tokio::test]
async fn empty_filing_root_is_fatal() {
    let fx = fixture(0, Vec::new()).await;

    let pipeline = FilingPipeline::new(
        fx.config.clone(),
        Arc::new(ScriptedFilingApi::new()),
        Arc::new(MockEmbeddingProvider::default()),
        Arc::new(ScriptedAnswerGenerator::new()),
    );
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Discovery(_)));
}
