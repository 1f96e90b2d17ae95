use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing_subscriber::FmtSubscriber;

use filing_qa::auth::{exchange_for_token, fetch_credential_file};
use filing_qa::config::PipelineConfig;
use filing_qa::pipeline::FilingPipeline;
use filing_qa::providers::{
    ChatCompletionGenerator, EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider,
    SecApiClient,
};
use filing_qa::types::PipelineError;

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    init_tracing();

    let config = PipelineConfig::from_env();

    let client = reqwest::Client::builder()
        .user_agent(format!("filing-qa/0.1 ({})", config.email))
        .use_rustls_tls()
        .build()?;

    // Credential bootstrap is the only fatal external step: nothing can run
    // without a scoped token for the generation service.
    let credential_url = env::var("FILING_QA_CREDENTIAL_URL")
        .map_err(|_| PipelineError::Auth("FILING_QA_CREDENTIAL_URL is not set".to_string()))?;
    let token_url = env::var("FILING_QA_TOKEN_URL")
        .map_err(|_| PipelineError::Auth("FILING_QA_TOKEN_URL is not set".to_string()))?;
    let credential_path = env::var("FILING_QA_CREDENTIAL_PATH")
        .unwrap_or_else(|_| "./credentials/service-account.json".to_string());
    let credential_path =
        fetch_credential_file(&client, &credential_url, &credential_path).await?;
    let token = exchange_for_token(&client, &token_url, &credential_path).await?;

    let extractor_base = env::var("FILING_QA_EXTRACTOR_BASE_URL")
        .unwrap_or_else(|_| "https://api.sec-api.io".to_string());
    let filing_api = Arc::new(SecApiClient::new(
        client.clone(),
        extractor_base,
        config.credentials.extractor_api_key.clone(),
    ));

    // "mock" selects the deterministic offline embedder, anything else the
    // remote model.
    let embedding_key = env::var("FILING_QA_EMBEDDING_API_KEY").unwrap_or_default();
    let embedder: Arc<dyn EmbeddingProvider> = if embedding_key.is_empty() || embedding_key == "mock"
    {
        Arc::new(MockEmbeddingProvider::new(384))
    } else {
        let base = env::var("FILING_QA_EMBEDDING_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = env::var("FILING_QA_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Arc::new(HttpEmbeddingProvider::new(
            client.clone(),
            base,
            embedding_key,
            model,
            384,
        ))
    };

    let generation_base = env::var("FILING_QA_GENERATION_BASE_URL")
        .unwrap_or_else(|_| "https://generativelanguage.example/v1".to_string());
    let generator = Arc::new(ChatCompletionGenerator::new(
        client,
        generation_base,
        &token,
        config.generation.clone(),
    ));

    let start = Instant::now();
    let pipeline = FilingPipeline::new(config, filing_api, embedder, generator);
    let summary = pipeline.run().await?;
    let duration = start.elapsed();

    for outcome in &summary.answers {
        match &outcome.result {
            Ok(answer) => println!("Question: {}\nResponse: {}\n", outcome.question, answer),
            Err(err) => println!(
                "Question: {}\nError processing question: {}\n",
                outcome.question, err
            ),
        }
    }

    println!("✅ Run complete!");
    println!("  filings located   : {}", summary.filings_located);
    println!(
        "  records persisted : {} ({} failed)",
        summary.extraction.succeeded(),
        summary.extraction.failed()
    );
    println!("  chunks produced   : {}", summary.chunks_produced);
    println!(
        "  chunks indexed    : {} (skipped {})",
        summary.chunks_indexed, summary.chunks_skipped
    );
    println!("  duration          : {}", format_duration(duration));

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();
    format!("{}m {}.{:03}s", secs / 60, secs % 60, millis)
}
