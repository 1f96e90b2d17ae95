//! Pipeline configuration.
//!
//! All external collaborators receive their settings through these structs at
//! construction time; nothing reads process-wide mutable state after startup.
//! `from_env` picks up `.env`/environment overrides for deployments, while
//! `Default` mirrors the canonical run (Tesla 10-K filings, sections 1A, 7
//! and 8, two analyst questions).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Character-based splitting parameters.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters repeated from the tail of the previous chunk.
    pub chunk_overlap: usize,
    /// Unit boundary the splitter accumulates on.
    pub separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separator: "\n\n".to_string(),
        }
    }
}

/// Retrieval parameters for question answering.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Number of nearest chunks forwarded as context.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Answer-generation model parameters.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model identifier passed to the generation service.
    pub model: String,
    pub temperature: f32,
    /// Token cap for generated answers; `None` defers to the service default.
    pub max_tokens: Option<u32>,
    /// Request timeout; `None` defers to the HTTP client default.
    pub timeout: Option<Duration>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-pro".to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout: None,
        }
    }
}

/// Credentials handed to the remote extraction service at construction.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub extractor_api_key: String,
}

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Contact email carried in the HTTP user agent.
    pub email: String,
    /// Company ticker the filings belong to.
    pub company: String,
    /// Base URL document URLs are composed from.
    pub archive_base_url: String,
    /// Root directory holding one subdirectory per downloaded filing.
    pub filings_root: PathBuf,
    /// Directory extracted filing records are written to.
    pub records_dir: PathBuf,
    /// Filename prefix for persisted records.
    pub record_prefix: String,
    /// Section identifiers to extract per filing.
    pub sections: Vec<String>,
    /// Questions answered at the end of the run.
    pub questions: Vec<String>,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub credentials: ApiCredentials,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let company = "TSLA".to_string();
        let filings_root = PathBuf::from(format!("./sec-edgar-filings/{company}/10-K"));
        Self {
            email: "filings@example.com".to_string(),
            archive_base_url: "https://www.sec.gov/Archives/edgar/data/1318605/".to_string(),
            records_dir: filings_root.clone(),
            filings_root,
            company,
            record_prefix: "filing_".to_string(),
            sections: vec!["1A".to_string(), "7".to_string(), "8".to_string()],
            questions: vec![
                "What operational challenges did the company highlight for the past fiscal year?"
                    .to_string(),
                "How does the company describe its competitive strategy in the automotive market?"
                    .to_string(),
            ],
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            credentials: ApiCredentials {
                extractor_api_key: String::new(),
            },
        }
    }
}

impl PipelineConfig {
    /// Builds a config from defaults plus `.env`/environment overrides.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();

        if let Ok(email) = env::var("FILING_QA_EMAIL") {
            config.email = email;
        }
        if let Ok(company) = env::var("FILING_QA_COMPANY") {
            config.filings_root = PathBuf::from(format!("./sec-edgar-filings/{company}/10-K"));
            config.records_dir = config.filings_root.clone();
            config.company = company;
        }
        if let Ok(base) = env::var("FILING_QA_ARCHIVE_BASE_URL") {
            config.archive_base_url = base;
        }
        if let Ok(root) = env::var("FILING_QA_FILINGS_ROOT") {
            config.filings_root = PathBuf::from(root);
        }
        if let Ok(dir) = env::var("FILING_QA_RECORDS_DIR") {
            config.records_dir = PathBuf::from(dir);
        }
        if let Ok(key) = env::var("FILING_QA_EXTRACTOR_API_KEY") {
            config.credentials.extractor_api_key = key;
        }
        if let Ok(sections) = env::var("FILING_QA_SECTIONS") {
            let parsed: Vec<String> = sections
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.sections = parsed;
            }
        }
        if let Ok(top_k) = env::var("FILING_QA_TOP_K")
            && let Ok(top_k) = top_k.parse::<usize>()
        {
            config.retrieval.top_k = top_k;
        }
        if let Ok(model) = env::var("FILING_QA_GENERATION_MODEL") {
            config.generation.model = model;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_reference_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.company, "TSLA");
        assert_eq!(config.sections, vec!["1A", "7", "8"]);
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.chunking.separator, "\n\n");
        assert_eq!(config.questions.len(), 2);
    }

    #[test]
    fn section_list_parsing_skips_blanks() {
        let parsed: Vec<String> = "1A, 7,,8 "
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(parsed, vec!["1A", "7", "8"]);
    }
}
