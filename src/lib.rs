//! ```text
//! Downloaded filings ──► ingestion::locate ──► (filing id, document URL)
//!                                 │
//!                                 ▼
//!                      ingestion::extract ──► providers::secapi
//!                                 │              (metadata + sections)
//!                                 ▼
//!                      ingestion::records  (one text record per filing)
//!                                 │
//!                                 ▼
//!                      chunking::chunk_records ──► bounded overlapping chunks
//!                                 │
//!                                 ▼
//!                      stores::build_index ──► providers (embeddings)
//!                                 │
//!                                 ▼
//!                      qa::RetrievalQa ──► providers (answer generation)
//! ```
//!
pub mod auth;
pub mod chunking;
pub mod config;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod qa;
pub mod stores;
pub mod types;

pub use pipeline::{BatchReport, FilingPipeline, RunSummary};
pub use types::{Chunk, Filing, PipelineError};
