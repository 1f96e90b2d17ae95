//! Per-filing section extraction and record persistence.
//!
//! One filing in, one self-contained record out. Failures stay scoped to the
//! item that caused them: a section that fails to extract is logged and
//! dropped from the record, a filing whose metadata request fails produces no
//! record, and in both cases the rest of the batch keeps going.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::locate::LocatedFiling;
use super::records::RecordStore;
use crate::pipeline::BatchReport;
use crate::providers::FilingDataApi;
use crate::types::{Filing, PipelineError};

const COVER_NAMESPACE: &str = "CoverPage";

/// Extraction results: the filings that produced records, plus the per-item
/// batch report covering every input.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub filings: Vec<Filing>,
    pub report: BatchReport,
}

/// Extracts configured sections for each located filing and persists records.
pub struct SectionExtractor {
    api: Arc<dyn FilingDataApi>,
    store: RecordStore,
    sections: Vec<String>,
}

impl SectionExtractor {
    pub fn new(api: Arc<dyn FilingDataApi>, store: RecordStore, sections: Vec<String>) -> Self {
        Self {
            api,
            store,
            sections,
        }
    }

    /// Processes each filing in order, writing `{prefix}{i}.txt` records with
    /// a 1-based index. Per-filing failures are collected, never propagated.
    pub async fn extract_and_persist(
        &self,
        located: &[LocatedFiling],
    ) -> Result<ExtractionOutcome, PipelineError> {
        let mut filings = Vec::new();
        let mut report = BatchReport::default();

        for (position, filing) in located.iter().enumerate() {
            let index = position + 1;
            info!(url = %filing.url, index, "processing filing");
            match self.extract_one(filing, index).await {
                Ok(extracted) => {
                    report.push_ok(&filing.filing_id);
                    filings.push(extracted);
                }
                Err(err) => {
                    error!(url = %filing.url, %err, "error processing filing");
                    report.push_err(&filing.filing_id, err);
                }
            }
        }

        Ok(ExtractionOutcome { filings, report })
    }

    async fn extract_one(
        &self,
        located: &LocatedFiling,
        index: usize,
    ) -> Result<Filing, PipelineError> {
        let metadata = self.api.cover_metadata(&located.url).await?;
        let cover: BTreeMap<String, String> =
            metadata.get(COVER_NAMESPACE).cloned().unwrap_or_default();

        let mut sections = BTreeMap::new();
        for section in &self.sections {
            match self.api.section_text(&located.url, section).await {
                Ok(text) => {
                    sections.insert(section.clone(), text);
                }
                Err(err) => {
                    warn!(url = %located.url, %section, %err, "error extracting section");
                }
            }
        }

        self.store.write(index, &cover, &sections).await?;
        Ok(Filing {
            id: located.filing_id.clone(),
            url: located.url.clone(),
            metadata: cover,
            sections,
        })
    }
}
