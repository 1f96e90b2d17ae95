//! Filing discovery over a downloaded submission hierarchy.
//!
//! Raw filings arrive as one subdirectory per filing, each holding a
//! `full-submission.txt` with the complete EDGAR submission. The primary
//! document's filename is embedded in a `<FILENAME>` tag inside that record;
//! the locator resolves each filing to the URL of that document.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::fs;
use tracing::{debug, warn};
use url::Url;

use crate::types::PipelineError;

const SUBMISSION_FILE: &str = "full-submission.txt";

static FILENAME_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<FILENAME>([^<]+\.htm)").expect("filename tag pattern compiles")
});

/// One discovered filing, resolved to its primary document URL.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFiling {
    /// Accession-derived identifier with separators stripped.
    pub filing_id: String,
    /// URL of the primary `.htm` document.
    pub url: Url,
}

/// Discovers filings beneath a root directory and resolves document URLs.
#[derive(Debug, Clone)]
pub struct FilingLocator {
    base_url: String,
}

impl FilingLocator {
    /// Creates a locator composing URLs against the given archive base.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url }
    }

    /// Walks `root` and returns one entry per filing whose submission record
    /// names a primary document.
    ///
    /// Subdirectories without a submission record are skipped silently;
    /// records without a usable `<FILENAME>` tag are skipped with a
    /// diagnostic. Output is ordered by directory path so repeated runs
    /// produce the same sequence.
    pub async fn locate(&self, root: impl AsRef<Path>) -> Result<Vec<LocatedFiling>, PipelineError> {
        let root = root.as_ref();
        let mut subdirs = collect_subdirectories(root).await?;
        subdirs.sort();

        let mut located = Vec::new();
        for dir in subdirs {
            let submission = dir.join(SUBMISSION_FILE);
            let Ok(meta) = fs::metadata(&submission).await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let content = fs::read_to_string(&submission).await?;
            let Some(capture) = FILENAME_TAG.captures(&content) else {
                warn!(directory = %dir.display(), "no <FILENAME> tag found, skipping filing");
                continue;
            };
            let document_name = capture[1].trim().to_string();
            let filing_id = filing_id_from_dir(&dir);
            let raw_url = format!("{}{}/{}", self.base_url, filing_id, document_name);
            match Url::parse(&raw_url) {
                Ok(url) => {
                    debug!(filing_id = %filing_id, url = %url, "located filing document");
                    located.push(LocatedFiling { filing_id, url });
                }
                Err(err) => {
                    warn!(
                        directory = %dir.display(),
                        url = %raw_url,
                        %err,
                        "composed document URL is invalid, skipping filing"
                    );
                }
            }
        }
        Ok(located)
    }
}

/// Collects every directory below `root`, excluding the root itself.
async fn collect_subdirectories(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                found.push(path.clone());
                pending.push(path);
            }
        }
    }
    Ok(found)
}

/// Derives a filing identifier from the directory basename by dropping every
/// non-alphanumeric character (`0001045810-23-000017` -> `000104581023000017`).
fn filing_id_from_dir(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
