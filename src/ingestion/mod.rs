//! Filing ingestion: discovery, section extraction, and record persistence.
//!
//! * [`locate`] — resolves downloaded submissions to primary document URLs.
//! * [`extract`] — pulls metadata and section text, one record per filing.
//! * [`records`] — the persisted record naming convention and format.

pub mod extract;
pub mod locate;
pub mod records;

pub use extract::{ExtractionOutcome, SectionExtractor};
pub use locate::{FilingLocator, LocatedFiling};
pub use records::{RecordStore, StoredRecord};
