//! ef-core: stable foundation for the EarthFrame catalog.
//!
//! Contains:
//! - schema (simulation record, machine snapshot, status enums)
//! - link (normalization of link-like values into `{url, label}`)
//! - validate (record-set repair: unique ids, ISO-8601 dates)
//! - draft (required-field completeness before submission)
//! - error (shared error types)

pub mod draft;
pub mod error;
pub mod link;
pub mod schema;
pub mod validate;

pub use draft::{DraftReport, DraftSection, SectionProgress, check_draft};
pub use error::{CoreError, CoreResult};
pub use link::{ExternalLink, LinkLike, looks_like_url, to_link_list};
pub use schema::*;
pub use validate::{ValidationError, normalize_dates, sanitize_records, validate_records};
