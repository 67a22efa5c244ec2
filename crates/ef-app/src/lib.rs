//! Shared application service layer for the EarthFrame catalog.
//!
//! Ties the record schema, filtering and session crates to a data source:
//! configuration, the REST client, single in-flight fetch tracking, the
//! browse and compare sessions, AI summaries, CSV export and submission.

pub mod browse;
pub mod client;
pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod submit;
pub mod summary;

// Re-export key types for convenience
pub use browse::BrowseSession;
pub use client::{CatalogSource, FileCatalog, HttpCatalogClient};
pub use compare::CompareSession;
pub use config::{CatalogConfig, ConfigOverrides};
pub use error::{AppError, AppResult};
pub use export::{ExportColumn, SortKey, default_sort, export_file_name, export_records};
pub use fetch::{FetchSlot, FetchWorker, Ticket, WorkerMessage};
pub use submit::{load_draft, submit_draft};
pub use summary::{SUMMARY_ERROR_TEXT, generate_summary, spawn_summary, summary_text};
