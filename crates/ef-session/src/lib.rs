//! ef-session: client-side state that outlives a single view.
//!
//! - storage (durable key/value store for persisted state)
//! - selection (capped, ordered set of selected record ids)
//! - comparison (column order, hidden set and section expansion reducer)
//! - table (comparison table rendering)

pub mod comparison;
pub mod selection;
pub mod storage;
pub mod table;

pub use comparison::{ComparisonAction, ComparisonState, HIDDEN_KEY, Section};
pub use selection::{MAX_SELECTION, SELECTION_KEY, SelectionSet, Toggle, limit_row_selection};
pub use storage::{FileStorage, MemoryStorage, Storage, load_json, save_json};
pub use table::{CellValue, ComparisonTable, PLACEHOLDER, render_table};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },
}
