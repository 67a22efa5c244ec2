//! ef-filter: faceted filtering over simulation records.
//!
//! A [`FilterState`] holds the selected values per [`Facet`]; [`filter_records`]
//! applies it to a record slice, [`available_options`] derives the choices a
//! filter panel offers, and the [`query`] module maps state to and from a URL
//! query string.

pub mod engine;
pub mod facet;
pub mod options;
pub mod query;
pub mod state;

pub use engine::{FieldValue, field_value, filter_records, matches};
pub use facet::{Facet, FacetKind};
pub use options::{AvailableOptions, available_options};
pub use query::{from_query_string, merge_query, to_query_string};
pub use state::{FacetValue, FilterState};

pub type FilterResult<T> = Result<T, FilterError>;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Facet {facet} expects {expected:?} values")]
    KindMismatch {
        facet: &'static str,
        expected: FacetKind,
    },
}
