//! Available filter options derived from the loaded record set.

use indexmap::IndexSet;
use std::collections::BTreeMap;

use ef_core::SimulationRecord;

use crate::engine::{FieldValue, field_value};
use crate::facet::Facet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableOptions {
    options: BTreeMap<Facet, Vec<String>>,
}

impl AvailableOptions {
    pub fn get(&self, facet: Facet) -> &[String] {
        self.options.get(&facet).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Facet, &[String])> {
        self.options
            .iter()
            .map(|(facet, values)| (*facet, values.as_slice()))
    }
}

/// Deduplicated union of every multi-select facet's values across `records`,
/// in first-seen order. Empty strings and absent fields are skipped.
pub fn available_options(records: &[SimulationRecord]) -> AvailableOptions {
    let mut options = BTreeMap::new();

    for facet in Facet::MULTI_SELECT {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for record in records {
            match field_value(record, facet) {
                FieldValue::Scalar(Some(value)) => {
                    if !value.is_empty() {
                        seen.insert(value);
                    }
                }
                FieldValue::Scalar(None) => {}
                FieldValue::List(values) => {
                    seen.extend(values.iter().map(String::as_str).filter(|v| !v.is_empty()));
                }
            }
        }
        options.insert(facet, seen.into_iter().map(str::to_string).collect());
    }

    AvailableOptions { options }
}
