//! Filter state model.

use indexmap::IndexSet;
use std::collections::BTreeMap;

use crate::facet::{Facet, FacetKind};
use crate::{FilterError, FilterResult};

/// Value held for one facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetValue {
    Values(Vec<String>),
    Bound(String),
}

impl FacetValue {
    fn kind(&self) -> FacetKind {
        match self {
            FacetValue::Values(_) => FacetKind::MultiSelect,
            FacetValue::Bound(_) => FacetKind::DateBound,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            FacetValue::Values(values) => values.is_empty(),
            FacetValue::Bound(bound) => bound.is_empty(),
        }
    }
}

/// Selected facet values plus an optional free-text name query.
///
/// Empty facets are never stored, so an absent entry is the only
/// representation of "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    facets: BTreeMap<Facet, FacetValue>,
    name_query: Option<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of `facet`. Multi-select values are deduplicated,
    /// keeping first-seen order; an empty value clears the facet.
    pub fn apply_filter(&mut self, facet: Facet, value: FacetValue) -> FilterResult<()> {
        if value.kind() != facet.kind() {
            return Err(FilterError::KindMismatch {
                facet: facet.key(),
                expected: facet.kind(),
            });
        }

        let value = match value {
            FacetValue::Values(values) => {
                let unique: IndexSet<String> = values.into_iter().collect();
                FacetValue::Values(unique.into_iter().collect())
            }
            bound => bound,
        };

        if value.is_empty() {
            self.facets.remove(&facet);
        } else {
            self.facets.insert(facet, value);
        }
        Ok(())
    }

    pub fn select_values<I, S>(&mut self, facet: Facet, values: I) -> FilterResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.apply_filter(facet, FacetValue::Values(values))
    }

    pub fn set_bound(&mut self, facet: Facet, bound: impl Into<String>) -> FilterResult<()> {
        self.apply_filter(facet, FacetValue::Bound(bound.into()))
    }

    /// Checkbox semantics: add `value` if absent, otherwise remove it.
    /// Returns whether the value is selected afterwards.
    pub fn toggle_value(&mut self, facet: Facet, value: &str) -> FilterResult<bool> {
        let mut values = self.values(facet).to_vec();
        let selected = if let Some(pos) = values.iter().position(|v| v == value) {
            values.remove(pos);
            false
        } else {
            values.push(value.to_string());
            true
        };
        self.apply_filter(facet, FacetValue::Values(values))?;
        Ok(selected)
    }

    pub fn clear_facet(&mut self, facet: Facet) {
        self.facets.remove(&facet);
    }

    pub fn reset_filters(&mut self) {
        self.facets.clear();
        self.name_query = None;
    }

    pub fn get(&self, facet: Facet) -> Option<&FacetValue> {
        self.facets.get(&facet)
    }

    /// Selected values of a multi-select facet (empty when unconstrained).
    pub fn values(&self, facet: Facet) -> &[String] {
        match self.facets.get(&facet) {
            Some(FacetValue::Values(values)) => values.as_slice(),
            _ => &[],
        }
    }

    pub fn bound(&self, facet: Facet) -> Option<&str> {
        match self.facets.get(&facet) {
            Some(FacetValue::Bound(bound)) => Some(bound.as_str()),
            _ => None,
        }
    }

    pub fn name_query(&self) -> Option<&str> {
        self.name_query.as_deref()
    }

    pub fn set_name_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.name_query = (!query.is_empty()).then_some(query);
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty() && self.name_query.is_none()
    }

    pub fn active_facets(&self) -> impl Iterator<Item = (Facet, &FacetValue)> {
        self.facets.iter().map(|(facet, value)| (*facet, value))
    }

    /// Equality that ignores value order within a multi-select facet.
    pub fn equivalent(&self, other: &FilterState) -> bool {
        if self.name_query != other.name_query || self.facets.len() != other.facets.len() {
            return false;
        }
        self.facets.iter().all(|(facet, value)| {
            match (value, other.facets.get(facet)) {
                (FacetValue::Values(a), Some(FacetValue::Values(b))) => {
                    let a: IndexSet<&String> = a.iter().collect();
                    let b: IndexSet<&String> = b.iter().collect();
                    a.len() == b.len() && a.iter().all(|v| b.contains(v))
                }
                (FacetValue::Bound(a), Some(FacetValue::Bound(b))) => a == b,
                _ => false,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_deduplicates_in_first_seen_order() {
        let mut state = FilterState::new();
        state
            .select_values(Facet::Variables, ["tas", "pr", "tas", "ts", "pr"])
            .unwrap();
        assert_eq!(state.values(Facet::Variables), ["tas", "pr", "ts"]);
    }

    #[test]
    fn apply_replaces_previous_value() {
        let mut state = FilterState::new();
        state.select_values(Facet::Status, ["complete"]).unwrap();
        state.select_values(Facet::Status, ["failed"]).unwrap();
        assert_eq!(state.values(Facet::Status), ["failed"]);
    }

    #[test]
    fn empty_value_clears_facet() {
        let mut state = FilterState::new();
        state.set_bound(Facet::ModelStartDate, "1850-01-01").unwrap();
        state.set_bound(Facet::ModelStartDate, "").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut state = FilterState::new();
        let err = state.set_bound(Facet::Compset, "WCYCL").unwrap_err();
        assert_eq!(
            err,
            FilterError::KindMismatch {
                facet: "compset",
                expected: FacetKind::MultiSelect
            }
        );
        assert!(state.select_values(Facet::ModelEndDate, ["x"]).is_err());
    }

    #[test]
    fn toggle_value_adds_then_removes() {
        let mut state = FilterState::new();
        assert!(state.toggle_value(Facet::GridName, "ne30").unwrap());
        assert!(state.toggle_value(Facet::GridName, "ne120").unwrap());
        assert!(!state.toggle_value(Facet::GridName, "ne30").unwrap());
        assert_eq!(state.values(Facet::GridName), ["ne120"]);
        assert!(!state.toggle_value(Facet::GridName, "ne120").unwrap());
        assert!(state.get(Facet::GridName).is_none());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = FilterState::new();
        state.select_values(Facet::CampaignId, ["v3.LR"]).unwrap();
        state.set_name_query("historical");
        state.reset_filters();
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn equivalent_ignores_value_order() {
        let mut a = FilterState::new();
        let mut b = FilterState::new();
        a.select_values(Facet::Variables, ["tas", "pr"]).unwrap();
        b.select_values(Facet::Variables, ["pr", "tas"]).unwrap();
        assert_ne!(a, b);
        assert!(a.equivalent(&b));

        b.select_values(Facet::Status, ["running"]).unwrap();
        assert!(!a.equivalent(&b));
    }
}
