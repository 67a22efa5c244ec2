//! URL query-string codec for [`FilterState`].
//!
//! One parameter per facet: multi-select values comma-joined, date bounds raw,
//! the name query under `q`. Empty facets are omitted when serializing.

use url::form_urlencoded;

use crate::facet::{Facet, FacetKind};
use crate::state::{FacetValue, FilterState};

pub const NAME_QUERY_KEY: &str = "q";

pub fn to_query_string(state: &FilterState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for facet in Facet::ALL {
        match state.get(facet) {
            Some(FacetValue::Values(values)) if !values.is_empty() => {
                serializer.append_pair(facet.key(), &values.join(","));
            }
            Some(FacetValue::Bound(bound)) if !bound.is_empty() => {
                serializer.append_pair(facet.key(), bound);
            }
            _ => {}
        }
    }
    if let Some(query) = state.name_query() {
        serializer.append_pair(NAME_QUERY_KEY, query);
    }
    serializer.finish()
}

/// Merge query parameters into `state`.
///
/// An absent parameter leaves the facet untouched, a present but empty one
/// clears it. Unknown parameters are ignored.
pub fn merge_query(state: &mut FilterState, query: &str) {
    let query = query.strip_prefix('?').unwrap_or(query);

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == NAME_QUERY_KEY {
            state.set_name_query(value.into_owned());
            continue;
        }

        let Some(facet) = Facet::from_key(&key) else {
            tracing::debug!(param = %key, "ignoring unknown query parameter");
            continue;
        };

        let parsed = match facet.kind() {
            FacetKind::MultiSelect => FacetValue::Values(
                value
                    .split(',')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            FacetKind::DateBound => FacetValue::Bound(value.into_owned()),
        };

        // kinds were matched above, so this cannot fail
        let _ = state.apply_filter(facet, parsed);
    }
}

pub fn from_query_string(query: &str) -> FilterState {
    let mut state = FilterState::new();
    merge_query(&mut state, query);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_arrays_comma_joined() {
        let mut state = FilterState::new();
        state.select_values(Facet::Variables, ["tas", "pr"]).unwrap();
        state.set_bound(Facet::ModelStartDate, "1850-01-01").unwrap();
        assert_eq!(
            to_query_string(&state),
            "variables=tas%2Cpr&modelStartDate=1850-01-01"
        );
    }

    #[test]
    fn empty_state_serializes_to_empty_string() {
        assert_eq!(to_query_string(&FilterState::new()), "");
    }

    #[test]
    fn parses_with_leading_question_mark() {
        let state = from_query_string("?status=complete,failed&q=hist");
        assert_eq!(state.values(Facet::Status), ["complete", "failed"]);
        assert_eq!(state.name_query(), Some("hist"));
    }

    #[test]
    fn absent_keeps_and_empty_clears() {
        let mut state = FilterState::new();
        state.select_values(Facet::CampaignId, ["v3.LR"]).unwrap();
        state.select_values(Facet::Compset, ["WCYCL1850"]).unwrap();

        merge_query(&mut state, "compset=&gridName=ne30");

        assert_eq!(state.values(Facet::CampaignId), ["v3.LR"]);
        assert!(state.get(Facet::Compset).is_none());
        assert_eq!(state.values(Facet::GridName), ["ne30"]);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let state = from_query_string("page=2&machineId=m1");
        assert_eq!(state.values(Facet::MachineId), ["m1"]);
        assert_eq!(state.active_facets().count(), 1);
    }

    #[test]
    fn round_trip_with_encoded_characters() {
        let mut state = FilterState::new();
        state
            .select_values(Facet::GridName, ["ne30pg2_r05 & oEC", "ne4=x"])
            .unwrap();
        state.set_bound(Facet::UploadStartDate, "2025-09-26T11:49:24+00:00").unwrap();
        state.set_name_query("v3 LR");
        let parsed = from_query_string(&to_query_string(&state));
        assert!(parsed.equivalent(&state));
    }
}
