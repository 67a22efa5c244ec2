//! Filtering engine.
//!
//! AND across facets, OR within a facet's selected values. Date bounds use
//! exact string equality; no interval comparison is performed.

use ef_core::SimulationRecord;

use crate::facet::Facet;
use crate::state::{FacetValue, FilterState};

/// A record field as seen by a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Scalar(Option<&'a str>),
    List(&'a [String]),
}

pub fn field_value(record: &SimulationRecord, facet: Facet) -> FieldValue<'_> {
    use FieldValue::{List, Scalar};

    match facet {
        Facet::CampaignId => Scalar(record.campaign_id.as_deref()),
        Facet::ExperimentTypeId => Scalar(record.experiment_type_id.as_deref()),
        Facet::Variables => List(&record.variables),
        Facet::MachineId => Scalar(record.machine_id.as_deref()),
        Facet::GridName => Scalar(record.grid_name.as_deref()),
        Facet::VersionTag => Scalar(record.version_tag.as_deref()),
        Facet::Status => Scalar(Some(record.status.as_str())),
        Facet::SimulationType => Scalar(Some(record.simulation_type.as_str())),
        Facet::Compset => Scalar(record.compset.as_deref()),
        Facet::ModelStartDate => Scalar(record.model_start_date.as_deref()),
        Facet::ModelEndDate => Scalar(record.model_end_date.as_deref()),
        Facet::UploadStartDate | Facet::UploadEndDate => Scalar(record.upload_date.as_deref()),
    }
}

fn facet_matches(field: FieldValue<'_>, constraint: &FacetValue) -> bool {
    match constraint {
        FacetValue::Values(selected) => {
            if selected.is_empty() {
                return true;
            }
            match field {
                FieldValue::List(values) => values.iter().any(|v| selected.contains(v)),
                FieldValue::Scalar(Some(value)) => selected.iter().any(|s| s == value),
                FieldValue::Scalar(None) => false,
            }
        }
        FacetValue::Bound(bound) => {
            if bound.is_empty() {
                return true;
            }
            match field {
                FieldValue::Scalar(Some(value)) => value == bound,
                FieldValue::List(values) => values.iter().any(|v| v == bound),
                FieldValue::Scalar(None) => false,
            }
        }
    }
}

pub fn matches(record: &SimulationRecord, state: &FilterState) -> bool {
    if let Some(query) = state.name_query() {
        let query = query.to_lowercase();
        if !record.name.to_lowercase().contains(&query) {
            return false;
        }
    }

    state
        .active_facets()
        .all(|(facet, constraint)| facet_matches(field_value(record, facet), constraint))
}

/// Records satisfying every facet, in input order.
pub fn filter_records<'a>(
    records: &'a [SimulationRecord],
    state: &FilterState,
) -> Vec<&'a SimulationRecord> {
    records.iter().filter(|r| matches(r, state)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_core::Status;

    fn record(id: &str, status: Status, campaign: &str) -> SimulationRecord {
        SimulationRecord {
            id: id.to_string(),
            name: format!("run {id}"),
            status,
            campaign_id: Some(campaign.to_string()),
            ..Default::default()
        }
    }

    fn ids(records: &[&SimulationRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn status_filter_with_empty_campaign() {
        let records = vec![
            record("a", Status::Complete, "C1"),
            record("b", Status::Failed, "C1"),
            record("c", Status::Complete, "C2"),
        ];
        let mut state = FilterState::new();
        state.select_values(Facet::Status, ["complete"]).unwrap();
        state
            .select_values(Facet::CampaignId, Vec::<String>::new())
            .unwrap();

        assert_eq!(ids(&filter_records(&records, &state)), ["a", "c"]);
    }

    #[test]
    fn or_within_facet_and_across_facets() {
        let records = vec![
            record("a", Status::Complete, "C1"),
            record("b", Status::Failed, "C1"),
            record("c", Status::Running, "C2"),
        ];
        let mut state = FilterState::new();
        state
            .select_values(Facet::Status, ["failed", "running"])
            .unwrap();
        assert_eq!(ids(&filter_records(&records, &state)), ["b", "c"]);

        state.select_values(Facet::CampaignId, ["C2"]).unwrap();
        assert_eq!(ids(&filter_records(&records, &state)), ["c"]);
    }

    #[test]
    fn list_field_matches_on_intersection() {
        let mut a = record("a", Status::Complete, "C1");
        a.variables = vec!["tas".into(), "pr".into()];
        let mut b = record("b", Status::Complete, "C1");
        b.variables = vec!["ts".into()];
        let records = vec![a, b];

        let mut state = FilterState::new();
        state.select_values(Facet::Variables, ["pr", "zg"]).unwrap();
        assert_eq!(ids(&filter_records(&records, &state)), ["a"]);
    }

    #[test]
    fn missing_field_never_matches_a_constraint() {
        let mut a = record("a", Status::Complete, "C1");
        a.compset = None;
        let mut state = FilterState::new();
        state.select_values(Facet::Compset, ["WCYCL1850"]).unwrap();
        assert!(!matches(&a, &state));
    }

    #[test]
    fn date_bound_is_exact_equality() {
        let mut a = record("a", Status::Complete, "C1");
        a.model_start_date = Some("1850-01-01".into());
        a.upload_date = Some("2025-01-02".into());
        let mut state = FilterState::new();

        state.set_bound(Facet::ModelStartDate, "1850-01-01").unwrap();
        assert!(matches(&a, &state));
        state.set_bound(Facet::ModelStartDate, "1849-01-01").unwrap();
        assert!(!matches(&a, &state));

        state.clear_facet(Facet::ModelStartDate);
        state.set_bound(Facet::UploadEndDate, "2025-01-02").unwrap();
        assert!(matches(&a, &state));
    }

    #[test]
    fn name_query_is_case_insensitive_substring() {
        let mut a = record("a", Status::Complete, "C1");
        a.name = "v3.LR.Historical_0101".into();
        let mut state = FilterState::new();
        state.set_name_query("historical");
        assert!(matches(&a, &state));
        state.set_name_query("picontrol");
        assert!(!matches(&a, &state));
    }

    #[test]
    fn empty_state_passes_everything_through() {
        let records = vec![
            record("a", Status::Complete, "C1"),
            record("b", Status::Failed, "C2"),
        ];
        assert_eq!(filter_records(&records, &FilterState::new()).len(), 2);
    }
}
