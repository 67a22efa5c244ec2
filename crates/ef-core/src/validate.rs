//! Record-set validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use crate::schema::SimulationRecord;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Empty id at position {position}")]
    EmptyId { position: usize },

    #[error("Duplicate ID: {id}")]
    DuplicateId { id: String },

    #[error("Invalid date: {field} = {value} on record {id}")]
    InvalidDate {
        id: String,
        field: &'static str,
        value: String,
    },
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM`, RFC 3339 timestamps, and naive
/// `YYYY-MM-DDTHH:MM:SS[.f]`.
pub fn is_iso8601(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

fn date_fields(record: &mut SimulationRecord) -> [(&'static str, &mut Option<String>); 7] {
    [
        ("uploadDate", &mut record.upload_date),
        ("lastModified", &mut record.last_modified),
        ("lastEditedAt", &mut record.last_edited_at),
        ("modelStartDate", &mut record.model_start_date),
        ("modelEndDate", &mut record.model_end_date),
        ("calendarStartDate", &mut record.calendar_start_date),
        ("runDate", &mut record.run_date),
    ]
}

/// Blank dates are cleared; unparseable ones are cleared and reported.
fn repair_dates(record: &mut SimulationRecord) -> Vec<ValidationError> {
    let id = record.id.clone();
    let mut violations = Vec::new();
    for (field, slot) in date_fields(record) {
        let Some(value) = slot.as_deref() else {
            continue;
        };
        if value.trim().is_empty() {
            *slot = None;
        } else if !is_iso8601(value) {
            violations.push(ValidationError::InvalidDate {
                id: id.clone(),
                field,
                value: value.to_string(),
            });
            *slot = None;
        }
    }
    violations
}

/// Blank dates on a single record become absent; an unparseable one is an error.
pub fn normalize_dates(record: &mut SimulationRecord) -> Result<(), ValidationError> {
    match repair_dates(record).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}

/// Every violation in the record set, in record order.
pub fn validate_records(records: &[SimulationRecord]) -> Vec<ValidationError> {
    let (_, violations) = sanitize_records(records.to_vec());
    violations
}

/// Repair a record set instead of rejecting it.
///
/// Records with an empty id and later duplicates of an id are dropped. Empty
/// date strings become absent silently; unparseable dates become absent and
/// are reported. Returns the kept records and the violations found.
pub fn sanitize_records(
    records: Vec<SimulationRecord>,
) -> (Vec<SimulationRecord>, Vec<ValidationError>) {
    let mut ids = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut violations = Vec::new();

    for (position, mut record) in records.into_iter().enumerate() {
        if record.id.is_empty() {
            violations.push(ValidationError::EmptyId { position });
            continue;
        }
        if !ids.insert(record.id.clone()) {
            violations.push(ValidationError::DuplicateId {
                id: record.id.clone(),
            });
            continue;
        }

        violations.extend(repair_dates(&mut record));
        kept.push(record);
    }

    (kept, violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> SimulationRecord {
        SimulationRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_common_iso_forms() {
        assert!(is_iso8601("1850-01-01"));
        assert!(is_iso8601("2025-09-26T11:49:24Z"));
        assert!(is_iso8601("2025-09-26T11:49:24.123+02:00"));
        assert!(is_iso8601("2025-09-26T11:49:24"));
        assert!(!is_iso8601("26/09/2025"));
    }

    #[test]
    fn year_month_is_accepted() {
        assert!(is_iso8601("0001-01"));
        assert!(!is_iso8601("0001-13"));
    }

    #[test]
    fn later_duplicates_are_dropped() {
        let (kept, violations) = sanitize_records(vec![record("a"), record("b"), record("a")]);
        let ids: Vec<&str> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(violations, [ValidationError::DuplicateId { id: "a".to_string() }]);
    }

    #[test]
    fn empty_id_is_dropped() {
        let (kept, violations) = sanitize_records(vec![record("a"), record("")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(violations, [ValidationError::EmptyId { position: 1 }]);
    }

    #[test]
    fn bad_date_becomes_absent_and_is_reported() {
        let mut bad = record("a");
        bad.model_end_date = Some("sometime".to_string());
        bad.run_date = Some("2025-01-02".to_string());
        let (kept, violations) = sanitize_records(vec![bad]);
        assert_eq!(kept[0].model_end_date, None);
        assert_eq!(kept[0].run_date.as_deref(), Some("2025-01-02"));
        assert!(matches!(
            violations.as_slice(),
            [ValidationError::InvalidDate { field: "modelEndDate", .. }]
        ));
    }

    #[test]
    fn empty_date_is_absent_without_violation() {
        let mut draft = record("a");
        draft.upload_date = Some(String::new());
        let (kept, violations) = sanitize_records(vec![draft]);
        assert_eq!(kept[0].upload_date, None);
        assert!(violations.is_empty());
    }

    #[test]
    fn normalize_dates_rejects_garbage() {
        let mut draft = record("");
        draft.upload_date = Some(" ".to_string());
        assert!(normalize_dates(&mut draft).is_ok());
        assert_eq!(draft.upload_date, None);

        draft.run_date = Some("last week".to_string());
        assert!(matches!(
            normalize_dates(&mut draft),
            Err(ValidationError::InvalidDate { field: "runDate", .. })
        ));
    }

    #[test]
    fn validate_lists_every_violation() {
        let mut bad = record("b");
        bad.upload_date = Some("yesterday".to_string());
        let violations = validate_records(&[record("a"), bad, record("a"), record("")]);
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn absent_dates_are_fine() {
        assert!(validate_records(&[record("a"), record("b")]).is_empty());
    }
}
