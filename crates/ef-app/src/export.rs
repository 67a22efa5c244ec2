//! CSV export of the browse table.
//!
//! The file starts with a UTF-8 byte order mark so spreadsheet tools pick
//! the right encoding. Fields containing a comma, quote or newline are quoted
//! with inner quotes doubled.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use ef_core::SimulationRecord;
use ef_session::PLACEHOLDER;

use crate::error::{AppError, AppResult};

const BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportColumn {
    Name,
    SimulationType,
    Status,
    VersionTag,
    GridName,
    Compset,
    ModelDates,
    MachineId,
    Vars,
    Diagnostics,
    UploadDate,
    GitHash,
    Branch,
    RunDate,
    LastEditedAt,
}

impl ExportColumn {
    pub const ALL: [ExportColumn; 15] = [
        ExportColumn::Name,
        ExportColumn::SimulationType,
        ExportColumn::Status,
        ExportColumn::VersionTag,
        ExportColumn::GridName,
        ExportColumn::Compset,
        ExportColumn::ModelDates,
        ExportColumn::MachineId,
        ExportColumn::Vars,
        ExportColumn::Diagnostics,
        ExportColumn::UploadDate,
        ExportColumn::GitHash,
        ExportColumn::Branch,
        ExportColumn::RunDate,
        ExportColumn::LastEditedAt,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ExportColumn::Name => "name",
            ExportColumn::SimulationType => "simulationType",
            ExportColumn::Status => "status",
            ExportColumn::VersionTag => "versionTag",
            ExportColumn::GridName => "gridName",
            ExportColumn::Compset => "compset",
            ExportColumn::ModelDates => "modelDates",
            ExportColumn::MachineId => "machineId",
            ExportColumn::Vars => "vars",
            ExportColumn::Diagnostics => "diagnostics",
            ExportColumn::UploadDate => "uploadDate",
            ExportColumn::GitHash => "gitHash",
            ExportColumn::Branch => "branch",
            ExportColumn::RunDate => "runDate",
            ExportColumn::LastEditedAt => "lastEditedAt",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            ExportColumn::Name => "Name",
            ExportColumn::SimulationType => "Type",
            ExportColumn::Status => "Status",
            ExportColumn::VersionTag => "Version / Tag",
            ExportColumn::GridName => "Grid",
            ExportColumn::Compset => "Compset",
            ExportColumn::ModelDates => "Dates (Model)",
            ExportColumn::MachineId => "Machine",
            ExportColumn::Vars => "Vars",
            ExportColumn::Diagnostics => "Diagnostics",
            ExportColumn::UploadDate => "Submitted",
            ExportColumn::GitHash => "Git",
            ExportColumn::Branch => "Branch",
            ExportColumn::RunDate => "Run Date",
            ExportColumn::LastEditedAt => "Edited",
        }
    }

    pub fn from_key(key: &str) -> Option<ExportColumn> {
        ExportColumn::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Cell text as written to the file.
    pub fn value(self, record: &SimulationRecord) -> String {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        match self {
            ExportColumn::Name => record.name.clone(),
            ExportColumn::SimulationType => record.simulation_type.to_string(),
            ExportColumn::Status => record.status.to_string(),
            ExportColumn::VersionTag => text(&record.version_tag),
            ExportColumn::GridName => text(&record.grid_name),
            ExportColumn::Compset => text(&record.compset),
            ExportColumn::ModelDates => format!(
                "{} → {}",
                format_date(record.model_start_date.as_deref()),
                format_date(record.model_end_date.as_deref())
            ),
            ExportColumn::MachineId => text(&record.machine_id),
            ExportColumn::Vars => record.variables.len().to_string(),
            ExportColumn::Diagnostics => format!(
                "diag:{}; pace:{}",
                record.diagnostic_links.len(),
                record.pace_links.len()
            ),
            ExportColumn::UploadDate => format_date(record.upload_date.as_deref()),
            ExportColumn::GitHash => record
                .git_hash
                .as_deref()
                .map(|hash| hash.chars().take(7).collect())
                .unwrap_or_default(),
            ExportColumn::Branch => text(&record.branch),
            ExportColumn::RunDate => format_date(record.run_date.as_deref()),
            ExportColumn::LastEditedAt => format_date(record.last_edited_at.as_deref()),
        }
    }

    /// Ordering for present values; missing values are handled by the caller.
    fn compare(self, a: &SimulationRecord, b: &SimulationRecord) -> Ordering {
        match self {
            ExportColumn::Vars => a.variables.len().cmp(&b.variables.len()),
            ExportColumn::Diagnostics => (a.diagnostic_links.len() + a.pace_links.len())
                .cmp(&(b.diagnostic_links.len() + b.pace_links.len())),
            ExportColumn::ModelDates => a.model_start_date.cmp(&b.model_start_date),
            ExportColumn::UploadDate => a.upload_date.cmp(&b.upload_date),
            ExportColumn::RunDate => a.run_date.cmp(&b.run_date),
            ExportColumn::LastEditedAt => a.last_edited_at.cmp(&b.last_edited_at),
            other => other.value(a).cmp(&other.value(b)),
        }
    }
}

impl fmt::Display for ExportColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ExportColumn {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        ExportColumn::from_key(s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown column: {s}")))
    }
}

fn is_missing(column: ExportColumn, record: &SimulationRecord) -> bool {
    match column {
        ExportColumn::ModelDates => record.model_start_date.is_none(),
        ExportColumn::UploadDate => record.upload_date.is_none(),
        ExportColumn::RunDate => record.run_date.is_none(),
        ExportColumn::LastEditedAt => record.last_edited_at.is_none(),
        ExportColumn::Vars | ExportColumn::Diagnostics => false,
        other => other.value(record).is_empty(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: ExportColumn,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: ExportColumn) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: ExportColumn) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// `column` for ascending, `-column` for descending.
impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.strip_prefix('-') {
            Some(key) => Ok(SortKey::desc(key.parse()?)),
            None => Ok(SortKey::asc(s.parse()?)),
        }
    }
}

/// Newest submissions first, then by name.
pub fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey::desc(ExportColumn::UploadDate),
        SortKey::asc(ExportColumn::Name),
    ]
}

/// Stable multi-key sort. Missing values go last regardless of direction.
pub fn sort_records(records: &mut [&SimulationRecord], keys: &[SortKey]) {
    records.sort_by(|a, b| {
        for key in keys {
            let ordering = match (is_missing(key.column, a), is_missing(key.column, b)) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => {
                    let ordering = key.column.compare(a, b);
                    if key.descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// `yyyy-mm-dd`, or the placeholder when absent or unparseable.
pub fn format_date(value: Option<&str>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        });
    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn write_csv<W: Write>(
    mut writer: W,
    records: &[&SimulationRecord],
    columns: &[ExportColumn],
) -> AppResult<()> {
    writer.write_all(BOM.as_bytes())?;

    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    csv.write_record(columns.iter().map(|c| c.header()))?;
    for record in records {
        csv.write_record(columns.iter().map(|c| c.value(record)))?;
    }
    csv.flush()?;
    Ok(())
}

/// Sort `records` and write them out. Returns the number of data rows.
pub fn export_records<W: Write>(
    writer: W,
    mut records: Vec<&SimulationRecord>,
    sort: &[SortKey],
    columns: &[ExportColumn],
) -> AppResult<usize> {
    if columns.is_empty() {
        return Err(AppError::InvalidInput("No columns to export".to_string()));
    }
    sort_records(&mut records, sort);
    write_csv(writer, &records, columns)?;
    tracing::info!(rows = records.len(), columns = columns.len(), "exported csv");
    Ok(records.len())
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("simulations_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_core::{ExternalLink, Status};

    fn record(id: &str, name: &str, upload: Option<&str>) -> SimulationRecord {
        SimulationRecord {
            id: id.to_string(),
            name: name.to_string(),
            upload_date: upload.map(str::to_string),
            ..Default::default()
        }
    }

    fn export(records: &[&SimulationRecord], columns: &[ExportColumn]) -> String {
        let mut out = Vec::new();
        write_csv(&mut out, records, columns).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn starts_with_bom_and_quotes_when_needed() {
        let mut r = record("a", "ocean, \"spun up\"", None);
        r.branch = Some("line\nbreak".to_string());
        let csv = export(&[&r], &[ExportColumn::Name, ExportColumn::Branch]);
        assert!(csv.starts_with('\u{feff}'));
        assert_eq!(
            csv.trim_start_matches('\u{feff}'),
            "Name,Branch\n\"ocean, \"\"spun up\"\"\",\"line\nbreak\"\n"
        );
    }

    #[test]
    fn derived_cells() {
        let mut r = record("a", "Run A", Some("2024-03-05T10:00:00Z"));
        r.status = Status::Running;
        r.git_hash = Some("0123456789abcdef".to_string());
        r.variables = vec!["TS".into(), "PRECT".into()];
        r.diagnostic_links = vec![ExternalLink::new("https://d.test", "d")];
        r.model_start_date = Some("1850-01-01".to_string());

        assert_eq!(ExportColumn::Status.value(&r), "running");
        assert_eq!(ExportColumn::GitHash.value(&r), "0123456");
        assert_eq!(ExportColumn::Vars.value(&r), "2");
        assert_eq!(ExportColumn::Diagnostics.value(&r), "diag:1; pace:0");
        assert_eq!(ExportColumn::UploadDate.value(&r), "2024-03-05");
        assert_eq!(ExportColumn::ModelDates.value(&r), "1850-01-01 → —");
    }

    #[test]
    fn default_sort_is_newest_then_name() {
        let a = record("a", "beta", Some("2024-01-01"));
        let b = record("b", "alpha", Some("2024-01-01"));
        let c = record("c", "gamma", Some("2024-06-01"));
        let d = record("d", "delta", None);
        let mut rows = vec![&d, &a, &b, &c];
        sort_records(&mut rows, &default_sort());
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a", "d"]);
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!(
            "-runDate".parse::<SortKey>().unwrap(),
            SortKey::desc(ExportColumn::RunDate)
        );
        assert_eq!("name".parse::<SortKey>().unwrap(), SortKey::asc(ExportColumn::Name));
        assert!("bogus".parse::<SortKey>().is_err());
    }

    #[test]
    fn file_name_uses_local_timestamp() {
        let now = Local::now();
        let name = export_file_name(now);
        assert!(name.starts_with("simulations_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "simulations_20240101_000000.csv".len());
    }
}
