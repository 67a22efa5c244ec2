//! Required-field completeness of a simulation about to be submitted.
//!
//! Fields are grouped by form section. Configuration, model setup and version
//! control gate submission; paths are tracked but advisory.

use std::fmt;

use crate::schema::{SimulationRecord, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftSection {
    Configuration,
    ModelSetup,
    VersionControl,
    Paths,
}

impl DraftSection {
    pub const ALL: [DraftSection; 4] = [
        DraftSection::Configuration,
        DraftSection::ModelSetup,
        DraftSection::VersionControl,
        DraftSection::Paths,
    ];

    pub fn title(self) -> &'static str {
        match self {
            DraftSection::Configuration => "Configuration",
            DraftSection::ModelSetup => "Model Setup",
            DraftSection::VersionControl => "Version Control",
            DraftSection::Paths => "Paths",
        }
    }

    /// Whether an incomplete section blocks submission.
    pub fn gates_submission(self) -> bool {
        !matches!(self, DraftSection::Paths)
    }

    fn required(self) -> &'static [&'static str] {
        match self {
            DraftSection::Configuration => &["name", "status", "campaignId", "experimentTypeId"],
            DraftSection::ModelSetup => &["machineId", "compiler"],
            DraftSection::VersionControl => &["branch", "gitHash"],
            DraftSection::Paths => &["outputPath", "runScriptPaths"],
        }
    }
}

impl fmt::Display for DraftSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn is_satisfied(record: &SimulationRecord, field: &str) -> bool {
    match field {
        "name" => !record.name.trim().is_empty(),
        "status" => record.status != Status::NotStarted,
        "campaignId" => filled(&record.campaign_id),
        "experimentTypeId" => filled(&record.experiment_type_id),
        "machineId" => filled(&record.machine_id),
        "compiler" => filled(&record.compiler),
        "branch" => filled(&record.branch),
        "gitHash" => filled(&record.git_hash),
        "outputPath" => filled(&record.output_path),
        "runScriptPaths" => !record.run_script_paths.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    pub section: DraftSection,
    pub required: usize,
    pub satisfied: usize,
    pub missing: Vec<&'static str>,
}

impl SectionProgress {
    pub fn is_complete(&self) -> bool {
        self.satisfied >= self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReport {
    pub sections: Vec<SectionProgress>,
}

impl DraftReport {
    /// All gating sections are complete.
    pub fn is_ready(&self) -> bool {
        self.sections
            .iter()
            .filter(|p| p.section.gates_submission())
            .all(SectionProgress::is_complete)
    }

    /// Missing fields that block submission.
    pub fn blocking(&self) -> Vec<&'static str> {
        self.sections
            .iter()
            .filter(|p| p.section.gates_submission())
            .flat_map(|p| p.missing.iter().copied())
            .collect()
    }

    pub fn section(&self, section: DraftSection) -> Option<&SectionProgress> {
        self.sections.iter().find(|p| p.section == section)
    }
}

pub fn check_draft(record: &SimulationRecord) -> DraftReport {
    let sections = DraftSection::ALL
        .into_iter()
        .map(|section| {
            let required = section.required();
            let missing: Vec<&'static str> = required
                .iter()
                .copied()
                .filter(|field| !is_satisfied(record, field))
                .collect();
            SectionProgress {
                section,
                required: required.len(),
                satisfied: required.len() - missing.len(),
                missing,
            }
        })
        .collect();
    DraftReport { sections }
}
