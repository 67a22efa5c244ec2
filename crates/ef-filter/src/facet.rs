use std::fmt;
use std::str::FromStr;

use crate::FilterError;

/// One filterable dimension of a simulation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    CampaignId,
    ExperimentTypeId,
    Variables,
    MachineId,
    GridName,
    VersionTag,
    Status,
    SimulationType,
    Compset,
    ModelStartDate,
    ModelEndDate,
    UploadStartDate,
    UploadEndDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetKind {
    /// Ordered set of selected values, OR-ed together.
    MultiSelect,
    /// Single date bound string.
    DateBound,
}

impl Facet {
    pub const ALL: [Facet; 13] = [
        Facet::CampaignId,
        Facet::ExperimentTypeId,
        Facet::Variables,
        Facet::MachineId,
        Facet::GridName,
        Facet::VersionTag,
        Facet::Status,
        Facet::SimulationType,
        Facet::Compset,
        Facet::ModelStartDate,
        Facet::ModelEndDate,
        Facet::UploadStartDate,
        Facet::UploadEndDate,
    ];

    pub const MULTI_SELECT: [Facet; 9] = [
        Facet::CampaignId,
        Facet::ExperimentTypeId,
        Facet::Variables,
        Facet::MachineId,
        Facet::GridName,
        Facet::VersionTag,
        Facet::Status,
        Facet::SimulationType,
        Facet::Compset,
    ];

    /// Query-string parameter name.
    pub fn key(self) -> &'static str {
        match self {
            Facet::CampaignId => "campaignId",
            Facet::ExperimentTypeId => "experimentTypeId",
            Facet::Variables => "variables",
            Facet::MachineId => "machineId",
            Facet::GridName => "gridName",
            Facet::VersionTag => "versionTag",
            Facet::Status => "status",
            Facet::SimulationType => "simulationType",
            Facet::Compset => "compset",
            Facet::ModelStartDate => "modelStartDate",
            Facet::ModelEndDate => "modelEndDate",
            Facet::UploadStartDate => "uploadStartDate",
            Facet::UploadEndDate => "uploadEndDate",
        }
    }

    pub fn from_key(key: &str) -> Option<Facet> {
        Facet::ALL.into_iter().find(|facet| facet.key() == key)
    }

    pub fn kind(self) -> FacetKind {
        match self {
            Facet::ModelStartDate
            | Facet::ModelEndDate
            | Facet::UploadStartDate
            | Facet::UploadEndDate => FacetKind::DateBound,
            _ => FacetKind::MultiSelect,
        }
    }

    pub fn is_multi_select(self) -> bool {
        self.kind() == FacetKind::MultiSelect
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Facet {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Facet::from_key(s).ok_or_else(|| FilterError::UnknownFacet(s.to_string()))
    }
}
