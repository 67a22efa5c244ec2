//! Simulation record schema.
//!
//! Mirrors the JSON rows served by the catalog API (camelCase keys). Optional
//! scalars accept both `null` and a missing key; list fields treat `null` as empty.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::link::{ExternalLink, deserialize_links};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Complete,
    Running,
    #[default]
    NotStarted,
    Failed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Complete,
        Status::Running,
        Status::NotStarted,
        Status::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Complete => "complete",
            Status::Running => "running",
            Status::NotStarted => "not-started",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                what: "status",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SimulationType {
    #[default]
    Production,
    Master,
    Experimental,
}

impl SimulationType {
    pub const ALL: [SimulationType; 3] = [
        SimulationType::Production,
        SimulationType::Master,
        SimulationType::Experimental,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SimulationType::Production => "production",
            SimulationType::Master => "master",
            SimulationType::Experimental => "experimental",
        }
    }
}

impl fmt::Display for SimulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        SimulationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                what: "simulation type",
                value: s.to_string(),
            })
    }
}

/// Snapshot of the machine a simulation ran on, embedded in each record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(default)]
    pub gpu: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    // Identification
    /// Assigned by the server; empty on a draft.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub case_name: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub simulation_type: SimulationType,

    // Provenance
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub experiment_type_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variables: Vec<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub last_edited_by: Option<String>,
    #[serde(default)]
    pub last_edited_at: Option<String>,

    // Model setup
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub machine: Option<Machine>,
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub compset: Option<String>,
    #[serde(default)]
    pub comp_set_alias: Option<String>,
    #[serde(default)]
    pub grid_name: Option<String>,
    #[serde(default)]
    pub grid_resolution: Option<String>,
    #[serde(default)]
    pub initialization_type: Option<String>,
    #[serde(default)]
    pub parent_simulation_id: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub git_hash: Option<String>,
    #[serde(default, alias = "tag")]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub external_repo_url: Option<String>,

    // Timeline
    #[serde(default)]
    pub model_start_date: Option<String>,
    #[serde(default)]
    pub model_end_date: Option<String>,
    #[serde(default)]
    pub calendar_start_date: Option<String>,
    #[serde(default)]
    pub run_date: Option<String>,

    // Outputs
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub archive_paths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub run_script_paths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub batch_log_paths: Vec<String>,
    #[serde(
        default,
        alias = "postprocessingScriptPath",
        deserialize_with = "null_as_empty"
    )]
    pub postprocessing_script_paths: Vec<String>,

    // Diagnostics & performance
    #[serde(default, deserialize_with = "deserialize_links")]
    pub diagnostic_links: Vec<ExternalLink>,
    #[serde(default, deserialize_with = "deserialize_links")]
    pub pace_links: Vec<ExternalLink>,

    // Free text
    #[serde(default, rename = "notesMarkdown", alias = "notes")]
    pub notes: Option<String>,
    #[serde(default)]
    pub known_issues: Option<String>,
    #[serde(default)]
    pub key_features: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub annotations: Vec<String>,
}

impl SimulationRecord {
    /// Machine display name, falling back to the raw machine id.
    pub fn machine_label(&self) -> Option<&str> {
        self.machine
            .as_ref()
            .map(|m| m.name.as_str())
            .filter(|name| !name.is_empty())
            .or(self.machine_id.as_deref())
    }
}

/// Parse a JSON array of simulation records as served by the list endpoint.
pub fn parse_records(json: &str) -> CoreResult<Vec<SimulationRecord>> {
    Ok(serde_json::from_str(json)?)
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
