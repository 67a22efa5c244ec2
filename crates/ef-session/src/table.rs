//! Comparison table rendering.
//!
//! Metric rows are grouped by [`Section`]; each row has one cell per visible
//! column in display order. Missing values render as [`PLACEHOLDER`].

use std::collections::HashMap;

use ef_core::{ExternalLink, SimulationRecord, looks_like_url};

use crate::comparison::{ComparisonState, Section};

pub const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    List(Vec<String>),
    Links(Vec<ExternalLink>),
    Missing,
}

impl CellValue {
    fn text(value: Option<&str>) -> CellValue {
        match value {
            Some(v) if !v.is_empty() => CellValue::Text(v.to_string()),
            _ => CellValue::Missing,
        }
    }

    fn list(values: &[String]) -> CellValue {
        if values.is_empty() {
            CellValue::Missing
        } else {
            CellValue::List(values.to_vec())
        }
    }

    fn links(links: &[ExternalLink]) -> CellValue {
        if links.is_empty() {
            CellValue::Missing
        } else {
            CellValue::Links(links.to_vec())
        }
    }

    /// Paths that look like URLs or rooted paths become links; others stay text.
    fn paths(paths: &[String]) -> CellValue {
        if paths.is_empty() {
            return CellValue::Missing;
        }
        if paths.iter().all(|p| looks_like_url(p)) {
            CellValue::Links(
                paths
                    .iter()
                    .map(|p| ExternalLink::new(p.as_str(), p.as_str()))
                    .collect(),
            )
        } else {
            CellValue::List(paths.to_vec())
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::List(values) => values.join(", "),
            CellValue::Links(links) => links
                .iter()
                .map(|link| {
                    if link.label == link.url {
                        link.url.clone()
                    } else {
                        format!("{} ({})", link.label, link.url)
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
            CellValue::Missing => PLACEHOLDER.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

struct MetricRow {
    section: Section,
    label: &'static str,
    extract: fn(&SimulationRecord) -> CellValue,
}

const METRICS: &[MetricRow] = &[
    MetricRow {
        section: Section::Configuration,
        label: "Simulation Name",
        extract: |r| CellValue::text(Some(r.name.as_str())),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Model Start Date",
        extract: |r| CellValue::text(r.model_start_date.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Model End Date",
        extract: |r| CellValue::text(r.model_end_date.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Run Date",
        extract: |r| CellValue::text(r.run_date.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Repo",
        extract: |r| CellValue::text(r.external_repo_url.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Branch",
        extract: |r| CellValue::text(r.branch.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Tag",
        extract: |r| CellValue::text(r.version_tag.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Campaign",
        extract: |r| CellValue::text(r.campaign_id.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Compset",
        extract: |r| CellValue::text(r.compset.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Resolution",
        extract: |r| CellValue::text(r.grid_name.as_deref()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Machine",
        extract: |r| CellValue::text(r.machine_label()),
    },
    MetricRow {
        section: Section::Configuration,
        label: "Compiler",
        extract: |r| CellValue::text(r.compiler.as_deref()),
    },
    MetricRow {
        section: Section::KeyFeatures,
        label: "Key Features",
        extract: |r| CellValue::text(r.key_features.as_deref()),
    },
    MetricRow {
        section: Section::KnownIssues,
        label: "Known Issues",
        extract: |r| CellValue::text(r.known_issues.as_deref()),
    },
    MetricRow {
        section: Section::Notes,
        label: "Notes",
        extract: |r| CellValue::text(r.notes.as_deref()),
    },
    MetricRow {
        section: Section::Locations,
        label: "Run Scripts",
        extract: |r| CellValue::paths(&r.run_script_paths),
    },
    MetricRow {
        section: Section::Locations,
        label: "Output Location",
        extract: |r| CellValue::paths(r.output_path.as_slice()),
    },
    MetricRow {
        section: Section::Locations,
        label: "Archive Location",
        extract: |r| CellValue::paths(&r.archive_paths),
    },
    MetricRow {
        section: Section::Locations,
        label: "Batch Logs",
        extract: |r| CellValue::list(&r.batch_log_paths),
    },
    MetricRow {
        section: Section::Locations,
        label: "Diagnostic Links",
        extract: |r| CellValue::links(&r.diagnostic_links),
    },
    MetricRow {
        section: Section::Locations,
        label: "PACE Links",
        extract: |r| CellValue::links(&r.pace_links),
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    /// Index into the selection.
    pub column: usize,
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub label: &'static str,
    pub cells: Vec<CellValue>,
    /// True when the visible cells do not all agree.
    pub differs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub section: Section,
    pub expanded: bool,
    /// Empty when the section is collapsed.
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTable {
    pub headers: Vec<ColumnHeader>,
    pub sections: Vec<RenderedSection>,
    /// Hidden columns as `(id, title)`, for "show" controls.
    pub hidden: Vec<(String, String)>,
}

impl ComparisonTable {
    pub fn row(&self, label: &str) -> Option<&RenderedRow> {
        self.sections
            .iter()
            .flat_map(|s| s.rows.iter())
            .find(|r| r.label == label)
    }
}

fn title_for(id: &str, by_id: &HashMap<&str, &SimulationRecord>) -> String {
    by_id
        .get(id)
        .map(|r| r.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(id)
        .to_string()
}

pub fn render_table(state: &ComparisonState, records: &[SimulationRecord]) -> ComparisonTable {
    let by_id: HashMap<&str, &SimulationRecord> =
        records.iter().map(|r| (r.id.as_str(), r)).collect();

    let visible = state.visible_columns();
    let headers = visible
        .iter()
        .map(|&column| {
            let id = &state.columns()[column];
            ColumnHeader {
                column,
                id: id.clone(),
                title: title_for(id, &by_id),
            }
        })
        .collect();

    let sections = Section::ALL
        .into_iter()
        .map(|section| {
            let expanded = state.is_expanded(section);
            let rows = if expanded {
                METRICS
                    .iter()
                    .filter(|m| m.section == section)
                    .map(|metric| {
                        let cells: Vec<CellValue> = visible
                            .iter()
                            .map(|&column| {
                                by_id
                                    .get(state.columns()[column].as_str())
                                    .map(|r| (metric.extract)(r))
                                    .unwrap_or(CellValue::Missing)
                            })
                            .collect();
                        let differs = cells.windows(2).any(|pair| pair[0] != pair[1]);
                        RenderedRow {
                            label: metric.label,
                            cells,
                            differs,
                        }
                    })
                    .collect()
            } else {
                Vec::new()
            };
            RenderedSection {
                section,
                expanded,
                rows,
            }
        })
        .collect();

    let hidden = state
        .hidden()
        .iter()
        .map(|id| (id.clone(), title_for(id, &by_id)))
        .collect();

    ComparisonTable {
        headers,
        sections,
        hidden,
    }
}
