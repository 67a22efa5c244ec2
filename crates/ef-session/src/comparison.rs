//! Comparison table state.
//!
//! Columns are the selected record ids. `order` is a permutation of column
//! indices, `hidden` holds ids that stay selected but are not displayed, and
//! each [`Section`] has an independent expanded flag. All transitions go
//! through [`ComparisonState::reduce`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::SessionResult;
use crate::selection::{MAX_SELECTION, SelectionSet};
use crate::storage::{Storage, load_json, save_json};

/// Storage key for the persisted hidden columns.
pub const HIDDEN_KEY: &str = "compare_hidden_cols";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    Configuration,
    KeyFeatures,
    KnownIssues,
    Notes,
    Locations,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Configuration,
        Section::KeyFeatures,
        Section::KnownIssues,
        Section::Notes,
        Section::Locations,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Section::Configuration => "configuration",
            Section::KeyFeatures => "keyFeatures",
            Section::KnownIssues => "knownIssues",
            Section::Notes => "notes",
            Section::Locations => "locations",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Section::Configuration => "Configuration",
            Section::KeyFeatures => "Key Features",
            Section::KnownIssues => "Known Issues",
            Section::Notes => "Notes",
            Section::Locations => "Locations",
        }
    }

    pub fn default_expanded(self) -> bool {
        matches!(self, Section::Configuration | Section::Locations)
    }

    pub fn from_key(key: &str) -> Option<Section> {
        Section::ALL.into_iter().find(|s| s.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonAction {
    Select(String),
    Deselect(String),
    /// Move the entry at position `from` of `order` to position `to`.
    Reorder { from: usize, to: usize },
    /// Hide the column with this index into the selection.
    Hide(usize),
    Show(String),
    UnhideAll,
    ToggleSection(Section),
    SyncFromSelection(Vec<String>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    pub source: Option<usize>,
    pub over: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonState {
    columns: Vec<String>,
    order: Vec<usize>,
    hidden: Vec<String>,
    expanded: BTreeMap<Section, bool>,
    drag: DragState,
}

impl Default for ComparisonState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Columns follow the selection invariants: unique ids, at most [`MAX_SELECTION`].
fn unique_capped(ids: Vec<String>) -> Vec<String> {
    SelectionSet::from_ids(ids).ids().to_vec()
}

impl ComparisonState {
    pub fn new(columns: Vec<String>) -> Self {
        let columns = unique_capped(columns);
        let order = (0..columns.len()).collect();
        Self {
            columns,
            order,
            hidden: Vec::new(),
            expanded: Section::ALL
                .into_iter()
                .map(|s| (s, s.default_expanded()))
                .collect(),
            drag: DragState::default(),
        }
    }

    /// Restore persisted hidden ids; ids no longer selected are pruned.
    pub fn with_hidden(mut self, hidden: Vec<String>) -> Self {
        for id in hidden {
            if self.columns.contains(&id) && !self.hidden.contains(&id) {
                self.hidden.push(id);
            }
        }
        self
    }

    pub fn load<S: Storage + ?Sized>(columns: Vec<String>, storage: &S) -> Self {
        let hidden: Vec<String> = load_json(storage, HIDDEN_KEY);
        Self::new(columns).with_hidden(hidden)
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> SessionResult<()> {
        save_json(storage, HIDDEN_KEY, &self.hidden)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn hidden(&self) -> &[String] {
        &self.hidden
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn is_expanded(&self, section: Section) -> bool {
        self.expanded
            .get(&section)
            .copied()
            .unwrap_or_else(|| section.default_expanded())
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.iter().any(|h| h == id)
    }

    /// Column indices to render, in display order, hidden columns skipped.
    pub fn visible_columns(&self) -> Vec<usize> {
        self.order
            .iter()
            .copied()
            .filter(|&col| !self.is_hidden(&self.columns[col]))
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible_columns()
            .into_iter()
            .map(|col| self.columns[col].as_str())
            .collect()
    }

    /// Apply one action. Returns whether the state changed.
    pub fn reduce(&mut self, action: ComparisonAction) -> bool {
        match action {
            ComparisonAction::Select(id) => {
                if self.columns.contains(&id) || self.columns.len() >= MAX_SELECTION {
                    return false;
                }
                let mut next = self.columns.clone();
                next.push(id);
                self.sync(next)
            }
            ComparisonAction::Deselect(id) => {
                if !self.columns.contains(&id) {
                    return false;
                }
                let next = self.columns.iter().filter(|c| **c != id).cloned().collect();
                self.sync(next)
            }
            ComparisonAction::Reorder { from, to } => self.reorder(from, to),
            ComparisonAction::Hide(col) => {
                let Some(id) = self.columns.get(col) else {
                    return false;
                };
                if self.is_hidden(id) {
                    return false;
                }
                self.hidden.push(id.clone());
                true
            }
            ComparisonAction::Show(id) => {
                let before = self.hidden.len();
                self.hidden.retain(|h| *h != id);
                self.hidden.len() != before
            }
            ComparisonAction::UnhideAll => {
                let changed = !self.hidden.is_empty();
                self.hidden.clear();
                changed
            }
            ComparisonAction::ToggleSection(section) => {
                let expanded = self.is_expanded(section);
                self.expanded.insert(section, !expanded);
                true
            }
            ComparisonAction::SyncFromSelection(ids) => self.sync(ids),
        }
    }

    fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from == to || from >= self.order.len() || to >= self.order.len() {
            return false;
        }
        let moved = self.order.remove(from);
        self.order.insert(to, moved);
        true
    }

    /// Reconcile with the upstream selection. A membership change resets
    /// `order` to identity; a pure reordering keeps the displayed sequence.
    /// Hidden ids no longer selected are dropped either way.
    fn sync(&mut self, ids: Vec<String>) -> bool {
        let ids = unique_capped(ids);
        if ids == self.columns {
            return false;
        }

        let current: HashSet<&String> = self.columns.iter().collect();
        let incoming: HashSet<&String> = ids.iter().collect();
        let same_members = current == incoming && ids.len() == self.columns.len();

        let order = if same_members {
            self.order
                .iter()
                .filter_map(|&col| ids.iter().position(|id| *id == self.columns[col]))
                .collect()
        } else {
            (0..ids.len()).collect()
        };

        self.hidden.retain(|h| ids.contains(h));
        self.columns = ids;
        self.order = order;
        self.drag = DragState::default();
        true
    }

    pub fn drag_start(&mut self, col: usize) {
        if col < self.columns.len() {
            self.drag.source = Some(col);
        }
    }

    pub fn drag_over(&mut self, col: usize) {
        self.drag.over = Some(col);
    }

    pub fn drag_leave(&mut self) {
        self.drag.over = None;
    }

    /// Drop the dragged column onto `target` (a column index). The source is
    /// removed from `order` and reinserted at the target's position.
    pub fn drop_on(&mut self, target: usize) -> bool {
        let source = self.drag.source.take();
        self.drag.over = None;

        let Some(source) = source else {
            return false;
        };
        if source == target {
            return false;
        }

        let from = self.order.iter().position(|&c| c == source);
        let to = self.order.iter().position(|&c| c == target);
        match (from, to) {
            (Some(from), Some(to)) => self.reduce(ComparisonAction::Reorder { from, to }),
            _ => false,
        }
    }
}
