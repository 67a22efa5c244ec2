//! Capped selection of record ids shared across views.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::SessionResult;
use crate::storage::{Storage, load_json, save_json};

/// Maximum number of simulations comparable at once.
pub const MAX_SELECTION: usize = 5;

/// Storage key for the persisted selection.
pub const SELECTION_KEY: &str = "selectedSimulationIds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The set was full; nothing changed.
    Rejected,
}

/// Ordered set of at most [`MAX_SELECTION`] unique ids, appended at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
    members: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary ids, dropping duplicates and anything past the cap.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for id in ids {
            if set.is_full() {
                break;
            }
            set.insert(id.into());
        }
        set
    }

    /// Reconcile a row-selection object: the first [`MAX_SELECTION`] keys
    /// marked `true`, in the map's own key order.
    pub fn from_row_selection(selection: &IndexMap<String, bool>) -> Self {
        Self::from_ids(
            selection
                .iter()
                .filter(|(_, selected)| **selected)
                .map(|(id, _)| id.as_str()),
        )
    }

    pub fn to_row_selection(&self) -> IndexMap<String, bool> {
        self.ids.iter().map(|id| (id.clone(), true)).collect()
    }

    fn insert(&mut self, id: String) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.ids.push(id);
        true
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= MAX_SELECTION
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Remove `id` if present, otherwise add it when there is room.
    pub fn toggle(&mut self, id: &str) -> Toggle {
        if self.remove(id) {
            return Toggle::Removed;
        }
        if self.is_full() {
            tracing::debug!(id, "selection full, ignoring add");
            return Toggle::Rejected;
        }
        self.insert(id.to_string());
        Toggle::Added
    }

    pub fn remove(&mut self, id: &str) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.ids.retain(|existing| existing != id);
        true
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.members.clear();
    }

    /// Load the persisted selection. Invalid data yields an empty set;
    /// oversized or duplicated arrays are reconciled.
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        let ids: Vec<String> = load_json(storage, SELECTION_KEY);
        Self::from_ids(ids)
    }

    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> SessionResult<()> {
        save_json(storage, SELECTION_KEY, &self.ids)
    }
}

/// Limit a row-selection object to its first `max` selected keys.
pub fn limit_row_selection(selection: &IndexMap<String, bool>, max: usize) -> IndexMap<String, bool> {
    selection
        .iter()
        .filter(|(_, selected)| **selected)
        .take(max)
        .map(|(id, _)| (id.clone(), true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn full() -> SelectionSet {
        SelectionSet::from_ids(["a", "b", "c", "d", "e"])
    }

    #[test]
    fn toggle_at_cap_is_ignored() {
        let mut selection = full();
        assert_eq!(selection.toggle("f"), Toggle::Rejected);
        assert_eq!(selection.ids(), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn toggle_removes_even_when_full() {
        let mut selection = full();
        assert_eq!(selection.toggle("c"), Toggle::Removed);
        assert_eq!(selection.ids(), ["a", "b", "d", "e"]);
        assert_eq!(selection.toggle("f"), Toggle::Added);
        assert_eq!(selection.ids(), ["a", "b", "d", "e", "f"]);
    }

    #[test]
    fn from_ids_dedups_and_caps() {
        let selection = SelectionSet::from_ids(["a", "a", "b", "c", "d", "e", "f"]);
        assert_eq!(selection.ids(), ["a", "b", "c", "d", "e"]);
        assert!(!selection.contains("f"));
    }

    #[test]
    fn row_selection_keeps_first_selected_keys() {
        let mut rows = IndexMap::new();
        for (id, selected) in [
            ("r1", true),
            ("r2", false),
            ("r3", true),
            ("r4", true),
            ("r5", true),
            ("r6", true),
            ("r7", true),
        ] {
            rows.insert(id.to_string(), selected);
        }

        let selection = SelectionSet::from_row_selection(&rows);
        assert_eq!(selection.ids(), ["r1", "r3", "r4", "r5", "r6"]);

        let limited = limit_row_selection(&rows, 2);
        assert_eq!(limited.keys().collect::<Vec<_>>(), ["r1", "r3"]);
    }

    #[test]
    fn clear_empties() {
        let mut selection = full();
        selection.clear();
        assert!(selection.is_empty());
        assert!(!selection.contains("a"));
    }

    #[test]
    fn persisted_round_trip() {
        let mut storage = MemoryStorage::new();
        let selection = SelectionSet::from_ids(["x", "y"]);
        selection.save(&mut storage).unwrap();
        assert_eq!(SelectionSet::load(&storage), selection);
    }

    #[test]
    fn unparseable_persisted_value_loads_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(SELECTION_KEY, "[\"a\", 3").unwrap();
        assert!(SelectionSet::load(&storage).is_empty());
    }
}
