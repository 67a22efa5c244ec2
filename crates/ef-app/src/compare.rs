//! The selection and comparison state as one persisted session.
//!
//! State is loaded once when the session opens and saved after every
//! transition that changed it. Selection membership changes always flow
//! through the [`SelectionSet`] first and reach the comparison state as a
//! `SyncFromSelection`.

use ef_core::SimulationRecord;
use ef_session::{
    ComparisonAction, ComparisonState, ComparisonTable, SelectionSet, Storage, Toggle,
    render_table,
};

use crate::error::AppResult;

#[derive(Debug)]
pub struct CompareSession<S: Storage> {
    storage: S,
    selection: SelectionSet,
    comparison: ComparisonState,
}

impl<S: Storage> CompareSession<S> {
    pub fn open(storage: S) -> Self {
        let selection = SelectionSet::load(&storage);
        let comparison = ComparisonState::load(selection.ids().to_vec(), &storage);
        tracing::debug!(
            selected = selection.len(),
            hidden = comparison.hidden().len(),
            "opened compare session"
        );
        Self {
            storage,
            selection,
            comparison,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn comparison(&self) -> &ComparisonState {
        &self.comparison
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn toggle(&mut self, id: &str) -> AppResult<Toggle> {
        let outcome = self.selection.toggle(id);
        if outcome != Toggle::Rejected {
            self.sync_and_save()?;
        }
        Ok(outcome)
    }

    pub fn clear(&mut self) -> AppResult<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        self.selection.clear();
        self.sync_and_save()
    }

    /// Apply a comparison action. Returns whether anything changed.
    pub fn dispatch(&mut self, action: ComparisonAction) -> AppResult<bool> {
        let changed = match action {
            ComparisonAction::Select(id) => {
                if self.selection.contains(&id) {
                    false
                } else {
                    self.selection.toggle(&id) == Toggle::Added
                }
            }
            ComparisonAction::Deselect(id) => self.selection.remove(&id),
            ComparisonAction::SyncFromSelection(ids) => {
                let next = SelectionSet::from_ids(ids);
                let changed = next != self.selection;
                self.selection = next;
                changed
            }
            other => {
                let changed = self.comparison.reduce(other);
                if changed {
                    self.save()?;
                }
                return Ok(changed);
            }
        };

        if changed {
            self.sync_and_save()?;
        }
        Ok(changed)
    }

    /// Remove the column at `col` (an index into the selection) from the selection.
    pub fn remove_column(&mut self, col: usize) -> AppResult<bool> {
        let Some(id) = self.comparison.columns().get(col).cloned() else {
            return Ok(false);
        };
        self.dispatch(ComparisonAction::Deselect(id))
    }

    pub fn drag_start(&mut self, col: usize) {
        self.comparison.drag_start(col);
    }

    pub fn drag_over(&mut self, col: usize) {
        self.comparison.drag_over(col);
    }

    pub fn drag_leave(&mut self) {
        self.comparison.drag_leave();
    }

    pub fn drop_on(&mut self, col: usize) -> AppResult<bool> {
        let changed = self.comparison.drop_on(col);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    pub fn render(&self, records: &[SimulationRecord]) -> ComparisonTable {
        render_table(&self.comparison, records)
    }

    /// Selected records in selection order, for summaries.
    pub fn selected_records(&self, records: &[SimulationRecord]) -> Vec<SimulationRecord> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| records.iter().find(|r| &r.id == id))
            .cloned()
            .collect()
    }

    pub fn save(&mut self) -> AppResult<()> {
        self.selection.save(&mut self.storage)?;
        self.comparison.save(&mut self.storage)?;
        Ok(())
    }

    fn sync_and_save(&mut self) -> AppResult<()> {
        self.comparison
            .reduce(ComparisonAction::SyncFromSelection(self.selection.ids().to_vec()));
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ef_session::{MemoryStorage, SELECTION_KEY};

    fn session_with(ids: &[&str]) -> CompareSession<MemoryStorage> {
        let mut session = CompareSession::open(MemoryStorage::new());
        for id in ids {
            session.toggle(id).unwrap();
        }
        session
    }

    #[test]
    fn toggles_reach_comparison_columns() {
        let session = session_with(&["a", "b", "c"]);
        assert_eq!(session.comparison().columns(), ["a", "b", "c"]);
        assert_eq!(session.comparison().order(), [0, 1, 2]);
    }

    #[test]
    fn rejected_toggle_does_not_touch_state() {
        let mut session = session_with(&["a", "b", "c", "d", "e"]);
        assert_eq!(session.toggle("f").unwrap(), Toggle::Rejected);
        assert_eq!(session.selection().ids(), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn remove_column_prunes_hidden_and_resets_order() {
        let mut session = session_with(&["a", "b", "c"]);
        session
            .dispatch(ComparisonAction::Reorder { from: 0, to: 2 })
            .unwrap();
        session.dispatch(ComparisonAction::Hide(1)).unwrap();

        assert!(session.remove_column(1).unwrap());
        assert_eq!(session.selection().ids(), ["a", "c"]);
        assert_eq!(session.comparison().order(), [0, 1]);
        assert!(session.comparison().hidden().is_empty());
        assert!(!session.remove_column(9).unwrap());
    }

    #[test]
    fn state_survives_reopen() {
        let mut session = session_with(&["a", "b"]);
        session.dispatch(ComparisonAction::Hide(0)).unwrap();
        let storage = session.into_storage();

        let reopened = CompareSession::open(storage);
        assert_eq!(reopened.selection().ids(), ["a", "b"]);
        assert_eq!(reopened.comparison().hidden(), ["a"]);
        assert_eq!(reopened.comparison().visible_ids(), ["b"]);
    }

    #[test]
    fn corrupt_selection_opens_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(SELECTION_KEY, "oops").unwrap();
        let session = CompareSession::open(storage);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn select_and_sync_actions_go_through_selection() {
        let mut session = session_with(&["a"]);
        assert!(session.dispatch(ComparisonAction::Select("b".into())).unwrap());
        assert!(!session.dispatch(ComparisonAction::Select("b".into())).unwrap());
        assert_eq!(session.selection().ids(), ["a", "b"]);

        let many = ["v", "w", "x", "y", "z", "extra"].map(String::from).to_vec();
        assert!(session.dispatch(ComparisonAction::SyncFromSelection(many)).unwrap());
        assert_eq!(session.selection().ids(), ["v", "w", "x", "y", "z"]);
        assert_eq!(session.comparison().columns(), ["v", "w", "x", "y", "z"]);
    }

    #[test]
    fn drag_drop_reorders() {
        let mut session = session_with(&["a", "b", "c"]);
        session.drag_start(0);
        session.drag_over(2);
        assert!(session.drop_on(2).unwrap());
        assert_eq!(session.comparison().visible_ids(), ["b", "c", "a"]);
    }

    #[test]
    fn selected_records_follow_selection_order() {
        let records: Vec<SimulationRecord> = ["a", "b", "c"]
            .iter()
            .map(|id| SimulationRecord {
                id: id.to_string(),
                name: id.to_string(),
                ..Default::default()
            })
            .collect();
        let session = session_with(&["c", "a"]);
        let picked: Vec<String> = session
            .selected_records(&records)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(picked, ["c", "a"]);
    }
}
