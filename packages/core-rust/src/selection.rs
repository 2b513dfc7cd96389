//! Multi-selection of record identifiers.
//!
//! The selection is a plain set of ids. "Select all" always works against
//! the ids currently visible, and bulk actions drain the selection. What
//! happens to selected ids that drop out of view after a filter change is an
//! explicit [`SelectionPolicy`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// What to do with selected ids that are no longer visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep them, so a selection can be built up across several filters.
    #[default]
    Retain,
    /// Drop them whenever the visible set changes.
    PruneToView,
}

/// State of the header "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectAllState {
    /// No visible record is selected.
    None,
    /// Some, but not all, visible records are selected.
    Partial,
    /// Every visible record is selected (and the view is not empty).
    All,
}

/// A bulk operation ready for the mutation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkIntent {
    /// Action name, such as `"delete"` or `"archive"`.
    pub action: String,
    /// Selected ids in ascending order.
    pub ids: Vec<RecordId>,
}

/// The set of currently selected record identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<RecordId>,
    policy: SelectionPolicy,
}

impl SelectionSet {
    #[must_use]
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            selected: BTreeSet::new(),
            policy,
        }
    }

    /// How hidden ids are treated on reconcile.
    #[must_use]
    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.selected.iter()
    }

    /// Flips membership of `id`. Works for ids outside the current view.
    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Header checkbox behaviour: clears the selection when it already
    /// equals the visible ids as a set, otherwise selects exactly the
    /// visible ids.
    pub fn select_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        let visible: BTreeSet<RecordId> = visible.into_iter().cloned().collect();
        if self.selected == visible {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
    }

    /// Header checkbox state for the given visible ids.
    pub fn select_all_state<'a, I>(&self, visible: I) -> SelectAllState
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        let mut total = 0usize;
        let mut hits = 0usize;
        for id in visible {
            total += 1;
            if self.selected.contains(id) {
                hits += 1;
            }
        }
        match hits {
            0 => SelectAllState::None,
            n if n == total => SelectAllState::All,
            _ => SelectAllState::Partial,
        }
    }

    /// Applies the policy after the visible set changed. Returns the number
    /// of ids dropped.
    pub fn reconcile<'a, I>(&mut self, visible: I) -> usize
    where
        I: IntoIterator<Item = &'a RecordId>,
    {
        match self.policy {
            SelectionPolicy::Retain => 0,
            SelectionPolicy::PruneToView => {
                let visible: BTreeSet<&RecordId> = visible.into_iter().collect();
                let before = self.selected.len();
                self.selected.retain(|id| visible.contains(id));
                before - self.selected.len()
            }
        }
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Packages the selection for `action` and clears it.
    ///
    /// Returns `None` without touching anything when nothing is selected.
    pub fn take_for_bulk(&mut self, action: impl Into<String>) -> Option<BulkIntent> {
        if self.selected.is_empty() {
            return None;
        }
        let ids = std::mem::take(&mut self.selected).into_iter().collect();
        Some(BulkIntent {
            action: action.into(),
            ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<RecordId> {
        raw.iter().copied().map(RecordId::from).collect()
    }

    #[test]
    fn select_all_toggles_against_visible() {
        let visible = ids(&[1, 2, 3]);
        let mut selection = SelectionSet::default();

        selection.select_all(&visible);
        assert_eq!(selection.len(), 3);
        assert!(visible.iter().all(|id| selection.contains(id)));

        selection.select_all(&visible);
        assert!(selection.is_empty());
    }

    #[test]
    fn select_all_with_partial_selection_selects_view() {
        let visible = ids(&[1, 2, 3]);
        let mut selection = SelectionSet::default();
        selection.toggle(RecordId::from(2_i64));

        selection.select_all(&visible);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn select_all_replaces_off_view_selection() {
        let mut selection = SelectionSet::default();
        selection.toggle(RecordId::from(9_i64));

        selection.select_all(&ids(&[1, 2]));
        assert!(!selection.contains(&RecordId::from(9_i64)));
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn select_all_on_empty_view_clears() {
        let mut selection = SelectionSet::default();
        selection.toggle(RecordId::from(1_i64));
        selection.select_all(&[]);
        assert!(selection.is_empty());
        // Empty selection equals empty view: stays empty.
        selection.select_all(&[]);
        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_flips_membership() {
        let mut selection = SelectionSet::default();
        assert!(selection.toggle(RecordId::from("a")));
        assert!(selection.contains(&RecordId::from("a")));
        assert!(!selection.toggle(RecordId::from("a")));
        assert!(selection.is_empty());
    }

    #[test]
    fn header_state() {
        let visible = ids(&[1, 2]);
        let mut selection = SelectionSet::default();
        assert_eq!(selection.select_all_state(&visible), SelectAllState::None);
        selection.toggle(RecordId::from(1_i64));
        assert_eq!(selection.select_all_state(&visible), SelectAllState::Partial);
        selection.toggle(RecordId::from(2_i64));
        assert_eq!(selection.select_all_state(&visible), SelectAllState::All);
        assert_eq!(selection.select_all_state(&[]), SelectAllState::None);
    }

    #[test]
    fn retain_policy_keeps_hidden_ids() {
        let mut selection = SelectionSet::new(SelectionPolicy::Retain);
        selection.select_all(&ids(&[1, 2, 3]));
        assert_eq!(selection.reconcile(&ids(&[1])), 0);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn prune_policy_drops_hidden_ids() {
        let mut selection = SelectionSet::new(SelectionPolicy::PruneToView);
        selection.select_all(&ids(&[1, 2, 3]));
        assert_eq!(selection.reconcile(&ids(&[1, 3, 4])), 1);
        assert_eq!(selection.iter().cloned().collect::<Vec<_>>(), ids(&[1, 3]));
    }

    #[test]
    fn bulk_take_clears_selection() {
        let mut selection = SelectionSet::default();
        selection.toggle(RecordId::from(2_i64));
        selection.toggle(RecordId::from(1_i64));

        let intent = selection.take_for_bulk("archive").unwrap();
        assert_eq!(intent.action, "archive");
        assert_eq!(intent.ids, ids(&[1, 2]));
        assert!(selection.is_empty());
    }

    #[test]
    fn bulk_take_on_empty_is_noop() {
        let mut selection = SelectionSet::default();
        assert!(selection.take_for_bulk("delete").is_none());
    }
}
