//! The list-view pipeline: store → filter → sort → visible rows.
//!
//! A [`ViewPipeline`] is the whole state of one management page: the record
//! snapshot, the active filter, the sort order and the selection. Every
//! change to the filter or sort recomputes the visible rows and reconciles
//! the selection according to its [`SelectionPolicy`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::filter::{self, FacetValue, FilterSpec, PredicateFilter};
use crate::record::{Record, RecordId, RecordStore};
use crate::schema::EntitySchema;
use crate::selection::{BulkIntent, SelectAllState, SelectionPolicy, SelectionSet};
use crate::sort::SortSpec;

/// Offset/size window into the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Index of the first row.
    pub offset: usize,
    /// Maximum number of rows.
    pub size: usize,
}

impl PageRequest {
    /// Window starting at the first row.
    #[must_use]
    pub fn first(size: usize) -> Self {
        Self { offset: 0, size }
    }
}

/// One window of visible rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Rows in this window, in view order.
    pub items: Vec<Record>,
    /// Number of visible rows in total.
    pub total: usize,
    /// Offset of the following page, `None` on the last one.
    pub next_offset: Option<usize>,
}

/// Filter, sort and selection state over one [`RecordStore`].
#[derive(Debug, Clone)]
pub struct ViewPipeline {
    store: RecordStore,
    filter: FilterSpec,
    order: Vec<SortSpec>,
    selection: SelectionSet,
    visible: Vec<Record>,
}

impl ViewPipeline {
    /// Starts with no filter, no sort and an empty selection.
    #[must_use]
    pub fn new(store: RecordStore, policy: SelectionPolicy) -> Self {
        let visible = store.records().to_vec();
        Self {
            store,
            filter: FilterSpec::default(),
            order: Vec::new(),
            selection: SelectionSet::new(policy),
            visible,
        }
    }

    /// The record snapshot this view reads.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    #[must_use]
    pub fn schema(&self) -> &EntitySchema {
        self.store.schema()
    }

    /// Active filter.
    #[must_use]
    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Active sort order.
    #[must_use]
    pub fn order(&self) -> &[SortSpec] {
        &self.order
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    // ------------------------------------------------------------------
    // Filter and sort
    // ------------------------------------------------------------------

    /// Replaces the whole filter and recomputes.
    pub fn set_filter(&mut self, filter: FilterSpec) {
        self.filter = filter;
        self.recompute();
    }

    /// Sets the search term and recomputes.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
        self.recompute();
    }

    /// Sets one facet and recomputes.
    pub fn set_facet(&mut self, facet: impl Into<String>, value: impl Into<FacetValue>) {
        self.filter.facets.insert(facet.into(), value.into());
        self.recompute();
    }

    /// Replaces the sort order and recomputes.
    pub fn set_sort(&mut self, order: Vec<SortSpec>) {
        self.order = order;
        self.recompute();
    }

    /// Sorts by a bare field token in the field's default direction.
    /// Returns `false` and keeps the current order for an unknown token.
    pub fn sort_by_token(&mut self, token: &str) -> bool {
        match self.schema().sorts().spec_for_token(token) {
            Some(spec) => {
                self.set_sort(vec![spec]);
                true
            }
            None => {
                tracing::debug!(entity = self.schema().entity(), token, "unknown sort token");
                false
            }
        }
    }

    fn recompute(&mut self) {
        let schema = self.store.schema();
        let filtered = PredicateFilter::new(schema, &self.filter).apply(self.store.records());
        self.visible = schema.sorts().sort(&filtered, &self.order);
        let dropped = self.selection.reconcile(self.visible.iter().map(Record::id));
        tracing::debug!(
            entity = schema.entity(),
            total = self.store.len(),
            visible = self.visible.len(),
            dropped,
            "view recomputed"
        );
    }

    // ------------------------------------------------------------------
    // Visible rows
    // ------------------------------------------------------------------

    /// Rows passing the filter, in sort order.
    #[must_use]
    pub fn visible(&self) -> &[Record] {
        &self.visible
    }

    /// Ids of the visible rows, in order.
    pub fn visible_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.visible.iter().map(Record::id)
    }

    /// Counts per value of `facet` under every other active predicate.
    #[must_use]
    pub fn facet_counts(&self, facet: &str) -> Option<BTreeMap<String, usize>> {
        filter::facet_counts(self.store.records(), self.schema(), &self.filter, facet)
    }

    /// A window of the visible rows. A window past the end is empty.
    #[must_use]
    pub fn page(&self, request: PageRequest) -> Page {
        let total = self.visible.len();
        let start = request.offset.min(total);
        let end = start.saturating_add(request.size).min(total);
        Page {
            items: self.visible[start..end].to_vec(),
            total,
            next_offset: (end < total && end > start).then_some(end),
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.selection.contains(id)
    }

    /// Flips one id. Returns whether it is now selected.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        self.selection.toggle(id)
    }

    /// Header checkbox: toggles between "every visible row" and nothing.
    pub fn select_all(&mut self) {
        self.selection.select_all(self.visible.iter().map(Record::id));
    }

    /// State of the header checkbox against the visible rows.
    #[must_use]
    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.select_all_state(self.visible.iter().map(Record::id))
    }

    /// Drains the selection into a bulk intent; `None` when nothing is
    /// selected.
    pub fn take_bulk(&mut self, action: impl Into<String>) -> Option<BulkIntent> {
        let intent = self.selection.take_for_bulk(action)?;
        tracing::info!(
            entity = self.schema().entity(),
            action = %intent.action,
            count = intent.ids.len(),
            "bulk action prepared"
        );
        Some(intent)
    }
}
