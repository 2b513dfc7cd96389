//! One mounted management screen.

use std::sync::Arc;

use shopdesk_core::{
    BulkIntent, Catalog, FacetValue, Page, PageRequest, RecordStore, SelectionPolicy, SortSpec,
    ViewPipeline,
};

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::traits::{MutationSink, RecordSource};

/// A list screen (orders, partners, banners, ...) bound to its collaborators.
///
/// Each page owns its own snapshot, filter, sort and selection; nothing is
/// shared between pages.
pub struct ManagementPage {
    entity: String,
    view: ViewPipeline,
    sink: Arc<dyn MutationSink>,
    page_size: usize,
}

impl ManagementPage {
    /// Loads `entity` from `source` and builds its view.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownEntity`] when the catalog has no schema,
    /// [`ConsoleError::Collaborator`] when loading fails and
    /// [`ConsoleError::RecordStore`] for malformed or duplicate records.
    pub async fn mount(
        entity: &str,
        catalog: &Catalog,
        source: &dyn RecordSource,
        sink: Arc<dyn MutationSink>,
        config: &ConsoleConfig,
    ) -> Result<Self, ConsoleError> {
        let schema = catalog.get(entity).ok_or_else(|| ConsoleError::UnknownEntity {
            entity: entity.to_string(),
        })?;
        let values = source.load(entity).await?;
        let store = RecordStore::from_values(schema, values)?;
        tracing::info!(entity, records = store.len(), "page mounted");
        Ok(Self::with_store(store, sink, config.selection_policy, config.default_page_size))
    }

    /// Builds a page over an existing snapshot.
    #[must_use]
    pub fn with_store(
        store: RecordStore,
        sink: Arc<dyn MutationSink>,
        policy: SelectionPolicy,
        page_size: usize,
    ) -> Self {
        Self {
            entity: store.schema().entity().to_string(),
            view: ViewPipeline::new(store, policy),
            sink,
            page_size: page_size.max(1),
        }
    }

    /// Entity name this page lists.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The underlying view: visible rows, selection, facet counts.
    #[must_use]
    pub fn view(&self) -> &ViewPipeline {
        &self.view
    }

    /// Direct access for selection toggles and anything not wrapped here.
    pub fn view_mut(&mut self) -> &mut ViewPipeline {
        &mut self.view
    }

    /// Replaces the search box text.
    pub fn search(&mut self, term: &str) {
        self.view.set_search(term);
    }

    /// Narrows one facet; `"all"` clears it.
    pub fn narrow(&mut self, facet: &str, value: &str) {
        self.view.set_facet(facet, FacetValue::parse(value));
    }

    /// Sorts by a bare token (`"revenue"`, `"date"`). Unknown tokens leave
    /// the order unchanged.
    pub fn sort_by(&mut self, token: &str) -> bool {
        self.view.sort_by_token(token)
    }

    /// Replaces the whole sort order.
    pub fn sort(&mut self, order: Vec<SortSpec>) {
        self.view.set_sort(order);
    }

    /// Zero-based page of the visible rows.
    #[must_use]
    pub fn page(&self, index: usize) -> Page {
        self.view.page(PageRequest {
            offset: index.saturating_mul(self.page_size),
            size: self.page_size,
        })
    }

    /// Number of pages at the configured size.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.view.visible().len().div_ceil(self.page_size)
    }

    /// Sends the selection to the sink as `action` and clears it.
    ///
    /// Returns `Ok(None)` when nothing is selected. If the sink fails the
    /// selection is restored.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Collaborator`] with the sink's error.
    pub async fn bulk(&mut self, action: &str) -> Result<Option<BulkIntent>, ConsoleError> {
        let Some(intent) = self.view.take_bulk(action) else {
            return Ok(None);
        };
        if let Err(err) = self.sink.dispatch(&self.entity, intent.clone()).await {
            tracing::warn!(entity = %self.entity, action, error = %err, "bulk dispatch failed");
            for id in &intent.ids {
                self.view.toggle(id.clone());
            }
            return Err(ConsoleError::Collaborator(err));
        }
        Ok(Some(intent))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;
    use shopdesk_core::catalog::{ORDERS, PARTNERS};
    use shopdesk_core::{RecordId, SelectAllState};

    use super::*;
    use crate::sinks::{InMemoryRecordSource, JournalEntry, LoggingSink};

    fn source() -> InMemoryRecordSource {
        let source = InMemoryRecordSource::new();
        source
            .insert_json(
                PARTNERS,
                json!([
                    {"id": 1, "name": "Acme", "status": "active", "tier": "gold", "revenue": 1200},
                    {"id": 2, "name": "Bolt", "status": "pending", "tier": "silver", "revenue": 5400},
                    {"id": 3, "name": "Crane", "status": "active", "tier": "platinum", "revenue": 800},
                    {"id": 4, "name": "Delta", "status": "suspended", "tier": "bronze", "revenue": 300},
                ]),
            )
            .unwrap();
        source
    }

    async fn mount(sink: Arc<dyn MutationSink>, config: &ConsoleConfig) -> ManagementPage {
        let catalog = Catalog::builtin().unwrap();
        ManagementPage::mount(PARTNERS, &catalog, &source(), sink, config)
            .await
            .unwrap()
    }

    fn ids(page: &ManagementPage) -> Vec<&str> {
        page.view().visible_ids().map(RecordId::as_str).collect()
    }

    #[tokio::test]
    async fn mount_filter_sort_and_bulk() {
        let sink = Arc::new(LoggingSink::new());
        let mut page = mount(sink.clone(), &ConsoleConfig::default()).await;
        assert_eq!(page.entity(), PARTNERS);

        page.narrow("status", "active");
        assert!(page.sort_by("revenue"));
        assert_eq!(ids(&page), ["1", "3"]);

        page.view_mut().select_all();
        assert_eq!(page.view().select_all_state(), SelectAllState::All);

        let intent = page.bulk("suspend").await.unwrap().unwrap();
        assert_eq!(intent.ids, [RecordId::from(1_i64), RecordId::from(3_i64)]);
        assert!(page.view().selection().is_empty());
        assert!(matches!(
            &sink.journal()[0],
            JournalEntry::Bulk { entity, .. } if entity == PARTNERS
        ));

        assert_eq!(page.bulk("suspend").await.unwrap(), None);
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn all_sentinel_restores_full_view() {
        let mut page = mount(Arc::new(LoggingSink::new()), &ConsoleConfig::default()).await;
        page.narrow("tier", "gold");
        assert_eq!(ids(&page), ["1"]);
        page.narrow("tier", "all");
        assert_eq!(page.view().visible().len(), 4);
    }

    #[tokio::test]
    async fn prune_policy_from_config() {
        let config = ConsoleConfig {
            selection_policy: SelectionPolicy::PruneToView,
            ..ConsoleConfig::default()
        };
        let mut page = mount(Arc::new(LoggingSink::new()), &config).await;
        page.view_mut().select_all();
        page.search("acme");
        assert_eq!(page.view().selection().len(), 1);
    }

    #[tokio::test]
    async fn paging_uses_configured_size() {
        let config = ConsoleConfig {
            default_page_size: 3,
            ..ConsoleConfig::default()
        };
        let page = mount(Arc::new(LoggingSink::new()), &config).await;
        assert_eq!(page.page_count(), 2);
        assert_eq!(page.page(0).items.len(), 3);
        assert_eq!(page.page(0).next_offset, Some(3));
        assert_eq!(page.page(1).items.len(), 1);
        assert!(page.page(2).items.is_empty());
    }

    #[tokio::test]
    async fn unknown_entity_and_missing_dataset() {
        let catalog = Catalog::builtin().unwrap();
        let sink: Arc<dyn MutationSink> = Arc::new(LoggingSink::new());
        let config = ConsoleConfig::default();

        let err = ManagementPage::mount("invoices", &catalog, &source(), sink.clone(), &config)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConsoleError::UnknownEntity { .. }));

        let err = ManagementPage::mount(ORDERS, &catalog, &source(), sink, &config)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ConsoleError::Collaborator(_)));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let catalog = Catalog::builtin().unwrap();
        let source = InMemoryRecordSource::new();
        source.insert_json(PARTNERS, json!([{"id": 1}, {"id": "1"}])).unwrap();
        let err = ManagementPage::mount(
            PARTNERS,
            &catalog,
            &source,
            Arc::new(LoggingSink::new()),
            &ConsoleConfig::default(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, ConsoleError::RecordStore(_)));
    }

    struct Offline;

    #[async_trait]
    impl MutationSink for Offline {
        async fn dispatch(&self, _entity: &str, _intent: BulkIntent) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
    }

    #[tokio::test]
    async fn failed_dispatch_restores_selection() {
        let mut page = mount(Arc::new(Offline), &ConsoleConfig::default()).await;
        page.view_mut().toggle(RecordId::from(2_i64));
        page.view_mut().toggle(RecordId::from(4_i64));

        let err = page.bulk("delete").await.unwrap_err();
        assert!(err.to_string().contains("offline"));
        assert!(page.view().is_selected(&RecordId::from(2_i64)));
        assert!(page.view().is_selected(&RecordId::from(4_i64)));
        assert_eq!(page.view().selection().len(), 2);
    }
}
