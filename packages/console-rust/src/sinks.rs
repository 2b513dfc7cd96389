//! In-process collaborator implementations.
//!
//! [`InMemoryRecordSource`] serves fixture datasets, [`LoggingSink`] logs
//! and journals every intent, [`DelayedSink`] adds artificial latency to
//! any collaborator, and [`FanOutSink`] forwards bulk intents to several
//! sinks.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use shopdesk_core::{BulkIntent, FormState, Value};

use crate::traits::{MutationSink, ProductPublisher, RecordSource};

// ---------------------------------------------------------------------------
// InMemoryRecordSource
// ---------------------------------------------------------------------------

/// Fixture datasets keyed by entity name.
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    datasets: DashMap<String, Arc<Vec<Value>>>,
}

impl InMemoryRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`InMemoryRecordSource::insert`].
    #[must_use]
    pub fn with_dataset(self, entity: &str, records: Vec<Value>) -> Self {
        self.insert(entity, records);
        self
    }

    /// Replaces the dataset for `entity`.
    pub fn insert(&self, entity: &str, records: Vec<Value>) {
        self.datasets.insert(entity.to_string(), Arc::new(records));
    }

    /// Loads a JSON array of records for `entity`.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not an array.
    pub fn insert_json(&self, entity: &str, json: serde_json::Value) -> anyhow::Result<()> {
        let serde_json::Value::Array(items) = json else {
            anyhow::bail!("dataset for {entity} must be a JSON array");
        };
        self.insert(entity, items.into_iter().map(Value::from).collect());
        Ok(())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn load(&self, entity: &str) -> anyhow::Result<Vec<Value>> {
        // Clone the Arc so no DashMap guard is held past this point.
        let dataset = self
            .datasets
            .get(entity)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| anyhow::anyhow!("no dataset for entity {entity}"))?;
        Ok(dataset.as_ref().clone())
    }
}

// ---------------------------------------------------------------------------
// LoggingSink
// ---------------------------------------------------------------------------

/// One call recorded by [`LoggingSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    Bulk { entity: String, intent: BulkIntent },
    Published { product_id: String, payload: FormState },
}

/// Logs every intent via `tracing` and keeps a journal for inspection.
///
/// Nothing is applied anywhere; this is the console's stand-in for a
/// backend.
#[derive(Debug, Default)]
pub struct LoggingSink {
    journal: Mutex<Vec<JournalEntry>>,
}

impl LoggingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.journal.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.journal.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal.lock().is_empty()
    }
}

#[async_trait]
impl MutationSink for LoggingSink {
    async fn dispatch(&self, entity: &str, intent: BulkIntent) -> anyhow::Result<()> {
        tracing::info!(
            entity,
            action = %intent.action,
            ids = ?intent.ids,
            "bulk intent"
        );
        self.journal.lock().push(JournalEntry::Bulk {
            entity: entity.to_string(),
            intent,
        });
        Ok(())
    }
}

#[async_trait]
impl ProductPublisher for LoggingSink {
    async fn create_product(&self, payload: &FormState) -> anyhow::Result<String> {
        let product_id = format!("prod-{}", uuid::Uuid::new_v4().simple());
        let name = payload
            .to_value()
            .as_map()
            .and_then(|fields| fields.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::info!(%product_id, %name, "product created");
        self.journal.lock().push(JournalEntry::Published {
            product_id: product_id.clone(),
            payload: payload.clone(),
        });
        Ok(product_id)
    }
}

// ---------------------------------------------------------------------------
// DelayedSink
// ---------------------------------------------------------------------------

/// Wraps a collaborator and sleeps for a fixed latency before every call.
#[derive(Debug)]
pub struct DelayedSink<T> {
    inner: T,
    latency: Duration,
}

impl<T> DelayedSink<T> {
    pub fn new(inner: T, latency: Duration) -> Self {
        Self { inner, latency }
    }

    /// The wrapped collaborator.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: RecordSource> RecordSource for DelayedSink<T> {
    async fn load(&self, entity: &str) -> anyhow::Result<Vec<Value>> {
        tokio::time::sleep(self.latency).await;
        self.inner.load(entity).await
    }
}

#[async_trait]
impl<T: MutationSink> MutationSink for DelayedSink<T> {
    async fn dispatch(&self, entity: &str, intent: BulkIntent) -> anyhow::Result<()> {
        tokio::time::sleep(self.latency).await;
        self.inner.dispatch(entity, intent).await
    }
}

#[async_trait]
impl<T: ProductPublisher> ProductPublisher for DelayedSink<T> {
    async fn create_product(&self, payload: &FormState) -> anyhow::Result<String> {
        tokio::time::sleep(self.latency).await;
        self.inner.create_product(payload).await
    }
}

// ---------------------------------------------------------------------------
// FanOutSink
// ---------------------------------------------------------------------------

/// Forwards each intent to every registered sink, in order.
///
/// Stops at the first failure; sinks before it have already seen the
/// intent.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn MutationSink>>,
}

impl FanOutSink {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn MutationSink>>) -> Self {
        Self { sinks }
    }

    /// Appends a sink after the existing ones.
    pub fn add(&mut self, sink: Arc<dyn MutationSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl MutationSink for FanOutSink {
    async fn dispatch(&self, entity: &str, intent: BulkIntent) -> anyhow::Result<()> {
        for sink in &self.sinks {
            sink.dispatch(entity, intent.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shopdesk_core::RecordId;

    use super::*;

    fn intent(action: &str) -> BulkIntent {
        BulkIntent {
            action: action.to_string(),
            ids: vec![RecordId::from("a"), RecordId::from("b")],
        }
    }

    #[tokio::test]
    async fn in_memory_source_serves_datasets() {
        let source = InMemoryRecordSource::new()
            .with_dataset("orders", vec![Value::from(json!({"id": 1}))]);
        source.insert_json("banners", json!([{"id": "b1"}, {"id": "b2"}])).unwrap();

        assert_eq!(source.load("orders").await.unwrap().len(), 1);
        assert_eq!(source.load("banners").await.unwrap().len(), 2);
        assert!(source.load("points").await.is_err());
        assert!(source.insert_json("points", json!({"id": 1})).is_err());
    }

    #[tokio::test]
    async fn logging_sink_journals_calls() {
        let sink = LoggingSink::new();
        sink.dispatch("orders", intent("archive")).await.unwrap();
        let form = FormState::from_value(Value::from(json!({"name": "Lamp"}))).unwrap();
        let id = sink.create_product(&form).await.unwrap();
        assert!(id.starts_with("prod-"));

        let journal = sink.journal();
        assert_eq!(journal.len(), 2);
        assert_eq!(
            journal[0],
            JournalEntry::Bulk {
                entity: "orders".to_string(),
                intent: intent("archive"),
            }
        );
        assert!(matches!(&journal[1], JournalEntry::Published { product_id, .. } if *product_id == id));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_sink_waits_before_forwarding() {
        let sink = Arc::new(DelayedSink::new(LoggingSink::new(), Duration::from_millis(300)));
        let task = {
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { sink.dispatch("orders", intent("delete")).await })
        };

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(sink.inner().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        task.await.unwrap().unwrap();
        assert_eq!(sink.inner().len(), 1);
    }

    struct Failing;

    #[async_trait]
    impl MutationSink for Failing {
        async fn dispatch(&self, _entity: &str, _intent: BulkIntent) -> anyhow::Result<()> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[tokio::test]
    async fn fan_out_reaches_every_sink_until_failure() {
        let first = Arc::new(LoggingSink::new());
        let second = Arc::new(LoggingSink::new());
        let sinks: Vec<Arc<dyn MutationSink>> = vec![first.clone(), second.clone()];
        let mut fan_out = FanOutSink::new(sinks);
        fan_out.dispatch("partners", intent("suspend")).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);

        fan_out.add(Arc::new(Failing));
        assert!(fan_out.dispatch("partners", intent("suspend")).await.is_err());
        assert_eq!(first.len(), 2);
    }
}
