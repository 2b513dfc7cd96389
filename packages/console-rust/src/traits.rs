use async_trait::async_trait;
use shopdesk_core::{BulkIntent, FormState, Value};

/// Supplies the raw records a management page mounts with.
/// Implementations: in-memory fixtures, delayed wrappers (tests, demos).
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Load every record of `entity` as field maps.
    async fn load(&self, entity: &str) -> anyhow::Result<Vec<Value>>;
}

/// Receives bulk mutation intents. Records are never mutated in place;
/// whatever applies the intent lives behind this trait.
#[async_trait]
pub trait MutationSink: Send + Sync {
    /// Hand over one bulk intent for the given entity type.
    async fn dispatch(&self, entity: &str, intent: BulkIntent) -> anyhow::Result<()>;
}

/// Creates a product from a validated wizard payload.
#[async_trait]
pub trait ProductPublisher: Send + Sync {
    /// Returns the identifier assigned to the new product.
    async fn create_product(&self, payload: &FormState) -> anyhow::Result<String>;
}
