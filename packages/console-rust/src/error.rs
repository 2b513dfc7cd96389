use shopdesk_core::product::ProductWizardError;
use shopdesk_core::{
    PathParseError, PathResolutionError, PublishError, RecordStoreError, SchemaError,
};

/// Errors surfaced by console sessions.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The catalog has no schema for the entity.
    #[error("unknown entity: {entity}")]
    UnknownEntity { entity: String },
    /// Publish was attempted while uploads were still running.
    #[error("{pending} image upload(s) still in progress")]
    UploadsPending { pending: usize },
    /// The session already produced a product.
    #[error("session already published as {product_id}")]
    AlreadyPublished { product_id: String },
    /// A schema failed to build.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Loaded records were malformed or duplicated.
    #[error(transparent)]
    RecordStore(#[from] RecordStoreError),
    /// A dotted path string was malformed.
    #[error(transparent)]
    PathParse(#[from] PathParseError),
    /// A path did not fit the form.
    #[error(transparent)]
    Path(#[from] PathResolutionError),
    /// The product wizard could not be assembled.
    #[error(transparent)]
    Wizard(#[from] ProductWizardError),
    /// Publish validation refused the payload.
    #[error(transparent)]
    Publish(#[from] PublishError),
    /// A record source, sink or publisher failed.
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] anyhow::Error),
}
