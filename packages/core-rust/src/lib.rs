//! `ShopDesk` Core: faceted list views, selection, and multi-step forms.
//!
//! Everything here is synchronous and pure: a [`ViewPipeline`] turns a
//! [`RecordStore`] into visible rows, and a [`StepWizard`] drives a
//! [`FormState`] through validated steps.

pub mod catalog;
pub mod filter;
pub mod form;
pub mod path;
pub mod pipeline;
pub mod product;
pub mod record;
pub mod schema;
pub mod selection;
pub mod sort;
pub mod types;
pub mod validation;
pub mod wizard;

pub use catalog::Catalog;
pub use filter::{FacetValue, FilterSpec, PredicateFilter};
pub use form::{FormState, PathErrorReason, PathResolutionError};
pub use path::{FieldPath, PathParseError, PathSegment};
pub use pipeline::{Page, PageRequest, ViewPipeline};
pub use record::{Record, RecordError, RecordId, RecordStore, RecordStoreError};
pub use schema::{EntitySchema, FacetDef, SchemaError};
pub use selection::{BulkIntent, SelectAllState, SelectionPolicy, SelectionSet};
pub use sort::{RankTable, SortDirection, SortKind, SortRegistry, SortRule, SortSpec};
pub use types::Value;
pub use validation::{FieldErrors, FieldRule, RuleSet, StepValidator};
pub use wizard::{PublishError, StepFailure, StepOutcome, StepWizard, WizardError, WizardStep};
