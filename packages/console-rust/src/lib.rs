//! `ShopDesk` Console: runtime layer around the list-view engine.
//!
//! Collaborator traits for data supply, bulk mutations and product
//! publishing, in-process implementations of them, management page and
//! upload sessions, the upload progress ticker, configuration and tracing
//! setup.

pub mod config;
pub mod error;
pub mod page;
pub mod session;
pub mod sinks;
pub mod telemetry;
pub mod traits;
pub mod upload;

pub use config::{ConsoleConfig, ProgressConfig};
pub use error::ConsoleError;
pub use page::ManagementPage;
pub use session::UploadSession;
pub use sinks::{DelayedSink, FanOutSink, InMemoryRecordSource, JournalEntry, LoggingSink};
pub use telemetry::{init_tracing, LogFormat};
pub use traits::{MutationSink, ProductPublisher, RecordSource};
pub use upload::{UploadProgress, UploadStatus};
