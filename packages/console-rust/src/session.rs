//! Product upload session: wizard, pending image uploads, publishing.

use std::sync::Arc;

use shopdesk_core::product::{self, MAX_IMAGES};
use shopdesk_core::{FieldErrors, FieldPath, StepOutcome, StepWizard, Value};

use crate::config::ProgressConfig;
use crate::error::ConsoleError;
use crate::traits::ProductPublisher;
use crate::upload::{UploadProgress, UploadStatus};

struct PendingImage {
    url: String,
    alt: String,
    progress: UploadProgress,
}

/// One run through the product creation wizard.
///
/// Dropping the session cancels every pending upload ticker.
pub struct UploadSession {
    wizard: StepWizard,
    publisher: Arc<dyn ProductPublisher>,
    progress: ProgressConfig,
    pending: Vec<PendingImage>,
    published: Option<String>,
}

impl UploadSession {
    /// # Errors
    ///
    /// [`ConsoleError::Wizard`] if the built-in product wizard cannot be
    /// assembled.
    pub fn new(
        publisher: Arc<dyn ProductPublisher>,
        progress: ProgressConfig,
    ) -> Result<Self, ConsoleError> {
        Ok(Self {
            wizard: product::wizard()?,
            publisher,
            progress,
            pending: Vec::new(),
            published: None,
        })
    }

    /// Wizard state: current step, form and errors.
    #[must_use]
    pub fn wizard(&self) -> &StepWizard {
        &self.wizard
    }

    /// Navigation goes straight to the wizard.
    pub fn wizard_mut(&mut self) -> &mut StepWizard {
        &mut self.wizard
    }

    /// Sets the field at a dotted path.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::PathParse`] for a malformed path and
    /// [`ConsoleError::Path`] when it does not fit the product form.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ConsoleError> {
        let path = FieldPath::parse(path)?;
        self.wizard.set_field(&path, value.into())?;
        Ok(())
    }

    /// Tries to advance one step.
    pub fn next(&mut self) -> StepOutcome {
        self.wizard.next()
    }

    /// Errors from the last blocked advance.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        self.wizard.errors()
    }

    /// Starts a simulated upload for an image; it joins the form once
    /// [`UploadSession::finish_uploads`] sees it complete.
    pub fn begin_image_upload(&mut self, url: &str, alt: &str) {
        tracing::debug!(url, "image upload started");
        self.pending.push(PendingImage {
            url: url.to_string(),
            alt: alt.to_string(),
            progress: UploadProgress::start(&self.progress),
        });
    }

    /// Uploads not yet finished or cancelled.
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    /// Progress of each pending upload, in start order.
    #[must_use]
    pub fn upload_status(&self) -> Vec<UploadStatus> {
        self.pending.iter().map(|p| p.progress.status()).collect()
    }

    /// Waits for every pending upload. Completed images are appended to the
    /// form (up to the image limit); cancelled ones are discarded. Returns
    /// the number of images added.
    ///
    /// Uploads leave the queue one at a time, so on error the failing
    /// upload and those after it stay pending.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Path`] if the form has no image list.
    pub async fn finish_uploads(&mut self) -> Result<usize, ConsoleError> {
        let images = product::images_path();
        let mut added = 0;
        while let Some(pending) = self.pending.first_mut() {
            if pending.progress.finished().await == UploadStatus::Complete {
                let count = self
                    .wizard
                    .form()
                    .get_path(&images)?
                    .as_list()
                    .map_or(0, <[Value]>::len);
                if count < MAX_IMAGES {
                    let image = product::image(&pending.url, &pending.alt);
                    self.wizard.update_form(|form| form.push_item(&images, image))?;
                    added += 1;
                } else {
                    tracing::warn!(url = %pending.url, "image limit reached");
                }
            } else {
                tracing::debug!(url = %pending.url, "image upload discarded");
            }
            self.pending.remove(0);
        }
        Ok(added)
    }

    /// Cancels every pending upload.
    pub async fn cancel_uploads(&mut self) {
        for mut pending in self.pending.drain(..) {
            pending.progress.cancel().await;
        }
    }

    /// Revalidates every step and hands the payload to the publisher.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UploadsPending`] while uploads are running,
    /// [`ConsoleError::AlreadyPublished`] on a second call,
    /// [`ConsoleError::Publish`] when validation fails and
    /// [`ConsoleError::Collaborator`] when the publisher does.
    pub async fn publish(&mut self) -> Result<String, ConsoleError> {
        if let Some(product_id) = &self.published {
            return Err(ConsoleError::AlreadyPublished {
                product_id: product_id.clone(),
            });
        }
        if !self.pending.is_empty() {
            return Err(ConsoleError::UploadsPending {
                pending: self.pending.len(),
            });
        }
        let payload = self.wizard.publish().map_err(|err| {
            tracing::warn!(error = %err, "publish refused");
            err
        })?;
        let product_id = self.publisher.create_product(&payload).await.map_err(|err| {
            tracing::warn!(error = %err, "product publisher failed");
            err
        })?;
        tracing::info!(%product_id, "product published");
        self.published = Some(product_id.clone());
        Ok(product_id)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shopdesk_core::PublishError;

    use super::*;
    use crate::sinks::{DelayedSink, JournalEntry, LoggingSink};

    fn progress() -> ProgressConfig {
        ProgressConfig {
            tick_interval_ms: 50,
            step_percent: 20,
        }
    }

    fn session(publisher: Arc<dyn ProductPublisher>) -> UploadSession {
        UploadSession::new(publisher, progress()).unwrap()
    }

    fn fill(session: &mut UploadSession) {
        session.set_field("name", "Desk lamp").unwrap();
        session.set_field("sku", "LAMP-001").unwrap();
        session.set_field("category", "lighting").unwrap();
        session.set_field("pricing.basePrice", 39.0).unwrap();
        session.set_field("inventory.quantity", 12_i64).unwrap();
        session.set_field("shipping.weight", "1.2").unwrap();
    }

    #[tokio::test]
    async fn blank_name_blocks_first_step() {
        let mut session = session(Arc::new(LoggingSink::new()));
        assert!(!session.next().is_advanced());
        assert_eq!(session.wizard().current(), 1);
        assert_eq!(session.errors().get("name"), Some("Product name is required"));
    }

    #[tokio::test]
    async fn bad_paths_are_errors() {
        let mut session = session(Arc::new(LoggingSink::new()));
        assert!(matches!(session.set_field("pricing..x", 1_i64), Err(ConsoleError::PathParse(_))));
        assert!(matches!(session.set_field("pricing.basePrice.amount", 1_i64), Err(ConsoleError::Path(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn uploads_then_publish() {
        let publisher = Arc::new(DelayedSink::new(LoggingSink::new(), Duration::from_millis(400)));
        let mut session = session(publisher.clone());
        fill(&mut session);

        session.begin_image_upload("https://cdn.example/lamp.jpg", "Lamp");
        session.begin_image_upload("https://cdn.example/lamp-side.jpg", "Side");
        assert_eq!(session.pending_uploads(), 2);

        session.wizard_mut().jump_to(6);
        assert!(matches!(session.publish().await, Err(ConsoleError::UploadsPending { pending: 2 })));

        assert_eq!(session.finish_uploads().await.unwrap(), 2);
        assert_eq!(session.pending_uploads(), 0);

        let product_id = session.publish().await.unwrap();
        assert!(matches!(
            &publisher.inner().journal()[0],
            JournalEntry::Published { product_id: id, .. } if *id == product_id
        ));
        assert!(matches!(session.publish().await, Err(ConsoleError::AlreadyPublished { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_uploads_never_reach_the_form() {
        let mut session = session(Arc::new(LoggingSink::new()));
        session.begin_image_upload("https://cdn.example/a.jpg", "A");
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(session.upload_status(), [UploadStatus::Running(20)]);

        session.cancel_uploads().await;
        assert_eq!(session.pending_uploads(), 0);
        assert_eq!(session.finish_uploads().await.unwrap(), 0);

        session.wizard_mut().jump_to(4);
        let outcome = session.next();
        assert!(!outcome.is_advanced());
    }

    #[tokio::test]
    async fn invalid_payload_is_refused() {
        let sink = Arc::new(LoggingSink::new());
        let mut session = session(sink.clone());
        session.wizard_mut().jump_to(6);
        let err = session.publish().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Publish(PublishError::Invalid(_))));
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_finish_keeps_uploads_queued() {
        let mut session = session(Arc::new(LoggingSink::new()));
        session.begin_image_upload("https://cdn.example/a.jpg", "A");
        session.begin_image_upload("https://cdn.example/b.jpg", "B");
        session.set_field("media", "none").unwrap();

        let err = session.finish_uploads().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Path(_)));
        assert_eq!(session.pending_uploads(), 2);
        assert_eq!(session.upload_status()[0], UploadStatus::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_upload_reaches_the_form() {
        let mut session = UploadSession::new(
            Arc::new(LoggingSink::new()),
            ProgressConfig {
                tick_interval_ms: 0,
                step_percent: 10,
            },
        )
        .unwrap();
        session.begin_image_upload("https://cdn.example/a.jpg", "A");
        assert_eq!(session.finish_uploads().await.unwrap(), 1);
        let images = session.wizard().form().get_path(&product::images_path()).unwrap();
        assert_eq!(images.as_list().map(<[Value]>::len), Some(1));
    }
}
