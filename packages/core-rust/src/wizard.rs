//! Multi-step form wizard with validation-gated forward navigation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::form::{FormState, PathResolutionError};
use crate::path::FieldPath;
use crate::types::Value;
use crate::validation::{FieldErrors, StepValidator};

/// One stage of the wizard.
#[derive(Clone)]
pub struct WizardStep {
    title: String,
    validator: Arc<dyn StepValidator>,
}

impl WizardStep {
    /// A titled step checked by `validator`.
    pub fn new(title: impl Into<String>, validator: impl StepValidator + 'static) -> Self {
        Self {
            title: title.into(),
            validator: Arc::new(validator),
        }
    }

    /// Title shown in the step header.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Runs this step's checks against `form`.
    #[must_use]
    pub fn validate(&self, form: &FormState) -> FieldErrors {
        self.validator.validate(form)
    }
}

impl fmt::Debug for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardStep")
            .field("title", &self.title)
            .field("paths", &self.validator.paths())
            .finish_non_exhaustive()
    }
}

/// Wizard assembly failed. Always a wiring bug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    /// The step list is empty.
    #[error("a wizard needs at least one step")]
    NoSteps,
    /// A step validates a path missing from the template.
    #[error("step {step} ({title}) validates a field the form does not have")]
    Path {
        step: usize,
        title: String,
        #[source]
        source: PathResolutionError,
    },
}

/// A field that failed during publish revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    /// 1-indexed step owning the field.
    pub step: usize,
    /// Path text of the field.
    pub field: String,
    /// First failing rule message.
    pub message: String,
}

/// Why a publish was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Publish was called before the last step.
    #[error("publish is only available on step {last} (currently on step {current})")]
    NotOnFinalStep { current: usize, last: usize },
    /// One or more steps failed revalidation.
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<StepFailure>),
}

/// Result of [`StepWizard::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Validation passed; the wizard is now on `to` (unchanged on the last step).
    Advanced { to: usize },
    /// Validation failed; the wizard stayed put.
    Blocked(FieldErrors),
}

impl StepOutcome {
    /// Whether the wizard moved on.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self, StepOutcome::Advanced { .. })
    }
}

/// Ordered steps over one [`FormState`].
///
/// Steps are numbered from 1. `next` only moves forward when the current
/// step validates; `prev` and `jump_to` move freely and are clamped to the
/// step range.
#[derive(Debug, Clone)]
pub struct StepWizard {
    steps: Vec<WizardStep>,
    current: usize,
    form: FormState,
    errors: FieldErrors,
}

impl StepWizard {
    /// Builds a wizard positioned on step 1.
    ///
    /// # Errors
    ///
    /// [`WizardError::NoSteps`] for an empty step list and
    /// [`WizardError::Path`] when a validator reads a path that does not
    /// resolve against `template`.
    pub fn new(template: FormState, steps: Vec<WizardStep>) -> Result<Self, WizardError> {
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        for (index, step) in steps.iter().enumerate() {
            for path in step.validator.paths() {
                template.get_path(path).map_err(|source| WizardError::Path {
                    step: index + 1,
                    title: step.title.clone(),
                    source,
                })?;
            }
        }
        Ok(Self {
            steps,
            current: 1,
            form: template,
            errors: FieldErrors::new(),
        })
    }

    /// Number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Current step, 1-indexed.
    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// The step currently shown.
    #[must_use]
    pub fn current_step(&self) -> &WizardStep {
        &self.steps[self.current - 1]
    }

    /// All steps in order.
    #[must_use]
    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    /// Whether the current step is the last one.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current == self.steps.len()
    }

    /// Current form values.
    #[must_use]
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Errors from the last blocked `next`, minus fields edited since.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    fn clamp(&self, step: usize) -> usize {
        step.clamp(1, self.steps.len())
    }

    /// Validates the current step and advances when it passes.
    pub fn next(&mut self) -> StepOutcome {
        let errors = self.current_step().validate(&self.form);
        if errors.is_empty() {
            self.current = self.clamp(self.current + 1);
            self.errors = FieldErrors::new();
            tracing::debug!(step = self.current, "wizard advanced");
            StepOutcome::Advanced { to: self.current }
        } else {
            tracing::debug!(step = self.current, errors = errors.len(), "wizard step blocked");
            self.errors = errors.clone();
            StepOutcome::Blocked(errors)
        }
    }

    /// Moves back one step without validating.
    pub fn prev(&mut self) -> usize {
        self.current = self.clamp(self.current.saturating_sub(1));
        self.errors = FieldErrors::new();
        self.current
    }

    /// Quick navigation: moves to `step` (clamped) without validating.
    pub fn jump_to(&mut self, step: usize) -> usize {
        self.current = self.clamp(step);
        self.errors = FieldErrors::new();
        self.current
    }

    /// Updates one field and clears its pending error.
    ///
    /// # Errors
    ///
    /// Returns [`PathResolutionError`] when `path` does not fit the form;
    /// the form is left unchanged.
    pub fn set_field(&mut self, path: &FieldPath, value: Value) -> Result<(), PathResolutionError> {
        self.form = self.form.set_path(path, value)?;
        self.errors.remove(&path.to_string());
        Ok(())
    }

    /// Applies an arbitrary form transition (list edits and the like).
    ///
    /// # Errors
    ///
    /// Propagates the transition's error; the form is left unchanged.
    pub fn update_form<F>(&mut self, update: F) -> Result<(), PathResolutionError>
    where
        F: FnOnce(&FormState) -> Result<FormState, PathResolutionError>,
    {
        self.form = update(&self.form)?;
        Ok(())
    }

    /// Revalidates every step and hands out the payload.
    ///
    /// # Errors
    ///
    /// [`PublishError::NotOnFinalStep`] before the last step,
    /// [`PublishError::Invalid`] listing every failing field otherwise.
    pub fn publish(&self) -> Result<FormState, PublishError> {
        if !self.is_last() {
            return Err(PublishError::NotOnFinalStep {
                current: self.current,
                last: self.steps.len(),
            });
        }
        let failures: Vec<StepFailure> = self
            .steps
            .iter()
            .enumerate()
            .flat_map(|(index, step)| {
                step.validate(&self.form)
                    .iter()
                    .map(|(field, message)| StepFailure {
                        step: index + 1,
                        field: field.to_string(),
                        message: message.to_string(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        if failures.is_empty() {
            Ok(self.form.clone())
        } else {
            Err(PublishError::Invalid(failures))
        }
    }
}
