//! Field-level validation producing per-field error maps.
//!
//! Validation failures are data, not errors: a validator returns
//! [`FieldErrors`] keyed by field, and the presentation layer renders each
//! message next to its field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::form::FormState;
use crate::path::{FieldPath, PathParseError};
use crate::types::Value;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9\s\-()]{6,19}$").expect("phone pattern compiles"));

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Drops the message for a field.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    /// Adds every entry of `other` not already present.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    /// Field and message pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut errors = Self::new();
        for (field, message) in iter {
            errors.insert(field, message);
        }
        errors
    }
}

/// Produces field errors for a form.
pub trait StepValidator: Send + Sync {
    fn validate(&self, form: &FormState) -> FieldErrors;

    /// Paths this validator reads. Checked against the form template when
    /// a wizard is assembled, so wiring mistakes surface up front.
    fn paths(&self) -> Vec<&FieldPath> {
        Vec::new()
    }
}

impl<F> StepValidator for F
where
    F: Fn(&FormState) -> FieldErrors + Send + Sync,
{
    fn validate(&self, form: &FormState) -> FieldErrors {
        self(form)
    }
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
enum Check {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
    Pattern(Regex),
    NonEmptyList,
    Custom(Predicate),
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Required => f.write_str("Required"),
            Check::MinLength(n) => write!(f, "MinLength({n})"),
            Check::MaxLength(n) => write!(f, "MaxLength({n})"),
            Check::Min(n) => write!(f, "Min({n})"),
            Check::Max(n) => write!(f, "Max({n})"),
            Check::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Check::NonEmptyList => f.write_str("NonEmptyList"),
            Check::Custom(_) => f.write_str("Custom"),
        }
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.trim().chars().count()),
        Value::List(items) => Some(items.len()),
        _ => None,
    }
}

impl Check {
    /// `value` is `None` when the field is absent. Optional blank fields
    /// skip every check but `Required`.
    fn passes(&self, value: Option<&Value>) -> bool {
        let blank = value.map_or(true, Value::is_blank);
        match (self, value) {
            (Check::Required, _) => !blank,
            (Check::NonEmptyList, _) => value.and_then(Value::as_list).is_some_and(|items| !items.is_empty()),
            (_, None) => true,
            _ if blank => true,
            (Check::MinLength(min), Some(v)) => length(v).map_or(true, |len| len >= *min),
            (Check::MaxLength(max), Some(v)) => length(v).map_or(true, |len| len <= *max),
            (Check::Min(min), Some(v)) => v.as_f64().is_some_and(|n| n >= *min),
            (Check::Max(max), Some(v)) => v.as_f64().is_some_and(|n| n <= *max),
            (Check::Pattern(re), Some(v)) => v.scalar_text().is_some_and(|text| re.is_match(text.trim())),
            (Check::Custom(predicate), Some(v)) => predicate(v),
        }
    }
}

/// Checks bound to one field. The first failing check sets the message.
#[derive(Debug, Clone)]
pub struct FieldRule {
    path: FieldPath,
    key: String,
    checks: Vec<(Check, String)>,
}

impl FieldRule {
    /// Rule for the field at `path`; errors are keyed by the path text.
    ///
    /// # Errors
    ///
    /// Returns [`PathParseError`] for a malformed path.
    pub fn new(path: &str) -> Result<Self, PathParseError> {
        let path = FieldPath::parse(path)?;
        Ok(Self {
            key: path.to_string(),
            path,
            checks: Vec::new(),
        })
    }

    /// Field this rule checks.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Error key, the path text.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn check(mut self, check: Check, message: impl Into<String>) -> Self {
        self.checks.push((check, message.into()));
        self
    }

    /// Must be present and not blank (empty text, empty list, null).
    #[must_use]
    pub fn required(self, message: impl Into<String>) -> Self {
        self.check(Check::Required, message)
    }

    /// Trimmed text length (or list length) at least `min`.
    #[must_use]
    pub fn min_length(self, min: usize, message: impl Into<String>) -> Self {
        self.check(Check::MinLength(min), message)
    }

    /// Fails when the trimmed text or the list is longer than `max`.
    #[must_use]
    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.check(Check::MaxLength(max), message)
    }

    /// Numeric and at least `min`.
    #[must_use]
    pub fn min(self, min: f64, message: impl Into<String>) -> Self {
        self.check(Check::Min(min), message)
    }

    /// Fails when the number is above `max`.
    #[must_use]
    pub fn max(self, max: f64, message: impl Into<String>) -> Self {
        self.check(Check::Max(max), message)
    }

    /// Fails when the text does not match `pattern`.
    #[must_use]
    pub fn pattern(self, pattern: Regex, message: impl Into<String>) -> Self {
        self.check(Check::Pattern(pattern), message)
    }

    /// Requires an email address.
    #[must_use]
    pub fn email(self, message: impl Into<String>) -> Self {
        self.check(Check::Pattern(EMAIL.clone()), message)
    }

    /// Requires a phone number.
    #[must_use]
    pub fn phone(self, message: impl Into<String>) -> Self {
        self.check(Check::Pattern(PHONE.clone()), message)
    }

    /// Must be a list with at least one item.
    #[must_use]
    pub fn non_empty_list(self, message: impl Into<String>) -> Self {
        self.check(Check::NonEmptyList, message)
    }

    /// Fails when `predicate` returns false.
    #[must_use]
    pub fn custom<F>(self, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.check(Check::Custom(Arc::new(predicate)), message)
    }

    /// First failing message for this field, if any.
    #[must_use]
    pub fn evaluate(&self, form: &FormState) -> Option<&str> {
        let root = form.to_value();
        let value = self.path.lookup(&root);
        self.checks
            .iter()
            .find(|(check, _)| !check.passes(value))
            .map(|(_, message)| message.as_str())
    }
}

/// Ordered list of field rules; implements [`StepValidator`].
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Rule set checked in order.
    #[must_use]
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Rules in order.
    #[must_use]
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl StepValidator for RuleSet {
    fn validate(&self, form: &FormState) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for rule in &self.rules {
            if let Some(message) = rule.evaluate(form) {
                errors.insert(rule.key(), message);
            }
        }
        errors
    }

    fn paths(&self) -> Vec<&FieldPath> {
        self.rules.iter().map(FieldRule::path).collect()
    }
}
