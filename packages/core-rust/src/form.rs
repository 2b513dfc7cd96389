//! Persistent nested form state with path-addressed updates.
//!
//! [`FormState::set_path`] never mutates: it returns a new state in which
//! every container on the path is a shallow copy and every other branch is
//! shared with the previous state by reference. Callers can therefore use
//! [`Value::ptr_eq`] on any branch to tell whether it changed.
//!
//! Lists are only ever replaced wholesale ([`FormState::replace_list`] and
//! the helpers built on it); there is no in-place index mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::path::{FieldPath, PathSegment};
use crate::types::Value;

/// Why a path segment could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathErrorReason {
    /// An intermediate key does not exist.
    Missing,
    /// The value holding this segment is not the right kind of container.
    NotContainer {
        expected: &'static str,
        found: &'static str,
    },
    /// A list index past the end.
    IndexOutOfBounds { len: usize },
}

impl fmt::Display for PathErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathErrorReason::Missing => f.write_str("no such field"),
            PathErrorReason::NotContainer { expected, found } => {
                write!(f, "expected a {expected}, found a {found}")
            }
            PathErrorReason::IndexOutOfBounds { len } => {
                write!(f, "index out of bounds for a list of {len}")
            }
        }
    }
}

/// A path that does not fit the form's shape.
///
/// This is a programming error (form wiring and schema disagree), not a
/// validation message for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot resolve `{path}` at segment `{segment}` (#{position}): {reason}")]
pub struct PathResolutionError {
    /// Full path text.
    pub path: String,
    /// Segment that failed.
    pub segment: String,
    /// Zero-based index of that segment.
    pub position: usize,
    /// Why it failed.
    pub reason: PathErrorReason,
}

impl PathResolutionError {
    fn new(path: &FieldPath, position: usize, reason: PathErrorReason) -> Self {
        Self {
            path: path.to_string(),
            segment: path
                .segments()
                .get(position)
                .map(ToString::to_string)
                .unwrap_or_default(),
            position,
            reason,
        }
    }
}

/// Nested, in-progress form data.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    root: Arc<BTreeMap<String, Value>>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            root: Arc::new(BTreeMap::new()),
        }
    }
}

impl FormState {
    #[must_use]
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self {
            root: Arc::new(fields),
        }
    }

    /// Wraps a map value; any other kind yields `None`.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// The whole state as a map value (shares storage).
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(Arc::clone(&self.root))
    }

    /// Whether `other` is this exact version (no update in between).
    #[must_use]
    pub fn same_version(&self, other: &FormState) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// Strict lookup.
    ///
    /// # Errors
    ///
    /// Returns [`PathResolutionError`] naming the first segment that does
    /// not resolve.
    pub fn get_path(&self, path: &FieldPath) -> Result<&Value, PathResolutionError> {
        let mut node: Option<&Value> = None;
        for (position, segment) in path.segments().iter().enumerate() {
            let next = match (node, segment) {
                (None, _) => map_child(&self.root, segment),
                (Some(Value::Map(entries)), _) => map_child(entries, segment),
                (Some(Value::List(items)), PathSegment::Index(index)) => {
                    items.get(*index).ok_or(PathErrorReason::IndexOutOfBounds { len: items.len() })
                }
                (Some(Value::List(_)), PathSegment::Key(_)) => Err(PathErrorReason::NotContainer {
                    expected: "map",
                    found: "list",
                }),
                (Some(other), _) => Err(PathErrorReason::NotContainer {
                    expected: expected_for(segment),
                    found: other.kind(),
                }),
            };
            node = Some(next.map_err(|reason| PathResolutionError::new(path, position, reason))?);
        }
        node.ok_or_else(|| PathResolutionError::new(path, 0, PathErrorReason::Missing))
    }

    /// Returns a new state with the value at `path` replaced.
    ///
    /// Intermediate segments must already exist; the last key of a map may
    /// be new. On error `self` is untouched and no partial update is
    /// visible anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`PathResolutionError`] when an intermediate segment is
    /// missing, is not a container, or indexes past the end of a list.
    pub fn set_path(&self, path: &FieldPath, value: Value) -> Result<FormState, PathResolutionError> {
        if path.is_empty() {
            return Err(PathResolutionError::new(path, 0, PathErrorReason::Missing));
        }
        let root = set_in_map(&self.root, path, 0, value)?;
        Ok(FormState {
            root: Arc::new(root),
        })
    }

    /// Replaces the list at `path` with `f(current items)`.
    ///
    /// # Errors
    ///
    /// Returns [`PathResolutionError`] when `path` does not resolve or does
    /// not hold a list.
    pub fn replace_list<F>(&self, path: &FieldPath, f: F) -> Result<FormState, PathResolutionError>
    where
        F: FnOnce(&[Value]) -> Vec<Value>,
    {
        let current = self.get_path(path)?;
        let Value::List(items) = current else {
            return Err(PathResolutionError::new(
                path,
                path.len().saturating_sub(1),
                PathErrorReason::NotContainer {
                    expected: "list",
                    found: current.kind(),
                },
            ));
        };
        let next = f(items);
        self.set_path(path, Value::List(Arc::new(next)))
    }

    /// Appends `item` to the list at `path`.
    ///
    /// # Errors
    ///
    /// See [`FormState::replace_list`].
    pub fn push_item(&self, path: &FieldPath, item: Value) -> Result<FormState, PathResolutionError> {
        self.replace_list(path, |items| {
            let mut next = Vec::with_capacity(items.len() + 1);
            next.extend_from_slice(items);
            next.push(item);
            next
        })
    }

    /// Keeps only the list items at `path` for which `keep` returns true.
    ///
    /// # Errors
    ///
    /// See [`FormState::replace_list`].
    pub fn retain_items<F>(&self, path: &FieldPath, mut keep: F) -> Result<FormState, PathResolutionError>
    where
        F: FnMut(&Value) -> bool,
    {
        self.replace_list(path, |items| items.iter().filter(|item| keep(item)).cloned().collect())
    }
}

fn expected_for(segment: &PathSegment) -> &'static str {
    match segment {
        PathSegment::Key(_) => "map",
        PathSegment::Index(_) => "list",
    }
}

fn map_key(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(index) => index.to_string(),
    }
}

fn map_child<'a>(
    entries: &'a BTreeMap<String, Value>,
    segment: &PathSegment,
) -> Result<&'a Value, PathErrorReason> {
    entries.get(&map_key(segment)).ok_or(PathErrorReason::Missing)
}

fn set_in_map(
    entries: &BTreeMap<String, Value>,
    path: &FieldPath,
    position: usize,
    value: Value,
) -> Result<BTreeMap<String, Value>, PathResolutionError> {
    let segment = &path.segments()[position];
    let key = map_key(segment);
    let next = if position + 1 == path.len() {
        value
    } else {
        let child = entries
            .get(&key)
            .ok_or_else(|| PathResolutionError::new(path, position, PathErrorReason::Missing))?;
        set_in(child, path, position + 1, value)?
    };
    // Shallow copy: sibling values are `Arc` clones of the originals.
    let mut copy = entries.clone();
    copy.insert(key, next);
    Ok(copy)
}

fn set_in(
    node: &Value,
    path: &FieldPath,
    position: usize,
    value: Value,
) -> Result<Value, PathResolutionError> {
    let segment = &path.segments()[position];
    match (node, segment) {
        (Value::Map(entries), _) => Ok(Value::Map(Arc::new(set_in_map(
            entries, path, position, value,
        )?))),
        (Value::List(items), PathSegment::Index(index)) => {
            let child = items.get(*index).ok_or_else(|| {
                PathResolutionError::new(
                    path,
                    position,
                    PathErrorReason::IndexOutOfBounds { len: items.len() },
                )
            })?;
            let next = if position + 1 == path.len() {
                value
            } else {
                set_in(child, path, position + 1, value)?
            };
            let mut copy = items.as_ref().clone();
            copy[*index] = next;
            Ok(Value::List(Arc::new(copy)))
        }
        (other, _) => Err(PathResolutionError::new(
            path,
            position,
            PathErrorReason::NotContainer {
                expected: expected_for(segment),
                found: other.kind(),
            },
        )),
    }
}

impl From<BTreeMap<String, Value>> for FormState {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::new(fields)
    }
}
