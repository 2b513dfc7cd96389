//! Tagged field paths into nested values.
//!
//! A [`FieldPath`] is an ordered list of [`PathSegment`]s: map keys and list
//! indices. Paths are parsed once from their dotted text form
//! (`"shipping.dimensions.length"`, `"images.0.url"`) and then resolved
//! against values without any further string splitting.

use std::fmt;
use std::str::FromStr;

use crate::types::Value;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Key of a map entry.
    Key(String),
    /// Position in a list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Error returned when a dotted path string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    /// No segments at all.
    #[error("path is empty")]
    Empty,
    /// Two dots in a row, or a leading or trailing dot.
    #[error("path `{path}` has an empty segment at position {position}")]
    EmptySegment { path: String, position: usize },
}

/// Address of a field inside a nested value.
///
/// Segments made entirely of ASCII digits parse as list indices; every
/// other segment is a map key.
///
/// # Examples
///
/// ```
/// use shopdesk_core::path::{FieldPath, PathSegment};
///
/// let path = FieldPath::parse("images.0.url").unwrap();
/// assert_eq!(path.segments()[1], PathSegment::Index(0));
/// assert_eq!(path.to_string(), "images.0.url");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`PathParseError`] for an empty path or an empty segment
    /// (`"a..b"`, `".a"`, `"a."`).
    pub fn parse(text: &str) -> Result<Self, PathParseError> {
        if text.is_empty() {
            return Err(PathParseError::Empty);
        }
        let segments = text
            .split('.')
            .enumerate()
            .map(|(position, raw)| {
                if raw.is_empty() {
                    Err(PathParseError::EmptySegment {
                        path: text.to_string(),
                        position,
                    })
                } else if raw.bytes().all(|b| b.is_ascii_digit()) {
                    // Digit runs too long for usize are treated as keys.
                    Ok(raw
                        .parse::<usize>()
                        .map_or_else(|_| PathSegment::Key(raw.to_string()), PathSegment::Index))
                } else {
                    Ok(PathSegment::Key(raw.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// Single-key path. Never fails; the key is taken verbatim even if it
    /// contains dots.
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(key.into())],
        }
    }

    /// Segments in order, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Looks the path up in `root`, returning `None` when any step is
    /// missing or the wrong kind of container.
    ///
    /// This is the lenient lookup used for reading record fields, where an
    /// absent value is an ordinary outcome. Form editing uses the strict
    /// resolver in [`crate::form`].
    #[must_use]
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Map(entries)) => entries.get(key),
                (PathSegment::Index(index), Value::List(items)) => items.get(*index),
                // Numeric keys on maps (`{"0": ..}`) resolve by their text.
                (PathSegment::Index(index), Value::Map(entries)) => {
                    entries.get(&index.to_string())
                }
                _ => None,
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_keys_and_indices() {
        let path = FieldPath::parse("variants.2.sku").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("variants".to_string()),
                PathSegment::Index(2),
                PathSegment::Key("sku".to_string()),
            ]
        );
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert_eq!(FieldPath::parse(""), Err(PathParseError::Empty));
        assert!(matches!(
            FieldPath::parse("a..b"),
            Err(PathParseError::EmptySegment { position: 1, .. })
        ));
        assert!(FieldPath::parse(".a").is_err());
        assert!(FieldPath::parse("a.").is_err());
    }

    #[test]
    fn display_roundtrips_text() {
        for text in ["name", "pricing.basePrice", "images.0.url"] {
            assert_eq!(FieldPath::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn lookup_walks_maps_and_lists() {
        let root = Value::from(json!({
            "pricing": {"basePrice": 20},
            "images": [{"url": "a.png"}, {"url": "b.png"}]
        }));
        let price = FieldPath::parse("pricing.basePrice").unwrap();
        assert_eq!(price.lookup(&root), Some(&Value::Int(20)));
        let url = FieldPath::parse("images.1.url").unwrap();
        assert_eq!(url.lookup(&root), Some(&Value::from("b.png")));
    }

    #[test]
    fn lookup_missing_is_none() {
        let root = Value::from(json!({"pricing": {"basePrice": 20}}));
        assert!(FieldPath::parse("pricing.salePrice").unwrap().lookup(&root).is_none());
        assert!(FieldPath::parse("pricing.basePrice.x").unwrap().lookup(&root).is_none());
        assert!(FieldPath::parse("images.0").unwrap().lookup(&root).is_none());
    }

    #[test]
    fn key_constructor_keeps_dots() {
        let path = FieldPath::key("a.b");
        assert_eq!(path.len(), 1);
        let root = Value::from(json!({"a.b": 1}));
        assert_eq!(path.lookup(&root), Some(&Value::Int(1)));
    }
}
