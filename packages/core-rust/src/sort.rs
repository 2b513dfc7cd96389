//! Field → comparator registry and stable multi-key sorting.
//!
//! Each sortable field is registered once with a [`SortRule`] naming where
//! the value lives, how values compare ([`SortKind`]) and the direction a
//! bare field name implies (e.g. `revenue` sorts highest first). A sort
//! request is an explicit list of [`SortSpec`] `(field, direction)` pairs;
//! later specs break ties left by earlier ones.
//!
//! # Missing values
//!
//! Absent fields, non-numeric values under a numeric rule, unparsable
//! timestamps and values outside a rank table always rank last,
//! whichever direction is requested.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::record::Record;
use crate::types::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Explicit rank order for categorical values (`critical` before `high`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    ranks: BTreeMap<String, u32>,
}

impl RankTable {
    /// Ranks values by their position in `ordered`, starting at 0.
    ///
    /// A value listed twice keeps its first rank.
    pub fn new<I, S>(ordered: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranks = BTreeMap::new();
        for (rank, value) in (0u32..).zip(ordered) {
            ranks.entry(value.into()).or_insert(rank);
        }
        Self { ranks }
    }

    /// Rank of a value; unknown values have none.
    #[must_use]
    pub fn rank(&self, value: &str) -> Option<u32> {
        self.ranks.get(value).copied()
    }
}

/// How values of a sortable field compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKind {
    /// Integers, floats, or numeric strings.
    Numeric,
    /// Case-insensitive text order; the exact text breaks ties.
    Text,
    /// ISO-8601 timestamps (`2024-03-01T10:00:00Z`, `2024-03-01T10:00:00`,
    /// `2024-03-01`) or integer epoch milliseconds.
    Timestamp,
    /// Explicit rank table, ascending by rank.
    Rank(RankTable),
}

/// Registered comparator for one sortable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRule {
    /// Where the value lives in a record.
    pub path: FieldPath,
    /// How values compare.
    pub kind: SortKind,
    /// Direction used when the field is requested by name alone.
    pub default_direction: SortDirection,
}

/// One `(field, direction)` sort request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    /// Registered sort field name.
    pub field: String,
    /// Requested order.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending request for `field`.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending request for `field`.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text { folded: String, raw: String },
    Time(i64),
    Rank(u32),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (
                SortKey::Text { folded: fa, raw: ra },
                SortKey::Text { folded: fb, raw: rb },
            ) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Rank(a), SortKey::Rank(b)) => a.cmp(b),
            // One rule always yields one key kind.
            _ => Ordering::Equal,
        }
    }
}

impl SortRule {
    fn key(&self, record: &Record) -> Option<SortKey> {
        let value = record.get_path(&self.path)?;
        match &self.kind {
            SortKind::Numeric => value.as_f64().map(SortKey::Number),
            SortKind::Text => value.scalar_text().map(|text| SortKey::Text {
                folded: text.to_lowercase(),
                raw: text.into_owned(),
            }),
            SortKind::Timestamp => match value {
                Value::Int(millis) => Some(SortKey::Time(*millis)),
                Value::String(text) => parse_timestamp(text).map(SortKey::Time),
                _ => None,
            },
            SortKind::Rank(table) => value
                .scalar_text()
                .and_then(|text| table.rank(&text))
                .map(SortKey::Rank),
        }
    }
}

/// Parses the timestamp shapes found in list data into epoch milliseconds.
fn parse_timestamp(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Missing keys rank last regardless of direction.
fn compare_slots(a: Option<&SortKey>, b: Option<&SortKey>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => direction.apply(a.compare(b)),
    }
}

/// Registry of sortable fields for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortRegistry {
    rules: BTreeMap<String, SortRule>,
}

impl SortRegistry {
    /// Rule for a registered field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SortRule> {
        self.rules.get(field)
    }

    /// Registered field names, alphabetically.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Resolves a bare field token (`"revenue"`, `"date"`) to a spec using
    /// the field's default direction. Unknown tokens resolve to `None`.
    #[must_use]
    pub fn spec_for_token(&self, token: &str) -> Option<SortSpec> {
        self.rules.get(token).map(|rule| SortSpec {
            field: token.to_string(),
            direction: rule.default_direction,
        })
    }

    /// Comparator for a single spec, or `None` for an unregistered field.
    #[must_use]
    pub fn comparator(&self, spec: &SortSpec) -> Option<impl Fn(&Record, &Record) -> Ordering + '_> {
        let rule = self.rules.get(&spec.field)?;
        let direction = spec.direction;
        Some(move |a: &Record, b: &Record| {
            compare_slots(rule.key(a).as_ref(), rule.key(b).as_ref(), direction)
        })
    }

    /// Returns `records` ordered by `order`, leaving the input untouched.
    ///
    /// The sort is stable. Specs naming unregistered fields are skipped;
    /// if none remain the input order is returned as-is.
    #[must_use]
    pub fn sort(&self, records: &[Record], order: &[SortSpec]) -> Vec<Record> {
        let rules: Vec<(&SortRule, SortDirection)> = order
            .iter()
            .filter_map(|spec| match self.rules.get(&spec.field) {
                Some(rule) => Some((rule, spec.direction)),
                None => {
                    tracing::debug!(field = %spec.field, "ignoring unknown sort field");
                    None
                }
            })
            .collect();
        if rules.is_empty() {
            return records.to_vec();
        }

        // Keys are extracted once per record rather than once per comparison.
        let mut keyed: Vec<(Vec<Option<SortKey>>, &Record)> = records
            .iter()
            .map(|record| (rules.iter().map(|(rule, _)| rule.key(record)).collect(), record))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            rules
                .iter()
                .enumerate()
                .map(|(i, (_, direction))| compare_slots(a[i].as_ref(), b[i].as_ref(), *direction))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        keyed.into_iter().map(|(_, record)| record.clone()).collect()
    }
}

impl FromIterator<(String, SortRule)> for SortRegistry {
    fn from_iter<T: IntoIterator<Item = (String, SortRule)>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
