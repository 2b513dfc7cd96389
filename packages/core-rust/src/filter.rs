//! Conjunctive predicate filtering over records.
//!
//! A [`FilterSpec`] holds the search box text and the value chosen for each
//! facet (status, tier, category, ...). [`PredicateFilter`] combines them
//! into one predicate: a record is visible when it matches the search term
//! AND every narrowed facet. The sentinel `"all"` and an empty search term
//! never narrow anything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::schema::{EntitySchema, FacetDef};
use crate::types::Value;

/// Sentinel facet value that matches every record.
pub const ALL: &str = "all";

/// Value selected for one facet.
///
/// Serialized as the plain dropdown string, so `"all"` and `"gold"` have
/// the same shape on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FacetValue {
    /// Matches every record.
    All,
    /// Matches records whose field text equals this value exactly.
    Exact(String),
}

impl FacetValue {
    /// Parses a dropdown value; `"all"` becomes [`FacetValue::All`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            FacetValue::All
        } else {
            FacetValue::Exact(value.to_string())
        }
    }

    /// Whether this is the `"all"` sentinel.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, FacetValue::All)
    }
}

impl From<&str> for FacetValue {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for FacetValue {
    fn from(value: String) -> Self {
        if value == ALL {
            FacetValue::All
        } else {
            FacetValue::Exact(value)
        }
    }
}

impl From<FacetValue> for String {
    fn from(value: FacetValue) -> Self {
        match value {
            FacetValue::All => ALL.to_string(),
            FacetValue::Exact(value) => value,
        }
    }
}

/// The currently active filter predicate values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Raw search box text.
    #[serde(default)]
    pub search: String,
    /// Selected value per facet name.
    #[serde(default)]
    pub facets: BTreeMap<String, FacetValue>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search box text.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    /// Sets one facet value.
    #[must_use]
    pub fn with_facet(mut self, name: impl Into<String>, value: impl Into<FacetValue>) -> Self {
        self.facets.insert(name.into(), value.into());
        self
    }

    /// Normalised search term: trimmed and lower-cased, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<String> {
        let term = self.search.trim();
        (!term.is_empty()).then(|| term.to_lowercase())
    }

    /// Facets that actually narrow the view.
    pub fn active_facets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facets.iter().filter_map(|(name, value)| match value {
            FacetValue::All => None,
            FacetValue::Exact(v) => Some((name.as_str(), v.as_str())),
        })
    }

    /// Whether nothing is narrowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.active_facets().next().is_none()
    }
}

/// Combined predicate compiled from a schema and a filter spec.
///
/// Facets the schema does not declare are ignored.
#[derive(Debug)]
pub struct PredicateFilter<'a> {
    schema: &'a EntitySchema,
    term: Option<String>,
    facets: Vec<(&'a FacetDef, String)>,
}

impl<'a> PredicateFilter<'a> {
    #[must_use]
    pub fn new(schema: &'a EntitySchema, spec: &FilterSpec) -> Self {
        Self::build(schema, spec, None)
    }

    /// Same as [`PredicateFilter::new`] but leaves one facet out, for
    /// counting that facet's values under every other predicate.
    fn without_facet(schema: &'a EntitySchema, spec: &FilterSpec, skip: &str) -> Self {
        Self::build(schema, spec, Some(skip))
    }

    fn build(schema: &'a EntitySchema, spec: &FilterSpec, skip: Option<&str>) -> Self {
        let facets = spec
            .active_facets()
            .filter(|(name, _)| Some(*name) != skip)
            .filter_map(|(name, value)| match schema.facet(name) {
                Some(def) => Some((def, value.to_string())),
                None => {
                    tracing::debug!(entity = schema.entity(), facet = name, "ignoring unknown facet");
                    None
                }
            })
            .collect();
        Self {
            schema,
            term: spec.search_term(),
            facets,
        }
    }

    /// Whether `record` satisfies every active predicate.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && self
                .facets
                .iter()
                .all(|(def, value)| facet_matches(record, def, value))
    }

    fn matches_search(&self, record: &Record) -> bool {
        let Some(term) = &self.term else {
            return true;
        };
        self.schema.searchable().iter().any(|path| {
            record
                .get_path(path)
                .and_then(|value| match value {
                    Value::String(_) | Value::Int(_) | Value::Float(_) => value.scalar_text(),
                    _ => None,
                })
                .is_some_and(|text| text.to_lowercase().contains(term.as_str()))
        })
    }

    /// Records that pass, in input order.
    #[must_use]
    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records.iter().filter(|record| self.matches(record)).cloned().collect()
    }
}

fn facet_matches(record: &Record, def: &FacetDef, value: &str) -> bool {
    record
        .get_path(&def.path)
        .and_then(Value::scalar_text)
        .is_some_and(|text| text == value)
}

/// Filters `records` by `spec` under `schema`, preserving input order.
#[must_use]
pub fn filter(records: &[Record], schema: &EntitySchema, spec: &FilterSpec) -> Vec<Record> {
    PredicateFilter::new(schema, spec).apply(records)
}

/// Number of records per value of one facet, under every other active
/// predicate.
///
/// Declared domain values appear even with a zero count; values found in
/// records but missing from the domain are counted as well. Returns `None`
/// when the schema has no such facet.
#[must_use]
pub fn facet_counts(
    records: &[Record],
    schema: &EntitySchema,
    spec: &FilterSpec,
    facet: &str,
) -> Option<BTreeMap<String, usize>> {
    let def = schema.facet(facet)?;
    let predicate = PredicateFilter::without_facet(schema, spec, facet);
    let mut counts: BTreeMap<String, usize> =
        def.domain.iter().map(|value| (value.clone(), 0)).collect();
    for record in records.iter().filter(|record| predicate.matches(record)) {
        if let Some(text) = record.get_path(&def.path).and_then(Value::scalar_text) {
            *counts.entry(text.into_owned()).or_insert(0) += 1;
        }
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> EntitySchema {
        EntitySchema::builder("partners")
            .searchable(["name", "email", "sku"])
            .facet("status", ["active", "draft", "suspended"])
            .facet_at("tier", "program.tier", ["gold", "silver"])
            .build()
            .unwrap()
    }

    fn records(values: &[serde_json::Value]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::new("id", Value::from(v.clone())).unwrap())
            .collect()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    fn sample() -> Vec<Record> {
        records(&[
            json!({"id": 1, "name": "Acme Supplies", "email": "sales@acme.io", "status": "active", "revenue": 100, "program": {"tier": "gold"}}),
            json!({"id": 2, "name": "Bolt Retail", "email": "hi@bolt.shop", "status": "draft", "revenue": 500, "program": {"tier": "silver"}}),
            json!({"id": 3, "name": "Cobalt Goods", "email": "team@cobalt.co", "status": "active", "sku": 44012, "program": {"tier": "silver"}}),
        ])
    }

    #[test]
    fn status_facet_selects_exact_matches() {
        let input = records(&[
            json!({"id": 1, "status": "active", "revenue": 100}),
            json!({"id": 2, "status": "draft", "revenue": 500}),
        ]);
        let spec = FilterSpec::new().with_facet("status", "active");
        assert_eq!(ids(&filter(&input, &schema(), &spec)), ["1"]);
    }

    #[test]
    fn all_sentinel_and_empty_search_match_everything() {
        let spec = FilterSpec::new()
            .with_search("   ")
            .with_facet("status", "all")
            .with_facet("tier", ALL);
        assert!(spec.is_empty());
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["1", "2", "3"]);
    }

    #[test]
    fn search_is_case_insensitive_over_any_field() {
        let spec = FilterSpec::new().with_search("BOLT");
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["2"]);

        let spec = FilterSpec::new().with_search("goods");
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["3"]);

        let spec = FilterSpec::new().with_search("acme.io");
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["1"]);
    }

    #[test]
    fn search_matches_numeric_fields_by_text() {
        let spec = FilterSpec::new().with_search("4401");
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["3"]);
    }

    #[test]
    fn predicates_combine_with_and() {
        let spec = FilterSpec::new()
            .with_search("o")
            .with_facet("status", "active")
            .with_facet("tier", "silver");
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["3"]);
    }

    #[test]
    fn unknown_facet_is_ignored() {
        let spec = FilterSpec::new().with_facet("region", "emea");
        assert_eq!(filter(&sample(), &schema(), &spec).len(), 3);
    }

    #[test]
    fn missing_facet_field_does_not_match() {
        let input = records(&[json!({"id": 1}), json!({"id": 2, "status": "active"})]);
        let spec = FilterSpec::new().with_facet("status", "active");
        assert_eq!(ids(&filter(&input, &schema(), &spec)), ["2"]);
    }

    #[test]
    fn facet_counts_ignore_own_facet() {
        let spec = FilterSpec::new()
            .with_facet("status", "active")
            .with_facet("tier", "silver");
        let counts = facet_counts(&sample(), &schema(), &spec, "status").unwrap();
        // Tier narrows to ids 2 and 3; status itself is not applied.
        assert_eq!(counts["active"], 1);
        assert_eq!(counts["draft"], 1);
        assert_eq!(counts["suspended"], 0);
    }

    #[test]
    fn facet_counts_include_undeclared_values() {
        let input = records(&[json!({"id": 1, "status": "archived"})]);
        let counts = facet_counts(&input, &schema(), &FilterSpec::new(), "status").unwrap();
        assert_eq!(counts["archived"], 1);
        assert!(facet_counts(&input, &schema(), &FilterSpec::new(), "region").is_none());
    }

    #[test]
    fn facet_values_are_plain_strings() {
        let all: FacetValue = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(all, FacetValue::All);
        let exact: FacetValue = serde_json::from_str(r#""gold""#).unwrap();
        assert_eq!(exact, FacetValue::Exact("gold".to_string()));
        assert_eq!(serde_json::to_value(&exact).unwrap(), json!("gold"));
        assert_eq!(serde_json::to_value(&all).unwrap(), json!("all"));
    }

    #[test]
    fn filter_spec_reads_ui_shape() {
        let spec: FilterSpec = serde_json::from_value(json!({
            "search": "bolt",
            "facets": {"status": "draft", "tier": "all"}
        }))
        .unwrap();
        assert_eq!(spec.facets["status"], FacetValue::Exact("draft".to_string()));
        assert_eq!(ids(&filter(&sample(), &schema(), &spec)), ["2"]);

        let empty: FilterSpec = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
    }
}
