//! Records and the read-only record store behind a list view.
//!
//! A [`Record`] is one row of domain data (an order, a partner, a banner)
//! held as a field map plus its identifier. A [`RecordStore`] is the
//! immutable snapshot a page mounts with: records are never mutated in
//! place, mutations are expressed as intents handed to a collaborator.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::schema::EntitySchema;
use crate::types::Value;

/// Stable, unique identifier of a record.
///
/// Integer identifiers from the data source are normalised to their
/// decimal text so that `7` and `"7"` name the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives an identifier from a field value. Only strings and integers
    /// qualify.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Int(i) => Some(Self(i.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for RecordId {
    fn from(i: i64) -> Self {
        Self(i.to_string())
    }
}

/// Errors raised while building a single record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// The value is not a field map.
    #[error("record is a {kind}, expected a map of fields")]
    NotAMap { kind: &'static str },
    /// The id field is missing or not a string or integer.
    #[error("record has no usable `{field}` identifier")]
    MissingId { field: String },
}

/// Errors raised while assembling a record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordStoreError {
    /// One record failed to build.
    #[error("{entity} record #{position}: {source}")]
    Record {
        entity: String,
        position: usize,
        #[source]
        source: RecordError,
    },
    /// Two records share an id.
    #[error("{entity}: duplicate record id `{id}`")]
    DuplicateId { entity: String, id: RecordId },
}

/// One item of domain data.
///
/// Cloning is cheap: the field map is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    fields: Value,
}

impl Record {
    /// Wraps a map value, extracting its identifier from `id_field`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::NotAMap`] if `fields` is not a map and
    /// [`RecordError::MissingId`] if the identifier is absent or not a
    /// string/integer.
    pub fn new(id_field: &str, fields: Value) -> Result<Self, RecordError> {
        let Value::Map(entries) = &fields else {
            return Err(RecordError::NotAMap { kind: fields.kind() });
        };
        let id = entries
            .get(id_field)
            .and_then(RecordId::from_value)
            .ok_or_else(|| RecordError::MissingId {
                field: id_field.to_string(),
            })?;
        Ok(Self { id, fields })
    }

    /// Identifier taken from the schema id field.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// The whole field map as a value.
    #[must_use]
    pub fn fields(&self) -> &Value {
        &self.fields
    }

    /// Top-level field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.as_map().and_then(|entries| entries.get(field))
    }

    /// Field by path, descending into nested sub-objects such as
    /// `pricing.basePrice` or `engagement.views`.
    #[must_use]
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        path.lookup(&self.fields)
    }
}

/// Immutable collection of records for one entity type, with its schema.
///
/// Created once per page mount. Every record carries a unique identifier.
#[derive(Debug, Clone)]
pub struct RecordStore {
    schema: Arc<EntitySchema>,
    records: Arc<[Record]>,
}

impl RecordStore {
    /// Builds a store from raw field maps supplied by the data source.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Record`] for a malformed record and
    /// [`RecordStoreError::DuplicateId`] when two records share an id.
    pub fn from_values<I>(schema: Arc<EntitySchema>, values: I) -> Result<Self, RecordStoreError>
    where
        I: IntoIterator<Item = Value>,
    {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                Record::new(schema.id_field(), value).map_err(|source| RecordStoreError::Record {
                    entity: schema.entity().to_string(),
                    position,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(schema, records)
    }

    /// Builds a store from already-constructed records.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::DuplicateId`] when two records share an id.
    pub fn new(schema: Arc<EntitySchema>, records: Vec<Record>) -> Result<Self, RecordStoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(RecordStoreError::DuplicateId {
                    entity: schema.entity().to_string(),
                    id: record.id().clone(),
                });
            }
        }
        Ok(Self {
            schema,
            records: records.into(),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// All records in load order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record with the given id.
    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> Arc<EntitySchema> {
        Arc::new(EntitySchema::builder("orders").id_field("id").build().unwrap())
    }

    #[test]
    fn integer_and_string_ids_normalise() {
        let a = Record::new("id", Value::from(json!({"id": 7}))).unwrap();
        let b = Record::new("id", Value::from(json!({"id": "7"}))).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().as_str(), "7");
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = Record::new("id", Value::from(json!({"name": "x"}))).unwrap_err();
        assert_eq!(err, RecordError::MissingId { field: "id".to_string() });

        let err = Record::new("id", Value::from(json!({"id": null}))).unwrap_err();
        assert!(matches!(err, RecordError::MissingId { .. }));
    }

    #[test]
    fn non_map_record_is_rejected() {
        let err = Record::new("id", Value::from(json!([1, 2]))).unwrap_err();
        assert_eq!(err, RecordError::NotAMap { kind: "list" });
    }

    #[test]
    fn nested_field_lookup() {
        let record = Record::new(
            "id",
            Value::from(json!({"id": 1, "engagement": {"views": 420}})),
        )
        .unwrap();
        let path = FieldPath::parse("engagement.views").unwrap();
        assert_eq!(record.get_path(&path), Some(&Value::Int(420)));
        assert!(record.get("views").is_none());
    }

    #[test]
    fn store_rejects_duplicate_ids() {
        let err = RecordStore::from_values(
            schema(),
            [json!({"id": 1}), json!({"id": "1"})].map(Value::from),
        )
        .unwrap_err();
        assert!(matches!(err, RecordStoreError::DuplicateId { ref id, .. } if id.as_str() == "1"));
    }

    #[test]
    fn store_reports_position_of_bad_record() {
        let err = RecordStore::from_values(
            schema(),
            [json!({"id": 1}), json!({"name": "no id"})].map(Value::from),
        )
        .unwrap_err();
        assert!(matches!(err, RecordStoreError::Record { position: 1, .. }));
    }

    #[test]
    fn store_lookup_by_id() {
        let store = RecordStore::from_values(
            schema(),
            [json!({"id": 1, "total": 10}), json!({"id": 2, "total": 20})].map(Value::from),
        )
        .unwrap();
        assert_eq!(store.len(), 2);
        let record = store.get(&RecordId::from(2_i64)).unwrap();
        assert_eq!(record.get("total"), Some(&Value::Int(20)));
    }
}
