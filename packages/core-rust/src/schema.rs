use std::collections::BTreeSet;

use crate::path::{FieldPath, PathParseError};
use crate::sort::{SortDirection, SortKind, SortRegistry, SortRule};

/// Schema descriptor for one entity type (orders, partners, banners, ...).
///
/// Everything a list page used to hard-code lives here: which field is the
/// identifier, which fields the search box looks at, which categorical
/// fields can be narrowed, and which fields can be sorted and how.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    entity: String,
    id_field: String,
    searchable: Vec<FieldPath>,
    facets: Vec<FacetDef>,
    sorts: SortRegistry,
}

/// A categorical field that can be narrowed to one exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetDef {
    /// Name used in a `FilterSpec` (`"status"`, `"tier"`).
    pub name: String,
    /// Where the value lives in a record.
    pub path: FieldPath,
    /// Declared values, in display order. Records may still carry values
    /// outside this list.
    pub domain: Vec<String>,
}

/// Errors raised while building a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A declared field path does not parse.
    #[error("{entity}: invalid path for `{field}`: {source}")]
    InvalidPath {
        entity: String,
        field: String,
        #[source]
        source: PathParseError,
    },
    /// The same facet name was declared twice.
    #[error("{entity}: facet `{name}` declared twice")]
    DuplicateFacet { entity: String, name: String },
    /// The same sort field was declared twice.
    #[error("{entity}: sort field `{name}` declared twice")]
    DuplicateSort { entity: String, name: String },
}

impl EntitySchema {
    /// Starts a schema for `entity`. The identifier field defaults to `"id"`.
    #[must_use]
    pub fn builder(entity: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            entity: entity.into(),
            id_field: "id".to_string(),
            searchable: Vec::new(),
            facets: Vec::new(),
            sorts: Vec::new(),
            error: None,
        }
    }

    /// Entity name, such as `"orders"`.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Field holding the record id.
    #[must_use]
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Paths scanned by the search box.
    #[must_use]
    pub fn searchable(&self) -> &[FieldPath] {
        &self.searchable
    }

    /// Declared facets in declaration order.
    #[must_use]
    pub fn facets(&self) -> &[FacetDef] {
        &self.facets
    }

    /// Facet by name.
    #[must_use]
    pub fn facet(&self, name: &str) -> Option<&FacetDef> {
        self.facets.iter().find(|facet| facet.name == name)
    }

    /// Sortable fields.
    #[must_use]
    pub fn sorts(&self) -> &SortRegistry {
        &self.sorts
    }
}

/// Builder for [`EntitySchema`].
///
/// Path parse errors and duplicate declarations are collected and reported
/// once by [`EntitySchemaBuilder::build`].
#[derive(Debug)]
pub struct EntitySchemaBuilder {
    entity: String,
    id_field: String,
    searchable: Vec<FieldPath>,
    facets: Vec<FacetDef>,
    sorts: Vec<(String, SortRule)>,
    error: Option<SchemaError>,
}

impl EntitySchemaBuilder {
    /// Overrides the id field (default `"id"`).
    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Adds fields matched by the free-text search box.
    #[must_use]
    pub fn searchable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            if let Some(path) = self.parse(field.as_ref()) {
                self.searchable.push(path);
            }
        }
        self
    }

    /// Adds a categorical facet stored under a field of the same name.
    #[must_use]
    pub fn facet<I, S>(self, name: &str, domain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_at(name, name, domain)
    }

    /// Adds a categorical facet whose value lives at `path`.
    #[must_use]
    pub fn facet_at<I, S>(mut self, name: &str, path: &str, domain: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.facets.iter().any(|facet| facet.name == name) {
            self.fail(SchemaError::DuplicateFacet {
                entity: self.entity.clone(),
                name: name.to_string(),
            });
            return self;
        }
        if let Some(path) = self.parse(path) {
            self.facets.push(FacetDef {
                name: name.to_string(),
                path,
                domain: domain.into_iter().map(Into::into).collect(),
            });
        }
        self
    }

    /// Registers a sortable field stored under its own name.
    #[must_use]
    pub fn sort(self, name: &str, kind: SortKind, default_direction: SortDirection) -> Self {
        self.sort_at(name, name, kind, default_direction)
    }

    /// Registers a sortable field whose value lives at `path`.
    #[must_use]
    pub fn sort_at(
        mut self,
        name: &str,
        path: &str,
        kind: SortKind,
        default_direction: SortDirection,
    ) -> Self {
        if self.sorts.iter().any(|(existing, _)| existing == name) {
            self.fail(SchemaError::DuplicateSort {
                entity: self.entity.clone(),
                name: name.to_string(),
            });
            return self;
        }
        if let Some(path) = self.parse(path) {
            self.sorts.push((
                name.to_string(),
                SortRule {
                    path,
                    kind,
                    default_direction,
                },
            ));
        }
        self
    }

    /// Finishes the schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] recorded while building.
    pub fn build(self) -> Result<EntitySchema, SchemaError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut searchable = Vec::with_capacity(self.searchable.len());
        let mut seen = BTreeSet::new();
        for path in self.searchable {
            if seen.insert(path.clone()) {
                searchable.push(path);
            }
        }
        Ok(EntitySchema {
            entity: self.entity,
            id_field: self.id_field,
            searchable,
            facets: self.facets,
            sorts: self.sorts.into_iter().collect(),
        })
    }

    fn parse(&mut self, field: &str) -> Option<FieldPath> {
        match FieldPath::parse(field) {
            Ok(path) => Some(path),
            Err(source) => {
                self.fail(SchemaError::InvalidPath {
                    entity: self.entity.clone(),
                    field: field.to_string(),
                    source,
                });
                None
            }
        }
    }

    fn fail(&mut self, error: SchemaError) {
        self.error.get_or_insert(error);
    }
}
