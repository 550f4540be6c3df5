//! Per-type schemas and their registry.
//!
//! Host records carry their resource type explicitly through [`Record`];
//! the [`SchemaContainer`] maps that tag to the [`Schema`] describing how the
//! record is encoded.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::error::{JsonApiError, JsonApiResult};
use crate::links::LinkBuilder;
use crate::object::{ResourceIdentifier, StandardObject};
use crate::parameters::IncludePath;

/// A domain record that can be encoded.
pub trait Record: Clone + Send + Sync + 'static {
    /// Returns the JSON:API resource type this record is exposed as.
    fn resource_type(&self) -> &str;
}

/// Records reachable through one relationship of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum RelatedData<R> {
    /// A to-one relationship, `None` when empty.
    ToOne(Option<R>),
    /// A to-many relationship.
    ToMany(Vec<R>),
}

impl<R> RelatedData<R> {
    /// Returns the related records.
    pub fn records(&self) -> Vec<&R> {
        match self {
            RelatedData::ToOne(record) => record.iter().collect(),
            RelatedData::ToMany(records) => records.iter().collect(),
        }
    }

    /// Returns true for to-many data.
    pub fn is_to_many(&self) -> bool {
        matches!(self, RelatedData::ToMany(_))
    }
}

/// Extraction rules for one resource type.
///
/// Only `resource_type`, `id` and `attributes` are required. The default
/// `links` emit a `self` link, the default `meta` emits nothing.
pub trait Schema<R>: Send + Sync {
    /// The resource type this schema encodes.
    fn resource_type(&self) -> &str;

    /// The external id of the record.
    fn id(&self, record: &R) -> String;

    /// The record's attributes, in the order they should be emitted.
    fn attributes(&self, record: &R) -> StandardObject;

    /// The record's relationships, in the order they should be emitted.
    fn relationships(&self, _record: &R) -> Vec<(String, RelatedData<R>)> {
        Vec::new()
    }

    /// The declared relationship fields, each paired with the resource type
    /// it points at. Include paths are checked against these.
    fn relationship_types(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }

    /// Resource-level links.
    fn links(&self, record: &R, links: &LinkBuilder) -> StandardObject {
        StandardObject::new().with(
            "self",
            json!(links.resource(self.resource_type(), &self.id(record))),
        )
    }

    /// Resource-level meta.
    fn meta(&self, _record: &R) -> Option<StandardObject> {
        None
    }
}

/// Registry of schemas keyed by resource type.
///
/// Populated at configuration time and shared read-only afterwards.
pub struct SchemaContainer<R> {
    schemas: HashMap<String, Arc<dyn Schema<R>>>,
}

impl<R: Record> SchemaContainer<R> {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registers a schema, replacing any previous one for the same type.
    pub fn register(&mut self, schema: Arc<dyn Schema<R>>) {
        self.schemas
            .insert(schema.resource_type().to_string(), schema);
    }

    /// Builder form of [`SchemaContainer::register`].
    pub fn with_schema(mut self, schema: Arc<dyn Schema<R>>) -> Self {
        self.register(schema);
        self
    }

    /// Returns whether a schema is registered for the type.
    pub fn contains(&self, resource_type: &str) -> bool {
        self.schemas.contains_key(resource_type)
    }

    /// Returns the schema registered for a resource type.
    pub fn schema_for_type(&self, resource_type: &str) -> JsonApiResult<&dyn Schema<R>> {
        self.schemas
            .get(resource_type)
            .map(|schema| schema.as_ref())
            .ok_or_else(|| {
                JsonApiError::runtime(format!(
                    "Cannot encode record: unmapped resource type '{}'",
                    resource_type
                ))
            })
    }

    /// Returns the schema for a record, looked up by its type tag.
    pub fn schema_for(&self, record: &R) -> JsonApiResult<&dyn Schema<R>> {
        self.schema_for_type(record.resource_type())
    }

    /// Checks include paths against the declared relationships, starting
    /// from `resource_type`. No records are involved.
    ///
    /// # Errors
    ///
    /// * `BadRequest` - If a segment is not a declared relationship
    /// * `Runtime` - If a type along a path has no schema
    pub fn validate_include(&self, resource_type: &str, paths: &[IncludePath]) -> JsonApiResult<()> {
        for path in paths {
            let mut current = resource_type.to_string();
            for segment in path.segments() {
                let schema = self.schema_for_type(&current)?;
                current = schema
                    .relationship_types()
                    .into_iter()
                    .find(|(field, _)| *field == segment.as_str())
                    .map(|(_, related_type)| related_type.to_string())
                    .ok_or_else(|| {
                        JsonApiError::bad_request(format!(
                            "Cannot include '{}': not a relationship of resource type '{}'",
                            path, current
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Returns the identifier of a record.
    pub fn identifier(&self, record: &R) -> JsonApiResult<ResourceIdentifier> {
        let schema = self.schema_for(record)?;
        Ok(ResourceIdentifier::new(
            schema.resource_type(),
            schema.id(record),
        ))
    }
}

impl<R: Record> Default for SchemaContainer<R> {
    fn default() -> Self {
        Self::new()
    }
}
