//! Relationship adapters.
//!
//! A [`RelationResolver`] reads the related ids straight off a record as a
//! [`RelationValue`], independent of how the relation is stored. [`HasOne`]
//! and [`HasMany`] check that value against the declared cardinality and
//! fetch the related records through the target type's adapter.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonapi_document::{JsonApiError, JsonApiResult, Linkage, Record, RelatedData};

use crate::adapter::ResourceAdapter;
use crate::container::AdapterContainer;

/// Relationship cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one related record.
    ToOne,
    /// Any number of related records.
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::ToOne => write!(f, "to-one"),
            Cardinality::ToMany => write!(f, "to-many"),
        }
    }
}

/// Related ids as stored on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationValue {
    /// A single related id, `None` when the relation is empty.
    ToOne(Option<String>),
    /// Related ids in storage order.
    ToMany(Vec<String>),
}

impl RelationValue {
    /// Returns the cardinality of the stored value.
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationValue::ToOne(_) => Cardinality::ToOne,
            RelationValue::ToMany(_) => Cardinality::ToMany,
        }
    }

    /// Converts request linkage into stored ids.
    pub fn from_linkage(linkage: &Linkage) -> Self {
        match linkage {
            Linkage::Empty => RelationValue::ToOne(None),
            Linkage::ToOne(identifier) => RelationValue::ToOne(Some(identifier.id.clone())),
            Linkage::ToMany(identifiers) => {
                RelationValue::ToMany(identifiers.iter().map(|i| i.id.clone()).collect())
            }
        }
    }
}

/// Reads the related ids of one relation off a record.
pub trait RelationResolver<R>: Send + Sync {
    /// Resolves `field` on `record`.
    fn resolve(&self, record: &R, field: &str) -> JsonApiResult<RelationValue>;
}

impl<R, F> RelationResolver<R> for F
where
    F: Fn(&R, &str) -> JsonApiResult<RelationValue> + Send + Sync,
{
    fn resolve(&self, record: &R, field: &str) -> JsonApiResult<RelationValue> {
        self(record, field)
    }
}

/// Resolves a relationship field of a record into related records.
#[async_trait]
pub trait RelationshipAdapter<R: Record>: Send + Sync {
    /// The relationship field name.
    fn field_name(&self) -> &str;

    /// The declared cardinality.
    fn cardinality(&self) -> Cardinality;

    /// The resource type of the related records.
    fn related_type(&self) -> &str;

    /// Fetches the related records of `record`.
    ///
    /// # Errors
    ///
    /// Returns `Runtime` when the stored relation does not match the declared
    /// cardinality or the related type has no adapter.
    async fn query(&self, record: &R, adapters: &AdapterContainer<R>)
    -> JsonApiResult<RelatedData<R>>;
}

struct Relation<R> {
    field: String,
    related_type: String,
    resolver: Arc<dyn RelationResolver<R>>,
}

impl<R: Record> Relation<R> {
    fn resolve(&self, record: &R) -> JsonApiResult<RelationValue> {
        self.resolver.resolve(record, &self.field)
    }

    fn mismatch(&self, relation: &str, found: Cardinality) -> JsonApiError {
        JsonApiError::runtime(format!(
            "relation {} cannot be used for relation of type {} (field '{}')",
            relation, found, self.field
        ))
    }

    fn target(&self, adapters: &AdapterContainer<R>) -> JsonApiResult<Arc<dyn ResourceAdapter<R>>> {
        adapters.adapter(&self.related_type).map_err(|_| {
            JsonApiError::runtime(format!(
                "Relationship '{}' targets resource type '{}' which has no adapter",
                self.field, self.related_type
            ))
        })
    }
}

/// A to-one relationship.
///
/// # Example
///
/// ```
/// use jsonapi_repository::{Cardinality, HasOne, RelationValue, RelationshipAdapter};
/// # use jsonapi_document::Record;
/// # #[derive(Clone)]
/// # struct Post { author_id: Option<String> }
/// # impl Record for Post { fn resource_type(&self) -> &str { "posts" } }
///
/// let author = HasOne::new("author", "people", |post: &Post, _field: &str| {
///     Ok(RelationValue::ToOne(post.author_id.clone()))
/// });
/// assert_eq!(author.cardinality(), Cardinality::ToOne);
/// assert_eq!(author.related_type(), "people");
/// ```
pub struct HasOne<R> {
    relation: Relation<R>,
}

impl<R: Record> HasOne<R> {
    /// Creates a to-one relationship resolved by `resolver`.
    pub fn new<F>(field: impl Into<String>, related_type: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&R, &str) -> JsonApiResult<RelationValue> + Send + Sync + 'static,
    {
        Self::with_resolver(field, related_type, Arc::new(resolver))
    }

    /// Creates a to-one relationship from a shared resolver.
    pub fn with_resolver(
        field: impl Into<String>,
        related_type: impl Into<String>,
        resolver: Arc<dyn RelationResolver<R>>,
    ) -> Self {
        Self {
            relation: Relation {
                field: field.into(),
                related_type: related_type.into(),
                resolver,
            },
        }
    }
}

#[async_trait]
impl<R: Record> RelationshipAdapter<R> for HasOne<R> {
    fn field_name(&self) -> &str {
        &self.relation.field
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::ToOne
    }

    fn related_type(&self) -> &str {
        &self.relation.related_type
    }

    async fn query(
        &self,
        record: &R,
        adapters: &AdapterContainer<R>,
    ) -> JsonApiResult<RelatedData<R>> {
        match self.relation.resolve(record)? {
            RelationValue::ToOne(None) => Ok(RelatedData::ToOne(None)),
            RelationValue::ToOne(Some(id)) => {
                let target = self.relation.target(adapters)?;
                Ok(RelatedData::ToOne(target.find(&id).await?))
            }
            RelationValue::ToMany(_) => Err(self.relation.mismatch("HasOne", Cardinality::ToMany)),
        }
    }
}

/// A to-many relationship.
pub struct HasMany<R> {
    relation: Relation<R>,
}

impl<R: Record> HasMany<R> {
    /// Creates a to-many relationship resolved by `resolver`.
    pub fn new<F>(field: impl Into<String>, related_type: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&R, &str) -> JsonApiResult<RelationValue> + Send + Sync + 'static,
    {
        Self::with_resolver(field, related_type, Arc::new(resolver))
    }

    /// Creates a to-many relationship from a shared resolver.
    pub fn with_resolver(
        field: impl Into<String>,
        related_type: impl Into<String>,
        resolver: Arc<dyn RelationResolver<R>>,
    ) -> Self {
        Self {
            relation: Relation {
                field: field.into(),
                related_type: related_type.into(),
                resolver,
            },
        }
    }
}

#[async_trait]
impl<R: Record> RelationshipAdapter<R> for HasMany<R> {
    fn field_name(&self) -> &str {
        &self.relation.field
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::ToMany
    }

    fn related_type(&self) -> &str {
        &self.relation.related_type
    }

    async fn query(
        &self,
        record: &R,
        adapters: &AdapterContainer<R>,
    ) -> JsonApiResult<RelatedData<R>> {
        match self.relation.resolve(record)? {
            RelationValue::ToMany(ids) if ids.is_empty() => Ok(RelatedData::ToMany(Vec::new())),
            RelationValue::ToMany(ids) => {
                let target = self.relation.target(adapters)?;
                Ok(RelatedData::ToMany(target.find_many(&ids).await?))
            }
            RelationValue::ToOne(_) => Err(self.relation.mismatch("HasMany", Cardinality::ToOne)),
        }
    }
}
