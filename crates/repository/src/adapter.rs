//! Resource adapter contract.
//!
//! This module defines the [`ResourceAdapter`] trait, the one contract a
//! record source has to satisfy to be exposed as a JSON:API resource type.
//! Existence and permission checks happen at the endpoint before any
//! mutating call reaches the adapter.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use jsonapi_document::{
    EncodingParameters, JsonApiError, JsonApiResult, PaginationParameters, Record, ResourceInput,
    ResourceObject,
};

use crate::relationship::RelationshipAdapter;

/// Result of a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<R> {
    /// The records on the requested page.
    pub records: Vec<R>,

    /// Total number of records, reported for pagination.
    pub total: u64,
}

impl<R> QueryResult<R> {
    /// Creates a query result.
    pub fn new(records: Vec<R>, total: u64) -> Self {
        Self { records, total }
    }
}

/// Exposes a source of domain records as one JSON:API resource type.
///
/// # Example
///
/// ```ignore
/// use jsonapi_repository::ResourceAdapter;
///
/// async fn example<R: Record>(adapter: &dyn ResourceAdapter<R>) -> JsonApiResult<()> {
///     let params = EncodingParameters::parse("filter[name]=Foo&sort=-name", 5)?;
///     let pagination = PaginationParameters::page(1, 10)?;
///
///     let result = adapter.query(&params, &pagination).await?;
///     println!("{} of {}", result.records.len(), result.total);
///
///     // Unknown ids are omitted, duplicates collapse.
///     let records = adapter.find_many(&["1".into(), "1".into(), "missing".into()]).await?;
///     assert!(records.len() <= 1);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ResourceAdapter<R: Record>: Send + Sync {
    /// The resource type served by this adapter.
    fn resource_type(&self) -> &str;

    /// Applies filters, sort and pagination, returning the page and the total.
    async fn query(
        &self,
        params: &EncodingParameters,
        pagination: &PaginationParameters,
    ) -> JsonApiResult<QueryResult<R>>;

    /// Creates a record from mapped input.
    ///
    /// # Errors
    ///
    /// * `UnprocessableEntity` - If the attributes are invalid
    /// * `Forbidden` - If the source does not accept writes
    async fn create(
        &self,
        input: ResourceInput,
        resource: &ResourceObject,
        params: &EncodingParameters,
    ) -> JsonApiResult<R>;

    /// Reads a record for display.
    async fn read(&self, id: &str, _params: &EncodingParameters) -> JsonApiResult<Option<R>> {
        self.find(id).await
    }

    /// Applies a resource object to an existing record.
    async fn update(
        &self,
        record: R,
        resource: &ResourceObject,
        params: &EncodingParameters,
    ) -> JsonApiResult<R>;

    /// Deletes an existing record.
    ///
    /// # Errors
    ///
    /// * `Forbidden` - If the source does not permit deletion
    async fn delete(&self, record: R, params: &EncodingParameters) -> JsonApiResult<()>;

    /// Looks up a record by id.
    async fn find(&self, id: &str) -> JsonApiResult<Option<R>>;

    /// Returns whether a record with the id exists.
    async fn exists(&self, id: &str) -> JsonApiResult<bool> {
        Ok(self.find(id).await?.is_some())
    }

    /// Looks up several records.
    ///
    /// Unresolvable ids are omitted and duplicate ids yield one record, kept
    /// at the position of their first occurrence.
    async fn find_many(&self, ids: &[String]) -> JsonApiResult<Vec<R>> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(record) = self.find(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Returns the adapter for a relationship field.
    ///
    /// # Errors
    ///
    /// Returns `Runtime` if the field is not configured as a relationship.
    fn related(&self, field: &str) -> JsonApiResult<Arc<dyn RelationshipAdapter<R>>> {
        Err(JsonApiError::runtime(format!(
            "Field '{}' is not a relationship of resource type '{}'",
            field,
            self.resource_type()
        )))
    }
}
