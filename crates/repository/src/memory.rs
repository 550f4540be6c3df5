//! In-memory resource adapter.
//!
//! Keeps records in insertion order behind a lock. Filtering is equality on
//! [`StoredRecord::field`], sorting follows the requested sort fields in
//! priority order, and the reported total is the size of the stored
//! collection before filters apply.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonapi_document::{
    EncodingParameters, FilterValue, JsonApiError, JsonApiResult, PaginationParameters, Record,
    ResourceInput, ResourceObject, SortField,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapter::{QueryResult, ResourceAdapter};
use crate::relationship::RelationshipAdapter;

/// A record the in-memory adapter can store.
pub trait StoredRecord: Record {
    /// The record id.
    fn id(&self) -> &str;

    /// A field value used for filtering and sorting.
    fn field(&self, name: &str) -> Option<Value>;

    /// Builds a new record from create input.
    fn from_input(resource_type: &str, id: String, input: &ResourceInput) -> JsonApiResult<Self>;

    /// Applies update input to the record.
    fn apply(&mut self, input: &ResourceInput) -> JsonApiResult<()>;
}

/// A [`ResourceAdapter`] over an in-memory collection.
///
/// # Example
///
/// ```ignore
/// let people = Arc::new(MemoryAdapter::new("people").with_records(vec![alice, bob]));
/// let posts = MemoryAdapter::new("posts")
///     .with_relationship(Arc::new(HasOne::new("author", "people", author_of)));
/// ```
pub struct MemoryAdapter<R> {
    resource_type: String,
    records: RwLock<Vec<R>>,
    relationships: HashMap<String, Arc<dyn RelationshipAdapter<R>>>,
    read_only: bool,
}

impl<R: StoredRecord> MemoryAdapter<R> {
    /// Creates an empty adapter for a resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            records: RwLock::new(Vec::new()),
            relationships: HashMap::new(),
            read_only: false,
        }
    }

    /// Seeds the adapter with records.
    pub fn with_records(self, records: impl IntoIterator<Item = R>) -> Self {
        self.records.write().extend(records);
        self
    }

    /// Configures a relationship, keyed by its field name.
    pub fn with_relationship(mut self, relationship: Arc<dyn RelationshipAdapter<R>>) -> Self {
        self.relationships
            .insert(relationship.field_name().to_string(), relationship);
        self
    }

    /// Rejects every write with `Forbidden`.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Stores a record, replacing one with the same id.
    pub fn insert(&self, record: R) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
    }

    /// Returns a stored record by id.
    pub fn get(&self, id: &str) -> Option<R> {
        self.records.read().iter().find(|r| r.id() == id).cloned()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn ensure_writable(&self, operation: &str) -> JsonApiResult<()> {
        if self.read_only {
            warn!(
                resource_type = %self.resource_type,
                operation = operation,
                "Write rejected by read-only adapter"
            );
            return Err(JsonApiError::forbidden(format!(
                "Resource type '{}' does not allow {}",
                self.resource_type, operation
            )));
        }
        Ok(())
    }
}

fn filter_matches<R: StoredRecord>(record: &R, filters: &[(&String, &FilterValue)]) -> bool {
    filters.iter().all(|(field, expected)| match record.field(field) {
        Some(Value::String(s)) => expected.matches(&s),
        Some(Value::Null) | None => false,
        Some(other) => expected.matches(&other.to_string()),
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn compare_records<R: StoredRecord>(a: &R, b: &R, sort: &[SortField]) -> Ordering {
    for field in sort {
        let ordering = compare_values(
            a.field(&field.field).as_ref(),
            b.field(&field.field).as_ref(),
        );
        let ordering = if field.is_ascending() {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<R: StoredRecord> ResourceAdapter<R> for MemoryAdapter<R> {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    async fn query(
        &self,
        params: &EncodingParameters,
        pagination: &PaginationParameters,
    ) -> JsonApiResult<QueryResult<R>> {
        let filters: Vec<(&String, &FilterValue)> = params.filter().iter().collect();

        let (total, mut matched) = {
            let records = self.records.read();
            let matched: Vec<R> = records
                .iter()
                .filter(|record| filter_matches(*record, &filters))
                .cloned()
                .collect();
            (records.len() as u64, matched)
        };

        if !params.sort().is_empty() {
            matched.sort_by(|a, b| compare_records(a, b, params.sort()));
        }

        let matched_count = matched.len();
        let records: Vec<R> = matched
            .into_iter()
            .skip(pagination.skip() as usize)
            .take(pagination.limit() as usize)
            .collect();

        debug!(
            resource_type = %self.resource_type,
            total = total,
            matched = matched_count,
            returned = records.len(),
            "Queried in-memory records"
        );

        Ok(QueryResult::new(records, total))
    }

    async fn create(
        &self,
        input: ResourceInput,
        _resource: &ResourceObject,
        _params: &EncodingParameters,
    ) -> JsonApiResult<R> {
        self.ensure_writable("create")?;

        let id = input
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = R::from_input(&self.resource_type, id.clone(), &input)?;

        let mut records = self.records.write();
        if records.iter().any(|r| r.id() == id) {
            return Err(JsonApiError::unprocessable(format!(
                "Resource {}/{} already exists",
                self.resource_type, id
            )));
        }
        records.push(record.clone());

        debug!(resource_type = %self.resource_type, id = %id, "Created record");
        Ok(record)
    }

    async fn update(
        &self,
        mut record: R,
        resource: &ResourceObject,
        _params: &EncodingParameters,
    ) -> JsonApiResult<R> {
        self.ensure_writable("update")?;

        let input = ResourceInput::from_resource(resource)?;
        record.apply(&input)?;

        let mut records = self.records.write();
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| JsonApiError::not_found(&self.resource_type, record.id()))?;
        *slot = record.clone();

        debug!(resource_type = %self.resource_type, id = %record.id(), "Updated record");
        Ok(record)
    }

    async fn delete(&self, record: R, _params: &EncodingParameters) -> JsonApiResult<()> {
        self.ensure_writable("delete")?;

        let mut records = self.records.write();
        let position = records
            .iter()
            .position(|r| r.id() == record.id())
            .ok_or_else(|| JsonApiError::not_found(&self.resource_type, record.id()))?;
        records.remove(position);

        debug!(resource_type = %self.resource_type, id = %record.id(), "Deleted record");
        Ok(())
    }

    async fn find(&self, id: &str) -> JsonApiResult<Option<R>> {
        Ok(self.get(id))
    }

    fn related(&self, field: &str) -> JsonApiResult<Arc<dyn RelationshipAdapter<R>>> {
        self.relationships.get(field).cloned().ok_or_else(|| {
            JsonApiError::runtime(format!(
                "Field '{}' is not a relationship of resource type '{}'",
                field, self.resource_type
            ))
        })
    }
}
