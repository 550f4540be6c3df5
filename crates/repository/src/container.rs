//! Adapter registry keyed by resource type.

use std::collections::HashMap;
use std::sync::Arc;

use jsonapi_document::{JsonApiError, JsonApiResult, Record};

use crate::adapter::ResourceAdapter;

/// Maps resource types to their adapters.
///
/// Registered once at startup and shared read-only afterwards.
pub struct AdapterContainer<R> {
    adapters: HashMap<String, Arc<dyn ResourceAdapter<R>>>,
}

impl<R: Record> AdapterContainer<R> {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers an adapter under its resource type, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ResourceAdapter<R>>) {
        self.adapters
            .insert(adapter.resource_type().to_string(), adapter);
    }

    /// Builder form of [`AdapterContainer::register`].
    pub fn with_adapter(mut self, adapter: Arc<dyn ResourceAdapter<R>>) -> Self {
        self.register(adapter);
        self
    }

    /// Returns the adapter for a resource type.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a resource type without an adapter.
    pub fn adapter(&self, resource_type: &str) -> JsonApiResult<Arc<dyn ResourceAdapter<R>>> {
        self.adapters
            .get(resource_type)
            .cloned()
            .ok_or_else(|| JsonApiError::not_found(resource_type, ""))
    }

    /// Returns the registered resource types, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl<R: Record> Default for AdapterContainer<R> {
    fn default() -> Self {
        Self::new()
    }
}
