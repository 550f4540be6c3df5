//! Top-level document assembly.

use serde_json::{Value, json};

use crate::error::JsonApiError;
use crate::object::StandardObject;

/// The JSON:API version advertised in every document.
pub const JSONAPI_VERSION: &str = "1.0";

/// Assembles a top-level document from its members.
///
/// A document holding errors never carries `data` or `included`.
///
/// # Example
///
/// ```
/// use jsonapi_document::DocumentBuilder;
/// use serde_json::json;
///
/// let document = DocumentBuilder::new()
///     .data(json!({"type": "entities", "id": "1"}))
///     .link("self", "http://localhost/entities/1")
///     .build();
///
/// assert_eq!(document["data"]["id"], "1");
/// assert_eq!(document["jsonapi"]["version"], "1.0");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    data: Option<Value>,
    included: Vec<Value>,
    links: StandardObject,
    meta: StandardObject,
    errors: Vec<Value>,
}

impl DocumentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the primary data.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the included resources.
    pub fn included(mut self, included: Vec<Value>) -> Self {
        self.included = included;
        self
    }

    /// Adds a top-level link.
    pub fn link(mut self, name: &str, url: impl Into<String>) -> Self {
        self.links = self.links.with(name, Value::String(url.into()));
        self
    }

    /// Merges top-level meta members.
    pub fn meta(mut self, meta: &StandardObject) -> Self {
        self.meta = self.meta.merge(meta);
        self
    }

    /// Adds an error object.
    pub fn error(mut self, error: &JsonApiError) -> Self {
        self.errors.push(error.to_error_object());
        self
    }

    /// Builds the document.
    pub fn build(self) -> Value {
        let mut document = StandardObject::new();

        if self.errors.is_empty() {
            document = document.with("data", self.data.unwrap_or(Value::Null));
            if !self.included.is_empty() {
                document = document.with("included", Value::Array(self.included));
            }
        } else {
            document = document.with("errors", Value::Array(self.errors));
        }
        if !self.links.is_empty() {
            document = document.with("links", self.links.into_value());
        }
        if !self.meta.is_empty() {
            document = document.with("meta", self.meta.into_value());
        }

        document
            .with("jsonapi", json!({ "version": JSONAPI_VERSION }))
            .into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_null_data() {
        let document = DocumentBuilder::new().build();
        assert_eq!(document["data"], Value::Null);
        assert!(document.get("included").is_none());
        assert!(document.get("links").is_none());
    }

    #[test]
    fn test_errors_exclude_data() {
        let document = DocumentBuilder::new()
            .data(json!([]))
            .error(&JsonApiError::forbidden("no"))
            .build();

        assert!(document.get("data").is_none());
        assert_eq!(document["errors"][0]["status"], "403");
    }

    #[test]
    fn test_member_order() {
        let meta = StandardObject::new().with("total", json!(1));
        let document = DocumentBuilder::new()
            .meta(&meta)
            .link("self", "http://localhost/entities")
            .data(json!([]))
            .included(vec![json!({"type": "people", "id": "1"})])
            .build();

        let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["data", "included", "links", "meta", "jsonapi"]);
    }
}
