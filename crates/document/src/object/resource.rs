//! Resource objects.

use serde_json::Value;

use super::identifier::ResourceIdentifier;
use super::relationships::{Relationship, Relationships};
use super::standard::StandardObject;
use crate::error::{JsonApiError, JsonApiResult};

const TYPE: &str = "type";
const ID: &str = "id";
const ATTRIBUTES: &str = "attributes";
const RELATIONSHIPS: &str = "relationships";
const META: &str = "meta";
const LINKS: &str = "links";

/// A typed view over a JSON:API resource object.
///
/// Members are validated when accessed: an `attributes` member that exists
/// but is not an object fails with `UnprocessableEntity`, while an absent one
/// reads as an empty object.
///
/// # Example
///
/// ```
/// use jsonapi_document::ResourceObject;
/// use serde_json::json;
///
/// let resource = ResourceObject::from_value(json!({
///     "type": "entities",
///     "attributes": {"name": "Foo"}
/// })).unwrap();
///
/// assert_eq!(resource.resource_type().unwrap(), "entities");
/// assert_eq!(resource.id().unwrap(), None);
/// assert_eq!(resource.attributes().unwrap().get_str("name").unwrap(), "Foo");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceObject {
    object: StandardObject,
}

impl ResourceObject {
    /// Wraps a standard object.
    pub fn new(object: StandardObject) -> Self {
        Self { object }
    }

    /// Creates a resource object from a decoded JSON value.
    pub fn from_value(value: Value) -> JsonApiResult<Self> {
        Ok(Self::new(StandardObject::from_value(value)?))
    }

    /// Returns the resource type.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` if `type` is missing, not a string, or empty.
    pub fn resource_type(&self) -> JsonApiResult<&str> {
        match self.object.value(TYPE) {
            Some(Value::String(t)) if !t.is_empty() => Ok(t),
            Some(_) => Err(JsonApiError::unprocessable(
                "Resource 'type' member must be a non-empty string",
            )),
            None => Err(JsonApiError::unprocessable("Resource 'type' member is missing")),
        }
    }

    /// Returns the resource id, if present.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` if `id` is present but not a string.
    pub fn id(&self) -> JsonApiResult<Option<&str>> {
        match self.object.value(ID) {
            None => Ok(None),
            Some(Value::String(id)) => Ok(Some(id)),
            Some(_) => Err(JsonApiError::unprocessable(
                "Resource 'id' member must be a string",
            )),
        }
    }

    /// Returns whether an `id` member is present.
    pub fn has_id(&self) -> bool {
        self.object.has(ID)
    }

    /// Returns the `(type, id)` identifier.
    pub fn identifier(&self) -> JsonApiResult<ResourceIdentifier> {
        let resource_type = self.resource_type()?;
        let id = self
            .id()?
            .ok_or_else(|| JsonApiError::unprocessable("Resource 'id' member is missing"))?;
        Ok(ResourceIdentifier::new(resource_type, id))
    }

    /// Returns whether an `attributes` member is present.
    pub fn has_attributes(&self) -> bool {
        self.object.has(ATTRIBUTES)
    }

    /// Returns the attributes, or an empty object when absent.
    pub fn attributes(&self) -> JsonApiResult<StandardObject> {
        self.member_object(
            ATTRIBUTES,
            "Attributes member is not an object. Perhaps you are passing an empty attribute?",
        )
    }

    /// Returns whether a `relationships` member is present.
    pub fn has_relationships(&self) -> bool {
        self.object.has(RELATIONSHIPS)
    }

    /// Returns the relationships, or an empty set when absent.
    pub fn relationships(&self) -> JsonApiResult<Relationships> {
        self.member_object(
            RELATIONSHIPS,
            "Relationships member is not an object. Perhaps you are passing empty relations?",
        )
        .map(Relationships::new)
    }

    /// Returns the named relationship, or `None` if it is absent.
    pub fn relationship(&self, key: &str) -> JsonApiResult<Option<Relationship>> {
        let relationships = self.relationships()?;
        if relationships.has(key) {
            relationships.relationship(key).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Returns the resource meta, if present.
    pub fn meta(&self) -> JsonApiResult<Option<StandardObject>> {
        self.optional_member_object(META)
    }

    /// Returns the resource links, if present.
    pub fn links(&self) -> JsonApiResult<Option<StandardObject>> {
        self.optional_member_object(LINKS)
    }

    /// Returns the underlying object.
    pub fn as_object(&self) -> &StandardObject {
        &self.object
    }

    /// Converts to a JSON value.
    pub fn to_value(&self) -> Value {
        self.object.to_value()
    }

    fn member_object(&self, key: &str, message: &str) -> JsonApiResult<StandardObject> {
        match self.object.value(key) {
            None => Ok(StandardObject::new()),
            Some(Value::Object(map)) => Ok(StandardObject::from_map(map.clone())),
            Some(_) => Err(JsonApiError::unprocessable(message)),
        }
    }

    fn optional_member_object(&self, key: &str) -> JsonApiResult<Option<StandardObject>> {
        match self.object.value(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(StandardObject::from_map(map.clone()))),
            Some(_) => Err(JsonApiError::unprocessable(format!(
                "Resource '{}' member is not an object",
                key
            ))),
        }
    }
}

impl From<StandardObject> for ResourceObject {
    fn from(object: StandardObject) -> Self {
        Self::new(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: Value) -> ResourceObject {
        ResourceObject::from_value(value).unwrap()
    }

    #[test]
    fn test_identifier() {
        let r = resource(json!({"type": "entities", "id": "abc"}));
        assert_eq!(r.identifier().unwrap(), ResourceIdentifier::new("entities", "abc"));
    }

    #[test]
    fn test_identifier_requires_type() {
        let r = resource(json!({"id": "abc"}));
        assert!(r.resource_type().is_err());
        assert!(r.identifier().is_err());
    }

    #[test]
    fn test_identifier_requires_id() {
        let r = resource(json!({"type": "entities"}));
        assert!(r.identifier().is_err());
        assert_eq!(r.id().unwrap(), None);
    }

    #[test]
    fn test_invalid_id_type() {
        let r = resource(json!({"type": "entities", "id": 42}));
        assert!(r.id().is_err());
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let r = resource(json!({"type": "entities"}));
        assert!(!r.has_attributes());
        assert!(r.attributes().unwrap().is_empty());
    }

    #[test]
    fn test_attributes_not_object() {
        let r = resource(json!({"type": "entities", "attributes": []}));
        let err = r.attributes().unwrap_err();
        assert!(matches!(err, JsonApiError::UnprocessableEntity { .. }));
    }

    #[test]
    fn test_relationships_not_object() {
        let r = resource(json!({"type": "entities", "relationships": "x"}));
        assert!(matches!(
            r.relationships().unwrap_err(),
            JsonApiError::UnprocessableEntity { .. }
        ));
    }

    #[test]
    fn test_relationship_absent_is_none() {
        let r = resource(json!({
            "type": "posts",
            "relationships": {"author": {"data": {"type": "people", "id": "1"}}}
        }));
        assert!(r.relationship("comments").unwrap().is_none());
        assert!(r.relationship("author").unwrap().unwrap().is_to_one());
    }

    #[test]
    fn test_relationship_present_but_invalid() {
        let r = resource(json!({
            "type": "posts",
            "relationships": {"author": {"data": 12}}
        }));
        assert!(r.relationship("author").is_err());
    }

    #[test]
    fn test_meta_and_links() {
        let r = resource(json!({"type": "posts", "meta": {"a": 1}, "links": 4}));
        assert_eq!(r.meta().unwrap().unwrap().len(), 1);
        assert!(r.links().is_err());
    }
}
