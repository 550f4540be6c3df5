//! Relationship members of resource objects.

use serde_json::{Value, json};

use super::identifier::ResourceIdentifier;
use super::standard::{StandardObject, json_kind};
use crate::error::{JsonApiError, JsonApiResult};

/// Resource linkage carried in a relationship's `data` member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Linkage {
    /// An empty to-one relationship (`"data": null`).
    Empty,
    /// A to-one relationship.
    ToOne(ResourceIdentifier),
    /// A to-many relationship, in document order.
    ToMany(Vec<ResourceIdentifier>),
}

impl Linkage {
    /// Parses the value of a `data` member.
    pub fn from_value(value: &Value) -> JsonApiResult<Self> {
        match value {
            Value::Null => Ok(Linkage::Empty),
            Value::Object(_) => Ok(Linkage::ToOne(ResourceIdentifier::from_value(value)?)),
            Value::Array(items) => Ok(Linkage::ToMany(
                items
                    .iter()
                    .map(ResourceIdentifier::from_value)
                    .collect::<JsonApiResult<Vec<_>>>()?,
            )),
            other => Err(JsonApiError::unprocessable(format!(
                "Relationship data must be null, an object or an array, found {}",
                json_kind(other)
            ))),
        }
    }

    /// Returns true for to-many linkage.
    pub fn is_to_many(&self) -> bool {
        matches!(self, Linkage::ToMany(_))
    }

    /// Returns every identifier in the linkage.
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self {
            Linkage::Empty => Vec::new(),
            Linkage::ToOne(identifier) => vec![identifier],
            Linkage::ToMany(identifiers) => identifiers.iter().collect(),
        }
    }

    /// Converts to a `data` member value.
    pub fn to_value(&self) -> Value {
        match self {
            Linkage::Empty => Value::Null,
            Linkage::ToOne(identifier) => identifier.to_value(),
            Linkage::ToMany(identifiers) => {
                Value::Array(identifiers.iter().map(ResourceIdentifier::to_value).collect())
            }
        }
    }
}

/// A single relationship object.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    data: Option<Linkage>,
    links: Option<StandardObject>,
    meta: Option<StandardObject>,
}

impl Relationship {
    /// Creates a relationship holding only linkage.
    pub fn new(data: Linkage) -> Self {
        Self {
            data: Some(data),
            links: None,
            meta: None,
        }
    }

    /// Parses a relationship object.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` if the value is not an object, if `data`
    /// is malformed, or if none of `data`, `links` and `meta` is present.
    pub fn from_value(value: &Value) -> JsonApiResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| JsonApiError::unprocessable("Relationship member is not an object"))?;

        let data = object.get("data").map(Linkage::from_value).transpose()?;
        let links = optional_object(object.get("links"), "links")?;
        let meta = optional_object(object.get("meta"), "meta")?;

        if data.is_none() && links.is_none() && meta.is_none() {
            return Err(JsonApiError::unprocessable(
                "Relationship must contain at least one of 'data', 'links' or 'meta'",
            ));
        }

        Ok(Self { data, links, meta })
    }

    /// Returns the linkage, if the relationship carries `data`.
    pub fn data(&self) -> Option<&Linkage> {
        self.data.as_ref()
    }

    /// Returns the relationship links.
    pub fn links(&self) -> Option<&StandardObject> {
        self.links.as_ref()
    }

    /// Returns the relationship meta.
    pub fn meta(&self) -> Option<&StandardObject> {
        self.meta.as_ref()
    }

    /// Returns true if the relationship carries to-one linkage (possibly empty).
    pub fn is_to_one(&self) -> bool {
        matches!(self.data, Some(Linkage::Empty) | Some(Linkage::ToOne(_)))
    }

    /// Returns true if the relationship carries to-many linkage.
    pub fn is_to_many(&self) -> bool {
        matches!(self.data, Some(Linkage::ToMany(_)))
    }

    /// Converts to a relationship object.
    pub fn to_value(&self) -> Value {
        let mut value = json!({});
        if let Some(links) = &self.links {
            value["links"] = links.to_value();
        }
        if let Some(data) = &self.data {
            value["data"] = data.to_value();
        }
        if let Some(meta) = &self.meta {
            value["meta"] = meta.to_value();
        }
        value
    }
}

fn optional_object(value: Option<&Value>, member: &str) -> JsonApiResult<Option<StandardObject>> {
    match value {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(StandardObject::from_map(map.clone()))),
        Some(_) => Err(JsonApiError::unprocessable(format!(
            "Relationship '{}' member is not an object",
            member
        ))),
    }
}

/// The `relationships` member of a resource object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relationships {
    members: StandardObject,
}

impl Relationships {
    /// Wraps a relationships object.
    pub fn new(members: StandardObject) -> Self {
        Self { members }
    }

    /// Returns whether the relationship is present.
    pub fn has(&self, key: &str) -> bool {
        self.members.has(key)
    }

    /// Returns relationship names in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys()
    }

    /// Returns true if no relationships are present.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Lazily yields every relationship in document order.
    ///
    /// Each item is parsed on demand, so a malformed member surfaces as an
    /// `Err` item when it is reached.
    pub fn all(&self) -> impl Iterator<Item = JsonApiResult<(&str, Relationship)>> {
        self.members
            .iter()
            .map(|(key, value)| Relationship::from_value(value).map(|rel| (key, rel)))
    }

    /// Returns the named relationship.
    ///
    /// # Errors
    ///
    /// Returns `Runtime` if the member is absent and `UnprocessableEntity`
    /// if it is malformed.
    pub fn relationship(&self, key: &str) -> JsonApiResult<Relationship> {
        let value = self
            .members
            .value(key)
            .ok_or_else(|| JsonApiError::runtime(format!("Relationship member '{}' is not present", key)))?;

        Relationship::from_value(value).map_err(|err| match err {
            JsonApiError::UnprocessableEntity { message } => JsonApiError::unprocessable(format!(
                "Relationship '{}': {}",
                key, message
            )),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relationships(value: Value) -> Relationships {
        Relationships::new(StandardObject::from_value(value).unwrap())
    }

    #[test]
    fn test_linkage_variants() {
        assert_eq!(Linkage::from_value(&Value::Null).unwrap(), Linkage::Empty);
        assert!(matches!(
            Linkage::from_value(&json!({"type": "people", "id": "9"})).unwrap(),
            Linkage::ToOne(_)
        ));
        let many = Linkage::from_value(&json!([
            {"type": "tags", "id": "1"},
            {"type": "tags", "id": "2"}
        ]))
        .unwrap();
        assert!(many.is_to_many());
        assert_eq!(many.identifiers().len(), 2);
        assert!(Linkage::from_value(&json!("tags")).is_err());
    }

    #[test]
    fn test_relationship_requires_member() {
        assert!(Relationship::from_value(&json!({})).is_err());
        assert!(Relationship::from_value(&json!({"links": {"related": "/x"}})).is_ok());
        assert!(Relationship::from_value(&json!({"meta": "x"})).is_err());
    }

    #[test]
    fn test_relationship_cardinality() {
        let to_one = Relationship::from_value(&json!({"data": null})).unwrap();
        assert!(to_one.is_to_one());
        let to_many = Relationship::from_value(&json!({"data": []})).unwrap();
        assert!(to_many.is_to_many());
    }

    #[test]
    fn test_all_in_document_order() {
        let rels = relationships(json!({
            "author": {"data": {"type": "people", "id": "9"}},
            "comments": {"data": [{"type": "comments", "id": "5"}]}
        }));
        let names: Vec<_> = rels.all().map(|r| r.unwrap().0).collect();
        assert_eq!(names, vec!["author", "comments"]);
    }

    #[test]
    fn test_all_surfaces_invalid_member() {
        let rels = relationships(json!({
            "author": {"data": null},
            "broken": "nope"
        }));
        let items: Vec<_> = rels.all().collect();
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn test_relationship_lookup_errors() {
        let rels = relationships(json!({"broken": 42}));
        assert!(matches!(
            rels.relationship("missing").unwrap_err(),
            JsonApiError::Runtime { .. }
        ));
        assert!(matches!(
            rels.relationship("broken").unwrap_err(),
            JsonApiError::UnprocessableEntity { .. }
        ));
    }

    #[test]
    fn test_to_value() {
        let rel = Relationship::new(Linkage::ToOne(ResourceIdentifier::new("people", "9")));
        assert_eq!(rel.to_value(), json!({"data": {"type": "people", "id": "9"}}));
    }
}
