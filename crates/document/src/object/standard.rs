//! Generic, ordered key/value document wrapper.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{JsonApiError, JsonApiResult};

/// An ordered mapping from member name to JSON value.
///
/// `StandardObject` represents any JSON object that flows through the engine:
/// request bodies, attributes, relationships and meta. Member order is the
/// document order of the decoded payload. Values are never mutated in place;
/// [`with`](Self::with) and [`without`](Self::without) return new objects.
///
/// # Example
///
/// ```
/// use jsonapi_document::StandardObject;
/// use serde_json::json;
///
/// let object = StandardObject::from_value(json!({"name": "Foo", "age": 3})).unwrap();
/// assert!(object.has("name"));
/// assert!(!object.has("description"));
/// assert_eq!(object.keys().collect::<Vec<_>>(), vec!["name", "age"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardObject {
    members: Map<String, Value>,
}

impl StandardObject {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object from a decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` if the value is not a JSON object.
    pub fn from_value(value: Value) -> JsonApiResult<Self> {
        match value {
            Value::Object(members) => Ok(Self { members }),
            other => Err(JsonApiError::unprocessable(format!(
                "Invalid document: expected an object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Creates an object from an existing map.
    pub fn from_map(members: Map<String, Value>) -> Self {
        Self { members }
    }

    /// Returns whether the member is present.
    pub fn has(&self, key: &str) -> bool {
        self.members.contains_key(key)
    }

    /// Returns the member value.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` if the member is not present.
    pub fn get(&self, key: &str) -> JsonApiResult<&Value> {
        self.members
            .get(key)
            .ok_or_else(|| JsonApiError::unprocessable(format!("Member '{}' not found", key)))
    }

    /// Returns the member value, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.members.get(key).unwrap_or(default)
    }

    /// Returns the member value if present.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    /// Returns the member as a string.
    pub fn get_str(&self, key: &str) -> JsonApiResult<&str> {
        self.get(key)?.as_str().ok_or_else(|| {
            JsonApiError::unprocessable(format!("Member '{}' is not a string", key))
        })
    }

    /// Returns the member as a nested object.
    pub fn get_object(&self, key: &str) -> JsonApiResult<StandardObject> {
        match self.get(key)? {
            Value::Object(members) => Ok(Self::from_map(members.clone())),
            _ => Err(JsonApiError::unprocessable(format!(
                "Member '{}' is not an object",
                key
            ))),
        }
    }

    /// Returns member names in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Returns members in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the object has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns a copy with the member set to `value`.
    ///
    /// An existing member keeps its position; a new member is appended.
    pub fn with(&self, key: impl Into<String>, value: Value) -> Self {
        let mut members = self.members.clone();
        members.insert(key.into(), value);
        Self { members }
    }

    /// Returns a copy without the member.
    pub fn without(&self, key: &str) -> Self {
        let members = self
            .members
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { members }
    }

    /// Returns a copy holding only the members accepted by `keep`.
    pub fn only<F>(&self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let members = self
            .members
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { members }
    }

    /// Returns a copy with the members of `other` merged over this object.
    pub fn merge(&self, other: &StandardObject) -> Self {
        let mut members = self.members.clone();
        for (k, v) in &other.members {
            members.insert(k.clone(), v.clone());
        }
        Self { members }
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.members
    }

    /// Converts into a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.members.clone())
    }

    /// Consumes the object into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.members)
    }
}

impl From<Map<String, Value>> for StandardObject {
    fn from(members: Map<String, Value>) -> Self {
        Self { members }
    }
}

impl FromIterator<(String, Value)> for StandardObject {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Names the JSON kind of a value for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
