//! Resource identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{JsonApiError, JsonApiResult};

/// Identifies a single resource by its `(type, id)` pair.
///
/// Equality is structural, which makes identifiers the de-duplication key
/// for compound documents and relationship linkage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// The resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// The resource id.
    pub id: String,
}

impl ResourceIdentifier {
    /// Creates a new identifier.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Parses a resource identifier object (`{"type": ..., "id": ...}`).
    pub fn from_value(value: &Value) -> JsonApiResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| JsonApiError::unprocessable("Resource identifier is not an object"))?;

        let resource_type = match object.get("type") {
            Some(Value::String(t)) if !t.is_empty() => t.clone(),
            _ => {
                return Err(JsonApiError::unprocessable(
                    "Resource identifier requires a non-empty 'type' string",
                ));
            }
        };

        let id = match object.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(JsonApiError::unprocessable(
                    "Resource identifier requires an 'id' string",
                ));
            }
        };

        Ok(Self { resource_type, id })
    }

    /// Converts to a resource identifier object.
    pub fn to_value(&self) -> Value {
        json!({
            "type": self.resource_type,
            "id": self.id,
        })
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}
