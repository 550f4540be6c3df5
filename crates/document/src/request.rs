//! Request document decoding.
//!
//! Turns a create/update request body into a validated [`ResourceObject`] and
//! the [`ResourceInput`] handed to adapters.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{JsonApiError, JsonApiResult};
use crate::object::{Linkage, ResourceObject, StandardObject};

/// A decoded request document carrying a single primary resource.
#[derive(Debug, Clone)]
pub struct RequestDocument {
    data: ResourceObject,
    meta: Option<StandardObject>,
}

impl RequestDocument {
    /// Decodes a raw request body.
    ///
    /// # Errors
    ///
    /// Returns `UnprocessableEntity` for an empty body, invalid JSON, or a
    /// document without a `data` resource object.
    pub fn parse(body: &[u8]) -> JsonApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(JsonApiError::unprocessable("Request body is empty"));
        }
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Decodes an already parsed request body.
    pub fn from_value(value: Value) -> JsonApiResult<Self> {
        let document = StandardObject::from_value(value)?;
        if document.is_empty() {
            return Err(JsonApiError::unprocessable("Request document is empty"));
        }

        let data = match document.value("data") {
            Some(Value::Object(map)) => ResourceObject::new(StandardObject::from_map(map.clone())),
            Some(_) => {
                return Err(JsonApiError::unprocessable(
                    "Request document 'data' member must be a resource object",
                ));
            }
            None => {
                return Err(JsonApiError::unprocessable(
                    "Request document is missing the 'data' member",
                ));
            }
        };

        // Validate the resource shape up front so adapters never see it broken.
        data.resource_type()?;
        data.id()?;
        data.attributes()?;
        for relationship in data.relationships()?.all() {
            relationship?;
        }

        let meta = match document.value("meta") {
            None => None,
            Some(Value::Object(map)) => Some(StandardObject::from_map(map.clone())),
            Some(_) => {
                return Err(JsonApiError::unprocessable(
                    "Request document 'meta' member must be an object",
                ));
            }
        };

        Ok(Self { data, meta })
    }

    /// Returns the primary resource object.
    pub fn data(&self) -> &ResourceObject {
        &self.data
    }

    /// Returns the document-level meta.
    pub fn meta(&self) -> Option<&StandardObject> {
        self.meta.as_ref()
    }

    /// Consumes the document, returning the primary resource object.
    pub fn into_data(self) -> ResourceObject {
        self.data
    }
}

/// The mapped input an adapter receives for create and update operations.
///
/// Produced from an already validated [`ResourceObject`], so adapters work
/// with plain attributes and linkage rather than raw JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceInput {
    /// Client-supplied id, if any.
    pub id: Option<String>,
    /// Attribute values.
    pub attributes: StandardObject,
    /// Relationship linkage by field name.
    pub relationships: BTreeMap<String, Linkage>,
}

impl ResourceInput {
    /// Maps a resource object into adapter input.
    ///
    /// Relationships carrying only `links` or `meta` are skipped.
    pub fn from_resource(resource: &ResourceObject) -> JsonApiResult<Self> {
        let mut relationships = BTreeMap::new();
        for item in resource.relationships()?.all() {
            let (name, relationship) = item?;
            if let Some(data) = relationship.data() {
                relationships.insert(name.to_string(), data.clone());
            }
        }

        Ok(Self {
            id: resource.id()?.map(str::to_string),
            attributes: resource.attributes()?,
            relationships,
        })
    }

    /// Returns the attribute value, if present.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.value(name)
    }
}
