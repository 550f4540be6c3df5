//! JSON:API document engine.
//!
//! This crate maps domain records to and from JSON:API documents. It is
//! synchronous and knows nothing about storage: records are described by
//! per-type [`Schema`]s, request bodies are decoded into typed views, and
//! query parameters are parsed into a validated [`EncodingParameters`]
//! descriptor.
//!
//! # Architecture
//!
//! - [`object`] - Standard object model, resource objects and relationships
//! - [`request`] - Request document decoding and adapter input mapping
//! - [`parameters`] - `include`, `fields`, `filter`, `sort` and `page` parsing
//! - [`pagination`] - Page-based and offset-based pagination
//! - [`schema`] - Per-type schemas keyed by record type tag
//! - [`encoder`] - Compound document encoding with inclusion and sparse fieldsets
//! - [`document`] - Top-level document assembly
//! - [`links`] - Link generation from the configured base URL
//! - [`media`] - Media type negotiation
//! - [`config`] - Engine configuration
//! - [`error`] - Error taxonomy mapped to HTTP status codes
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use jsonapi_document::{
//!     EncodingParameters, Encoder, LinkBuilder, Record, Schema, SchemaContainer,
//!     StandardObject,
//! };
//! use serde_json::json;
//!
//! #[derive(Clone)]
//! struct Entity {
//!     id: u32,
//!     name: String,
//! }
//!
//! impl Record for Entity {
//!     fn resource_type(&self) -> &str {
//!         "entities"
//!     }
//! }
//!
//! struct EntitySchema;
//!
//! impl Schema<Entity> for EntitySchema {
//!     fn resource_type(&self) -> &str {
//!         "entities"
//!     }
//!
//!     fn id(&self, record: &Entity) -> String {
//!         record.id.to_string()
//!     }
//!
//!     fn attributes(&self, record: &Entity) -> StandardObject {
//!         StandardObject::new().with("name", json!(record.name))
//!     }
//! }
//!
//! let schemas = SchemaContainer::<Entity>::new().with_schema(Arc::new(EntitySchema));
//! let links = LinkBuilder::new("http://localhost/testing/v1").unwrap();
//! let params = EncodingParameters::parse("fields[entities]=name", 5).unwrap();
//!
//! let entity = Entity { id: 1, name: "Foo".to_string() };
//! let document = Encoder::new(&schemas, &links)
//!     .encode_resource(Some(&entity), &params)
//!     .unwrap();
//!
//! assert_eq!(document["data"]["attributes"]["name"], "Foo");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod links;
pub mod media;
pub mod object;
pub mod pagination;
pub mod parameters;
pub mod request;
pub mod schema;

pub use config::{JsonApiConfig, PaginationScheme};
pub use document::{DocumentBuilder, JSONAPI_VERSION};
pub use encoder::Encoder;
pub use error::{JsonApiError, JsonApiResult, error_document};
pub use links::LinkBuilder;
pub use media::{MEDIA_TYPE, check_accept, check_content_type};
pub use object::{
    Linkage, Relationship, Relationships, ResourceIdentifier, ResourceObject, StandardObject,
};
pub use pagination::{
    PageLinks, PageOverrides, PaginationDefaults, PaginationParameters, PaginationStrategy,
};
pub use parameters::{EncodingParameters, FilterValue, IncludePath, SortDirection, SortField};
pub use request::{RequestDocument, ResourceInput};
pub use schema::{Record, RelatedData, Schema, SchemaContainer};
