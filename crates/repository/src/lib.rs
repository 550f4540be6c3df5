//! JSON:API adapter layer.
//!
//! Exposes arbitrary record sources as JSON:API resource types. Each type is
//! served by a [`ResourceAdapter`]; relationships are resolved through
//! [`RelationshipAdapter`]s; the [`Endpoint`] ties adapters, schemas and
//! permissions together and answers requests with `(status, document)`
//! responses.
//!
//! # Architecture
//!
//! - [`adapter`] - Resource adapter contract
//! - [`relationship`] - Relationship adapters and relation resolvers
//! - [`container`] - Adapter registry keyed by resource type
//! - [`access`] - Operation permissions
//! - [`memory`] - In-memory reference adapter
//! - [`endpoint`] - Request boundary and response sink
//!
//! # Permissions
//!
//! ```
//! use jsonapi_repository::{Operation, Permissions};
//!
//! let permissions = Permissions::read_only();
//! assert!(permissions.check(Operation::List, "entities").is_ok());
//! assert!(permissions.check(Operation::Create, "entities").is_err());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod access;
pub mod adapter;
pub mod container;
pub mod endpoint;
pub mod memory;
pub mod relationship;

pub use access::{Operation, Permissions, PermissionsBuilder};
pub use adapter::{QueryResult, ResourceAdapter};
pub use container::AdapterContainer;
pub use endpoint::{Endpoint, JsonApiRequest, JsonApiResponse, ResponseSink};
pub use memory::{MemoryAdapter, StoredRecord};
pub use relationship::{
    Cardinality, HasMany, HasOne, RelationResolver, RelationValue, RelationshipAdapter,
};
