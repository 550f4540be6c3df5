//! Document object model.
//!
//! - [`StandardObject`] - ordered key/value wrapper around any JSON object
//! - [`ResourceIdentifier`] - the `(type, id)` pair identifying a resource
//! - [`ResourceObject`] - typed view enforcing the resource object shape
//! - [`Relationships`] / [`Relationship`] / [`Linkage`] - relationship members

mod identifier;
mod relationships;
mod resource;
mod standard;

pub use identifier::ResourceIdentifier;
pub use relationships::{Linkage, Relationship, Relationships};
pub use resource::ResourceObject;
pub use standard::StandardObject;
