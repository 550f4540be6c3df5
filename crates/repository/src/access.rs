//! Endpoint access permissions.
//!
//! Decides whether an operation may run against a resource type. Checked by
//! the endpoint before any adapter call, so denial surfaces as `Forbidden`
//! without touching the record store.

use std::collections::HashSet;
use std::fmt;

use jsonapi_document::{JsonApiError, JsonApiResult};
use serde::{Deserialize, Serialize};

/// Operations an endpoint can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// List a collection.
    List,
    /// Fetch a single resource or its relationships.
    Read,
    /// Create a resource.
    Create,
    /// Update a resource.
    Update,
    /// Delete a resource.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::List => write!(f, "list"),
            Operation::Read => write!(f, "read"),
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Permissions granted to an endpoint.
///
/// # Examples
///
/// ```
/// use jsonapi_repository::{Operation, Permissions};
///
/// let read_only = Permissions::read_only();
/// assert!(read_only.can_perform(Operation::List, "entities"));
/// assert!(!read_only.can_perform(Operation::Delete, "entities"));
///
/// let custom = Permissions::builder()
///     .allow_operations(vec![Operation::Read, Operation::Create])
///     .deny_resource_types(vec!["secrets"])
///     .build();
/// assert!(custom.can_perform(Operation::Create, "entities"));
/// assert!(!custom.can_perform(Operation::Read, "secrets"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Allowed operations. If None, all operations are allowed.
    allowed_operations: Option<HashSet<Operation>>,

    /// Allowed resource types. If None, all resource types are allowed.
    allowed_resource_types: Option<HashSet<String>>,

    /// Resource types denied regardless of the allowances above.
    denied_resource_types: HashSet<String>,
}

impl Permissions {
    /// Allows every operation on every resource type.
    pub fn full_access() -> Self {
        Self {
            allowed_operations: None,
            allowed_resource_types: None,
            denied_resource_types: HashSet::new(),
        }
    }

    /// Allows listing and reading only.
    pub fn read_only() -> Self {
        Self::builder()
            .allow_operations(vec![Operation::List, Operation::Read])
            .build()
    }

    /// Denies everything.
    pub fn deny_all() -> Self {
        Self::builder().allow_operations(Vec::new()).build()
    }

    /// Creates a builder for custom permissions.
    pub fn builder() -> PermissionsBuilder {
        PermissionsBuilder::default()
    }

    /// Returns `true` if the operation is permitted on the resource type.
    pub fn can_perform(&self, operation: Operation, resource_type: &str) -> bool {
        if self.denied_resource_types.contains(resource_type) {
            return false;
        }

        if let Some(ref allowed_ops) = self.allowed_operations
            && !allowed_ops.contains(&operation)
        {
            return false;
        }

        if let Some(ref allowed_types) = self.allowed_resource_types
            && !allowed_types.contains(resource_type)
        {
            return false;
        }

        true
    }

    /// Fails with `Forbidden` unless the operation is permitted.
    pub fn check(&self, operation: Operation, resource_type: &str) -> JsonApiResult<()> {
        if self.can_perform(operation, resource_type) {
            Ok(())
        } else {
            Err(JsonApiError::forbidden(format!(
                "Operation '{}' is not allowed on resource type '{}'",
                operation, resource_type
            )))
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::full_access()
    }
}

/// Builder for custom permissions.
#[derive(Debug, Default)]
pub struct PermissionsBuilder {
    allowed_operations: Option<HashSet<Operation>>,
    allowed_resource_types: Option<HashSet<String>>,
    denied_resource_types: HashSet<String>,
}

impl PermissionsBuilder {
    /// Restricts the allowed operations.
    pub fn allow_operations(mut self, operations: Vec<Operation>) -> Self {
        self.allowed_operations = Some(operations.into_iter().collect());
        self
    }

    /// Restricts the allowed resource types.
    pub fn allow_resource_types<S: Into<String>>(mut self, types: Vec<S>) -> Self {
        self.allowed_resource_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Denies resource types outright.
    pub fn deny_resource_types<S: Into<String>>(mut self, types: Vec<S>) -> Self {
        self.denied_resource_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Builds the permissions.
    pub fn build(self) -> Permissions {
        Permissions {
            allowed_operations: self.allowed_operations,
            allowed_resource_types: self.allowed_resource_types,
            denied_resource_types: self.denied_resource_types,
        }
    }
}
