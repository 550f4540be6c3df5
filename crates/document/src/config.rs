//! Engine configuration.
//!
//! Supports programmatic configuration, command line arguments and
//! environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JSONAPI_BASE_URL` | http://localhost:8080 | Prefix for generated links |
//! | `JSONAPI_DEFAULT_PAGE_SIZE` | 20 | Page size when none is requested |
//! | `JSONAPI_MAX_PAGE_SIZE` | 1000 | Larger requested sizes are capped |
//! | `JSONAPI_PAGINATION` | page | Default scheme (`page` or `offset`) |
//! | `JSONAPI_MAX_INCLUDE_DEPTH` | 5 | Longest accepted `include` path |
//! | `JSONAPI_CLIENT_GENERATED_IDS` | false | Accept client ids on create |
//!
//! # Example
//!
//! ```rust
//! use jsonapi_document::JsonApiConfig;
//!
//! let config = JsonApiConfig {
//!     base_url: "http://localhost/testing/v1".to_string(),
//!     default_page_size: 10,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{Parser, ValueEnum};

use crate::pagination::PaginationDefaults;

/// Pagination scheme applied when a request names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PaginationScheme {
    /// `page[number]` / `page[size]`.
    #[default]
    Page,
    /// `page[offset]` / `page[limit]`.
    Offset,
}

/// Configuration for encoding, parameter parsing and link generation.
#[derive(Debug, Clone, Parser)]
#[command(name = "jsonapi")]
#[command(about = "JSON:API encoding engine")]
pub struct JsonApiConfig {
    /// Base URL prepended to every generated link.
    #[arg(long, env = "JSONAPI_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Default page size.
    #[arg(long, env = "JSONAPI_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u64,

    /// Maximum page size.
    #[arg(long, env = "JSONAPI_MAX_PAGE_SIZE", default_value = "1000")]
    pub max_page_size: u64,

    /// Pagination scheme used when the request carries no `page` parameters.
    #[arg(long, env = "JSONAPI_PAGINATION", value_enum, default_value = "page")]
    pub pagination: PaginationScheme,

    /// Longest accepted include path.
    #[arg(long, env = "JSONAPI_MAX_INCLUDE_DEPTH", default_value = "5")]
    pub max_include_depth: usize,

    /// Accept client-generated ids on create.
    #[arg(long, env = "JSONAPI_CLIENT_GENERATED_IDS", default_value = "false")]
    pub client_generated_ids: bool,
}

impl Default for JsonApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            default_page_size: 20,
            max_page_size: 1000,
            pagination: PaginationScheme::Page,
            max_include_depth: 5,
            client_generated_ids: false,
        }
    }
}

impl JsonApiConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["jsonapi"]).unwrap_or_default()
    }

    /// Returns the pagination defaults derived from this configuration.
    pub fn pagination_defaults(&self) -> PaginationDefaults {
        PaginationDefaults {
            scheme: self.pagination,
            size: self.default_page_size,
            max_size: self.max_page_size,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("Base URL '{}' is not a valid URL", self.base_url));
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.max_include_depth == 0 {
            errors.push("Max include depth cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://localhost/testing/v1".to_string(),
            default_page_size: 10,
            max_page_size: 100,
            pagination: PaginationScheme::Page,
            max_include_depth: 3,
            client_generated_ids: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JsonApiConfig::default();
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.pagination, PaginationScheme::Page);
        assert!(!config.client_generated_ids);
    }

    #[test]
    fn test_validate_valid() {
        assert!(JsonApiConfig::default().validate().is_ok());
        assert!(JsonApiConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_page_sizes() {
        let config = JsonApiConfig {
            default_page_size: 100,
            max_page_size: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let config = JsonApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Base URL")));
    }

    #[test]
    fn test_parse_from_args() {
        let config = JsonApiConfig::try_parse_from([
            "jsonapi",
            "--pagination",
            "offset",
            "--default-page-size",
            "5",
        ])
        .unwrap();
        assert_eq!(config.pagination, PaginationScheme::Offset);
        assert_eq!(config.default_page_size, 5);
    }

    #[test]
    fn test_pagination_defaults() {
        let defaults = JsonApiConfig::for_testing().pagination_defaults();
        assert_eq!(defaults.size, 10);
        assert_eq!(defaults.max_size, 100);
    }
}
