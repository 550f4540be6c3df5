//! Link generation.

use url::Url;

use crate::error::{JsonApiError, JsonApiResult};

/// Builds absolute resource, relationship and collection URLs from the
/// configured base URL.
///
/// # Example
///
/// ```
/// use jsonapi_document::LinkBuilder;
///
/// let links = LinkBuilder::new("http://localhost/testing/v1").unwrap();
/// assert_eq!(
///     links.resource("entities", "42"),
///     "http://localhost/testing/v1/entities/42"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base: Url,
}

impl LinkBuilder {
    /// Creates a link builder.
    ///
    /// # Errors
    ///
    /// Returns `Runtime` if the base URL cannot be parsed or cannot carry
    /// path segments.
    pub fn new(base_url: &str) -> JsonApiResult<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(JsonApiError::runtime(format!(
                "Base URL '{}' cannot carry resource paths",
                base_url
            )));
        }
        Ok(Self { base })
    }

    /// Returns the base URL.
    pub fn base(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// `{base}/{type}/{id}`
    pub fn resource(&self, resource_type: &str, id: &str) -> String {
        self.build(&[resource_type, id], &[])
    }

    /// `{base}/{type}/{id}/{field}`
    pub fn related(&self, resource_type: &str, id: &str, field: &str) -> String {
        self.build(&[resource_type, id, field], &[])
    }

    /// `{base}/{type}/{id}/relationships/{field}`
    pub fn relationship(&self, resource_type: &str, id: &str, field: &str) -> String {
        self.build(&[resource_type, id, "relationships", field], &[])
    }

    /// `{base}/{type}?{pairs}` with percent-encoded keys and values.
    pub fn collection(&self, resource_type: &str, pairs: &[(String, String)]) -> String {
        self.build(&[resource_type], pairs)
    }

    fn build(&self, segments: &[&str], pairs: &[(String, String)]) -> String {
        let mut url = self.base.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !pairs.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> LinkBuilder {
        LinkBuilder::new("http://localhost/testing/v1").unwrap()
    }

    #[test]
    fn test_resource_links() {
        let links = builder();
        assert_eq!(
            links.related("posts", "1", "author"),
            "http://localhost/testing/v1/posts/1/author"
        );
        assert_eq!(
            links.relationship("posts", "1", "author"),
            "http://localhost/testing/v1/posts/1/relationships/author"
        );
    }

    #[test]
    fn test_trailing_slash_base() {
        let links = LinkBuilder::new("http://localhost/api/").unwrap();
        assert_eq!(links.resource("posts", "1"), "http://localhost/api/posts/1");
        assert_eq!(links.base(), "http://localhost/api");
    }

    #[test]
    fn test_collection_with_page_pairs() {
        let pairs = vec![
            ("page[number]".to_string(), "1".to_string()),
            ("page[size]".to_string(), "10".to_string()),
        ];
        assert_eq!(
            builder().collection("entities", &pairs),
            "http://localhost/testing/v1/entities?page%5Bnumber%5D=1&page%5Bsize%5D=10"
        );
    }

    #[test]
    fn test_collection_without_pairs() {
        assert_eq!(
            builder().collection("entities", &[]),
            "http://localhost/testing/v1/entities"
        );
    }

    #[test]
    fn test_id_is_percent_encoded() {
        assert_eq!(
            builder().resource("entities", "a b"),
            "http://localhost/testing/v1/entities/a%20b"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = LinkBuilder::new("not a url").unwrap_err();
        assert!(matches!(err, JsonApiError::Runtime { .. }));
        assert!(LinkBuilder::new("mailto:someone@example.com").is_err());
    }
}
