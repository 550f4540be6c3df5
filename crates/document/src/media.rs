//! Media type negotiation.
//!
//! Clients must send `Content-Type: application/vnd.api+json` without media
//! type parameters, and must accept the JSON:API media type in at least one
//! unparameterized form.

use crate::error::{JsonApiError, JsonApiResult};

/// The JSON:API media type.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

/// A parsed media range: the lowercased `type/subtype` and whether it carried
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaRange {
    essence: String,
    has_parameters: bool,
}

impl MediaRange {
    fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';').map(str::trim);
        let essence = parts.next().filter(|s| !s.is_empty())?.to_ascii_lowercase();
        // Quality values are part of Accept syntax, not media type parameters.
        let has_parameters = parts
            .filter(|p| !p.is_empty())
            .any(|p| !p.to_ascii_lowercase().starts_with("q="));
        Some(Self {
            essence,
            has_parameters,
        })
    }

    fn is_jsonapi(&self) -> bool {
        self.essence == MEDIA_TYPE
    }

    fn is_wildcard(&self) -> bool {
        self.essence == "*/*" || self.essence == "application/*"
    }
}

/// Checks an `Accept` header value.
///
/// # Errors
///
/// Returns `NotAcceptable` when no entry accepts the bare JSON:API media
/// type, including when every JSON:API entry carries parameters.
pub fn check_accept(accept: Option<&str>) -> JsonApiResult<()> {
    let Some(accept) = accept.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };

    let ranges: Vec<MediaRange> = accept.split(',').filter_map(MediaRange::parse).collect();
    let acceptable = ranges
        .iter()
        .any(|range| range.is_wildcard() || (range.is_jsonapi() && !range.has_parameters));

    if acceptable {
        Ok(())
    } else if ranges.iter().any(MediaRange::is_jsonapi) {
        Err(JsonApiError::not_acceptable(format!(
            "Every '{}' entry in the Accept header carries media type parameters",
            MEDIA_TYPE
        )))
    } else {
        Err(JsonApiError::not_acceptable(format!(
            "The Accept header '{}' does not accept '{}'",
            accept, MEDIA_TYPE
        )))
    }
}

/// Checks a `Content-Type` header value. An absent header passes.
///
/// # Errors
///
/// Returns `NotAcceptable` for a foreign media type or a JSON:API media type
/// with parameters.
pub fn check_content_type(content_type: Option<&str>) -> JsonApiResult<()> {
    let Some(content_type) = content_type.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };

    match MediaRange::parse(content_type) {
        Some(range) if range.is_jsonapi() && !range.has_parameters => Ok(()),
        Some(range) if range.is_jsonapi() => Err(JsonApiError::not_acceptable(format!(
            "Media type parameters are not allowed on '{}'",
            MEDIA_TYPE
        ))),
        _ => Err(JsonApiError::not_acceptable(format!(
            "Unsupported Content-Type '{}', expected '{}'",
            content_type, MEDIA_TYPE
        ))),
    }
}
