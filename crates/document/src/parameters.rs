//! Encoding parameters parsing.
//!
//! Parses the JSON:API query parameters (`include`, `fields[TYPE]`,
//! `filter[FIELD]`, `sort`, `page[KEY]`) into an immutable
//! [`EncodingParameters`] descriptor. Unrecognized parameters are kept so that
//! they survive into generated links.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::{JsonApiError, JsonApiResult};

const INCLUDE: &str = "include";
const FIELDS: &str = "fields";
const FILTER: &str = "filter";
const SORT: &str = "sort";
const PAGE: &str = "page";

/// A relationship path requested through `include` (e.g. `comments.author`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IncludePath(Vec<String>);

impl IncludePath {
    /// Parses a dot-separated include path.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if any segment is empty.
    pub fn parse(path: &str) -> JsonApiResult<Self> {
        let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(JsonApiError::bad_request(format!(
                "Invalid include path '{}': empty relationship name",
                path
            )));
        }
        Ok(Self(segments))
    }

    /// Returns the relationship names along the path.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of relationships along the path.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for IncludePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Sort direction for a sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order (`-` prefix).
    Descending,
}

/// A single entry of the `sort` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Parses a sort entry (e.g. `-name` for descending).
    pub fn parse(s: &str) -> JsonApiResult<Self> {
        let s = s.trim();
        let (field, direction) = match s.strip_prefix('-') {
            Some(stripped) => (stripped, SortDirection::Descending),
            None => (s, SortDirection::Ascending),
        };
        if field.is_empty() {
            return Err(JsonApiError::bad_request("Invalid sort parameter: empty field name"));
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    /// Returns true for ascending order.
    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

/// The value of a `filter[FIELD]` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single value.
    Single(String),
    /// Several values (`filter[f][]=a&filter[f][]=b` or repeated keys).
    Many(Vec<String>),
}

impl FilterValue {
    /// Returns every value.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(v) => vec![v.as_str()],
            FilterValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Returns true if `candidate` equals one of the values.
    pub fn matches(&self, candidate: &str) -> bool {
        self.values().contains(&candidate)
    }

    fn push(self, value: String) -> Self {
        match self {
            FilterValue::Single(existing) => FilterValue::Many(vec![existing, value]),
            FilterValue::Many(mut values) => {
                values.push(value);
                FilterValue::Many(values)
            }
        }
    }
}

/// Parsed JSON:API query parameters.
///
/// # Example
///
/// ```
/// use jsonapi_document::{EncodingParameters, SortDirection};
///
/// let params = EncodingParameters::parse(
///     "include=author,comments.author&fields[posts]=title&sort=-name,age&page[number]=2",
///     5,
/// ).unwrap();
///
/// assert_eq!(params.include().len(), 2);
/// assert!(params.is_field_allowed("posts", "title"));
/// assert!(!params.is_field_allowed("posts", "body"));
/// assert_eq!(params.sort()[0].direction, SortDirection::Descending);
/// assert_eq!(params.page().get("number").map(String::as_str), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodingParameters {
    include: Vec<IncludePath>,
    fields: BTreeMap<String, BTreeSet<String>>,
    filter: BTreeMap<String, FilterValue>,
    sort: Vec<SortField>,
    page: BTreeMap<String, String>,
    unrecognized: Vec<(String, String)>,
    raw: Vec<(String, String)>,
}

impl EncodingParameters {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (percent-encoded) query string.
    pub fn parse(query: &str, max_include_depth: usize) -> JsonApiResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(
            form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned())),
            max_include_depth,
        )
    }

    /// Parses already decoded query pairs.
    pub fn from_pairs<I>(pairs: I, max_include_depth: usize) -> JsonApiResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();

        for (key, value) in pairs {
            params.raw.push((key.clone(), value.clone()));

            match split_bracket_key(&key)? {
                (INCLUDE, None) => params.parse_include(&value, max_include_depth)?,
                (SORT, None) => params.parse_sort(&value)?,
                (FIELDS, Some(resource_type)) => {
                    let names = params.fields.entry(resource_type.to_string()).or_default();
                    names.extend(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from),
                    );
                }
                (FILTER, Some(field)) => {
                    let field = field.trim_end_matches("[]").to_string();
                    let entry = match params.filter.remove(&field) {
                        Some(existing) => existing.push(value),
                        None if key.ends_with("[]") => {
                            FilterValue::Many(vec![value])
                        }
                        None => FilterValue::Single(value),
                    };
                    params.filter.insert(field, entry);
                }
                (PAGE, Some(page_key)) => {
                    params.page.insert(page_key.to_string(), value);
                }
                (FIELDS | FILTER | PAGE, None) => {
                    return Err(JsonApiError::bad_request(format!(
                        "Query parameter '{}' requires a bracketed key, e.g. {}[name]",
                        key, key
                    )));
                }
                (INCLUDE | SORT, Some(_)) => {
                    return Err(JsonApiError::bad_request(format!(
                        "Query parameter '{}' does not accept a bracketed key",
                        key
                    )));
                }
                _ => params.unrecognized.push((key.clone(), value)),
            }
        }

        Ok(params)
    }

    fn parse_include(&mut self, value: &str, max_depth: usize) -> JsonApiResult<()> {
        for entry in value.split(',') {
            let path = IncludePath::parse(entry)?;
            if path.depth() > max_depth {
                return Err(JsonApiError::bad_request(format!(
                    "Include path '{}' exceeds the maximum depth of {}",
                    path, max_depth
                )));
            }
            if !self.include.contains(&path) {
                self.include.push(path);
            }
        }
        Ok(())
    }

    fn parse_sort(&mut self, value: &str) -> JsonApiResult<()> {
        for entry in value.split(',') {
            self.sort.push(SortField::parse(entry)?);
        }
        Ok(())
    }

    /// Returns the requested include paths, in request order.
    pub fn include(&self) -> &[IncludePath] {
        &self.include
    }

    /// Returns the sparse fieldsets by resource type.
    pub fn fields(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.fields
    }

    /// Returns the sparse fieldset for a resource type, if restricted.
    pub fn fields_for(&self, resource_type: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(resource_type)
    }

    /// Returns whether the attribute or relationship may be emitted.
    ///
    /// A type absent from `fields` is unrestricted.
    pub fn is_field_allowed(&self, resource_type: &str, name: &str) -> bool {
        self.fields
            .get(resource_type)
            .is_none_or(|names| names.contains(name))
    }

    /// Returns the filters by field name.
    pub fn filter(&self) -> &BTreeMap<String, FilterValue> {
        &self.filter
    }

    /// Returns the sort fields in priority order.
    pub fn sort(&self) -> &[SortField] {
        &self.sort
    }

    /// Returns the raw `page` parameters.
    pub fn page(&self) -> &BTreeMap<String, String> {
        &self.page
    }

    /// Returns parameters outside the JSON:API families, in request order.
    pub fn unrecognized(&self) -> &[(String, String)] {
        &self.unrecognized
    }

    /// Returns every decoded parameter except `page[...]`, in request order.
    ///
    /// Used when generating links that carry their own page overrides.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.raw
            .iter()
            .filter(|(k, _)| !k.starts_with("page["))
            .cloned()
            .collect()
    }
}

/// Splits `family[key]` into `("family", Some("key"))`.
///
/// Keys with a trailing `[]` keep it in the inner key so callers can detect
/// array syntax.
fn split_bracket_key(key: &str) -> JsonApiResult<(&str, Option<&str>)> {
    let Some(open) = key.find('[') else {
        return Ok((key, None));
    };
    if !key.ends_with(']') {
        return Err(JsonApiError::bad_request(format!(
            "Malformed query parameter '{}'",
            key
        )));
    }
    let inner = &key[open + 1..key.len() - 1];
    let inner = inner.strip_suffix("][").unwrap_or(inner);
    if inner.is_empty() {
        return Err(JsonApiError::bad_request(format!(
            "Malformed query parameter '{}': empty key",
            key
        )));
    }
    Ok((&key[..open], Some(inner)))
}
