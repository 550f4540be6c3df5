//! Pagination parameters.
//!
//! Derives page-number/size or offset/limit semantics from the raw `page`
//! parameters, attaches the total reported by the adapter, and computes the
//! pagination meta and link overrides.

use std::collections::BTreeMap;

use serde_json::json;

use crate::config::PaginationScheme;
use crate::error::{JsonApiError, JsonApiResult};
use crate::object::StandardObject;

const NUMBER: &str = "number";
const SIZE: &str = "size";
const OFFSET: &str = "offset";
const LIMIT: &str = "limit";

/// Defaults applied when a request carries no (or partial) `page` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationDefaults {
    /// Scheme used when no `page` key is present.
    pub scheme: PaginationScheme,
    /// Default page size / limit.
    pub size: u64,
    /// Requested sizes above this are capped.
    pub max_size: u64,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            scheme: PaginationScheme::Page,
            size: 20,
            max_size: 1000,
        }
    }
}

/// The active pagination scheme for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// Page-based: `page[number]` (1-based) and `page[size]`.
    #[allow(missing_docs)]
    Page { number: u64, size: u64 },
    /// Offset-based: `page[offset]` (0-based) and `page[limit]`.
    #[allow(missing_docs)]
    Offset { offset: u64, limit: u64 },
}

/// Query overrides for one pagination link, e.g. `[("page[number]", "2"), ("page[size]", "10")]`.
pub type PageOverrides = Vec<(String, String)>;

/// Link hints for the top-level pagination links.
///
/// `prev` is absent on the first page, `next` on the last; `last` and `next`
/// require a known total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    /// The current page.
    pub current: PageOverrides,
    /// The first page.
    pub first: PageOverrides,
    /// The last page.
    pub last: Option<PageOverrides>,
    /// The previous page.
    pub prev: Option<PageOverrides>,
    /// The next page.
    pub next: Option<PageOverrides>,
}

/// Pagination parameters for a collection request.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use jsonapi_document::{PaginationDefaults, PaginationParameters};
///
/// let mut page = BTreeMap::new();
/// page.insert("number".to_string(), "1".to_string());
/// page.insert("size".to_string(), "10".to_string());
///
/// let pagination = PaginationParameters::from_page(&page, &PaginationDefaults::default())
///     .unwrap()
///     .with_total(100);
///
/// assert_eq!(pagination.last_page(), Some(10));
/// let links = pagination.links();
/// assert!(links.prev.is_none());
/// assert!(links.next.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParameters {
    strategy: PaginationStrategy,
    total: Option<u64>,
}

impl PaginationParameters {
    /// Creates page-based pagination.
    pub fn page(number: u64, size: u64) -> JsonApiResult<Self> {
        if number < 1 {
            return Err(JsonApiError::bad_request("page[number] must be at least 1"));
        }
        if size == 0 {
            return Err(JsonApiError::bad_request("page[size] must be greater than 0"));
        }
        if (number - 1).checked_mul(size).is_none() {
            return Err(JsonApiError::bad_request(format!(
                "page[number] {} is out of range for page[size] {}",
                number, size
            )));
        }
        Ok(Self {
            strategy: PaginationStrategy::Page { number, size },
            total: None,
        })
    }

    /// Creates offset-based pagination.
    pub fn offset(offset: u64, limit: u64) -> JsonApiResult<Self> {
        if limit == 0 {
            return Err(JsonApiError::bad_request("page[limit] must be greater than 0"));
        }
        Ok(Self {
            strategy: PaginationStrategy::Offset { offset, limit },
            total: None,
        })
    }

    /// Derives pagination from the raw `page` parameters.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for unknown or non-integer keys, for mixed
    /// schemes, for `size`/`limit` below 1, `number` below 1 or a negative
    /// `offset`.
    pub fn from_page(
        page: &BTreeMap<String, String>,
        defaults: &PaginationDefaults,
    ) -> JsonApiResult<Self> {
        if let Some(key) = page
            .keys()
            .find(|k| ![NUMBER, SIZE, OFFSET, LIMIT].contains(&k.as_str()))
        {
            return Err(JsonApiError::bad_request(format!(
                "Unsupported pagination parameter 'page[{}]'",
                key
            )));
        }

        let number = parse_integer(page, NUMBER)?;
        let size = parse_integer(page, SIZE)?;
        let offset = parse_integer(page, OFFSET)?;
        let limit = parse_integer(page, LIMIT)?;

        let page_based = number.is_some() || size.is_some();
        let offset_based = offset.is_some() || limit.is_some();

        let scheme = match (page_based, offset_based) {
            (true, true) => {
                return Err(JsonApiError::bad_request(
                    "Page-based and offset-based pagination parameters cannot be combined",
                ));
            }
            (true, false) => PaginationScheme::Page,
            (false, true) => PaginationScheme::Offset,
            (false, false) => defaults.scheme,
        };

        match scheme {
            PaginationScheme::Page => {
                let number = number.unwrap_or(1);
                if number < 1 {
                    return Err(JsonApiError::bad_request("page[number] must be at least 1"));
                }
                let size = checked_size(size, SIZE, defaults)?;
                Self::page(number as u64, size)
            }
            PaginationScheme::Offset => {
                let offset = offset.unwrap_or(0);
                if offset < 0 {
                    return Err(JsonApiError::bad_request("page[offset] cannot be negative"));
                }
                let limit = checked_size(limit, LIMIT, defaults)?;
                Self::offset(offset as u64, limit)
            }
        }
    }

    /// Returns a copy carrying the total number of records.
    pub fn with_total(self, total: u64) -> Self {
        Self {
            total: Some(total),
            ..self
        }
    }

    /// Returns the active strategy.
    pub fn strategy(&self) -> PaginationStrategy {
        self.strategy
    }

    /// Returns the total, once reported.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Returns the number of records to skip.
    pub fn skip(&self) -> u64 {
        match self.strategy {
            PaginationStrategy::Page { number, size } => (number - 1) * size,
            PaginationStrategy::Offset { offset, .. } => offset,
        }
    }

    /// Returns the maximum number of records on this page.
    pub fn limit(&self) -> u64 {
        match self.strategy {
            PaginationStrategy::Page { size, .. } => size,
            PaginationStrategy::Offset { limit, .. } => limit,
        }
    }

    /// Returns the 1-based page number.
    pub fn number(&self) -> u64 {
        match self.strategy {
            PaginationStrategy::Page { number, .. } => number,
            PaginationStrategy::Offset { offset, limit } => offset / limit + 1,
        }
    }

    /// Returns the last page number, `max(1, ceil(total / size))`.
    pub fn last_page(&self) -> Option<u64> {
        self.total
            .map(|total| total.div_ceil(self.limit()).max(1))
    }

    /// Returns the link overrides for the current, first, last, previous
    /// and next pages.
    pub fn links(&self) -> PageLinks {
        match self.strategy {
            PaginationStrategy::Page { number, size } => {
                let last = self.last_page();
                PageLinks {
                    current: page_overrides(number, size),
                    first: page_overrides(1, size),
                    last: last.map(|last| page_overrides(last, size)),
                    prev: (number > 1).then(|| {
                        let prev = last.map_or(number - 1, |last| (number - 1).min(last));
                        page_overrides(prev, size)
                    }),
                    next: last
                        .filter(|last| number < *last)
                        .map(|_| page_overrides(number + 1, size)),
                }
            }
            PaginationStrategy::Offset { offset, limit } => PageLinks {
                current: offset_overrides(offset, limit),
                first: offset_overrides(0, limit),
                last: self
                    .last_page()
                    .map(|last| offset_overrides((last - 1) * limit, limit)),
                prev: (offset > 0).then(|| {
                    let prev = offset.saturating_sub(limit);
                    let prev = self
                        .last_page()
                        .map_or(prev, |last| prev.min((last - 1) * limit));
                    offset_overrides(prev, limit)
                }),
                next: self
                    .total
                    .filter(|total| offset.saturating_add(limit) < *total)
                    .map(|_| offset_overrides(offset + limit, limit)),
            },
        }
    }

    /// Returns the pagination meta member.
    pub fn meta(&self) -> StandardObject {
        let mut meta = StandardObject::new();
        if let Some(total) = self.total {
            meta = meta.with("total", json!(total));
        }
        match self.strategy {
            PaginationStrategy::Page { number, size } => meta
                .with(SIZE, json!(size))
                .with(OFFSET, json!(self.skip()))
                .with(NUMBER, json!(number)),
            PaginationStrategy::Offset { offset, limit } => {
                meta.with(LIMIT, json!(limit)).with(OFFSET, json!(offset))
            }
        }
    }
}

fn parse_integer(page: &BTreeMap<String, String>, key: &str) -> JsonApiResult<Option<i64>> {
    page.get(key)
        .map(|value| {
            value.trim().parse::<i64>().map_err(|_| {
                JsonApiError::bad_request(format!("page[{}] must be an integer", key))
            })
        })
        .transpose()
}

fn checked_size(
    requested: Option<i64>,
    key: &str,
    defaults: &PaginationDefaults,
) -> JsonApiResult<u64> {
    match requested {
        None => Ok(defaults.size.min(defaults.max_size)),
        Some(size) if size <= 0 => Err(JsonApiError::bad_request(format!(
            "page[{}] must be greater than 0",
            key
        ))),
        Some(size) => Ok((size as u64).min(defaults.max_size)),
    }
}

fn page_overrides(number: u64, size: u64) -> PageOverrides {
    vec![
        ("page[number]".to_string(), number.to_string()),
        ("page[size]".to_string(), size.to_string()),
    ]
}

fn offset_overrides(offset: u64, limit: u64) -> PageOverrides {
    vec![
        ("page[offset]".to_string(), offset.to_string()),
        ("page[limit]".to_string(), limit.to_string()),
    ]
}
