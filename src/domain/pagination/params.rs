//! Query-string encoding of pagination state
//!
//! Keys are `page` / `pageSize`, or `{prefix}_page` / `{prefix}_pageSize`
//! so several paginated lists can share one URL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A query parameter value. Repeated keys arrive as `Multi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Multi(values) => values.first().map(String::as_str),
        }
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

/// Current query parameters of a location.
pub type QueryMap = BTreeMap<String, QueryValue>;

/// Page and size decoded from a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPaginationParams {
    pub page: u32,
    pub page_size: u32,
}

impl Default for UrlPaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

pub fn page_key(prefix: Option<&str>) -> String {
    prefixed(prefix, "page")
}

pub fn page_size_key(prefix: Option<&str>) -> String {
    prefixed(prefix, "pageSize")
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}_{key}"),
        _ => key.to_string(),
    }
}

fn parse_positive(params: &QueryMap, key: &str, default: u32) -> u32 {
    params
        .get(key)
        .and_then(QueryValue::first)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|value| *value >= 1)
        .unwrap_or(default)
}

/// Read page and size from `params`; missing, non-numeric or
/// non-positive values fall back to page 1 / size 20.
pub fn parse_url_pagination_params(params: &QueryMap, prefix: Option<&str>) -> UrlPaginationParams {
    UrlPaginationParams {
        page: parse_positive(params, &page_key(prefix), DEFAULT_PAGE),
        page_size: parse_positive(params, &page_size_key(prefix), DEFAULT_PAGE_SIZE),
    }
}

/// Query keys for `page` / `page_size`. Defaults are left out so the
/// URL of the first page stays clean.
pub fn generate_url_pagination_params(
    page: u32,
    page_size: u32,
    prefix: Option<&str>,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    if page != DEFAULT_PAGE {
        params.insert(page_key(prefix), page.to_string());
    }
    if page_size != DEFAULT_PAGE_SIZE {
        params.insert(page_size_key(prefix), page_size.to_string());
    }
    params
}

/// Convert generated parameters into a [`QueryMap`].
pub fn to_query_map(params: BTreeMap<String, String>) -> QueryMap {
    params
        .into_iter()
        .map(|(key, value)| (key, QueryValue::Single(value)))
        .collect()
}
