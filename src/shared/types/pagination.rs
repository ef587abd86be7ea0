use serde::{Deserialize, Serialize};

use crate::domain::pagination::math::{calculate_total_pages, has_next_page, has_previous_page};

use super::errors::PaginationError;

/// Pagination metadata reported by a data service alongside one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    /// Build metadata for `page` of a collection holding `total_items`.
    pub fn from_counts(page: u32, items_per_page: u32, total_items: u64) -> Self {
        let total_pages = calculate_total_pages(total_items, items_per_page);
        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page,
            has_next_page: has_next_page(page, total_pages),
            has_previous_page: has_previous_page(page),
        }
    }
}

/// One page of data together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, items_per_page: u32, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::from_counts(page, items_per_page, total_items),
        }
    }
}

/// Raw response as a fetcher resolves it.
///
/// Remote services may omit either field; such a response is rejected by
/// [`PageEnvelope::into_response`] and handled like any other failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    pub data: Option<Vec<T>>,
    pub pagination: Option<PaginationMeta>,
}

impl<T> PageEnvelope<T> {
    pub fn into_response(self) -> Result<PaginatedResponse<T>, PaginationError> {
        let data = self
            .data
            .ok_or(PaginationError::MalformedResponse { missing: "data" })?;
        let pagination = self
            .pagination
            .ok_or(PaginationError::MalformedResponse { missing: "pagination" })?;
        Ok(PaginatedResponse { data, pagination })
    }
}

impl<T> From<PaginatedResponse<T>> for PageEnvelope<T> {
    fn from(response: PaginatedResponse<T>) -> Self {
        Self {
            data: Some(response.data),
            pagination: Some(response.pagination),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_from_counts_for_last_partial_page() {
        let meta = PaginationMeta::from_counts(3, 20, 47);
        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn envelope_decodes_service_json() {
        let json = r#"{
            "data": ["drill", "ladder"],
            "pagination": {
                "currentPage": 1, "totalPages": 1, "totalItems": 2,
                "itemsPerPage": 20, "hasNextPage": false, "hasPreviousPage": false
            }
        }"#;
        let envelope: PageEnvelope<String> = serde_json::from_str(json).unwrap();
        let response = envelope.into_response().unwrap();
        assert_eq!(response.data, vec!["drill", "ladder"]);
        assert_eq!(response.pagination.total_items, 2);
    }

    #[test]
    fn envelope_without_pagination_is_malformed() {
        let envelope: PageEnvelope<String> = serde_json::from_str(r#"{"data": []}"#).unwrap();
        let err = envelope.into_response().unwrap_err();
        assert!(matches!(
            err,
            PaginationError::MalformedResponse { missing: "pagination" }
        ));
    }

    #[test]
    fn envelope_without_data_is_malformed() {
        let envelope: PageEnvelope<String> = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            envelope.into_response(),
            Err(PaginationError::MalformedResponse { missing: "data" })
        ));
    }
}
