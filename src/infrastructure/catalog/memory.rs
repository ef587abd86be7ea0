//! In-memory item catalog
//!
//! Stands in for the hosted document store during development, demos and
//! tests. Pages are served in listing order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::item::{Category, Item};
use crate::domain::pagination::calculate_offset;
use crate::domain::ports::PageFetcher;
use crate::shared::types::{FetchError, PageEnvelope, PaginatedResponse};

const SEED_NAMES: [&str; 8] = [
    "Cordless drill",
    "Extension ladder",
    "Pressure washer",
    "Camping tent",
    "Stand mixer",
    "Hedge trimmer",
    "Projector",
    "Board game set",
];

const SEED_OWNERS: [&str; 5] = ["Mira", "Jonas", "Aiko", "Tomasz", "Lea"];

/// Filters forwarded with every catalog page load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<Category>,
    pub search: Option<String>,
}

impl CatalogQuery {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(needle) if !needle.trim().is_empty() => item.matches(needle.trim()),
            _ => true,
        }
    }
}

/// In-memory catalog for development and testing
pub struct InMemoryCatalog {
    items: DashMap<Uuid, Item>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Catalog with `count` generated items, listed one minute apart.
    pub fn seeded(count: usize) -> Self {
        let catalog = Self::new();
        let start = Utc::now() - Duration::minutes(count as i64);

        for i in 0..count {
            let mut item = Item::new(
                format!("{} {:03}", SEED_NAMES[i % SEED_NAMES.len()], i + 1),
                Category::ALL[i % Category::ALL.len()],
                SEED_OWNERS[i % SEED_OWNERS.len()],
            );
            item.available = i % 4 != 3;
            item.listed_at = start + Duration::minutes(i as i64);
            catalog.add(item);
        }

        catalog
    }

    pub fn add(&self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn remove(&self, id: &Uuid) -> Option<Item> {
        self.items.remove(id).map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Matching items in listing order
    pub fn query(&self, query: &CatalogQuery) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| a.listed_at.cmp(&b.listed_at).then_with(|| a.id.cmp(&b.id)));
        items
    }

    /// One page of matching items
    pub fn page(&self, page: u32, page_size: u32, query: &CatalogQuery) -> PaginatedResponse<Item> {
        let matching = self.query(query);
        let total = matching.len() as u64;
        let offset = usize::try_from(calculate_offset(page, page_size)).unwrap_or(usize::MAX);

        let data: Vec<Item> = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();

        PaginatedResponse::new(data, page, page_size, total)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// [`PageFetcher`] serving pages straight from an [`InMemoryCatalog`]
#[derive(Clone)]
pub struct CatalogFetcher {
    catalog: Arc<InMemoryCatalog>,
}

impl CatalogFetcher {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl PageFetcher<Item, CatalogQuery> for CatalogFetcher {
    async fn fetch(
        &self,
        page: u32,
        page_size: u32,
        query: CatalogQuery,
    ) -> Result<PageEnvelope<Item>, FetchError> {
        let response = self.catalog.page(page, page_size, &query);
        debug!(
            page,
            page_size,
            returned = response.data.len(),
            total = response.pagination.total_items,
            "Catalog page served"
        );
        Ok(response.into())
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_catalog_pages_in_listing_order() {
        let catalog = InMemoryCatalog::seeded(47);
        let page = catalog.page(3, 20, &CatalogQuery::default());

        assert_eq!(page.data.len(), 7);
        assert_eq!(page.pagination.total_items, 47);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.data[0].name.ends_with("041"));
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let catalog = InMemoryCatalog::seeded(5);
        let page = catalog.page(4, 10, &CatalogQuery::default());
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_items, 5);
    }

    #[test]
    fn category_and_search_filters() {
        let catalog = InMemoryCatalog::seeded(47);

        let tools = CatalogQuery {
            category: Some(Category::Tools),
            search: None,
        };
        assert_eq!(catalog.query(&tools).len(), 8);

        let drills = CatalogQuery {
            category: None,
            search: Some("drill".to_string()),
        };
        assert_eq!(catalog.query(&drills).len(), 6);
    }

    #[test]
    fn remove_shrinks_catalog() {
        let catalog = InMemoryCatalog::seeded(3);
        let first = catalog.query(&CatalogQuery::default())[0].id;
        assert!(catalog.remove(&first).is_some());
        assert_eq!(catalog.len(), 2);
        assert!(catalog.remove(&first).is_none());
    }

    #[tokio::test]
    async fn fetcher_wraps_page_in_envelope() {
        let fetcher = CatalogFetcher::new(Arc::new(InMemoryCatalog::seeded(12)));
        let envelope = fetcher
            .fetch(2, 10, CatalogQuery::default())
            .await
            .unwrap();
        let response = envelope.into_response().unwrap();
        assert_eq!(response.data.len(), 2);
        assert!(response.pagination.has_previous_page);
    }
}
