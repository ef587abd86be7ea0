//! Observable state of one paginated list

use crate::domain::pagination::{
    calculate_item_range, calculate_total_pages, generate_page_numbers, has_next_page,
    has_previous_page, ItemRange,
};
use crate::shared::types::PaginationError;

/// Snapshot of a pagination engine.
#[derive(Debug, Clone)]
pub struct PaginationState<T> {
    /// 1-based page being shown or loaded
    pub current_page: u32,
    pub page_size: u32,
    /// Count reported by the last successful load
    pub total_items: u64,
    /// Items of the current page, empty after a failure
    pub items: Vec<T>,
    /// True while a fetch cycle, retries included, is in flight
    pub loading: bool,
    /// User-facing message of the last failure
    pub error: Option<String>,
    /// Attempts made by the current or last fetch cycle
    pub attempts: u32,
    pub last_error: Option<PaginationError>,
}

impl<T> PaginationState<T> {
    pub fn new(current_page: u32, page_size: u32) -> Self {
        Self {
            current_page,
            page_size,
            total_items: 0,
            items: Vec::new(),
            loading: false,
            error: None,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn total_pages(&self) -> u32 {
        calculate_total_pages(self.total_items, self.page_size)
    }

    pub fn position(&self) -> (u32, u32) {
        (self.current_page, self.page_size)
    }

    pub fn item_range(&self) -> ItemRange {
        calculate_item_range(self.current_page, self.page_size, self.total_items)
    }

    pub fn page_numbers(&self, max_visible: u32) -> Vec<u32> {
        generate_page_numbers(self.current_page, self.total_pages(), max_visible)
    }

    pub fn has_next_page(&self) -> bool {
        has_next_page(self.current_page, self.total_pages())
    }

    pub fn has_previous_page(&self) -> bool {
        has_previous_page(self.current_page)
    }
}
