//! Pure pagination arithmetic
//!
//! Every function here only looks at its arguments. Invalid input is
//! clamped or defaulted, never reported as an error.

use serde::{Deserialize, Serialize};

/// Page sizes offered to users when none are configured.
pub const DEFAULT_PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// Number of page links shown by default.
pub const DEFAULT_MAX_VISIBLE_PAGES: u32 = 7;

/// 1-indexed range for "showing X–Y of Z".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRange {
    pub start: u64,
    pub end: u64,
    pub showing: u64,
}

/// `ceil(total_items / items_per_page)`, or 0 when either is 0.
pub fn calculate_total_pages(total_items: u64, items_per_page: u32) -> u32 {
    if total_items == 0 || items_per_page == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(items_per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Clamp `page` into `[1, total_pages]`. An unknown total (0) only
/// enforces the lower bound.
pub fn validate_page_number(page: u32, total_pages: u32) -> u32 {
    if page < 1 {
        return 1;
    }
    if total_pages > 0 && page > total_pages {
        return total_pages;
    }
    page
}

/// `size` if it is one of `allowed`, otherwise the first allowed size.
pub fn validate_page_size(size: u32, allowed: &[u32]) -> u32 {
    if allowed.contains(&size) {
        return size;
    }
    allowed.first().copied().unwrap_or(size)
}

pub fn calculate_item_range(current_page: u32, items_per_page: u32, total_items: u64) -> ItemRange {
    let per_page = u64::from(items_per_page);
    let page = u64::from(current_page.max(1));

    let start = (page - 1) * per_page + 1;
    let end = (page * per_page).min(total_items);
    let showing = (end + 1).saturating_sub(start);

    ItemRange {
        start,
        end,
        showing,
    }
}

/// Page links to render around `current_page`.
///
/// With more pages than `max_visible` the window keeps its full width and
/// is shifted away from whichever edge it would cross.
pub fn generate_page_numbers(current_page: u32, total_pages: u32, max_visible: u32) -> Vec<u32> {
    if max_visible == 0 {
        return Vec::new();
    }
    if total_pages <= max_visible {
        return (1..=total_pages).collect();
    }

    let current_page = current_page.min(total_pages);
    let last_start = total_pages - max_visible + 1;
    let start = current_page
        .saturating_sub(max_visible / 2)
        .max(1)
        .min(last_start);

    (start..=start + (max_visible - 1)).collect()
}

pub fn has_next_page(current_page: u32, total_pages: u32) -> bool {
    current_page < total_pages
}

pub fn has_previous_page(current_page: u32) -> bool {
    current_page > 1
}

/// Zero-based index of the first item on `page`.
pub fn calculate_offset(page: u32, page_size: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(page_size)
}

/// Page that keeps the first visible item in view after switching from
/// `old_size` to `new_size`.
pub fn page_for_new_size(current_page: u32, old_size: u32, new_size: u32) -> u32 {
    if new_size == 0 {
        return 1;
    }
    let first_item = calculate_offset(current_page, old_size) + 1;
    let page = first_item.div_ceil(u64::from(new_size));
    u32::try_from(page).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(calculate_total_pages(47, 20), 3);
        assert_eq!(calculate_total_pages(41, 10), 5);
    }

    #[test]
    fn total_pages_zero_inputs() {
        assert_eq!(calculate_total_pages(0, 20), 0);
        assert_eq!(calculate_total_pages(15, 0), 0);
    }

    #[test]
    fn total_pages_exact_multiple_has_no_remainder_page() {
        assert_eq!(calculate_total_pages(40, 20), 2);
        assert_eq!(calculate_total_pages(100, 10), 10);
    }

    #[test]
    fn page_size_larger_than_total_is_one_page() {
        assert_eq!(calculate_total_pages(7, 100), 1);
    }

    #[test]
    fn validate_page_number_clamps_both_ends() {
        assert_eq!(validate_page_number(0, 5), 1);
        assert_eq!(validate_page_number(9, 5), 5);
        assert_eq!(validate_page_number(3, 5), 3);
    }

    #[test]
    fn validate_page_number_unknown_total_only_floors() {
        assert_eq!(validate_page_number(0, 0), 1);
        assert_eq!(validate_page_number(42, 0), 42);
    }

    #[test]
    fn validate_page_number_always_in_bounds() {
        for total in 0..12u32 {
            for page in 0..20u32 {
                let valid = validate_page_number(page, total);
                assert!(valid >= 1);
                if total > 0 {
                    assert!(valid <= total);
                }
            }
        }
    }

    #[test]
    fn validate_page_size_falls_back_to_first_allowed() {
        assert_eq!(validate_page_size(50, &DEFAULT_PAGE_SIZES), 50);
        assert_eq!(validate_page_size(33, &DEFAULT_PAGE_SIZES), 10);
        assert_eq!(validate_page_size(5, &[5, 15]), 5);
        assert_eq!(validate_page_size(7, &[]), 7);
    }

    #[test]
    fn item_range_on_last_partial_page() {
        assert_eq!(
            calculate_item_range(3, 20, 47),
            ItemRange {
                start: 41,
                end: 47,
                showing: 7
            }
        );
    }

    #[test]
    fn item_range_for_empty_collection() {
        let range = calculate_item_range(1, 20, 0);
        assert_eq!(range.showing, 0);
        assert_eq!(range.end, 0);
    }

    #[test]
    fn page_numbers_centered_window() {
        assert_eq!(generate_page_numbers(5, 20, 7), vec![2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(generate_page_numbers(10, 20, 5), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn page_numbers_fewer_pages_than_window() {
        assert_eq!(generate_page_numbers(1, 3, 7), vec![1, 2, 3]);
        assert!(generate_page_numbers(1, 0, 7).is_empty());
    }

    #[test]
    fn page_numbers_shift_at_edges() {
        assert_eq!(generate_page_numbers(1, 20, 7), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            generate_page_numbers(20, 20, 7),
            vec![14, 15, 16, 17, 18, 19, 20]
        );
        assert_eq!(
            generate_page_numbers(19, 20, 7),
            vec![14, 15, 16, 17, 18, 19, 20]
        );
    }

    #[test]
    fn page_numbers_for_page_past_the_end() {
        assert_eq!(
            generate_page_numbers(u32::MAX, 20, 7),
            vec![14, 15, 16, 17, 18, 19, 20]
        );
        assert_eq!(
            generate_page_numbers(u32::MAX - 1, u32::MAX, 3),
            vec![u32::MAX - 2, u32::MAX - 1, u32::MAX]
        );
        assert_eq!(
            generate_page_numbers(u32::MAX, u32::MAX, 3),
            vec![u32::MAX - 2, u32::MAX - 1, u32::MAX]
        );
    }

    #[test]
    fn next_and_previous_at_boundaries() {
        assert!(!has_previous_page(1));
        assert!(has_previous_page(2));
        assert!(has_next_page(2, 3));
        assert!(!has_next_page(3, 3));
        assert!(!has_next_page(1, 0));
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(calculate_offset(1, 20), 0);
        assert_eq!(calculate_offset(3, 10), 20);
    }

    #[test]
    fn new_size_keeps_first_item_in_view() {
        // page 3 of size 10 starts at item 21
        assert_eq!(page_for_new_size(3, 10, 20), 2);
        assert_eq!(page_for_new_size(3, 10, 50), 1);
        assert_eq!(page_for_new_size(2, 50, 10), 6);
        assert_eq!(page_for_new_size(1, 20, 100), 1);
    }
}
