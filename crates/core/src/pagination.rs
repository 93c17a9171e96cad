//! Page-number windowing for the results pager.
//!
//! Deterministic: given `(current, total)` the same indicator sequence is
//! always produced. With one page or fewer the pager renders nothing, so the
//! window is empty.

/// One indicator in the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// A navigable page number (1-based).
    Page(u32),
    /// A gap between page numbers.
    Ellipsis,
}

/// Pages shown in full before an ellipsis is needed (3 visible + first/last).
const FULL_WINDOW: u32 = 5;

/// Total pages for a result count, rounding up.
#[must_use]
pub fn total_pages(results: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(results.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

/// Compute the indicator window for a page control.
///
/// Rules:
/// - `total <= 1`: empty (no control rendered);
/// - `total <= 5`: all pages, no ellipsis;
/// - `current <= 4`: `[1, 2, 3, 4, …, total]`;
/// - `current >= total - 3`: `[1, …, total-3, total-2, total-1, total]`;
/// - otherwise: `[1, …, current-1, current, current+1, …, total]`.
#[must_use]
pub fn page_window(current: u32, total: u32) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }
    if total <= FULL_WINDOW {
        return (1..=total).map(PageItem::Page).collect();
    }

    if current <= 4 {
        let mut items: Vec<PageItem> = (1..=4).map(PageItem::Page).collect();
        items.push(PageItem::Ellipsis);
        items.push(PageItem::Page(total));
        items
    } else if current >= total - 3 {
        let mut items = vec![PageItem::Page(1), PageItem::Ellipsis];
        items.extend((total - 3..=total).map(PageItem::Page));
        items
    } else {
        vec![
            PageItem::Page(1),
            PageItem::Ellipsis,
            PageItem::Page(current - 1),
            PageItem::Page(current),
            PageItem::Page(current + 1),
            PageItem::Ellipsis,
            PageItem::Page(total),
        ]
    }
}

/// Whether a navigation target is inside the pager bounds.
#[must_use]
pub const fn page_in_bounds(page: u32, total: u32) -> bool {
    page >= 1 && page <= total
}
