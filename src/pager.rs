//! Fixed-size pagination of the topic menu.

/// One page of an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    /// Clamped page index actually shown
    pub page: usize,
    pub page_count: usize,
    pub items: &'a [T],
    pub has_prev: bool,
    pub has_next: bool,
}

/// Number of pages needed for `len` items, `ceil(len / page_size)`.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Clamp a requested page index into `[0, page_count - 1]`.
///
/// An empty list has no valid page; it is reported as page 0.
pub fn clamp_page(index: i64, len: usize, page_size: usize) -> usize {
    let last = page_count(len, page_size).saturating_sub(1);
    if index <= 0 {
        0
    } else {
        usize::try_from(index).map_or(last, |i| i.min(last))
    }
}

/// Slice `keys` into the page at `index`, clamping out-of-range requests.
///
/// A `page_size` of zero is treated as one.
pub fn paginate<T>(index: i64, keys: &[T], page_size: usize) -> PageSlice<'_, T> {
    let page_size = page_size.max(1);
    let page_count = page_count(keys.len(), page_size);
    let page = clamp_page(index, keys.len(), page_size);

    let start = (page * page_size).min(keys.len());
    let end = (start + page_size).min(keys.len());

    PageSlice {
        page,
        page_count,
        items: &keys[start..end],
        has_prev: page > 0,
        has_next: page + 1 < page_count,
    }
}
