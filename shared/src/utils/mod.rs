//! Utility functions and helpers

pub mod paths;

/// Integer division rounding up. `divisor` must be non-zero.
pub fn ceil_div(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor)
}

/// Sub-slice `[offset, offset + len)` clamped to the slice bounds
pub fn window<T>(items: &[T], offset: usize, len: usize) -> &[T] {
    let start = offset.min(items.len());
    let end = offset.saturating_add(len).min(items.len());
    &items[start..end]
}
