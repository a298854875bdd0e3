//! Fixed-size batch splitting.

/// Split an ordered slice into contiguous batches of at most `batch_size`
/// items. The last batch may be shorter. Concatenating the result
/// reconstructs the input exactly.
///
/// # Panics
///
/// Panics if `batch_size` is zero.
#[must_use]
pub fn split_batches<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    assert!(batch_size > 0, "batch_size must be at least 1");
    items.chunks(batch_size).collect()
}
