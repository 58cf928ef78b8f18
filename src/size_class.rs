//! The size-class ladder.
//!
//! Every slab-family allocation is rounded up to one of ten power-of-two
//! classes: 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096 bytes. The ladder
//! is fixed; every slab's pool layout is derived from it.

/// Number of size classes.
pub const CLASS_COUNT: usize = 10;

/// Smallest class, in bytes. Also the natural alignment of the smallest
/// blocks and the minimum width of an intrusive free-list link.
pub const MIN_CLASS_SIZE: usize = 8;

/// Largest class, in bytes. Requests above this are invalid.
pub const MAX_CLASS_SIZE: usize = 4096;

const MIN_CLASS_SHIFT: u32 = MIN_CLASS_SIZE.trailing_zeros();

// Free blocks store a link pointer in their first word.
const _: () = assert!(MIN_CLASS_SIZE >= core::mem::size_of::<usize>());
const _: () = assert!(MIN_CLASS_SIZE.is_power_of_two());
const _: () = assert!(index_to_size_class(CLASS_COUNT - 1) == MAX_CLASS_SIZE);

/// Returns the index of the smallest class that can hold `size` bytes.
///
/// `None` for a zero size or one above [`MAX_CLASS_SIZE`].
#[inline]
pub const fn size_to_index(size: usize) -> Option<usize> {
    if size == 0 || size > MAX_CLASS_SIZE {
        return None;
    }
    let size = if size < MIN_CLASS_SIZE { MIN_CLASS_SIZE } else { size };
    let size = size.next_power_of_two();
    Some((size.trailing_zeros() - MIN_CLASS_SHIFT) as usize)
}

/// Returns the block size of class `index`. The inverse of
/// [`size_to_index`] on class boundaries.
#[inline]
pub const fn index_to_size_class(index: usize) -> usize {
    MIN_CLASS_SIZE << index
}
