//! `Arena` — a linear bump region over one mapped area.
//!
//! Allocation is a pointer advance; there is no per-allocation free.
//! `reset` rewinds the whole region for reuse.

use core::ptr::{self, NonNull};

use crate::page::{align_up, map_region, unmap_region, PAGE_SIZE};

/// A bump allocator over a single page-mapped region.
///
/// Requests are served at the current offset with no alignment adjustment;
/// callers needing typed storage must size their requests accordingly. Not
/// thread-safe: allocation takes `&mut self`.
///
/// If the backing region cannot be mapped, the arena is still valid but
/// empty: `capacity()` is zero and every `alloc` fails.
pub struct Arena {
    base: *mut u8,
    used: usize,
    capacity: usize,
}

// Safety: the region is exclusively owned and `&Arena` grants no mutation.
unsafe impl Send for Arena {}

impl Arena {
    /// Maps a region of at least `capacity` bytes.
    ///
    /// The usable capacity is the page-rounded mapped size, which
    /// [`Arena::capacity`] reports.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 || capacity > usize::MAX - (PAGE_SIZE - 1) {
            return Self::empty();
        }
        let capacity = align_up(capacity, PAGE_SIZE);
        match unsafe { map_region(capacity) } {
            Some(base) => Self { base: base.as_ptr(), used: 0, capacity },
            None => Self::empty(),
        }
    }

    const fn empty() -> Self {
        Self { base: ptr::null_mut(), used: 0, capacity: 0 }
    }

    /// Returns `len` bytes at the current offset, or `None` if `len` is zero
    /// or the region cannot hold it.
    pub fn alloc(&mut self, len: usize) -> Option<NonNull<u8>> {
        if len == 0 {
            return None;
        }
        let end = self.used.checked_add(len)?;
        if end > self.capacity {
            return None;
        }
        let block = unsafe { self.base.add(self.used) };
        self.used = end;
        NonNull::new(block)
    }

    /// Like [`Arena::alloc`], but zero-fills the returned range.
    ///
    /// The OS zeroes mapped pages on first touch, but earlier allocations
    /// followed by a `reset` may have dirtied the range.
    pub fn calloc(&mut self, len: usize) -> Option<NonNull<u8>> {
        let block = self.alloc(len)?;
        unsafe {
            ptr::write_bytes(block.as_ptr(), 0, len);
        }
        Some(block)
    }

    /// Rewinds the region. Always succeeds.
    ///
    /// Every pointer previously returned by this arena is invalidated; the
    /// caller must not read or write through one afterwards.
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Bytes allocated since construction or the last `reset`.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total bytes the region can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe {
            unmap_region(self.base, self.capacity);
        }
    }
}
