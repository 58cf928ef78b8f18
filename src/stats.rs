//! Global allocation counters.
//!
//! An allocator cannot re-enter a logging framework, so observability is a
//! set of relaxed atomic counters that callers may read at any time.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide counters maintained by the slab family and the page mapper.
///
/// Alloc/free counters account in size-class bytes (the extent handed to the
/// caller), not requested bytes. Map/unmap counters account in page-rounded
/// bytes as issued to the OS.
pub struct AllocatorMetrics {
    /// Bytes handed out by slab-family `alloc`/`calloc`.
    pub allocated_bytes: AtomicUsize,
    /// Number of successful slab-family allocations.
    pub allocated_count: AtomicUsize,
    /// Bytes returned through slab-family `free`.
    pub freed_bytes: AtomicUsize,
    /// Number of slab-family frees.
    pub freed_count: AtomicUsize,
    /// Bytes requested from the OS by the page mapper.
    pub mapped_bytes: AtomicUsize,
    /// Bytes returned to the OS by the page mapper.
    pub unmapped_bytes: AtomicUsize,
}

/// The global metrics instance.
pub static METRICS: AllocatorMetrics = AllocatorMetrics {
    allocated_bytes: AtomicUsize::new(0),
    allocated_count: AtomicUsize::new(0),
    freed_bytes: AtomicUsize::new(0),
    freed_count: AtomicUsize::new(0),
    mapped_bytes: AtomicUsize::new(0),
    unmapped_bytes: AtomicUsize::new(0),
};

impl AllocatorMetrics {
    #[inline(always)]
    pub(crate) fn on_alloc(&self, size: usize) {
        self.allocated_count.fetch_add(1, Ordering::Relaxed);
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn on_free(&self, size: usize) {
        self.freed_count.fetch_add(1, Ordering::Relaxed);
        self.freed_bytes.fetch_add(size, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn on_map(&self, bytes: usize) {
        self.mapped_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn on_unmap(&self, bytes: usize) {
        self.unmapped_bytes.fetch_add(bytes, Ordering::Relaxed);
    }
}
