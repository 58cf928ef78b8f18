//! `Slab` — the concurrent multi-class allocator.
//!
//! A slab owns one [`Pool`] per size class plus a monotone epoch counter.
//! Allocation maps the request to a class and serves it from the calling
//! thread's block cache when possible; a miss refills the cache with a batch
//! drawn under that one pool's mutex. `reset` bumps the epoch, which lazily
//! invalidates every thread's cached view of this slab without cross-thread
//! signaling.
//!
//! The pools and the epoch live in a [`SlabShared`] written into its own
//! mapped region, so their address (the identity the caches key on) is
//! stable even though the `Slab` handle itself can move.

use core::mem::size_of;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicU64, Ordering};

use crate::cache::{self, BATCH};
use crate::page::{map_region, unmap_region};
use crate::pool::Pool;
use crate::size_class::{index_to_size_class, size_to_index, CLASS_COUNT};
use crate::stats::METRICS;

/// Blocks per class at scale 1.0. Larger classes get fewer blocks; each
/// class contributes 32 KiB.
const BASE_BLOCKS: [usize; CLASS_COUNT] = [4096, 2048, 1024, 512, 256, 128, 64, 32, 16, 8];

fn scaled_block_count(index: usize, scale: f64) -> usize {
    // The cast saturates negative and NaN scales to zero; max(1) then keeps
    // every class allocatable.
    let scaled = (BASE_BLOCKS[index] as f64 * scale) as usize;
    scaled.max(1)
}

/// The address-stable interior of a slab: ten pools and the live epoch.
pub(crate) struct SlabShared {
    pools: [Pool; CLASS_COUNT],
    epoch: AtomicU64,
}

impl SlabShared {
    #[inline]
    pub(crate) fn live_epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn pool(&self, index: usize) -> &Pool {
        &self.pools[index]
    }

    fn alloc_block(&self, index: usize) -> Option<NonNull<u8>> {
        let epoch = self.live_epoch();
        let cached = cache::CACHE.try_with(|cache| {
            let mut table = cache.borrow_mut();

            // Hit: a current-epoch stack with blocks in it.
            if let Some(entry) = table.lookup(self) {
                if entry.epoch() == epoch {
                    if let Some(block) = entry.stack_mut(index).pop() {
                        return NonNull::new(block);
                    }
                }
            }

            // Miss: pull a batch under the pool mutex, keep all but the
            // first for subsequent hits.
            let mut batch = [ptr::null_mut::<u8>(); BATCH];
            let taken = self.pools[index].alloc_batch(&mut batch);
            if taken == 0 {
                return None;
            }
            let entry = table.entry_for_refill(self, epoch);
            for &block in &batch[1..taken] {
                entry.stack_mut(index).push(block);
            }
            NonNull::new(batch[0])
        });

        let block = match cached {
            Ok(found) => found?,
            // Thread-local storage is tearing down; skip the cache.
            Err(_) => self.pools[index].alloc()?,
        };
        METRICS.on_alloc(index_to_size_class(index));
        Some(block)
    }

    unsafe fn free_block(&self, index: usize, block: *mut u8) {
        let epoch = self.live_epoch();
        let cached = cache::CACHE.try_with(|cache| {
            let mut table = cache.borrow_mut();
            // Only an existing, current-epoch entry takes the block; a free
            // never materializes cache state.
            let Some(entry) = table.lookup(self) else {
                return false;
            };
            if entry.epoch() != epoch {
                return false;
            }
            let stack = entry.stack_mut(index);
            if stack.is_full() {
                let mut drained = [ptr::null_mut::<u8>(); BATCH / 2];
                let count = stack.drain_to(BATCH / 2, &mut drained);
                unsafe { self.pools[index].free_batch(&drained[..count]) };
            }
            stack.push(block);
            true
        });
        if !matches!(cached, Ok(true)) {
            self.pools[index].free(NonNull::new_unchecked(block));
        }
        METRICS.on_free(index_to_size_class(index));
    }
}

/// A concurrent small-object allocator segregated by size class.
///
/// Shared freely across threads: pools are individually mutex-guarded and
/// the hot path runs against the calling thread's own cache. Cannot be
/// cloned: cached blocks are keyed on the slab's identity.
///
/// If the shared region cannot be mapped at construction, the slab is valid
/// but empty: `total_capacity()` is zero and every `alloc` fails.
pub struct Slab {
    shared: Option<NonNull<SlabShared>>,
}

unsafe impl Send for Slab {}
unsafe impl Sync for Slab {}

impl Slab {
    /// Creates a slab whose per-class block counts scale linearly with
    /// `scale` (at least one block per class for any positive scale).
    pub fn new(scale: f64) -> Self {
        let Some(region) = (unsafe { map_region(size_of::<SlabShared>()) }) else {
            return Self { shared: None };
        };
        let shared = region.cast::<SlabShared>();
        let value = SlabShared {
            pools: core::array::from_fn(|i| {
                Pool::new(index_to_size_class(i), scaled_block_count(i, scale))
            }),
            epoch: AtomicU64::new(0),
        };
        unsafe {
            shared.as_ptr().write(value);
        }
        Self { shared: Some(shared) }
    }

    #[inline]
    fn shared(&self) -> Option<&SlabShared> {
        self.shared.map(|shared| unsafe { shared.as_ref() })
    }

    /// Allocates a block of the smallest class holding `size` bytes.
    ///
    /// `None` for invalid sizes (zero or above the largest class) and for
    /// exhaustion of that class's pool.
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        let shared = self.shared()?;
        let index = size_to_index(size)?;
        shared.alloc_block(index)
    }

    /// Allocates like [`Slab::alloc`] and zero-fills the entire class
    /// extent, not merely `size` bytes.
    pub fn calloc(&self, size: usize) -> Option<NonNull<u8>> {
        let index = size_to_index(size)?;
        let block = self.alloc(size)?;
        unsafe {
            ptr::write_bytes(block.as_ptr(), 0, index_to_size_class(index));
        }
        Some(block)
    }

    /// Returns `ptr` to the pool for `size`'s class, through the calling
    /// thread's cache when it has a current-epoch entry.
    ///
    /// A null `ptr` or invalid `size` is a no-op.
    ///
    /// # Safety
    /// A non-null `ptr` must have come from this slab's `alloc`/`calloc`
    /// with the same `size` (up to class rounding), not freed since, and the
    /// slab must not have been `reset` in between.
    pub unsafe fn free(&self, ptr: *mut u8, size: usize) {
        let Some(shared) = self.shared() else { return };
        let Some(index) = size_to_index(size) else { return };
        if ptr.is_null() {
            return;
        }
        shared.free_block(index, ptr);
    }

    /// Whether `ptr` falls inside any of this slab's pools.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.shared()
            .is_some_and(|shared| shared.pools.iter().any(|pool| pool.owns(ptr)))
    }

    /// Rebuilds every pool's free population and advances the epoch, lazily
    /// invalidating all thread caches for this slab.
    ///
    /// Every outstanding block pointer is invalidated immediately; callers
    /// must not use or free one afterwards.
    pub fn reset(&self) {
        let Some(shared) = self.shared() else { return };
        shared.epoch.fetch_add(1, Ordering::Release);
        for pool in &shared.pools {
            pool.reset();
        }
    }

    /// Total bytes across all pools.
    pub fn total_capacity(&self) -> usize {
        self.shared()
            .map_or(0, |shared| shared.pools.iter().map(Pool::capacity).sum())
    }

    /// Bytes currently on the pools' free lists. Blocks parked in thread
    /// caches count as allocated until flushed back.
    pub fn total_free(&self) -> usize {
        self.shared()
            .map_or(0, |shared| shared.pools.iter().map(Pool::free_space).sum())
    }
}

impl Drop for Slab {
    fn drop(&mut self) {
        let Some(shared) = self.shared else { return };
        // This thread's cached view of the dying slab must not survive it.
        // Other threads' entries are the documented liveness hazard.
        let _ = cache::CACHE.try_with(|cache| {
            cache.borrow_mut().purge(shared.as_ptr().cast_const());
        });
        unsafe {
            ptr::drop_in_place(shared.as_ptr());
            unmap_region(shared.as_ptr().cast::<u8>(), size_of::<SlabShared>());
        }
    }
}
