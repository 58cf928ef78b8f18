//! # `palloc` — page-mapped allocators for well-characterized workloads
//!
//! A family of user-space allocators that bypass the process heap entirely:
//! every byte they manage comes straight from the OS page mapper. Each is a
//! specialization that beats a general-purpose allocator on the workload it
//! was shaped for:
//!
//! - [`Arena`]: a linear bump region for transient allocations — pointer
//!   advance to allocate, `reset` to reclaim everything at once.
//! - [`Pool`]: a fixed population of equal-sized blocks with an intrusive
//!   free list, for steady churn of one object shape.
//! - [`Slab`]: the concurrent core — ten power-of-two size classes, one
//!   mutex-guarded pool each, fronted by a per-thread block cache with
//!   batch refill and flush. An epoch counter makes a global `reset`
//!   invalidate every thread's cache in O(1) without cross-thread
//!   signaling.
//! - [`DynamicSlab`]: unbounded growth — a lock-free, prepend-only list of
//!   slabs behind a mutex-guarded growth path.
//!
//! ## Contract
//!
//! Failure is a `None` return, never a panic: invalid sizes, exhausted
//! capacity, and OS mapping refusals all surface the same way, and
//! construction failures leave objects valid but empty. `free` is `unsafe`:
//! the allocator writes a link word through the pointer, so provenance and
//! single-free are the caller's warrant. `reset` invalidates outstanding
//! pointers; the epoch machinery protects the allocator's own caches, not
//! pointers the caller kept.
//!
//! Allocators cannot be cloned, and cached blocks are keyed on a stable
//! identity, so a slab must outlive the threads that allocated from it (or
//! those threads must call [`flush_thread_cache`] first).

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

pub mod arena;
mod cache;
pub mod dynamic;
pub mod page;
pub mod pool;
pub mod size_class;
pub mod slab;
pub mod stats;

pub use arena::Arena;
pub use cache::{flush_thread_cache, BATCH, MAX_CACHED_SLABS};
pub use dynamic::DynamicSlab;
pub use page::{align_up, PAGE_SIZE};
pub use pool::Pool;
pub use size_class::{index_to_size_class, size_to_index, CLASS_COUNT, MAX_CLASS_SIZE, MIN_CLASS_SIZE};
pub use slab::Slab;
pub use stats::{AllocatorMetrics, METRICS};
