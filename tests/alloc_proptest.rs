use std::collections::HashSet;

use proptest::prelude::*;

use palloc::{flush_thread_cache, Arena, Pool, Slab, PAGE_SIZE};

#[derive(Debug, Clone, Copy)]
enum Op {
    Alloc,
    Free,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Alloc), Just(Op::Free)]
}

proptest! {
    #[test]
    fn arena_used_is_sum_of_lengths(lens in proptest::collection::vec(1usize..=256, 1..200)) {
        let mut arena = Arena::new(16 * PAGE_SIZE);
        let mut expected = 0usize;

        for len in lens {
            if expected + len <= arena.capacity() {
                let block = arena.alloc(len);
                prop_assert!(block.is_some());
                expected += len;
            } else {
                prop_assert!(arena.alloc(len).is_none());
            }
            prop_assert_eq!(arena.used(), expected);
        }

        arena.reset();
        prop_assert_eq!(arena.used(), 0);
        prop_assert!(arena.alloc(arena.capacity()).is_some());
    }

    #[test]
    fn pool_conserves_free_space(ops in proptest::collection::vec(op_strategy(), 1..400)) {
        const BLOCK_SIZE: usize = 64;
        const BLOCK_COUNT: usize = 128;
        let pool = Pool::new(BLOCK_SIZE, BLOCK_COUNT);
        let initial = pool.free_space();
        let mut held = Vec::new();
        let mut live = HashSet::new();

        for op in ops {
            match op {
                Op::Alloc => {
                    if let Some(block) = pool.alloc() {
                        prop_assert!(pool.owns(block.as_ptr()));
                        // Live blocks are pairwise distinct.
                        prop_assert!(live.insert(block.as_ptr() as usize));
                        held.push(block);
                    } else {
                        prop_assert!(held.len() == BLOCK_COUNT);
                    }
                }
                Op::Free => {
                    if let Some(block) = held.pop() {
                        live.remove(&(block.as_ptr() as usize));
                        unsafe { pool.free(block) };
                    }
                }
            }
            prop_assert_eq!(pool.free_space(), initial - held.len() * BLOCK_SIZE);
        }

        for block in held {
            unsafe { pool.free(block) };
        }
        prop_assert_eq!(pool.free_space(), initial);
    }

    #[test]
    fn pool_live_blocks_are_spaced(count in 2usize..64) {
        const BLOCK_SIZE: usize = 32;
        let pool = Pool::new(BLOCK_SIZE, 64);

        let mut addrs: Vec<usize> = (0..count)
            .map(|_| pool.alloc().unwrap().as_ptr() as usize)
            .collect();
        addrs.sort_unstable();
        for pair in addrs.windows(2) {
            prop_assert!(pair[1] - pair[0] >= BLOCK_SIZE);
        }
    }

    #[test]
    fn slab_conserves_free_space(
        ops in proptest::collection::vec((op_strategy(), 0usize..10), 1..300)
    ) {
        let slab = Slab::new(0.5);
        let initial = slab.total_free();
        let mut held: Vec<(core::ptr::NonNull<u8>, usize)> = Vec::new();

        for (op, class) in ops {
            let size = 8usize << class;
            match op {
                Op::Alloc => {
                    if let Some(block) = slab.alloc(size) {
                        prop_assert!(slab.owns(block.as_ptr()));
                        held.push((block, size));
                    }
                }
                Op::Free => {
                    if let Some((block, size)) = held.pop() {
                        unsafe { slab.free(block.as_ptr(), size) };
                    }
                }
            }
        }

        for (block, size) in held {
            unsafe { slab.free(block.as_ptr(), size) };
        }
        flush_thread_cache();
        prop_assert_eq!(slab.total_free(), initial);
    }

    #[test]
    fn slab_rejects_invalid_sizes(size in prop_oneof![Just(0usize), 4097usize..1 << 20, Just(usize::MAX)]) {
        let slab = Slab::new(0.1);
        prop_assert!(slab.alloc(size).is_none());
        prop_assert!(slab.calloc(size).is_none());
    }
}
