use std::alloc::{handle_alloc_error, Layout};
use std::cell::RefCell;
use std::mem::size_of;

use tracing::error;

/// Number of combination buffers (S1..S10) in one recursion frame.
pub const COMBINATIONS: usize = 10;
/// Number of product buffers (P1..P7) in one recursion frame.
pub const PRODUCTS: usize = 7;

/// Allocate a zero-filled `n×n` buffer.
///
/// Running out of memory is fatal: the failure is logged and the process
/// aborts through [`handle_alloc_error`].
pub fn allocate(n: usize) -> Vec<f64> {
    let len = match n.checked_mul(n) {
        Some(len) => len,
        None => {
            error!(n, "matrix buffer size overflows usize");
            handle_alloc_error(Layout::new::<f64>());
        }
    };

    let mut buf: Vec<f64> = Vec::new();
    if buf.try_reserve_exact(len).is_err() {
        error!(n, bytes = len.saturating_mul(8), "failed to allocate matrix buffer");
        let layout = Layout::array::<f64>(len).unwrap_or_else(|_| Layout::new::<f64>());
        handle_alloc_error(layout);
    }
    buf.resize(len, 0.0);
    buf
}

/// Per-thread scratch arena counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Buffers that had to come from the global allocator.
    pub fresh_allocations: usize,
    /// Buffers handed out again from the free lists.
    pub reuses: usize,
    /// Buffers currently parked in the free lists.
    pub retained_buffers: usize,
    /// Bytes held by the parked buffers.
    pub retained_bytes: usize,
}

/// Free lists of square scratch buffers, indexed by level (`log2` of the
/// buffer's side length).
#[derive(Debug, Default)]
struct ScratchArena {
    levels: Vec<Vec<Vec<f64>>>,
    stats: ArenaStats,
}

impl ScratchArena {
    fn take(&mut self, level: usize, zeroed: bool) -> Vec<f64> {
        match self.levels.get_mut(level).and_then(Vec::pop) {
            Some(mut buf) => {
                self.stats.reuses += 1;
                self.stats.retained_buffers -= 1;
                self.stats.retained_bytes -= bytes(&buf);
                if zeroed {
                    buf.fill(0.0);
                }
                buf
            }
            None => {
                self.stats.fresh_allocations += 1;
                allocate(1usize << level)
            }
        }
    }

    fn give(&mut self, level: usize, buf: Vec<f64>) {
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.stats.retained_buffers += 1;
        self.stats.retained_bytes += bytes(&buf);
        self.levels[level].push(buf);
    }

    /// Free parked buffers, largest level first, until at most `limit` bytes
    /// remain. Returns the number of buffers freed.
    fn trim(&mut self, limit: usize) -> usize {
        let mut released = 0;
        for level in self.levels.iter_mut().rev() {
            while self.stats.retained_bytes > limit {
                match level.pop() {
                    Some(buf) => {
                        self.stats.retained_buffers -= 1;
                        self.stats.retained_bytes -= bytes(&buf);
                        released += 1;
                    }
                    None => break,
                }
            }
        }
        while self.levels.last().is_some_and(Vec::is_empty) {
            self.levels.pop();
        }
        released
    }

    fn clear(&mut self) -> usize {
        let released = self.stats.retained_buffers;
        self.levels.clear();
        self.stats.retained_buffers = 0;
        self.stats.retained_bytes = 0;
        released
    }
}

fn bytes(buf: &[f64]) -> usize {
    buf.len() * size_of::<f64>()
}

thread_local! {
    static ARENA: RefCell<ScratchArena> = RefCell::new(ScratchArena::default());
}

/// Counters for the calling thread's arena.
pub fn arena_stats() -> ArenaStats {
    ARENA.with(|arena| arena.borrow().stats)
}

/// Drop every buffer parked in the calling thread's arena.
///
/// Returns the number of buffers released.
pub fn clear_thread_arena() -> usize {
    ARENA.with(|arena| arena.borrow_mut().clear())
}

/// Shrink the calling thread's arena to at most `limit` bytes, dropping the
/// largest buffers first.
///
/// Returns the number of buffers released.
pub fn trim_thread_arena(limit: usize) -> usize {
    ARENA.with(|arena| arena.borrow_mut().trim(limit))
}

/// The ten combination and seven product buffers owned by one recursion frame.
///
/// Buffers are taken from the running thread's arena and go back to it on
/// drop, so the per-frame cost after warm-up is a free-list pop. Fresh
/// buffers are zeroed; reused product buffers are zeroed only on request,
/// since only the classical multiplier accumulates into its output.
#[derive(Debug)]
pub struct ScratchSet {
    level: usize,
    size: usize,
    combinations: [Vec<f64>; COMBINATIONS],
    products: [Vec<f64>; PRODUCTS],
}

impl ScratchSet {
    /// Take a scratch set of `size×size` buffers. With `zero_products` the
    /// seven product buffers are all zero; otherwise reused ones may hold
    /// stale values.
    ///
    /// # Panics
    /// Panics if `size` is not a power of two.
    pub fn acquire(size: usize, zero_products: bool) -> Self {
        assert!(
            size.is_power_of_two(),
            "scratch size {} is not a power of two",
            size
        );
        let level = size.trailing_zeros() as usize;
        ARENA.with(|arena| {
            let mut arena = arena.borrow_mut();
            let combinations = std::array::from_fn(|_| arena.take(level, false));
            let products = std::array::from_fn(|_| arena.take(level, zero_products));
            ScratchSet {
                level,
                size,
                combinations,
                products,
            }
        })
    }

    /// Side length of every buffer in the set.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Disjoint borrows of the combination and product buffers.
    pub fn split_mut(
        &mut self,
    ) -> (
        &mut [Vec<f64>; COMBINATIONS],
        &mut [Vec<f64>; PRODUCTS],
    ) {
        (&mut self.combinations, &mut self.products)
    }
}

impl Drop for ScratchSet {
    fn drop(&mut self) {
        let level = self.level;
        let buffers = self
            .combinations
            .iter_mut()
            .chain(self.products.iter_mut())
            .map(std::mem::take);
        // The thread-local may already be gone during thread teardown; the
        // buffers are then simply freed.
        let _ = ARENA.try_with(|arena| {
            let mut arena = arena.borrow_mut();
            for buf in buffers {
                arena.give(level, buf);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let m = allocate(5);
        assert_eq!(m.len(), 25);
        assert!(m.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_allocate_empty() {
        assert!(allocate(0).is_empty());
    }

    #[test]
    fn test_scratch_set_shapes() {
        let mut s = ScratchSet::acquire(8, true);
        assert_eq!(s.size(), 8);
        let (combos, products) = s.split_mut();
        assert!(combos.iter().all(|b| b.len() == 64));
        assert!(products.iter().all(|b| b.len() == 64));
    }

    #[test]
    fn test_scratch_reused_and_products_zeroed() {
        // Each test runs on its own thread, so the arena starts empty.
        {
            let mut s = ScratchSet::acquire(4, true);
            let (combos, products) = s.split_mut();
            combos[0].fill(3.0);
            products[6].fill(7.0);
        }
        let after_first = arena_stats();
        assert_eq!(after_first.fresh_allocations, COMBINATIONS + PRODUCTS);
        assert_eq!(after_first.retained_buffers, COMBINATIONS + PRODUCTS);

        let mut s = ScratchSet::acquire(4, true);
        let stats = arena_stats();
        assert_eq!(stats.fresh_allocations, COMBINATIONS + PRODUCTS);
        assert_eq!(stats.reuses, COMBINATIONS + PRODUCTS);
        assert_eq!(stats.retained_buffers, 0);

        let (_, products) = s.split_mut();
        assert!(products.iter().all(|b| b.iter().all(|&x| x == 0.0)));
    }

    #[test]
    fn test_levels_are_separate() {
        drop(ScratchSet::acquire(2, true));
        drop(ScratchSet::acquire(16, true));
        let stats = arena_stats();
        assert_eq!(stats.fresh_allocations, 2 * (COMBINATIONS + PRODUCTS));
        assert_eq!(stats.reuses, 0);
    }

    #[test]
    fn test_reuse_without_zeroing_keeps_contents() {
        {
            let mut s = ScratchSet::acquire(2, true);
            let (_, products) = s.split_mut();
            products.iter_mut().for_each(|b| b.fill(5.0));
        }
        let mut s = ScratchSet::acquire(2, false);
        let (_, products) = s.split_mut();
        assert!(products.iter().all(|b| b.iter().all(|&x| x == 5.0)));
    }

    #[test]
    fn test_retained_bytes_tracked() {
        drop(ScratchSet::acquire(4, true));
        let stats = arena_stats();
        assert_eq!(stats.retained_bytes, (COMBINATIONS + PRODUCTS) * 16 * 8);
        let _s = ScratchSet::acquire(4, true);
        assert_eq!(arena_stats().retained_bytes, 0);
    }

    #[test]
    fn test_trim_drops_largest_levels_first() {
        drop(ScratchSet::acquire(2, true));
        drop(ScratchSet::acquire(8, true));
        let small = (COMBINATIONS + PRODUCTS) * 4 * 8;

        // Room for every 2x2 buffer but no 8x8 one.
        assert_eq!(trim_thread_arena(small), COMBINATIONS + PRODUCTS);
        let stats = arena_stats();
        assert_eq!(stats.retained_buffers, COMBINATIONS + PRODUCTS);
        assert_eq!(stats.retained_bytes, small);

        assert_eq!(trim_thread_arena(small), 0);
        assert_eq!(trim_thread_arena(small - 1), 1);
        assert_eq!(trim_thread_arena(0), COMBINATIONS + PRODUCTS - 1);
        assert_eq!(
            arena_stats(),
            ArenaStats {
                fresh_allocations: 2 * (COMBINATIONS + PRODUCTS),
                ..ArenaStats::default()
            }
        );
    }

    #[test]
    fn test_clear_thread_arena() {
        drop(ScratchSet::acquire(2, true));
        assert_eq!(clear_thread_arena(), COMBINATIONS + PRODUCTS);
        assert_eq!(arena_stats().retained_buffers, 0);
        assert_eq!(clear_thread_arena(), 0);
    }

    #[test]
    #[should_panic]
    fn test_non_power_of_two_rejected() {
        let _s = ScratchSet::acquire(6, true);
    }
}
