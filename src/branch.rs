//! Branch work dispatch over the rayon pool.
//!
//! A *branch* is one rayon worker. Sharded state (dominance lists, bounding
//! boxes, scratch matrices) is indexed by the worker's pool index, and
//! parallel phases are separated by ordinary sequential code, which gives
//! the same publication guarantees as a barrier between phases.
use rayon::prelude::*;

/// Number of branches the parallel phases run on.
pub fn branch_count() -> usize {
    rayon::current_num_threads()
}

/// Index of the executing branch. Zero outside a parallel phase.
pub fn branch_id() -> usize {
    rayon::current_thread_index().unwrap_or(0)
}

/// Parallel-for over a population slice. The operation receives the item,
/// its index and the executing branch.
pub fn parallel_for<T: Sync>(items: &[T], op: impl Fn(&T, usize, usize) + Sync) {
    items
        .par_iter()
        .enumerate()
        .for_each(|(index, item)| op(item, index, branch_id()));
}

/// Parallel-for over an index range.
pub fn parallel_for_range(range: std::ops::Range<usize>, op: impl Fn(usize, usize) + Sync) {
    range
        .into_par_iter()
        .for_each(|index| op(index, branch_id()));
}

/// Parallel sweep over all unordered index pairs `(i, j)` with `i < j`.
/// Work is partitioned by the first index; each call receives the pair and
/// the executing branch.
pub fn parallel_pairs(len: usize, op: impl Fn(usize, usize, usize) + Sync) {
    (0..len).into_par_iter().for_each(|first| {
        let branch = branch_id();
        for second in first + 1..len {
            op(first, second, branch);
        }
    });
}

/// Runs one worker loop on every branch of the pool and waits for all of
/// them, for phases that drain a shared queue instead of a range.
pub fn broadcast_workers(op: impl Fn(usize) + Sync) {
    rayon::broadcast(|context| op(context.index()));
}
