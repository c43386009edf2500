//! Best-per-cell matrix: per-cell density counts and the best ranked item,
//! with lock-free tracking of occupied cells.
use super::HyperBox;
use crate::container::MultiArray;
use crate::errors::Result;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Sentinel for "no item".
pub const NO_ITEM: usize = usize::MAX;

const LIST_END: usize = usize::MAX;

/// One cell: the number of items currently mapped to it, the best ranked
/// item, and the intrusive link used by the occupied-cell lists.
#[derive(Debug)]
pub struct Cell {
    count: AtomicU32,
    best: AtomicUsize,
    next: AtomicUsize,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            count: AtomicU32::new(0),
            best: AtomicUsize::new(NO_ITEM),
            next: AtomicUsize::new(LIST_END),
        }
    }
}

impl Clone for Cell {
    fn clone(&self) -> Self {
        Self {
            count: AtomicU32::new(self.count.load(Ordering::Relaxed)),
            best: AtomicUsize::new(self.best.load(Ordering::Relaxed)),
            next: AtomicUsize::new(LIST_END),
        }
    }
}

impl Cell {
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn best(&self) -> Option<usize> {
        match self.best.load(Ordering::Acquire) {
            NO_ITEM => None,
            item => Some(item),
        }
    }

    fn reset(&self) {
        self.count.store(0, Ordering::Release);
        self.best.store(NO_ITEM, Ordering::Release);
    }
}

/// Intrusive lock-free LIFO over cell indices; the links live inside the
/// cells. A cell is pushed at most once per phase and lists are only popped
/// in phases that push to the *other* list, which keeps the Treiber scheme
/// free of reuse hazards.
#[derive(Debug, Default)]
struct OccupiedList {
    head: AtomicUsize,
}

impl OccupiedList {
    fn new() -> Self {
        Self {
            head: AtomicUsize::new(LIST_END),
        }
    }

    fn push(&self, cells: &MultiArray<Cell>, index: usize) {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            cells[index].next.store(head, Ordering::Relaxed);
            match self
                .head
                .compare_exchange_weak(head, index, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(current) => head = current,
            }
        }
    }

    fn pop(&self, cells: &MultiArray<Cell>) -> Option<usize> {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            if head == LIST_END {
                return None;
            }
            let next = cells[head].next.load(Ordering::Relaxed);
            match self
                .head
                .compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(head),
                Err(current) => head = current,
            }
        }
    }
}

/// Branch-local scratch: one item matrix per branch, each collecting that
/// branch's best candidate per cell before the global merge.
#[derive(Debug, Default)]
pub struct PerBranchMatrices {
    matrices: Vec<Mutex<MultiArray<Option<usize>>>>,
}

impl PerBranchMatrices {
    pub fn branch_count(&self) -> usize {
        self.matrices.len()
    }

    pub fn set_branch_count(&mut self, count: usize) {
        self.matrices
            .resize_with(count, || Mutex::new(MultiArray::empty()));
    }

    /// Resizes every branch matrix to the given grid shape.
    pub fn update_shape(&mut self, shape: &[usize]) {
        for matrix in &self.matrices {
            let mut matrix = matrix.lock().expect("branch matrix lock");
            if matrix.dimension_count() != shape.len() {
                *matrix = MultiArray::new(shape);
            } else {
                matrix
                    .set_dimension_sizes(shape)
                    .expect("dimension count matches");
            }
        }
    }

    pub fn branch(&self, branch: usize) -> &Mutex<MultiArray<Option<usize>>> {
        &self.matrices[branch]
    }
}

/// For a grid shape, tracks per cell an atomic density count and the best
/// ranked item. Occupancy is kept in two lock-free lists: cells freshly
/// occupied this generation, and cells whose best has been collected.
#[derive(Debug)]
pub struct BestCellMatrix {
    cells: MultiArray<Cell>,
    fresh: OccupiedList,
    collected: OccupiedList,
}

impl Default for BestCellMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl BestCellMatrix {
    pub fn new() -> Self {
        Self {
            cells: MultiArray::empty(),
            fresh: OccupiedList::new(),
            collected: OccupiedList::new(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.cells.dimension_sizes()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Resizes the cell matrix to a new grid shape. Must not be called
    /// while any occupied-cell list still holds entries, since resizing
    /// moves cells under the intrusive links.
    pub fn update_shape(&mut self, shape: &[usize]) {
        if self.cells.dimension_count() != shape.len() {
            self.cells = MultiArray::new(shape);
        } else {
            self.cells
                .set_dimension_sizes(shape)
                .expect("dimension count matches");
        }
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn index_of(&self, hyper_box: &HyperBox) -> Result<usize> {
        self.cells.index_of(&hyper_box.to_indices())
    }

    /// Counts an item into the cell at `hyper_box`, registering the cell as
    /// occupied on its first item, and returns the cell's linear index.
    pub fn insert(&self, hyper_box: &HyperBox) -> Result<usize> {
        let index = self.index_of(hyper_box)?;
        if self.cells[index].count.fetch_add(1, Ordering::AcqRel) == 0 {
            self.fresh.push(&self.cells, index);
        }
        Ok(index)
    }

    /// Merges the per-branch scratch matrices: for every occupied cell the
    /// highest-ranked candidate across all branches becomes the cell's
    /// best. Scratch entries are consumed. Safe to run from several
    /// branches at once.
    pub fn collect_best(&self, per_branch: &PerBranchMatrices, rank_of: impl Fn(usize) -> i32) {
        while let Some(index) = self.fresh.pop(&self.cells) {
            let cell = &self.cells[index];
            for branch in (0..per_branch.branch_count()).rev() {
                let mut matrix = per_branch.branch(branch).lock().expect("branch matrix lock");
                let candidate = matrix[index].take();
                let best = cell.best.load(Ordering::Acquire);
                let better = match (best, candidate) {
                    (NO_ITEM, _) => true,
                    (_, None) => false,
                    (best, Some(candidate)) => rank_of(candidate) > rank_of(best),
                };
                if better {
                    cell.best
                        .store(candidate.unwrap_or(NO_ITEM), Ordering::Release);
                }
            }
            self.collected.push(&self.cells, index);
        }
    }

    /// Resets every collected cell, emptying the matrix for the next
    /// generation while keeping its shape.
    pub fn clear(&self) {
        while let Some(index) = self.collected.pop(&self.cells) {
            self.cells[index].reset();
        }
    }

    /// Occupied cells currently awaiting collection, in pop order. Intended
    /// for inspection in tests.
    pub fn fresh_cells(&self) -> Vec<usize> {
        let mut cells = Vec::new();
        let mut head = self.fresh.head.load(Ordering::Acquire);
        while head != LIST_END {
            cells.push(head);
            head = self.cells[head].next.load(Ordering::Relaxed);
        }
        cells
    }
}
