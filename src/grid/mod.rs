//! Hypergrids over fitness space: fixed and adaptive grids, hyperbox
//! coordinates, neighbour iteration and the best-per-cell matrix.
pub mod adaptive;
pub mod fixed;
pub mod matrix;
pub mod neighbour;

pub use adaptive::AdaptiveGrid;
pub use fixed::HyperGrid;
pub use matrix::{BestCellMatrix, PerBranchMatrices};
pub use neighbour::neighbours;

use std::cmp::Ordering;

/// Coordinates of one grid cell. Ordering scans from the highest dimension
/// down: the first differing coordinate pair decides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct HyperBox(pub Vec<i64>);

impl HyperBox {
    pub fn zeroed(dimension_count: usize) -> Self {
        Self(vec![0; dimension_count])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Coordinates as `usize`, valid only for boxes computed against the
    /// grid origin (all coordinates non-negative).
    pub fn to_indices(&self) -> Vec<usize> {
        self.0.iter().map(|&c| c.max(0) as usize).collect()
    }
}

impl Ord for HyperBox {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for HyperBox {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::ops::Index<usize> for HyperBox {
    type Output = i64;

    fn index(&self, index: usize) -> &i64 {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for HyperBox {
    fn index_mut(&mut self, index: usize) -> &mut i64 {
        &mut self.0[index]
    }
}

/// The lowest and highest points a grid currently spans.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl GridBounds {
    pub fn new(dimension_count: usize) -> Self {
        Self {
            lower: vec![0.0; dimension_count],
            upper: vec![0.0; dimension_count],
        }
    }

    /// Collapses both bounds onto one point, the seed for a fresh bounding
    /// box.
    pub fn reset_to(&mut self, point: &[f64]) {
        self.lower.clear();
        self.lower.extend_from_slice(point);
        self.upper.clear();
        self.upper.extend_from_slice(point);
    }

    pub fn dimension_count(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn set_lower(&mut self, point: &[f64]) {
        self.lower.clear();
        self.lower.extend_from_slice(point);
    }

    pub fn set_upper(&mut self, point: &[f64]) {
        self.upper.clear();
        self.upper.extend_from_slice(point);
    }

    pub(crate) fn lower_mut(&mut self) -> &mut [f64] {
        &mut self.lower
    }

    pub(crate) fn upper_mut(&mut self) -> &mut [f64] {
        &mut self.upper
    }
}
